// SPDX-FileCopyrightText: 2026 Taskpilot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bearer-token identity verification for the Taskpilot agent.
//!
//! Verifies 3-segment HS256 tokens (`header.payload.signature`, base64url)
//! against a shared secret and resolves them to a [`UserIdentity`].
//! Malformed input of any shape is an `Auth` error, never a panic.

pub mod verifier;

pub use verifier::{HsTokenVerifier, TokenClaims, mint_token};
