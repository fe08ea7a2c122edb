// SPDX-FileCopyrightText: 2026 Taskpilot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway for the Taskpilot agent.
//!
//! The chat endpoint is the turn orchestrator: it authorizes the caller,
//! resolves or creates the conversation, persists the inbound message,
//! runs the turn, persists the reply, and maps every failure to a
//! structured response. No error kills the serving process.

pub mod auth;
pub mod handlers;
pub mod server;

pub use server::{GatewayState, build_router, start_server};
