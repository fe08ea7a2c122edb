// SPDX-FileCopyrightText: 2026 Taskpilot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Authentication adapter trait for identity verification.

use async_trait::async_trait;

use crate::error::TaskpilotError;
use crate::traits::adapter::PluginAdapter;
use crate::types::UserIdentity;

/// Adapter for authenticating and verifying user identity.
///
/// Validates a bearer credential and resolves it to a verified identity.
/// Failure is always `TaskpilotError::Auth`; a malformed credential must
/// never panic or crash the process.
#[async_trait]
pub trait AuthAdapter: PluginAdapter {
    /// Verifies the given bearer token and returns the caller's identity.
    async fn verify(&self, token: &str) -> Result<UserIdentity, TaskpilotError>;
}
