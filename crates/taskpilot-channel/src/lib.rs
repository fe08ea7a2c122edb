// SPDX-FileCopyrightText: 2026 Taskpilot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Managed connection to the Taskpilot tool server.
//!
//! The [`ToolChannel`] owns the lifecycle of the out-of-process tool
//! server: lazy spawn on first use, capability handshake, correlation of
//! concurrent requests, timeout classification, and reconnect-on-failure
//! with backoff. Callers see a [`taskpilot_core::ToolDispatch`] that never
//! raises a fatal error; every failure mode is an explicit outcome.

pub mod channel;
pub mod spawner;

pub use channel::{ChannelState, ToolChannel};
pub use spawner::{ProcessSpawner, ServerGuard, ServerIo, ServerSpawner};
