// SPDX-FileCopyrightText: 2026 Taskpilot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tool server for the Taskpilot agent.
//!
//! Exposes the task operations (`add_new_task`, `list_tasks`,
//! `mark_task_complete`, `delete_task`, `update_task_title`) over a
//! line-delimited JSON protocol, each scoped by a caller-supplied
//! `user_id` validated at the storage query level.

pub mod catalog;
pub mod dispatch;
pub mod server;
pub mod wire;

#[cfg(test)]
pub(crate) mod testing;

pub use server::{run_stdio_server, serve};
pub use wire::{ServerCapabilities, WireRequest, WireResponse};
