// SPDX-FileCopyrightText: 2026 Taskpilot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turn execution for the Taskpilot agent.
//!
//! The [`TurnExecutor`] drives one conversational turn: it assembles the
//! model context (persona + injected identity + the user's message), calls
//! the provider, dispatches any requested tools through the tool channel,
//! and feeds results back until the model yields a final answer or the
//! round ceiling is hit.

pub mod executor;
pub mod prompt;

pub use executor::{TurnExecutor, TurnOutcome, TurnRunner};
