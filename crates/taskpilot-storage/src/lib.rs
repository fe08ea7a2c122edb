// SPDX-FileCopyrightText: 2026 Taskpilot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for the Taskpilot agent.
//!
//! Stores conversations, their append-only message history, and the durable
//! task list. All access goes through a single background connection; every
//! task query is scoped by owner at the SQL level.

pub mod adapter;
pub mod database;
pub mod migrations;
pub mod models;
pub mod queries;

pub use adapter::SqliteStorage;
pub use database::Database;
