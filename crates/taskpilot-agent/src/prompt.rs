// SPDX-FileCopyrightText: 2026 Taskpilot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! System instructions for the task-manager persona.

/// Default persona and operating rules for the agent.
pub const TASK_MANAGER_PERSONA: &str = "You are a professional task manager. \
You have tools to add, list, update, complete, and delete tasks.\n\n\
CRITICAL RULES:\n\
1. ALWAYS use the provided CURRENT_USER_ID for every tool call.\n\
2. If a user asks to update, complete, or delete a task but doesn't provide an ID, \
use 'list_tasks' first to find the correct ID.\n\
3. When listing tasks, show them clearly to the user.\n\
4. If a tool call times out but you suspect it succeeded, tell the user to refresh their list.";

/// Builds the per-turn instructions: the persona plus the authenticated
/// user id, injected as an explicit fact the model cannot override.
pub fn turn_instructions(persona: &str, user_id: &str) -> String {
    format!("{persona}\n\nCURRENT_USER_ID: {user_id}")
}

/// User-facing advisory for a turn whose only failures were tool timeouts
/// or channel unavailability. The mutation may have been applied, so this
/// asks for a refresh rather than reporting an error.
pub const WARMING_UP_ADVISORY: &str = "The task system is warming up. \
I've noted your request; please retry or refresh your task list in a moment.";

/// Best-effort reply when a turn hits the tool-round ceiling.
pub const ROUND_CEILING_REPLY: &str = "I couldn't finish that request within the \
allowed number of tool steps. Please check your task list and try again with a \
more specific request.";
