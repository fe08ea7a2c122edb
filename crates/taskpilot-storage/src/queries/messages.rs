// SPDX-FileCopyrightText: 2026 Taskpilot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message persistence. Messages are append-only: no update or delete.

use rusqlite::params;
use taskpilot_core::TaskpilotError;
use taskpilot_core::types::Role;

use crate::database::Database;
use crate::models::Message;

/// Insert a new message.
pub async fn insert_message(db: &Database, msg: &Message) -> Result<(), TaskpilotError> {
    let msg = msg.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO messages (id, conversation_id, role, content, tool_calls, tool_responses, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    msg.id,
                    msg.conversation_id,
                    msg.role.to_string(),
                    msg.content,
                    msg.tool_calls,
                    msg.tool_responses,
                    msg.created_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Get messages for a conversation in chronological order.
pub async fn get_messages_for_conversation(
    db: &Database,
    conversation_id: &str,
    limit: Option<i64>,
) -> Result<Vec<Message>, TaskpilotError> {
    let conversation_id = conversation_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut messages = Vec::new();
            let sql_base =
                "SELECT id, conversation_id, role, content, tool_calls, tool_responses, created_at
                 FROM messages WHERE conversation_id = ?1 ORDER BY created_at ASC";
            match limit {
                Some(lim) => {
                    let mut stmt = conn.prepare(&format!("{sql_base} LIMIT ?2"))?;
                    let rows =
                        stmt.query_map(params![conversation_id, lim], row_to_message)?;
                    for row in rows {
                        messages.push(row?);
                    }
                }
                None => {
                    let mut stmt = conn.prepare(sql_base)?;
                    let rows = stmt.query_map(params![conversation_id], row_to_message)?;
                    for row in rows {
                        messages.push(row?);
                    }
                }
            }
            Ok(messages)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

fn row_to_message(row: &rusqlite::Row<'_>) -> rusqlite::Result<Message> {
    let role_text: String = row.get(2)?;
    let role = role_text.parse::<Role>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(Message {
        id: row.get(0)?,
        conversation_id: row.get(1)?,
        role,
        content: row.get(3)?,
        tool_calls: row.get(4)?,
        tool_responses: row.get(5)?,
        created_at: row.get(6)?,
    })
}
