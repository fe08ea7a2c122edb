// SPDX-FileCopyrightText: 2026 Taskpilot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests for the chat endpoint: real router, real SQLite
//! storage, real token verification, scripted turn runner.

use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use taskpilot_agent::{TurnOutcome, TurnRunner};
use taskpilot_auth::{HsTokenVerifier, TokenClaims, mint_token};
use taskpilot_config::model::StorageConfig;
use taskpilot_core::types::UserIdentity;
use taskpilot_core::{StorageAdapter, TaskpilotError, ToolCallSummary};
use taskpilot_gateway::{GatewayState, build_router};
use taskpilot_storage::SqliteStorage;

const SECRET: &[u8] = b"gateway-test-secret";

/// Turn runner returning a scripted outcome and recording invocations.
struct ScriptedRunner {
    outcome: Result<TurnOutcome, String>,
    calls: Mutex<Vec<(String, String)>>,
}

impl ScriptedRunner {
    fn replying(text: &str, tool_calls: Vec<ToolCallSummary>) -> Self {
        Self {
            outcome: Ok(TurnOutcome {
                final_text: text.to_string(),
                tool_call_summaries: tool_calls,
                tool_results: vec![],
            }),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn failing(message: &str) -> Self {
        Self {
            outcome: Err(message.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl TurnRunner for ScriptedRunner {
    async fn run_turn(
        &self,
        user_message: &str,
        conversation_id: &str,
        _identity: &UserIdentity,
    ) -> Result<TurnOutcome, TaskpilotError> {
        self.calls
            .lock()
            .unwrap()
            .push((user_message.to_string(), conversation_id.to_string()));
        match &self.outcome {
            Ok(outcome) => Ok(outcome.clone()),
            Err(message) => Err(TaskpilotError::TurnFailed {
                message: message.clone(),
                source: None,
            }),
        }
    }
}

struct TestApp {
    router: axum::Router,
    storage: Arc<SqliteStorage>,
    runner: Arc<ScriptedRunner>,
    _dir: tempfile::TempDir,
}

async fn test_app(runner: ScriptedRunner) -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let storage = Arc::new(SqliteStorage::new(StorageConfig {
        database_path: dir
            .path()
            .join("gateway.db")
            .to_string_lossy()
            .into_owned(),
        wal_mode: true,
    }));
    storage.initialize().await.unwrap();

    let runner = Arc::new(runner);
    let state = GatewayState {
        auth: Arc::new(HsTokenVerifier::new(SECRET)),
        conversations: storage.clone(),
        runner: runner.clone(),
    };

    TestApp {
        router: build_router(state),
        storage,
        runner,
        _dir: dir,
    }
}

fn token_for(user_id: &str) -> String {
    mint_token(
        SECRET,
        &TokenClaims {
            user_id: Some(user_id.to_string()),
            sub: None,
            email: Some(format!("{user_id}@example.com")),
            exp: None,
        },
    )
}

fn chat_request(path_user: &str, token: Option<&str>, body: serde_json::Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(format!("/users/{path_user}/chat"))
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_is_public() {
    let app = test_app(ScriptedRunner::replying("ok", vec![])).await;
    let response = app
        .router
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn missing_token_is_unauthorized() {
    let app = test_app(ScriptedRunner::replying("ok", vec![])).await;
    let response = app
        .router
        .oneshot(chat_request("u1", None, serde_json::json!({"message": "hi"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(app.runner.call_count(), 0);
}

#[tokio::test]
async fn garbage_token_is_unauthorized() {
    let app = test_app(ScriptedRunner::replying("ok", vec![])).await;
    let response = app
        .router
        .oneshot(chat_request(
            "u1",
            Some("not.a.token"),
            serde_json::json!({"message": "hi"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn caller_path_mismatch_is_forbidden_and_persists_nothing() {
    let app = test_app(ScriptedRunner::replying("ok", vec![])).await;
    let response = app
        .router
        .oneshot(chat_request(
            "u1",
            Some(&token_for("u2")),
            serde_json::json!({"message": "hi"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let json = body_json(response).await;
    assert_eq!(json["detail"], "Not authorized");
    // No turn ran, no message was written.
    assert_eq!(app.runner.call_count(), 0);
}

#[tokio::test]
async fn chat_creates_conversation_and_appends_two_messages_per_turn() {
    let app = test_app(ScriptedRunner::replying(
        "Added 'buy milk' to your list.",
        vec![ToolCallSummary {
            tool: "add_new_task".into(),
            parameters: serde_json::json!({"title": "buy milk", "user_id": "u1"}),
        }],
    ))
    .await;
    let token = token_for("u1");

    let response = app
        .router
        .clone()
        .oneshot(chat_request(
            "u1",
            Some(&token),
            serde_json::json!({"message": "add task buy milk"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let conversation_id = json["conversation_id"].as_str().unwrap().to_string();
    assert_eq!(json["response"], "Added 'buy milk' to your list.");
    assert_eq!(json["tool_calls"][0]["tool"], "add_new_task");
    assert!(json["message_id"].as_str().is_some());

    use taskpilot_core::ConversationStore;
    let conversation = app
        .storage
        .get_conversation(&conversation_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(conversation.user_id, "u1");
    assert!(conversation.title.starts_with("Chat "));

    let messages = app
        .storage
        .get_messages(&conversation_id, None)
        .await
        .unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].content, "add task buy milk");
    assert_eq!(messages[1].content, "Added 'buy milk' to your list.");
    assert!(
        messages[1]
            .tool_calls
            .as_ref()
            .unwrap()
            .contains("add_new_task")
    );

    // Reusing the returned conversation id appends to the same thread.
    let response = app
        .router
        .clone()
        .oneshot(chat_request(
            "u1",
            Some(&token),
            serde_json::json!({"message": "thanks", "thread_id": conversation_id}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["conversation_id"], conversation_id);

    let messages = app
        .storage
        .get_messages(&conversation_id, None)
        .await
        .unwrap();
    assert_eq!(messages.len(), 4);
}

#[tokio::test]
async fn degraded_tooling_still_returns_200_with_advisory() {
    let advisory =
        "The task system is warming up. I've noted your request; please retry or \
         refresh your task list in a moment.";
    let app = test_app(ScriptedRunner::replying(advisory, vec![])).await;

    let response = app
        .router
        .oneshot(chat_request(
            "u1",
            Some(&token_for("u1")),
            serde_json::json!({"message": "list my tasks"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert!(json["response"].as_str().unwrap().contains("warming up"));
}

#[tokio::test]
async fn turn_failure_returns_500_but_keeps_the_user_message() {
    let app = test_app(ScriptedRunner::failing("model provider unreachable")).await;

    let response = app
        .router
        .oneshot(chat_request(
            "u1",
            Some(&token_for("u1")),
            serde_json::json!({"message": "add task buy milk"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert!(
        json["detail"]
            .as_str()
            .unwrap()
            .contains("model provider unreachable")
    );

    // The inbound message survived the failed turn: exactly one user
    // message, no assistant message.
    let (_, conversation_id) = app.runner.calls.lock().unwrap()[0].clone();
    use taskpilot_core::ConversationStore;
    let messages = app
        .storage
        .get_messages(&conversation_id, None)
        .await
        .unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].content, "add task buy milk");
}

#[tokio::test]
async fn unknown_thread_id_is_not_found() {
    let app = test_app(ScriptedRunner::replying("ok", vec![])).await;

    let response = app
        .router
        .oneshot(chat_request(
            "u1",
            Some(&token_for("u1")),
            serde_json::json!({"message": "hi", "thread_id": "missing-conv"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(app.runner.call_count(), 0);
}

#[tokio::test]
async fn foreign_thread_id_is_indistinguishable_from_missing() {
    let app = test_app(ScriptedRunner::replying("ok", vec![])).await;
    let token_u2 = token_for("u2");

    // u2 creates a conversation.
    let response = app
        .router
        .clone()
        .oneshot(chat_request(
            "u2",
            Some(&token_u2),
            serde_json::json!({"message": "hi"}),
        ))
        .await
        .unwrap();
    let conversation_id = body_json(response).await["conversation_id"]
        .as_str()
        .unwrap()
        .to_string();

    // u1 tries to append to it and gets the same 404 as for a missing id.
    let response = app
        .router
        .oneshot(chat_request(
            "u1",
            Some(&token_for("u1")),
            serde_json::json!({"message": "hi", "thread_id": conversation_id}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
