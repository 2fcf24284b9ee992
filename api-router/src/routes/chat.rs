use axum::{extract::State, response::IntoResponse, Json};
use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};
use serde_json::json;

use common::storage::types::conversation::{ChatTurn, Conversation};
use response_pipeline::{context::SessionContext, HistoryBuffer, ModelParams};

use crate::{api_state::ApiState, error::ApiError};

pub const WEB_CHANNEL: &str = "web";
const WEB_SENDER_NAME: &str = "Visitor";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessageParams {
    pub message: String,
    pub session_id: String,
}

#[derive(Debug, Serialize)]
pub struct ChatReply {
    pub reply: String,
}

/// Web chat turn: replay the stored transcript into per-session context
/// and history, persist and fan out both sides of the exchange, and hand
/// back whatever the dispatcher produced. Conversational failures come
/// back as apology text, never as a structured error.
pub async fn send_chat_message(
    State(state): State<ApiState>,
    Json(params): Json<ChatMessageParams>,
) -> Result<impl IntoResponse, ApiError> {
    if params.message.trim().is_empty() || params.session_id.trim().is_empty() {
        return Err(ApiError::ValidationError(
            "message and sessionId are required".to_string(),
        ));
    }

    let settings = state.settings_or_default().await;
    let model_params = ModelParams::from_settings(&settings);

    let prior_turns = Conversation::load_or_default(&params.session_id, WEB_CHANNEL, &state.db)
        .await
        .sorted_messages();
    let mut context = SessionContext::replay(&prior_turns);
    let mut history = HistoryBuffer::from_turns(&prior_turns);

    let user_turn = ChatTurn::user(WEB_SENDER_NAME.to_string(), None, params.message.clone());
    state
        .record_turn(&params.session_id, WEB_CHANNEL, user_turn)
        .await;

    let mut rng = StdRng::from_os_rng();
    let reply = state
        .dispatcher
        .respond(
            &params.message,
            &model_params,
            &mut context,
            &mut history,
            &mut rng,
        )
        .await;

    let bot_turn = ChatTurn::bot(
        settings.bot_name.clone(),
        settings.bot_avatar_url.clone(),
        reply.clone(),
    );
    state
        .record_turn(&params.session_id, WEB_CHANNEL, bot_turn)
        .await;

    Ok(Json(ChatReply { reply }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearHistoryParams {
    pub session_id: String,
}

pub async fn clear_chat_history(
    State(state): State<ApiState>,
    Json(params): Json<ClearHistoryParams>,
) -> Result<impl IntoResponse, ApiError> {
    Conversation::clear_messages(&state.db, &params.session_id).await?;

    Ok(Json(json!({ "status": "cleared" })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api_routes_v1;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        Router,
    };
    use common::{
        storage::db::SurrealDbClient,
        utils::{config::AppConfig, messenger::MessengerClient},
    };
    use response_pipeline::{
        dispatcher::GREETINGS, LlmGateway, ResponseDispatcher, APOLOGY,
    };
    use std::sync::Arc;
    use tokio::sync::broadcast;
    use tower::ServiceExt;
    use uuid::Uuid;

    fn test_config() -> AppConfig {
        AppConfig {
            openai_api_key: String::new(),
            openai_base_url: "https://example.invalid/v1".to_string(),
            surrealdb_address: "mem://".to_string(),
            surrealdb_username: "root".to_string(),
            surrealdb_password: "root".to_string(),
            surrealdb_namespace: "test_ns".to_string(),
            surrealdb_database: "test_db".to_string(),
            http_port: 0,
            page_access_token: String::new(),
            webhook_verify_token: "secret-token".to_string(),
            graph_api_base: "https://example.invalid/graph".to_string(),
        }
    }

    async fn test_app() -> (Router, ApiState) {
        let config = test_config();
        let db = Arc::new(
            SurrealDbClient::memory("test_ns", &Uuid::new_v4().to_string())
                .await
                .expect("Failed to start in-memory surrealdb"),
        );
        db.ensure_initialized()
            .await
            .expect("Failed to initialize db");

        let state = ApiState {
            db,
            dispatcher: Arc::new(ResponseDispatcher::new(LlmGateway::from_config(&config))),
            messenger: Arc::new(MessengerClient::new(&config)),
            events: broadcast::channel(16).0,
            config,
        };

        let app = Router::new()
            .nest("/api/v1", api_routes_v1())
            .with_state(state.clone());

        (app, state)
    }

    async fn post_json(app: &Router, uri: &str, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .expect("request"),
            )
            .await
            .expect("router response");

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        let value = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json body")
        };

        (status, value)
    }

    #[tokio::test]
    async fn test_greeting_round_trip_and_persistence() {
        let (app, state) = test_app().await;

        let (status, body) = post_json(
            &app,
            "/api/v1/chat",
            serde_json::json!({ "message": "hello", "sessionId": "widget-1" }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let reply = body
            .get("reply")
            .and_then(|r| r.as_str())
            .expect("reply field");
        assert!(GREETINGS.contains(&reply));

        // Both sides of the exchange landed in the transcript
        let messages = Conversation::get_messages("widget-1", &state.db).await;
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].message, "hello");
        assert_eq!(messages[1].message, reply);
    }

    #[tokio::test]
    async fn test_model_branch_degrades_to_apology() {
        let (app, _state) = test_app().await;

        let (status, body) = post_json(
            &app,
            "/api/v1/chat",
            serde_json::json!({ "message": "do aliens exist?", "sessionId": "widget-2" }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body.get("reply").and_then(|r| r.as_str()),
            Some(APOLOGY)
        );
    }

    #[tokio::test]
    async fn test_empty_message_is_rejected() {
        let (app, _state) = test_app().await;

        let (status, _) = post_json(
            &app,
            "/api/v1/chat",
            serde_json::json!({ "message": "   ", "sessionId": "widget-3" }),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_clear_history_is_idempotent_over_http() {
        let (app, state) = test_app().await;

        post_json(
            &app,
            "/api/v1/chat",
            serde_json::json!({ "message": "hello", "sessionId": "widget-4" }),
        )
        .await;
        assert!(!Conversation::get_messages("widget-4", &state.db)
            .await
            .is_empty());

        let (first, _) = post_json(
            &app,
            "/api/v1/chat/clear",
            serde_json::json!({ "sessionId": "widget-4" }),
        )
        .await;
        assert_eq!(first, StatusCode::OK);
        assert!(Conversation::get_messages("widget-4", &state.db)
            .await
            .is_empty());

        // Second clear must succeed on the already-empty transcript
        let (second, _) = post_json(
            &app,
            "/api/v1/chat/clear",
            serde_json::json!({ "sessionId": "widget-4" }),
        )
        .await;
        assert_eq!(second, StatusCode::OK);
        assert!(Conversation::get_messages("widget-4", &state.db)
            .await
            .is_empty());
    }
}
