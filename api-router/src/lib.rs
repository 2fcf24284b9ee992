use api_state::ApiState;
use axum::{
    extract::FromRef,
    routing::{get, post},
    Router,
};
use routes::{
    chat::{clear_chat_history, send_chat_message},
    conversations::{get_conversation, list_conversations},
    events::conversation_events,
    liveness::live,
    readiness::ready,
    settings::{get_settings, update_settings},
    webhook::{receive_webhook, verify_webhook},
};

pub mod api_state;
pub mod error;
mod routes;

/// Router for API functionality, version 1
pub fn api_routes_v1<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
    ApiState: FromRef<S>,
{
    Router::new()
        // Public probes (for k8s/systemd checks)
        .route("/live", get(live))
        .route("/ready", get(ready))
        // Messaging-platform webhook: handshake + event intake
        .route("/webhook", get(verify_webhook).post(receive_webhook))
        // Web chat widget endpoints
        .route("/chat", post(send_chat_message))
        .route("/chat/clear", post(clear_chat_history))
        // Inbox
        .route("/conversations", get(list_conversations))
        .route("/conversations/{session_id}", get(get_conversation))
        .route("/conversations/{session_id}/events", get(conversation_events))
        // Bot settings
        .route("/settings", get(get_settings).put(update_settings))
}
