use std::collections::HashMap;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use rand::{rngs::StdRng, SeedableRng};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};

use common::{
    error::AppError,
    storage::types::conversation::{ChatTurn, Conversation, Sender},
};
use response_pipeline::{context::SessionContext, HistoryBuffer, ModelParams};

use crate::api_state::ApiState;

pub const MESSENGER_CHANNEL: &str = "messenger";

/// Subscription handshake: echo the challenge when the mode and token
/// line up, 403 for anything else.
pub async fn verify_webhook(
    State(state): State<ApiState>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let mode = params.get("hub.mode").cloned().unwrap_or_default();
    let verify_token = params.get("hub.verify_token").cloned().unwrap_or_default();
    let challenge = params.get("hub.challenge").cloned().unwrap_or_default();

    let expected = &state.config.webhook_verify_token;

    if mode == "subscribe" && !challenge.is_empty() && !expected.is_empty() && verify_token == *expected
    {
        info!("Webhook verification handshake accepted");
        return (StatusCode::OK, challenge).into_response();
    }

    (
        StatusCode::FORBIDDEN,
        Json(json!({ "error": "invalid webhook verification token" })),
    )
        .into_response()
}

#[derive(Debug, Deserialize)]
pub struct WebhookPayload {
    pub object: String,
    #[serde(default)]
    pub entry: Vec<WebhookEntry>,
}

#[derive(Debug, Deserialize)]
pub struct WebhookEntry {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub messaging: Vec<MessagingEvent>,
}

#[derive(Debug, Deserialize)]
pub struct MessagingEvent {
    pub sender: EventSender,
    #[serde(default)]
    pub message: Option<EventMessage>,
    /// Platform event time in epoch milliseconds.
    #[serde(default)]
    pub timestamp: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct EventSender {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct EventMessage {
    #[serde(default)]
    pub text: Option<String>,
}

/// Event intake. Page events are always acknowledged with 200 so the
/// platform does not re-deliver; failures inside individual events are
/// logged and skipped.
pub async fn receive_webhook(
    State(state): State<ApiState>,
    Json(payload): Json<WebhookPayload>,
) -> Response {
    if payload.object != "page" {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "unsupported event object" })),
        )
            .into_response();
    }

    for entry in payload.entry {
        for event in entry.messaging {
            let Some(text) = event.message.as_ref().and_then(|m| m.text.clone()) else {
                continue;
            };
            if text.trim().is_empty() {
                continue;
            }

            let received_at = event
                .timestamp
                .and_then(DateTime::from_timestamp_millis)
                .unwrap_or_else(Utc::now);

            if let Err(e) = relay_message(&state, &event.sender.id, &text, received_at).await {
                error!(sender_id = %event.sender.id, "Webhook relay failed: {e}");
            }
        }
    }

    (StatusCode::OK, "EVENT_RECEIVED").into_response()
}

/// One inbound platform message: resolve the sender, persist and fan out
/// the user turn, dispatch, persist and fan out the reply, then push it
/// back through the send API in order.
async fn relay_message(
    state: &ApiState,
    sender_id: &str,
    text: &str,
    received_at: DateTime<Utc>,
) -> Result<(), AppError> {
    let settings = state.settings_or_default().await;
    let model_params = ModelParams::from_settings(&settings);

    let profile = state.messenger.fetch_profile(sender_id).await;

    let prior_turns = Conversation::load_or_default(sender_id, MESSENGER_CHANNEL, &state.db)
        .await
        .sorted_messages();
    let mut context = SessionContext::replay(&prior_turns);
    let mut history = HistoryBuffer::from_turns(&prior_turns);

    let user_turn = ChatTurn::new(
        Sender::User,
        profile.name,
        profile.avatar_url,
        text.to_string(),
        received_at,
    );
    state.record_turn(sender_id, MESSENGER_CHANNEL, user_turn).await;

    let mut rng = StdRng::from_os_rng();
    let reply = state
        .dispatcher
        .respond(text, &model_params, &mut context, &mut history, &mut rng)
        .await;

    let bot_turn = ChatTurn::bot(
        settings.bot_name.clone(),
        settings.bot_avatar_url.clone(),
        reply.clone(),
    );
    state.record_turn(sender_id, MESSENGER_CHANNEL, bot_turn).await;

    // Already-sent chunks stand; the send call aborts internally on the
    // first transport failure.
    if let Err(e) = state.messenger.send_text(sender_id, &reply).await {
        error!(sender_id, "Platform delivery failed: {e}");
    }

    Ok(())
}
