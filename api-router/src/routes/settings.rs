use axum::{extract::State, response::IntoResponse, Json};
use serde::Deserialize;

use common::storage::types::system_settings::SystemSettings;

use crate::{api_state::ApiState, error::ApiError};

pub async fn get_settings(State(state): State<ApiState>) -> Result<impl IntoResponse, ApiError> {
    let settings = SystemSettings::get_current(&state.db).await?;

    Ok(Json(settings))
}

#[derive(Debug, Deserialize)]
pub struct SettingsForm {
    pub chat_model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub bot_name: String,
    #[serde(default)]
    pub bot_avatar_url: Option<String>,
}

/// Merge the submitted knobs into the singleton row. The next dispatch
/// reads them fresh, so changes apply without a restart.
pub async fn update_settings(
    State(state): State<ApiState>,
    Json(form): Json<SettingsForm>,
) -> Result<impl IntoResponse, ApiError> {
    if form.bot_name.trim().is_empty() {
        return Err(ApiError::ValidationError("bot_name cannot be empty".to_string()));
    }

    let mut settings = SystemSettings::get_current(&state.db).await?;
    settings.chat_model = form.chat_model;
    settings.max_tokens = form.max_tokens;
    settings.temperature = form.temperature;
    settings.bot_name = form.bot_name;
    settings.bot_avatar_url = form.bot_avatar_url;

    let updated = SystemSettings::update(&state.db, settings).await?;

    Ok(Json(updated))
}
