use std::sync::Arc;

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{error, warn};

use common::{
    storage::{
        db::SurrealDbClient,
        types::{
            conversation::{ChatTurn, Conversation},
            system_settings::SystemSettings,
        },
    },
    utils::{config::AppConfig, messenger::MessengerClient},
};
use response_pipeline::{LlmGateway, ResponseDispatcher};

/// One new turn, fanned out to every connected listener.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnEvent {
    pub session_id: String,
    pub channel: String,
    pub turn: ChatTurn,
}

#[derive(Clone)]
pub struct ApiState {
    pub db: Arc<SurrealDbClient>,
    pub config: AppConfig,
    pub dispatcher: Arc<ResponseDispatcher>,
    pub messenger: Arc<MessengerClient>,
    pub events: broadcast::Sender<TurnEvent>,
}

impl ApiState {
    pub async fn new(config: &AppConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let db = Arc::new(
            SurrealDbClient::new(
                &config.surrealdb_address,
                &config.surrealdb_username,
                &config.surrealdb_password,
                &config.surrealdb_namespace,
                &config.surrealdb_database,
            )
            .await?,
        );

        db.ensure_initialized().await?;

        let (events, _) = broadcast::channel(256);

        Ok(Self {
            db,
            dispatcher: Arc::new(ResponseDispatcher::new(LlmGateway::from_config(config))),
            messenger: Arc::new(MessengerClient::new(config)),
            events,
            config: config.clone(),
        })
    }

    /// Persist a turn and fan it out. Persistence failures are logged and
    /// swallowed: the conversational path never surfaces structured
    /// errors to the visitor.
    pub async fn record_turn(&self, session_id: &str, channel: &str, turn: ChatTurn) {
        if let Err(e) = Conversation::append_turn(&self.db, session_id, channel, turn.clone()).await
        {
            error!(session_id, "Failed to persist turn: {e}");
        }

        // No receivers is fine; send only errs when nobody is listening
        let _ = self.events.send(TurnEvent {
            session_id: session_id.to_string(),
            channel: channel.to_string(),
            turn,
        });
    }

    pub async fn settings_or_default(&self) -> SystemSettings {
        match SystemSettings::get_current(&self.db).await {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Falling back to default settings: {e}");
                SystemSettings::new()
            }
        }
    }
}
