use tracing::warn;

use crate::{error::AppError, storage::db::SurrealDbClient, stored_object};

#[derive(Deserialize, Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

/// One persisted turn of a conversation. Immutable once appended;
/// ordering across a transcript is timestamp-based.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChatTurn {
    pub sender: Sender,
    pub sender_name: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatTurn {
    pub fn new(
        sender: Sender,
        sender_name: String,
        avatar_url: Option<String>,
        message: String,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            sender,
            sender_name,
            avatar_url,
            message,
            timestamp,
        }
    }

    pub fn user(sender_name: String, avatar_url: Option<String>, message: String) -> Self {
        Self::new(Sender::User, sender_name, avatar_url, message, Utc::now())
    }

    pub fn bot(sender_name: String, avatar_url: Option<String>, message: String) -> Self {
        Self::new(Sender::Bot, sender_name, avatar_url, message, Utc::now())
    }
}

stored_object!(Conversation, "conversation", {
    channel: String,
    messages: Vec<ChatTurn>
});

/// Inbox row: the newest turn of each session.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummary {
    pub session_id: String,
    pub channel: String,
    pub message_count: usize,
    pub last_message: Option<ChatTurn>,
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    /// The record id IS the session/platform-user id, so each session maps
    /// to exactly one transcript document.
    pub fn new(session_id: &str, channel: &str) -> Self {
        let now = Utc::now();
        Self {
            id: session_id.to_string(),
            created_at: now,
            updated_at: now,
            channel: channel.to_string(),
            messages: Vec::new(),
        }
    }

    /// Absent or unreadable documents are silently an empty conversation.
    pub async fn load_or_default(session_id: &str, channel: &str, db: &SurrealDbClient) -> Self {
        match db.get_item::<Conversation>(session_id).await {
            Ok(Some(conversation)) => conversation,
            Ok(None) => Self::new(session_id, channel),
            Err(e) => {
                warn!(
                    session_id,
                    "Failed to load conversation, starting empty: {e}"
                );
                Self::new(session_id, channel)
            }
        }
    }

    pub async fn append_turn(
        db: &SurrealDbClient,
        session_id: &str,
        channel: &str,
        turn: ChatTurn,
    ) -> Result<Self, AppError> {
        let mut conversation = Self::load_or_default(session_id, channel, db).await;
        conversation.messages.push(turn);
        conversation.updated_at = Utc::now();

        let stored = db.upsert_item(conversation).await?;
        stored.ok_or_else(|| AppError::InternalError("Conversation upsert returned nothing".into()))
    }

    pub async fn get_messages(session_id: &str, db: &SurrealDbClient) -> Vec<ChatTurn> {
        Self::load_or_default(session_id, "web", db)
            .await
            .sorted_messages()
    }

    /// Transcript oldest first. The stored array is already in insertion
    /// order; the sort keeps the guarantee when timestamps arrive skewed.
    pub fn sorted_messages(&self) -> Vec<ChatTurn> {
        let mut messages = self.messages.clone();
        messages.sort_by_key(|turn| turn.timestamp);
        messages
    }

    /// Empties the transcript but keeps the document, so a second call is
    /// trivially a no-op that still succeeds.
    pub async fn clear_messages(db: &SurrealDbClient, session_id: &str) -> Result<(), AppError> {
        let mut conversation = Self::load_or_default(session_id, "web", db).await;
        conversation.messages.clear();
        conversation.updated_at = Utc::now();

        db.upsert_item(conversation).await?;
        Ok(())
    }

    pub async fn list_summaries(db: &SurrealDbClient) -> Result<Vec<ConversationSummary>, AppError> {
        let conversations: Vec<Conversation> = db.get_all_stored_items().await?;

        let mut summaries: Vec<ConversationSummary> = conversations
            .into_iter()
            .map(|conversation| {
                let messages = conversation.sorted_messages();
                ConversationSummary {
                    session_id: conversation.id,
                    channel: conversation.channel,
                    message_count: messages.len(),
                    last_message: messages.last().cloned(),
                    updated_at: conversation.updated_at,
                }
            })
            .collect();

        summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));

        Ok(summaries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    async fn setup_db() -> SurrealDbClient {
        let namespace = "test_ns";
        let database = &Uuid::new_v4().to_string();
        SurrealDbClient::memory(namespace, database)
            .await
            .expect("Failed to start in-memory surrealdb")
    }

    #[tokio::test]
    async fn test_append_creates_conversation() {
        let db = setup_db().await;

        let turn = ChatTurn::user("Visitor".to_string(), None, "Hello there".to_string());
        let conversation = Conversation::append_turn(&db, "session-1", "web", turn)
            .await
            .expect("Failed to append turn");

        assert_eq!(conversation.id, "session-1");
        assert_eq!(conversation.channel, "web");
        assert_eq!(conversation.messages.len(), 1);

        let reloaded = Conversation::load_or_default("session-1", "web", &db).await;
        assert_eq!(reloaded.messages.len(), 1);
        assert_eq!(reloaded.messages[0].message, "Hello there");
    }

    #[tokio::test]
    async fn test_load_or_default_on_absent_session() {
        let db = setup_db().await;

        let conversation = Conversation::load_or_default("nobody-home", "web", &db).await;
        assert_eq!(conversation.id, "nobody-home");
        assert!(conversation.messages.is_empty());
    }

    #[tokio::test]
    async fn test_messages_sorted_by_timestamp() {
        let db = setup_db().await;
        let now = Utc::now();

        let late = ChatTurn::new(
            Sender::Bot,
            "Bot".to_string(),
            None,
            "second".to_string(),
            now,
        );
        let early = ChatTurn::new(
            Sender::User,
            "Visitor".to_string(),
            None,
            "first".to_string(),
            now - chrono::Duration::seconds(30),
        );

        Conversation::append_turn(&db, "session-order", "web", late)
            .await
            .expect("Failed to append");
        Conversation::append_turn(&db, "session-order", "web", early)
            .await
            .expect("Failed to append");

        let messages = Conversation::get_messages("session-order", &db).await;
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].message, "first");
        assert_eq!(messages[1].message, "second");
    }

    #[tokio::test]
    async fn test_clear_messages_is_idempotent() {
        let db = setup_db().await;

        let turn = ChatTurn::user("Visitor".to_string(), None, "wipe me".to_string());
        Conversation::append_turn(&db, "session-clear", "web", turn)
            .await
            .expect("Failed to append");

        Conversation::clear_messages(&db, "session-clear")
            .await
            .expect("First clear failed");
        assert!(Conversation::get_messages("session-clear", &db)
            .await
            .is_empty());

        // Second clear on the already-empty transcript must also succeed
        Conversation::clear_messages(&db, "session-clear")
            .await
            .expect("Second clear failed");
        assert!(Conversation::get_messages("session-clear", &db)
            .await
            .is_empty());
    }

    #[tokio::test]
    async fn test_clear_on_unknown_session_succeeds() {
        let db = setup_db().await;

        Conversation::clear_messages(&db, "never-seen")
            .await
            .expect("Clear on unknown session should not error");
    }

    #[tokio::test]
    async fn test_list_summaries_latest_message_per_session() {
        let db = setup_db().await;

        Conversation::append_turn(
            &db,
            "session-a",
            "web",
            ChatTurn::user("Visitor".to_string(), None, "older".to_string()),
        )
        .await
        .expect("Failed to append");
        Conversation::append_turn(
            &db,
            "session-a",
            "web",
            ChatTurn::bot("Bot".to_string(), None, "newest in a".to_string()),
        )
        .await
        .expect("Failed to append");
        Conversation::append_turn(
            &db,
            "session-b",
            "messenger",
            ChatTurn::user("Ada".to_string(), None, "only in b".to_string()),
        )
        .await
        .expect("Failed to append");

        let summaries = Conversation::list_summaries(&db)
            .await
            .expect("Failed to list summaries");

        assert_eq!(summaries.len(), 2);
        // Most recently updated first
        assert_eq!(summaries[0].session_id, "session-b");
        assert_eq!(
            summaries[0].last_message.as_ref().map(|m| m.message.clone()),
            Some("only in b".to_string())
        );

        let session_a = summaries
            .iter()
            .find(|s| s.session_id == "session-a")
            .expect("session-a summary missing");
        assert_eq!(session_a.message_count, 2);
        assert_eq!(
            session_a.last_message.as_ref().map(|m| m.message.clone()),
            Some("newest in a".to_string())
        );
    }
}
