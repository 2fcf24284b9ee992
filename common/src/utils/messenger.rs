use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{error, warn};

use crate::{error::AppError, utils::config::AppConfig};

/// Platform send API limit per message, counted in characters.
pub const MAX_CHUNK_CHARS: usize = 2000;

const FALLBACK_SENDER_NAME: &str = "Visitor";

#[derive(Debug, Clone)]
pub struct SenderProfile {
    pub name: String,
    pub avatar_url: Option<String>,
}

impl SenderProfile {
    fn fallback() -> Self {
        Self {
            name: FALLBACK_SENDER_NAME.to_string(),
            avatar_url: None,
        }
    }
}

/// Outbound client for the messaging platform's graph API: profile
/// lookups and chunked text delivery.
#[derive(Clone)]
pub struct MessengerClient {
    http: Client,
    api_base: String,
    access_token: String,
}

impl MessengerClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            http: Client::new(),
            api_base: config.graph_api_base.trim_end_matches('/').to_string(),
            access_token: config.page_access_token.clone(),
        }
    }

    /// Resolve a sender's display name and avatar. Lookup failures fall
    /// back to an anonymous profile so the relay keeps going.
    pub async fn fetch_profile(&self, user_id: &str) -> SenderProfile {
        #[derive(Deserialize)]
        struct ProfileResponse {
            first_name: Option<String>,
            last_name: Option<String>,
            profile_pic: Option<String>,
        }

        let url = format!("{}/{}", self.api_base, user_id);
        let response = self
            .http
            .get(&url)
            .query(&[
                ("fields", "first_name,last_name,profile_pic"),
                ("access_token", self.access_token.as_str()),
            ])
            .send()
            .await;

        let profile: ProfileResponse = match response {
            Ok(response) if response.status().is_success() => {
                match response.json().await {
                    Ok(profile) => profile,
                    Err(e) => {
                        warn!(user_id, "Unreadable profile payload: {e}");
                        return SenderProfile::fallback();
                    }
                }
            }
            Ok(response) => {
                warn!(
                    user_id,
                    status = %response.status(),
                    "Profile lookup rejected"
                );
                return SenderProfile::fallback();
            }
            Err(e) => {
                warn!(user_id, "Profile lookup failed: {e}");
                return SenderProfile::fallback();
            }
        };

        let name = [profile.first_name, profile.last_name]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ");

        SenderProfile {
            name: if name.trim().is_empty() {
                FALLBACK_SENDER_NAME.to_string()
            } else {
                name
            },
            avatar_url: profile.profile_pic,
        }
    }

    /// Deliver `text` to the recipient in order, one chunk per send call.
    /// The loop stops on the first transport failure; chunks already
    /// delivered are not retracted.
    pub async fn send_text(&self, recipient_id: &str, text: &str) -> Result<usize, AppError> {
        let chunks = chunk_text(text);
        let total = chunks.len();

        for (index, chunk) in chunks.iter().enumerate() {
            if let Err(e) = self.send_chunk(recipient_id, chunk).await {
                error!(
                    recipient_id,
                    sent = index,
                    total,
                    "Aborting delivery after failed chunk: {e}"
                );
                return Err(e);
            }
        }

        Ok(total)
    }

    async fn send_chunk(&self, recipient_id: &str, chunk: &str) -> Result<(), AppError> {
        let response = self
            .http
            .post(format!("{}/me/messages", self.api_base))
            .query(&[("access_token", self.access_token.as_str())])
            .json(&json!({
                "recipient": { "id": recipient_id },
                "message": { "text": chunk }
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Platform(format!(
                "send API returned {status}: {body}"
            )));
        }

        Ok(())
    }
}

/// Split `text` into ceil(len / MAX_CHUNK_CHARS) pieces, counting
/// characters rather than bytes so multi-byte input never splits inside
/// a code point. Concatenating the result reproduces the input exactly.
pub fn chunk_text(text: &str) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut count = 0usize;

    for ch in text.chars() {
        current.push(ch);
        count = count.saturating_add(1);
        if count == MAX_CHUNK_CHARS {
            chunks.push(std::mem::take(&mut current));
            count = 0;
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_count_matches_ceiling_law() {
        let cases = [
            (0usize, 0usize),
            (1, 1),
            (1999, 1),
            (2000, 1),
            (2001, 2),
            (4000, 2),
            (4001, 3),
        ];

        for (len, expected_chunks) in cases {
            let text = "a".repeat(len);
            let chunks = chunk_text(&text);
            assert_eq!(
                chunks.len(),
                expected_chunks,
                "wrong chunk count for length {len}"
            );
        }
    }

    #[test]
    fn test_chunks_concatenate_to_original() {
        let text = "lorem ipsum ".repeat(400); // 4800 chars
        let chunks = chunk_text(&text);

        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.chars().count() <= MAX_CHUNK_CHARS));
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn test_chunking_counts_characters_not_bytes() {
        // 2100 multi-byte characters: two chunks split at the 2000th char
        let text = "å".repeat(2100);
        let chunks = chunk_text(&text);

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].chars().count(), 2000);
        assert_eq!(chunks[1].chars().count(), 100);
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn test_empty_text_sends_nothing() {
        assert!(chunk_text("").is_empty());
    }
}
