use std::pin::Pin;

use async_stream::stream;
use axum::{
    extract::{Path, State},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse,
    },
};
use futures::Stream;
use tokio::sync::broadcast::error::RecvError;
use tracing::debug;

use crate::api_state::ApiState;

/// Live turn feed for one session. Subscribers see every turn recorded
/// after they connect; lagging consumers skip ahead instead of erroring
/// the stream.
pub async fn conversation_events(
    Path(session_id): Path<String>,
    State(state): State<ApiState>,
) -> impl IntoResponse {
    let mut receiver = state.events.subscribe();

    let stream: Pin<Box<dyn Stream<Item = Result<Event, axum::Error>> + Send>> =
        Box::pin(stream! {
            loop {
                match receiver.recv().await {
                    Ok(event) if event.session_id == session_id => {
                        match Event::default().event("turn").json_data(&event) {
                            Ok(sse_event) => yield Ok(sse_event),
                            Err(e) => debug!("Skipping unserializable turn event: {e}"),
                        }
                    }
                    // Turn for another session; keep waiting
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        debug!(session_id, skipped, "Event listener lagged");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
