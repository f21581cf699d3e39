// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Tracking routes: presence snapshots and the live map stream.

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
    Extension, Json, Router,
};
use futures_util::stream::{self, Stream};
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::Presence;
use crate::AppState;

/// How often the live stream re-reads the presence collection.
const STREAM_POLL_INTERVAL: Duration = Duration::from_secs(5);

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/tracking/presence", get(list_presence))
        .route("/api/tracking/stream", get(stream_presence))
}

/// One-shot snapshot of all rep presence records (manager only).
async fn list_presence(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Presence>>> {
    user.require_manager()?;
    Ok(Json(state.db.list_presence().await?))
}

/// Live presence stream for the tracking map (manager only).
///
/// Emits the full presence list every few seconds. The stream ends when
/// the client disconnects; there is nothing to tear down server-side
/// beyond dropping the stream.
async fn stream_presence(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Sse<impl Stream<Item = std::result::Result<Event, Infallible>>>> {
    user.require_manager()?;

    let stream = stream::unfold(state, |state| async move {
        tokio::time::sleep(STREAM_POLL_INTERVAL).await;

        let event = match state.db.list_presence().await {
            Ok(records) => Event::default()
                .json_data(&records)
                .unwrap_or_else(|_| Event::default().data("[]")),
            Err(e) => {
                tracing::warn!(error = %e, "Presence poll failed, emitting empty frame");
                Event::default().data("[]")
            }
        };

        Some((Ok(event), state))
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
