use std::convert::Infallible;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::Json;
use futures::{Stream, StreamExt};
use serde_json::Value;

use crate::rest::AppState;

/// Every retained alert, in key order.
pub async fn list_alerts(State(state): State<AppState>) -> Result<Json<Vec<Value>>, StatusCode> {
    let entries = state.store.list_all().await.map_err(|e| {
        tracing::error!(error = %e, "listing alerts failed");
        StatusCode::SERVICE_UNAVAILABLE
    })?;

    let alerts = entries
        .iter()
        .filter_map(|e| serde_json::from_str(&e.value).ok())
        .collect();
    Ok(Json(alerts))
}

/// Server-sent events: the retained alerts, then every new alert for as
/// long as the client stays connected.
pub async fn stream_alerts(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let session = state.gateway.open().await;
    let events = session
        .into_stream()
        .map(|e| Ok(Event::default().event("alert").data(&*e.data)));

    Sse::new(events).keep_alive(KeepAlive::new().interval(state.keep_alive))
}
