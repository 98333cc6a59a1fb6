use std::convert::Infallible;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::Json;
use futures::Stream;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use stormwatch_common::Record;
use stormwatch_workers::feed::{FeedError, FeedLogTail, FeedQuery, FeedTail};
use stormwatch_workers::tailer::TailerState;

use crate::rest::AppState;

const DEFAULT_LIMIT: usize = 1000;

#[derive(Serialize)]
pub struct FeedStatus {
    pub feed: String,
    pub state: Option<TailerState>,
    pub records: usize,
}

pub async fn list_feeds(State(state): State<AppState>) -> Json<Vec<FeedStatus>> {
    let mut out = Vec::new();
    for name in state.feeds.names() {
        let records = match state.feeds.get(&name) {
            Some(log) => log.len().await,
            None => 0,
        };
        out.push(FeedStatus {
            state: state.tailers.get(&name).map(|rx| *rx.borrow()),
            feed: name,
            records,
        });
    }
    Json(out)
}

#[derive(Serialize)]
pub struct IngestResponse {
    pub inserted: usize,
}

/// Accepts one record object or an array of them.
pub async fn ingest_records(
    State(state): State<AppState>,
    Path(feed): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<IngestResponse>, StatusCode> {
    let log = state.feeds.get(&feed).ok_or(StatusCode::NOT_FOUND)?;
    let records = into_records(body).ok_or(StatusCode::BAD_REQUEST)?;
    let unique_keys = state.unique_keys.get(&feed).map(Vec::as_slice).unwrap_or(&[]);

    let mut inserted = 0;
    for record in records {
        if log.upsert(record, unique_keys).await {
            inserted += 1;
        }
    }
    Ok(Json(IngestResponse { inserted }))
}

fn into_records(body: Value) -> Option<Vec<Record>> {
    match body {
        Value::Object(record) => Some(vec![record]),
        Value::Array(rows) => rows
            .into_iter()
            .map(|row| match row {
                Value::Object(record) => Some(record),
                _ => None,
            })
            .collect(),
        _ => None,
    }
}

#[derive(Deserialize)]
pub struct RecordsParams {
    pub start: Option<String>,
    pub end: Option<String>,
    pub limit: Option<usize>,
}

/// Newest-first feed history, optionally bounded on `time_tag`.
pub async fn query_records(
    State(state): State<AppState>,
    Path(feed): Path<String>,
    Query(params): Query<RecordsParams>,
) -> Result<Json<Vec<Record>>, StatusCode> {
    let log = state.feeds.get(&feed).ok_or(StatusCode::NOT_FOUND)?;
    let query = FeedQuery {
        start: params.start,
        end: params.end,
        limit: params.limit.unwrap_or(DEFAULT_LIMIT),
    };
    Ok(Json(log.query(&query).await))
}

/// Server-sent events: one `data:` frame per record inserted into `feed`
/// after the client connects.
pub async fn stream_records(
    State(state): State<AppState>,
    Path(feed): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, StatusCode> {
    let log = state.feeds.get(&feed).ok_or(StatusCode::NOT_FOUND)?;
    tracing::debug!(feed = %feed, "record stream opened");
    let events = futures::stream::unfold(log.tail(), |mut tail| async move {
        let event = next_record_event(&mut tail).await?;
        Some((Ok(event), tail))
    });
    Ok(Sse::new(events).keep_alive(KeepAlive::new().interval(state.keep_alive)))
}

async fn next_record_event(tail: &mut FeedLogTail) -> Option<Event> {
    loop {
        match tail.next().await {
            Ok(record) => match serde_json::to_string(&record) {
                Ok(json) => return Some(Event::default().data(json)),
                Err(e) => tracing::warn!(error = %e, "skipping unserializable record"),
            },
            Err(FeedError::Lagged(n)) => tracing::warn!(skipped = n, "record stream fell behind"),
            Err(e) => {
                tracing::debug!(error = %e, "record stream ended");
                return None;
            }
        }
    }
}
