use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;

use stormwatch_workers::metrics::exposition::render_prometheus;

use crate::rest::AppState;

pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    let body = render_prometheus(&state.metrics);
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        body,
    )
}
