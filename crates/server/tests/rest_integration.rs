use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use stormwatch_server::app::Stormwatch;
use stormwatch_server::config::{load_from_str, StormwatchConfig};

fn start() -> Stormwatch {
    Stormwatch::start(&StormwatchConfig::default()).unwrap()
}

async fn get(app: &Stormwatch, uri: &str) -> (StatusCode, Value) {
    let resp = app
        .router()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = resp.status();
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
}

async fn post(app: &Stormwatch, uri: &str, body: Value) -> (StatusCode, Value) {
    let resp = app
        .router()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = resp.status();
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
}

#[tokio::test]
async fn healthz_returns_ok() {
    let app = start();
    let (status, body) = get(&app, "/healthz").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));
    app.stop();
}

#[tokio::test]
async fn ready_returns_ok() {
    let app = start();
    let (status, _) = get(&app, "/ready").await;
    assert_eq!(status, StatusCode::OK);
    app.stop();
}

#[tokio::test]
async fn alerts_empty_at_start() {
    let app = start();
    let (status, body) = get(&app, "/alerts").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
    app.stop();
}

#[tokio::test]
async fn feeds_lists_builtin_tailers() {
    let app = start();
    let (status, body) = get(&app, "/v1/feeds").await;
    assert_eq!(status, StatusCode::OK);

    let feeds: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["feed"].as_str().unwrap())
        .collect();
    assert_eq!(feeds, vec!["planetary_k_index", "rtsw_mag", "solar_wind", "xray_flares"]);
    assert_eq!(body[0]["state"], json!("listening"));
    assert_eq!(body[0]["records"], json!(0));
    app.stop();
}

#[tokio::test]
async fn ingest_unknown_feed_is_404() {
    let app = start();
    let (status, _) = post(&app, "/v1/feeds/nope/records", json!({"a": 1})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    app.stop();
}

#[tokio::test]
async fn ingest_non_object_rows_is_400() {
    let app = start();
    let (status, _) = post(&app, "/v1/feeds/solar_wind/records", json!([{"speed": 1.0}, 7])).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    app.stop();
}

#[tokio::test]
async fn ingest_then_query_newest_first() {
    let app = start();
    let rows = json!([
        {"time_tag": "2024-05-10T12:00:00", "speed": 410.0},
        {"time_tag": "2024-05-10T12:01:00", "speed": 420.0},
        {"time_tag": "2024-05-10T12:02:00", "speed": 430.0},
    ]);
    let (status, body) = post(&app, "/v1/feeds/solar_wind/records", rows).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"inserted": 3}));

    let (status, body) = get(&app, "/v1/feeds/solar_wind/records").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["speed"], json!(430.0));
    assert_eq!(body.as_array().unwrap().len(), 3);

    let (_, body) = get(
        &app,
        "/v1/feeds/solar_wind/records?start=2024-05-10T12:00:30&end=2024-05-10T12:01:30",
    )
    .await;
    assert_eq!(body, json!([{"time_tag": "2024-05-10T12:01:00", "speed": 420.0}]));

    let (_, body) = get(&app, "/v1/feeds/solar_wind/records?limit=1").await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    app.stop();
}

#[tokio::test]
async fn query_unknown_feed_is_404() {
    let app = start();
    let (status, _) = get(&app, "/v1/feeds/nope/records").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    app.stop();
}

#[tokio::test]
async fn polled_feed_upserts_on_unique_keys() {
    let config = load_from_str(
        r#"
pollers:
  - feed: planetary_k_index
    endpoint: http://127.0.0.1:9/kp.json
    unique_keys: [time_tag]
    startup_attempts: 1
"#,
    )
    .unwrap();
    let app = Stormwatch::start(&config).unwrap();

    let row = json!({"time_tag": "2024-05-10T12:00:00", "kp_index": 2.0});
    let (_, body) = post(&app, "/v1/feeds/planetary_k_index/records", row).await;
    assert_eq!(body, json!({"inserted": 1}));

    let replaced = json!({"time_tag": "2024-05-10T12:00:00", "kp_index": 2.33});
    let (_, body) = post(&app, "/v1/feeds/planetary_k_index/records", replaced).await;
    assert_eq!(body, json!({"inserted": 0}));

    let (_, body) = get(&app, "/v1/feeds/planetary_k_index/records").await;
    assert_eq!(body, json!([{"time_tag": "2024-05-10T12:00:00", "kp_index": 2.33}]));
    app.stop();
}

#[tokio::test]
async fn metrics_endpoint_exposes_counters() {
    let app = start();
    let resp = app
        .router()
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("stormwatch_alerts_fired_total 0"));
    assert!(text.contains("stormwatch_sessions_active 0"));
    app.stop();
}

#[test]
fn bad_rule_set_fails_startup() {
    let config = load_from_str(
        r#"
rules:
  - feed: planetary_k_index
    code: KP_G1
    level: info
    ttl_secs: 60
    field: kp_index
    condition: GreaterThan
    threshold: 1
"#,
    )
    .unwrap();
    assert!(Stormwatch::start(&config).is_err());
}
