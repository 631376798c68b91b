use axum::{extract::State, http::HeaderMap, http::StatusCode, routing::post, Json, Router};
use realtime::{BrokerConfig, CentrifugoClient, Publisher, RealtimeError};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

type Seen = Arc<Mutex<Vec<(Option<String>, Value)>>>;

async fn publish_handler(
    State(seen): State<Seen>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());
    seen.lock().unwrap().push((auth, body));
    (StatusCode::OK, Json(json!({"result": {}})))
}

async fn spawn_broker(status: StatusCode) -> (String, Seen) {
    let seen: Seen = Arc::new(Mutex::new(Vec::new()));
    let app = if status == StatusCode::OK {
        Router::new()
            .route("/api/publish", post(publish_handler))
            .with_state(seen.clone())
    } else {
        Router::new().route("/api/publish", post(move || async move { status }))
    };

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}", addr), seen)
}

#[tokio::test]
async fn test_publish_posts_channel_and_data_with_api_key() {
    let (url, seen) = spawn_broker(StatusCode::OK).await;
    let client = CentrifugoClient::new(BrokerConfig::new(url, "secret-key")).unwrap();

    client
        .publish("conversation:c1", json!({"type": "new_message"}))
        .await
        .unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    let (auth, body) = &seen[0];
    assert_eq!(auth.as_deref(), Some("apikey secret-key"));
    assert_eq!(body["channel"], "conversation:c1");
    assert_eq!(body["data"]["type"], "new_message");
}

#[tokio::test]
async fn test_non_success_status_is_rejected() {
    let (url, _seen) = spawn_broker(StatusCode::SERVICE_UNAVAILABLE).await;
    let client = CentrifugoClient::new(BrokerConfig::new(url, "")).unwrap();

    let err = client.publish("chat:u1", json!({})).await.unwrap_err();
    match err {
        RealtimeError::Rejected { channel, status } => {
            assert_eq!(channel, "chat:u1");
            assert_eq!(status, 503);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_unreachable_broker_is_http_error() {
    // Bind then drop to get a port nobody is listening on.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = CentrifugoClient::new(BrokerConfig::new(format!("http://{}", addr), "")).unwrap();
    let err = client.publish("chat:u1", json!({})).await.unwrap_err();
    assert!(matches!(err, RealtimeError::Http(_)));
}
