use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::{Duration, Instant},
};

use axum::{
    Json, Router,
    extract::State,
    http::{
        HeaderMap, HeaderValue, StatusCode, Uri,
        header::{AUTHORIZATION, RETRY_AFTER},
    },
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde_json::{Value, json};
use spotdump::{
    config::Settings,
    error::ExportError,
    management::TokenManager,
    spotify::{SpotifyApi, SpotifyClient},
    types::Token,
};

/// One scripted answer of the local Spotify stand-in.
#[derive(Clone)]
struct Reply {
    status: StatusCode,
    retry_after: Option<&'static str>,
    delay: Option<Duration>,
    body: Value,
}

impl Reply {
    fn ok(body: Value) -> Self {
        Reply {
            status: StatusCode::OK,
            retry_after: None,
            delay: None,
            body,
        }
    }

    fn status(status: StatusCode) -> Self {
        Reply {
            status,
            retry_after: None,
            delay: None,
            body: json!({ "error": { "status": status.as_u16(), "message": "scripted" } }),
        }
    }

    fn retry_after(mut self, secs: &'static str) -> Self {
        self.retry_after = Some(secs);
        self
    }

    fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

struct Stub {
    replies: Vec<Reply>,
    hits: AtomicUsize,
    requests: Mutex<Vec<(String, String)>>,
}

impl Stub {
    fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

async fn scripted(State(stub): State<Arc<Stub>>, uri: Uri, headers: HeaderMap) -> Response {
    let hit = stub.hits.fetch_add(1, Ordering::SeqCst);
    let auth = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    stub.requests.lock().unwrap().push((uri.to_string(), auth));

    // the last reply repeats
    let reply = stub.replies[hit.min(stub.replies.len() - 1)].clone();
    if let Some(delay) = reply.delay {
        tokio::time::sleep(delay).await;
    }

    let mut response = (reply.status, Json(reply.body)).into_response();
    if let Some(secs) = reply.retry_after {
        response
            .headers_mut()
            .insert(RETRY_AFTER, HeaderValue::from_static(secs));
    }
    response
}

async fn start_stub(replies: Vec<Reply>) -> (Arc<Stub>, String) {
    let stub = Arc::new(Stub {
        replies,
        hits: AtomicUsize::new(0),
        requests: Mutex::new(Vec::new()),
    });

    let app = Router::new()
        .fallback(scripted)
        .with_state(Arc::clone(&stub));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (stub, format!("http://{addr}/v1"))
}

fn client(api_url: String, request_timeout: Duration) -> SpotifyClient {
    let settings = Settings {
        username: "tester".to_string(),
        client_id: "client-id".to_string(),
        client_secret: "client-secret".to_string(),
        redirect_uri: "http://127.0.0.1:8888/callback".to_string(),
        server_address: "127.0.0.1:8888".to_string(),
        auth_url: "http://127.0.0.1:9/authorize".to_string(),
        token_url: "http://127.0.0.1:9/api/token".to_string(),
        api_url,
        request_timeout,
    };
    let token = Token {
        access_token: "access".to_string(),
        refresh_token: "refresh".to_string(),
        scope: "playlist-read-private".to_string(),
        expires_in: 3600,
        obtained_at: Utc::now().timestamp() as u64,
    };

    SpotifyClient::new(settings, TokenManager::new("tester", token)).unwrap()
}

#[tokio::test]
async fn test_request_carries_query_and_bearer_token() {
    let (stub, url) = start_stub(vec![Reply::ok(json!({ "items": [] }))]).await;

    let body = client(url, Duration::from_secs(5))
        .playlists(10)
        .await
        .unwrap();

    assert_eq!(body, json!({ "items": [] }));
    let requests = stub.requests.lock().unwrap().clone();
    assert_eq!(
        requests,
        vec![("/v1/me/playlists?limit=10".to_string(), "Bearer access".to_string())]
    );
}

#[tokio::test]
async fn test_feature_ids_are_comma_joined() {
    let (stub, url) = start_stub(vec![Reply::ok(json!({ "artists": [] }))]).await;

    client(url, Duration::from_secs(5))
        .artists(&["1".to_string(), "2".to_string()])
        .await
        .unwrap();

    let requests = stub.requests.lock().unwrap().clone();
    assert_eq!(requests[0].0, "/v1/artists?ids=1%2C2");
}

#[tokio::test]
async fn test_server_error_is_retried_once() {
    let (stub, url) = start_stub(vec![
        Reply::status(StatusCode::SERVICE_UNAVAILABLE),
        Reply::ok(json!({ "items": [{ "id": "p1" }] })),
    ])
    .await;

    let body = client(url, Duration::from_secs(5))
        .playlists(50)
        .await
        .unwrap();

    assert_eq!(body["items"][0]["id"], json!("p1"));
    assert_eq!(stub.hits(), 2);
}

#[tokio::test]
async fn test_second_server_error_is_returned() {
    let (stub, url) = start_stub(vec![
        Reply::status(StatusCode::SERVICE_UNAVAILABLE).retry_after("0"),
        Reply::status(StatusCode::SERVICE_UNAVAILABLE).retry_after("0"),
        Reply::ok(json!({ "items": [] })),
    ])
    .await;

    let result = client(url, Duration::from_secs(5)).playlists(50).await;

    assert!(matches!(
        result,
        Err(ExportError::Status { status, .. }) if status.as_u16() == 503
    ));
    assert_eq!(stub.hits(), 2);
}

#[tokio::test]
async fn test_client_error_is_not_retried() {
    let (stub, url) = start_stub(vec![
        Reply::status(StatusCode::NOT_FOUND),
        Reply::ok(json!({ "items": [] })),
    ])
    .await;

    let result = client(url, Duration::from_secs(5))
        .playlist_items("missing", 100)
        .await;

    assert!(matches!(
        result,
        Err(ExportError::Status { status, .. }) if status.as_u16() == 404
    ));
    assert_eq!(stub.hits(), 1);
}

#[tokio::test]
async fn test_rate_limit_waits_for_retry_after() {
    let (stub, url) = start_stub(vec![
        Reply::status(StatusCode::TOO_MANY_REQUESTS).retry_after("1"),
        Reply::ok(json!({ "items": [] })),
    ])
    .await;

    let started = Instant::now();
    let result = client(url, Duration::from_secs(5)).recently_played(50).await;

    assert!(result.is_ok());
    assert_eq!(stub.hits(), 2);
    assert!(started.elapsed() >= Duration::from_secs(1));
}

#[tokio::test]
async fn test_rate_limit_with_long_retry_after_fails_at_once() {
    let (stub, url) = start_stub(vec![
        Reply::status(StatusCode::TOO_MANY_REQUESTS).retry_after("500"),
        Reply::ok(json!({ "items": [] })),
    ])
    .await;

    let started = Instant::now();
    let result = client(url, Duration::from_secs(5)).recently_played(50).await;

    assert!(matches!(
        result,
        Err(ExportError::Status { status, .. }) if status.as_u16() == 429
    ));
    assert_eq!(stub.hits(), 1);
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_timed_out_request_is_retried() {
    let (stub, url) = start_stub(vec![
        Reply::ok(json!({ "items": [] })).delayed(Duration::from_secs(2)),
        Reply::ok(json!({ "items": [{ "id": "late" }] })),
    ])
    .await;

    let body = client(url, Duration::from_millis(300))
        .playlists(50)
        .await
        .unwrap();

    assert_eq!(body["items"][0]["id"], json!("late"));
    assert_eq!(stub.hits(), 2);
}

#[test]
fn test_transient_status_classification() {
    let status = |code: StatusCode| ExportError::Status {
        status: code,
        url: "http://localhost/v1/me/playlists".to_string(),
    };

    assert!(status(StatusCode::TOO_MANY_REQUESTS).is_transient());
    assert!(status(StatusCode::INTERNAL_SERVER_ERROR).is_transient());
    assert!(status(StatusCode::BAD_GATEWAY).is_transient());
    assert!(!status(StatusCode::NOT_FOUND).is_transient());
    assert!(!status(StatusCode::UNAUTHORIZED).is_transient());
    assert!(!ExportError::MissingField("items".to_string()).is_transient());
    assert!(!ExportError::Auth("expired".to_string()).is_transient());
}
