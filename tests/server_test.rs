use std::{sync::Arc, time::Duration};

use spotdump::{
    config::Settings,
    server::start_api_server,
    types::AuthSession,
};
use tokio::sync::Mutex;

const SERVER_ADDRESS: &str = "127.0.0.1:38917";

fn settings() -> Settings {
    Settings {
        username: "tester".to_string(),
        client_id: "client-id".to_string(),
        client_secret: "client-secret".to_string(),
        redirect_uri: format!("http://{SERVER_ADDRESS}/auth/callback"),
        server_address: SERVER_ADDRESS.to_string(),
        auth_url: "http://127.0.0.1:9/authorize".to_string(),
        token_url: "http://127.0.0.1:9/api/token".to_string(),
        api_url: "http://127.0.0.1:9/v1".to_string(),
        request_timeout: Duration::from_secs(2),
    }
}

// Retries until the freshly spawned server accepts connections
async fn get_text(url: &str) -> (u16, String) {
    for _ in 0..50 {
        if let Ok(resp) = reqwest::get(url).await {
            let status = resp.status().as_u16();
            return (status, resp.text().await.unwrap());
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("callback server did not come up at {url}");
}

#[tokio::test]
async fn test_callback_route_rejects_denied_and_forged_redirects() {
    let state = Arc::new(Mutex::new(Some(AuthSession {
        csrf_state: "expected-state".to_string(),
        token: None,
    })));

    let server = tokio::spawn(start_api_server(
        Arc::clone(&state),
        settings(),
        "/auth/callback".to_string(),
    ));

    let base = format!("http://{SERVER_ADDRESS}/auth/callback");

    let (status, body) = get_text(&format!("{base}?error=access_denied")).await;
    assert_eq!(status, 200);
    assert!(body.contains("Authorization denied"));

    let (_, body) = get_text(&base).await;
    assert!(body.contains("Missing authorization code"));

    let (_, body) = get_text(&format!("{base}?code=abc&state=forged")).await;
    assert!(body.contains("State mismatch"));

    let (status, _) = get_text(&format!("http://{SERVER_ADDRESS}/elsewhere")).await;
    assert_eq!(status, 404);

    assert!(state.lock().await.as_ref().unwrap().token.is_none());
    server.abort();
}
