//! End-to-end claim resolution against a local profile endpoint served over
//! plain TCP, using the reqwest client.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{json, Map, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use url::Url;

use oidc_claims_core::oidc::IdToken;
use oidc_claims_core::provider::bearer_authorization;
use oidc_claims_core::{ApiError, ClaimExtractor, ProviderData, Result, SessionAssembler};
use oidc_claims_native::{init_tracing, ReqwestHttpClient};

struct ClaimsToken(Map<String, Value>);

impl ClaimsToken {
    fn new(claims: Value) -> Self {
        match claims {
            Value::Object(map) => Self(map),
            _ => panic!("claims must be an object"),
        }
    }
}

impl IdToken for ClaimsToken {
    fn claims(&self) -> Result<Map<String, Value>> {
        Ok(self.0.clone())
    }
}

/// Serve `body` with `status_line` to every connection, recording raw requests
async fn serve(status_line: &'static str, body: String) -> (Url, Arc<Mutex<Vec<String>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let recorder = seen.clone();

    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            let mut buf = vec![0u8; 8192];
            let n = stream.read(&mut buf).await.unwrap_or(0);
            recorder
                .lock()
                .unwrap()
                .push(String::from_utf8_lossy(&buf[..n]).to_string());

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            let _ = stream.write_all(response.as_bytes()).await;
            let _ = stream.shutdown().await;
        }
    });

    let url = Url::parse(&format!("http://{}/userinfo", addr)).unwrap();
    (url, seen)
}

/// Accept connections and never answer them
async fn serve_silence() -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((stream, _)) = listener.accept().await {
            held.push(stream);
        }
    });

    Url::parse(&format!("http://{}/userinfo", addr)).unwrap()
}

fn provider(profile_url: Url) -> ProviderData {
    ProviderData {
        profile_url: Some(profile_url),
        profile_timeout: Some(Duration::from_secs(5)),
        ..Default::default()
    }
    .with_authorization_header_fn(Box::new(bearer_authorization))
}

#[tokio::test]
async fn test_session_uses_profile_claims() {
    init_tracing();
    let (url, seen) = serve(
        "200 OK",
        json!({
            "email": "alice@example.com",
            "email_verified": true,
            "groups": ["admins", "ops"],
            "preferred_username": "alice"
        })
        .to_string(),
    )
    .await;

    let provider = provider(url);
    let http = ReqwestHttpClient::new();
    let token = ClaimsToken::new(json!({"sub": "u1"}));

    let session = SessionAssembler::new(&provider, &http)
        .build_session_from_claims(Some(&token), "access-123")
        .await
        .unwrap();

    assert_eq!(session.user, "u1");
    assert_eq!(session.email, "alice@example.com");
    assert_eq!(session.groups, vec!["admins", "ops"]);
    assert_eq!(session.preferred_username, "alice");

    let requests = seen.lock().unwrap().clone();
    assert_eq!(requests.len(), 1);
    let request = requests[0].to_ascii_lowercase();
    assert!(request.starts_with("get /userinfo"));
    assert!(request.contains("authorization: bearer access-123"));
    assert!(request.contains("accept: application/json"));
}

#[tokio::test]
async fn test_error_status_is_profile_fetch_failure() {
    let (url, seen) = serve("401 Unauthorized", r#"{"error":"invalid_token"}"#.to_string()).await;

    let provider = provider(url);
    let http = ReqwestHttpClient::new();
    let token = ClaimsToken::new(json!({"sub": "u1"}));
    let mut extractor = provider.claim_extractor(&token, "expired", &http).unwrap();

    let err = extractor.get_claim("email").await.unwrap_err();
    assert!(matches!(err, ApiError::ProfileFetch { .. }));
    assert!(err.to_string().contains("401"));
    assert!(err.to_error_response().message.contains("invalid_token"));

    // the failure is remembered; no second request goes out
    let again = extractor.get_claim("groups").await.unwrap_err();
    assert_eq!(again, err);
    assert_eq!(seen.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_session_failure_names_claim() {
    let (url, _seen) = serve("500 Internal Server Error", "boom".to_string()).await;

    let provider = provider(url);
    let http = ReqwestHttpClient::new();
    let token = ClaimsToken::new(json!({"sub": "u1"}));

    let err = SessionAssembler::new(&provider, &http)
        .build_session_from_claims(Some(&token), "at")
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::ProfileFetch { .. }));
    assert!(err.to_string().contains("could not get claim \"email\""));
}

#[tokio::test]
async fn test_unresponsive_profile_times_out() {
    let url = serve_silence().await;
    let http = ReqwestHttpClient::new();
    let token = ClaimsToken::new(json!({"sub": "u1"}));
    let headers = Some(bearer_authorization("at"));

    let mut extractor = ClaimExtractor::new(&token, Some(url), headers, &http)
        .unwrap()
        .with_timeout(Duration::from_millis(200));

    let err = extractor.get_claim("email").await.unwrap_err();
    assert_eq!(err, ApiError::UpstreamTimeout);
    assert_eq!(err.status_code(), 504);
}

#[tokio::test]
async fn test_client_timeout_is_classified() {
    let url = serve_silence().await;
    let http = ReqwestHttpClient::with_timeout(Duration::from_millis(200)).unwrap();
    let token = ClaimsToken::new(json!({}));
    let headers = Some(bearer_authorization("at"));

    let mut extractor = ClaimExtractor::new(&token, Some(url), headers, &http).unwrap();

    let err = extractor.get_claim("email").await.unwrap_err();
    assert_eq!(err, ApiError::UpstreamTimeout);
}

#[tokio::test]
async fn test_token_claims_need_no_server() {
    // unroutable profile URL: any request would fail the test
    let url = Url::parse("http://127.0.0.1:9/userinfo").unwrap();
    let provider = provider(url);
    let http = ReqwestHttpClient::new();
    let token = ClaimsToken::new(json!({
        "sub": "u1",
        "email": "a@example.com",
        "email_verified": true,
        "groups": ["g1", "g2"],
        "preferred_username": "alice"
    }));

    let session = SessionAssembler::new(&provider, &http)
        .build_session_from_claims(Some(&token), "at")
        .await
        .unwrap();
    assert_eq!(session.email, "a@example.com");
    assert_eq!(session.groups, vec!["g1", "g2"]);
}
