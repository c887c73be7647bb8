//! Mock implementations of platform traits for testing

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::{ApiError, Result};
use crate::oidc::{IdToken, IdTokenVerifier, JwtIdToken};
use crate::platform::{Clock, Environment, HttpClient, HttpResponse};

/// A request observed by [`MockHttp`]
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
}

/// Mock HTTP client with pre-configured responses
pub struct MockHttp {
    responses: Vec<(String, HttpResponse)>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MockHttp {
    pub fn new(responses: Vec<(String, HttpResponse)>) -> Self {
        Self {
            responses,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_status(pattern: &str, status: u16, body: Vec<u8>) -> Self {
        Self::new(vec![(pattern.to_string(), HttpResponse { status, body })])
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait(?Send)]
impl HttpClient for MockHttp {
    async fn get(&self, url: &str, headers: &[(&str, &str)]) -> Result<HttpResponse> {
        self.requests.lock().unwrap().push(RecordedRequest {
            url: url.to_string(),
            headers: headers
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        });

        for (pattern, response) in &self.responses {
            if url.contains(pattern) {
                return Ok(HttpResponse {
                    status: response.status,
                    body: response.body.clone(),
                });
            }
        }
        Err(ApiError::internal(format!("no mock response for GET {}", url)))
    }
}

/// HTTP client whose requests never complete
#[derive(Default)]
pub struct PendingHttp {
    calls: Mutex<usize>,
}

impl PendingHttp {
    pub fn call_count(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait(?Send)]
impl HttpClient for PendingHttp {
    async fn get(&self, _url: &str, _headers: &[(&str, &str)]) -> Result<HttpResponse> {
        *self.calls.lock().unwrap() += 1;
        std::future::pending().await
    }
}

/// 200 response for any URL containing "userinfo"
pub fn profile_response(body: Value) -> (String, HttpResponse) {
    (
        "userinfo".to_string(),
        HttpResponse {
            status: 200,
            body: serde_json::to_vec(&body).unwrap(),
        },
    )
}

/// Identity token backed by an in-memory claim object
pub struct StaticIdToken {
    claims: Map<String, Value>,
}

impl StaticIdToken {
    pub fn new(claims: Value) -> Self {
        match claims {
            Value::Object(claims) => Self { claims },
            other => panic!("token claims must be an object, got {}", other),
        }
    }
}

impl IdToken for StaticIdToken {
    fn claims(&self) -> Result<Map<String, Value>> {
        Ok(self.claims.clone())
    }
}

/// Build an unsigned compact JWT carrying `claims`
pub fn unsigned_jwt(claims: &Value) -> String {
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(claims).unwrap());
    format!("{}.{}.", header, payload)
}

/// Verifier that accepts every token without checking signatures
pub struct MockVerifier;

#[async_trait(?Send)]
impl IdTokenVerifier for MockVerifier {
    async fn verify(&self, raw_id_token: &str) -> Result<Box<dyn IdToken>> {
        if raw_id_token == "rejected" {
            return Err(ApiError::invalid_token("signature verification failed"));
        }
        Ok(Box::new(JwtIdToken::from_verified(raw_id_token)))
    }
}

/// Mock clock with a fixed timestamp
pub struct MockClock(pub u64);

impl Clock for MockClock {
    fn now_secs(&self) -> u64 {
        self.0
    }
}

/// Mock environment backed by an in-memory HashMap
pub struct MockEnv {
    vars: HashMap<String, String>,
    secrets: HashMap<String, String>,
}

impl MockEnv {
    pub fn new(vars: HashMap<String, String>, secrets: HashMap<String, String>) -> Self {
        Self { vars, secrets }
    }

    pub fn from_vars(vars: &[(&str, &str)]) -> Self {
        Self::new(
            vars.iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            HashMap::new(),
        )
    }
}

impl Environment for MockEnv {
    fn get_var(&self, name: &str) -> Result<String> {
        self.vars
            .get(name)
            .cloned()
            .ok_or_else(|| ApiError::internal(format!("variable '{}' not found", name)))
    }

    fn get_secret(&self, name: &str) -> Result<String> {
        self.secrets
            .get(name)
            .cloned()
            .ok_or_else(|| ApiError::internal(format!("secret '{}' not found", name)))
    }
}
