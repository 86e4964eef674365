//! Test doubles and helpers for driving the HTTP API in-process.

#![allow(dead_code)]

use argon2::password_hash::{PasswordHasher, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use dyncrab::api::AppState;
use dyncrab::auth::UserConfig;
use dyncrab::provider::{AddressRecord, DynProvider, Provider, Zone};
use dyncrab::{Authenticator, CredentialStore, Error};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::ServiceExt;

pub const TTL: Duration = Duration::from_secs(300);

/// Hash `password` the way an operator would, with cheap parameters to keep tests fast.
pub fn hash(password: &str) -> String {
    let argon2 = Argon2::new(
        Algorithm::Argon2id,
        Version::V0x13,
        Params::new(4096, 3, 1, None).unwrap(),
    );
    let salt = SaltString::encode_b64(b"integration-salt").unwrap();
    argon2
        .hash_password(password.as_bytes(), &salt)
        .unwrap()
        .to_string()
}

/// `alice:secret` may update three hostnames, one of them written un-normalized.
pub fn store() -> CredentialStore {
    CredentialStore::from_users([UserConfig {
        username: "alice".to_string(),
        password_hash: hash("secret"),
        hostnames: vec![
            "home.example.com".to_string(),
            "HOST.sub.example.com.".to_string(),
            "orphan.example.net".to_string(),
        ],
    }])
}

/// What the provider did when `set_records` was called.
#[derive(Debug, Clone)]
pub struct SetCall {
    pub zone: String,
    pub records: Vec<AddressRecord>,
}

/// A provider that records its calls and can be told to fail or hang.
#[derive(Default)]
pub struct RecordingProvider {
    zones: Vec<Zone>,
    fail_list: bool,
    fail_set: bool,
    hang_list: bool,
    hang_set: bool,
    list_calls: AtomicUsize,
    set_calls: Mutex<Vec<SetCall>>,
}

impl RecordingProvider {
    pub fn new(zones: &[&str]) -> Self {
        Self {
            zones: zones.iter().map(|z| Zone::new(*z)).collect(),
            ..Self::default()
        }
    }

    pub fn failing_list(mut self) -> Self {
        self.fail_list = true;
        self
    }

    pub fn failing_set(mut self) -> Self {
        self.fail_set = true;
        self
    }

    /// `list_zones` never completes.
    pub fn hanging_list(mut self) -> Self {
        self.hang_list = true;
        self
    }

    /// `set_records` never completes.
    pub fn hanging_set(mut self) -> Self {
        self.hang_set = true;
        self
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn set_calls(&self) -> Vec<SetCall> {
        self.set_calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Provider for RecordingProvider {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn list_zones(&self) -> Result<Vec<Zone>, Error> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.hang_list {
            std::future::pending::<()>().await;
        }
        if self.fail_list {
            return Err(Error::provider("recording", "zone listing refused"));
        }
        Ok(self.zones.clone())
    }

    async fn set_records(&self, zone: &str, records: &[AddressRecord]) -> Result<(), Error> {
        self.set_calls.lock().unwrap().push(SetCall {
            zone: zone.to_string(),
            records: records.to_vec(),
        });
        if self.hang_set {
            std::future::pending::<()>().await;
        }
        if self.fail_set {
            return Err(Error::provider("recording", "record update refused"));
        }
        Ok(())
    }
}

/// The API wired to `provider` and the fixture users.
pub struct TestApp {
    pub provider: Arc<RecordingProvider>,
    state: AppState,
}

impl TestApp {
    pub fn new(provider: RecordingProvider) -> Self {
        let provider = Arc::new(provider);
        let dyn_provider: DynProvider = provider.clone();
        let state = AppState::new(Authenticator::new(store()), dyn_provider, TTL);
        Self { provider, state }
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        dyncrab::api::router(self.state.clone())
            .oneshot(request)
            .await
            .unwrap()
    }

    /// GET `uri`, optionally with Basic-Auth, and return status and body text.
    pub async fn call(&self, uri: &str, credentials: Option<(&str, &str)>) -> (StatusCode, String) {
        let mut request = Request::builder().uri(uri);
        if let Some((username, password)) = credentials {
            request = request.header(header::AUTHORIZATION, basic(username, password));
        }
        let response = self.send(request.body(Body::empty()).unwrap()).await;
        (response.status(), body_text(response).await)
    }
}

pub fn basic(username: &str, password: &str) -> String {
    format!("Basic {}", BASE64.encode(format!("{username}:{password}")))
}

pub async fn body_text(response: Response) -> String {
    let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
