#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use actix_web::cookie::Cookie;
use actix_web::dev::ServiceResponse;
use actix_web::http::header;
use async_trait::async_trait;
use url::{Position, Url};

use callback_auth::adapter::MemoryAdapter;
use callback_auth::mail::{Mailer, OutgoingEmail};
use callback_auth::providers::Providers;
use callback_auth::{AppState, AuthConfig, AuthResult};

pub const BASE_URL: &str = "http://localhost:3000";

#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<OutgoingEmail>>,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: OutgoingEmail) -> AuthResult<()> {
        self.sent.lock().unwrap().push(email);
        Ok(())
    }
}

impl RecordingMailer {
    pub fn last(&self) -> Option<OutgoingEmail> {
        self.sent.lock().unwrap().last().cloned()
    }

    pub fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

pub struct TestContext {
    pub state: AppState,
    pub adapter: Arc<MemoryAdapter>,
    pub mailer: Arc<RecordingMailer>,
}

pub fn test_config(extra: &[(&str, &str)]) -> AuthConfig {
    let mut vars: HashMap<String, String> = HashMap::from([
        ("NEXTAUTH_SECRET".to_string(), "test-secret".to_string()),
        ("NEXTAUTH_URL".to_string(), BASE_URL.to_string()),
        ("SMTP_HOST".to_string(), "smtp.test.local".to_string()),
        ("EMAIL_FROM".to_string(), "Callback <no-reply@callback.ph>".to_string()),
    ]);
    for (k, v) in extra {
        vars.insert(k.to_string(), v.to_string());
    }
    AuthConfig::from_lookup(|key| vars.get(key).cloned()).expect("test config")
}

pub fn test_context(config: AuthConfig, providers: Providers) -> TestContext {
    let adapter = Arc::new(MemoryAdapter::new());
    let mailer = Arc::new(RecordingMailer::default());
    let state = AppState::new(
        config,
        providers,
        adapter.clone(),
        Some(mailer.clone()),
        reqwest::Client::new(),
    );
    TestContext { state, adapter, mailer }
}

/// Cookies kept between requests, like a browser would.
#[derive(Default)]
pub struct CookieJar {
    cookies: HashMap<String, Cookie<'static>>,
}

impl CookieJar {
    pub fn store<B>(&mut self, resp: &ServiceResponse<B>) {
        for cookie in resp.response().cookies() {
            let cookie = cookie.into_owned();
            if cookie.value().is_empty() {
                self.cookies.remove(cookie.name());
            } else {
                self.cookies.insert(cookie.name().to_string(), cookie);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Cookie<'static>> {
        self.cookies.get(name)
    }

    pub fn all(&self) -> Vec<Cookie<'static>> {
        self.cookies.values().cloned().collect()
    }
}

pub fn location<B>(resp: &ServiceResponse<B>) -> Url {
    let raw = resp
        .headers()
        .get(header::LOCATION)
        .expect("location header")
        .to_str()
        .expect("ascii location");
    Url::parse(raw).expect("absolute location")
}

pub fn query_param(url: &Url, key: &str) -> Option<String> {
    url.query_pairs()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}

/// Path and query of an absolute url, for use as a test request uri.
pub fn request_uri(url: &Url) -> String {
    url[Position::BeforePath..].to_string()
}

/// The magic link is the only line of the plaintext body that is a url.
pub fn magic_link(email: &OutgoingEmail) -> Url {
    let line = email
        .text
        .lines()
        .map(str::trim)
        .find(|line| line.starts_with("http"))
        .expect("link in email body");
    Url::parse(line).expect("valid link")
}
