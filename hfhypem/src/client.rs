//! HTTP transport for hypem.com
//!
//! hypem.com only hands out working signing keys to a logged-in session,
//! so every request carries the configured session cookie and a browser
//! User-Agent.
//!
//! # Example
//!
//! ```no_run
//! use hfhypem::{HypemClient, SessionCookie, Transport};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = HypemClient::builder()
//!         .session(SessionCookie::new("AUTH", "03%3A...", "hypem.com"))
//!         .build()?;
//!
//!     let page = client.get_text("http://hypem.com/latest/fresh").await?;
//!     println!("{} bytes", page.len());
//!     Ok(())
//! }
//! ```

use crate::config_ext::HypemSettings;
use crate::error::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::cookie::Jar;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Default timeout for HTTP requests (30 seconds)
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Browser identity sent on every request
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Fedora; Linux x86_64; rv:51.0) Gecko/20100101 Firefox/51.0";

/// Something that can GET a URL and hand back the body
///
/// The pipeline only depends on this trait; [`HypemClient`] is the
/// production implementation.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issues one GET and returns the full response body
    ///
    /// The status code is not inspected: error pages are returned like
    /// any other body and fail later, at decoding.
    async fn get_text(&self, url: &str) -> Result<String>;
}

/// Session cookie attached to hypem.com requests
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionCookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    #[serde(default = "default_cookie_path")]
    pub path: String,
    #[serde(default)]
    pub expires: Option<DateTime<Utc>>,
}

fn default_cookie_path() -> String {
    "/".to_string()
}

impl SessionCookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: domain.into(),
            path: default_cookie_path(),
            expires: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_expires(mut self, expires: DateTime<Utc>) -> Self {
        self.expires = Some(expires);
        self
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires.is_some_and(|expires| expires <= now)
    }

    fn host(&self) -> &str {
        self.domain.trim_start_matches('.')
    }

    /// The cookie as a `Set-Cookie` header value
    ///
    /// An IP address domain yields a host-only cookie, since `Domain`
    /// cannot name an address.
    pub fn set_cookie_string(&self) -> String {
        let mut cookie = format!("{}={}; Path={}", self.name, self.value, self.path);
        if self.host().parse::<IpAddr>().is_err() {
            cookie.push_str(&format!("; Domain={}", self.host()));
        }
        if let Some(expires) = self.expires {
            cookie.push_str(&format!(
                "; Expires={}",
                expires.format("%a, %d %b %Y %H:%M:%S GMT")
            ));
        }
        cookie
    }

    /// Cookie jar holding only this cookie
    ///
    /// Domain, path and expiry matching are left to the jar. An expired
    /// cookie is not stored at all.
    pub fn jar(&self) -> Result<Jar> {
        let origin = Url::parse(&format!("http://{}/", self.host()))?;
        let jar = Jar::default();
        jar.add_cookie_str(&self.set_cookie_string(), &origin);
        Ok(jar)
    }
}

/// hypem.com HTTP client
///
/// Cheap to clone. The pipeline builds one per inbound request so that no
/// session state is shared between concurrent feeds.
#[derive(Debug, Clone)]
pub struct HypemClient {
    client: Client,
    session: Option<SessionCookie>,
    timeout: Duration,
}

impl HypemClient {
    /// Create a builder for configuring the client
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    /// Build a client from the hypem settings
    pub fn from_settings(settings: &HypemSettings) -> Result<Self> {
        let mut builder = Self::builder()
            .user_agent(&settings.user_agent)
            .timeout(settings.timeout);
        if let Some(session) = &settings.session {
            builder = builder.session(session.clone());
        }
        builder.build()
    }

    pub fn session(&self) -> Option<&SessionCookie> {
        self.session.as_ref()
    }

    /// Get the internal HTTP client
    pub fn http_client(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl Transport for HypemClient {
    async fn get_text(&self, url: &str) -> Result<String> {
        let parsed = Url::parse(url)?;
        let response = self
            .client
            .get(parsed)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| Error::fetch(url, e))?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!(%status, url, "non-success status, passing body through");
        }

        response.text().await.map_err(|e| Error::fetch(url, e))
    }
}

/// Builder for configuring a HypemClient
#[derive(Debug)]
pub struct ClientBuilder {
    client: Option<Client>,
    timeout: Duration,
    user_agent: String,
    session: Option<SessionCookie>,
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self {
            client: None,
            timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            session: None,
        }
    }
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a custom HTTP client (User-Agent and cookies are then the client's own)
    pub fn client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    /// Set the per-request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn session(mut self, session: SessionCookie) -> Self {
        self.session = Some(session);
        self
    }

    /// Build the client
    pub fn build(self) -> Result<HypemClient> {
        match &self.session {
            Some(session) if session.is_expired_at(Utc::now()) => {
                tracing::warn!(
                    cookie = %session.name,
                    "Session cookie has expired, hypem.com will hand out unusable keys"
                );
            }
            None => {
                tracing::warn!("No session cookie configured, hypem.com will hand out unusable keys");
            }
            _ => {}
        }

        let client = match self.client {
            Some(client) => client,
            None => {
                let mut builder = Client::builder()
                    .user_agent(&self.user_agent)
                    .timeout(self.timeout);
                if let Some(session) = &self.session {
                    builder = builder.cookie_provider(Arc::new(session.jar()?));
                }
                builder
                    .build()
                    .map_err(|e| Error::Config(anyhow::anyhow!("cannot build HTTP client: {}", e)))?
            }
        };

        Ok(HypemClient {
            client,
            session: self.session,
            timeout: self.timeout,
        })
    }
}
