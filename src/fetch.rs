//! Blocking HTTP(S) fetch for URL-sourced message bodies.

use crate::errors::FetchError;
use reqwest::blocking::Client;
use reqwest::Method;
use std::time::Duration;

/// Request options for fetching a body from a URL.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FetchOptions {
    #[serde(default = "default_method")]
    pub method: String,
    #[serde(default)]
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
    pub timeout_ms: Option<u64>,
    pub proxy: Option<String>,
    #[serde(default = "default_verify_peer")]
    pub verify_peer: bool,
    pub user_agent: Option<String>,
}

fn default_method() -> String {
    "GET".to_string()
}
fn default_verify_peer() -> bool {
    true
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            method: default_method(),
            headers: vec![],
            body: None,
            timeout_ms: None,
            proxy: None,
            verify_peer: true,
            user_agent: None,
        }
    }
}

impl FetchOptions {
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    fn client(&self, url: &str) -> Result<Client, FetchError> {
        let mut builder = Client::builder();
        if let Some(ms) = self.timeout_ms {
            builder = builder.timeout(Duration::from_millis(ms));
        }
        if let Some(ref proxy) = self.proxy {
            let proxy = reqwest::Proxy::all(proxy).map_err(|e| FetchError::new(url, e.to_string()))?;
            builder = builder.proxy(proxy);
        }
        if !self.verify_peer {
            builder = builder.danger_accept_invalid_certs(true);
        }
        if let Some(ref agent) = self.user_agent {
            builder = builder.user_agent(agent.clone());
        }
        builder.build().map_err(|e| FetchError::new(url, e.to_string()))
    }
}

/// Whether `content` should be fetched rather than read from disk.
pub fn is_url(content: &str) -> bool {
    let lower = content.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Fetch `url` and return the response body as text. Non-2xx statuses are errors.
pub fn fetch_url(url: &str, options: &FetchOptions) -> Result<String, FetchError> {
    let method = Method::from_bytes(options.method.to_ascii_uppercase().as_bytes())
        .map_err(|_| FetchError::new(url, format!("invalid method {}", options.method)))?;

    let mut request = options.client(url)?.request(method, url.trim());
    for (name, value) in &options.headers {
        request = request.header(name.as_str(), value.as_str());
    }
    if let Some(ref body) = options.body {
        request = request.body(body.clone());
    }

    let response = request
        .send()
        .and_then(|r| r.error_for_status())
        .map_err(|e| FetchError::new(url, e.to_string()))?;
    response.text().map_err(|e| FetchError::new(url, e.to_string()))
}
