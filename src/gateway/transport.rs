//! Blocking HTTP transport.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::GatewaySettings;
use crate::core::GatewayError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Method {
    Get,
    Post,
}

/// One outbound gateway call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayRequest {
    pub method: Method,
    pub url: String,
    /// Header name/value pairs in send order.
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl GatewayRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn post(url: impl Into<String>, body: Option<String>) -> Self {
        Self {
            method: Method::Post,
            url: url.into(),
            headers: Vec::new(),
            body,
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn headers(mut self, headers: Vec<(String, String)>) -> Self {
        self.headers.extend(headers);
        self
    }

    /// Value of the first header called `name`.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Sends a request and returns the parsed JSON body.
///
/// In-band gateway rejections (`success: false`) are ordinary responses.
/// Only failures to obtain a JSON body are errors.
pub trait Transport: Send + Sync {
    /// # Errors
    ///
    /// `GatewayError::Transport` on connection failure, timeout, non-2xx
    /// status, or a body that is not JSON.
    fn send(&self, request: &GatewayRequest) -> Result<Value, GatewayError>;
}

/// [`Transport`] over a blocking `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self, GatewayError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        Ok(Self { client })
    }

    /// Client with the timeout configured in `settings`.
    pub fn from_settings(settings: &GatewaySettings) -> Result<Self, GatewayError> {
        Self::new(Duration::from_secs(settings.timeout_secs))
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: &GatewayRequest) -> Result<Value, GatewayError> {
        let mut builder = match request.method {
            Method::Get => self.client.get(&request.url),
            Method::Post => self.client.post(&request.url),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let resp = builder
            .send()
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(GatewayError::Transport(format!("HTTP {status}: {body}")));
        }

        serde_json::from_str(&body)
            .map_err(|e| GatewayError::Transport(format!("response is not JSON: {e}")))
    }
}
