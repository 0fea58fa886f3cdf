//! Request descriptors: the caller-facing description of one HTTP exchange.
//!
//! # Design
//! A descriptor is inert data. `build` folds in the client's session headers,
//! serializes query parameters into the URL and encodes the body, producing an
//! `HttpRequest` without any I/O. Query parameters live in a `BTreeMap`, so
//! they are emitted sorted by key regardless of insertion order.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Serialize;
use ureq::http::{HeaderName, HeaderValue};
use url::Url;

use crate::config::{ClientConfig, Validation};
use crate::error::ClientError;
use crate::http::{Headers, HttpMethod, HttpRequest, RequestBody};

/// Request body before encoding.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Bytes(Vec<u8>),
    Json(serde_json::Value),
}

#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    pub method: HttpMethod,
    pub url: String,
    pub query: BTreeMap<String, String>,
    pub headers: Headers,
    pub body: Option<Body>,
    /// Overrides the client timeout for this request.
    pub timeout: Option<Duration>,
    /// Overrides the client validation policy for this request.
    pub validation: Option<Validation>,
}

impl RequestDescriptor {
    pub fn new(method: HttpMethod, url: &str) -> Self {
        Self {
            method,
            url: url.to_string(),
            query: BTreeMap::new(),
            headers: Headers::new(),
            body: None,
            timeout: None,
            validation: None,
        }
    }

    pub fn get(url: &str) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    pub fn post(url: &str) -> Self {
        Self::new(HttpMethod::Post, url)
    }

    pub fn put(url: &str) -> Self {
        Self::new(HttpMethod::Put, url)
    }

    pub fn delete(url: &str) -> Self {
        Self::new(HttpMethod::Delete, url)
    }

    pub fn query(mut self, name: &str, value: &str) -> Self {
        self.query.insert(name.to_string(), value.to_string());
        self
    }

    pub fn queries<'a>(mut self, pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        for (name, value) in pairs {
            self.query.insert(name.to_string(), value.to_string());
        }
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.set(name, value);
        self
    }

    pub fn headers(mut self, headers: Headers) -> Self {
        self.headers.extend(&headers);
        self
    }

    pub fn bytes(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(Body::Bytes(body.into()));
        self
    }

    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, ClientError> {
        let value =
            serde_json::to_value(body).map_err(|e| ClientError::InvalidRequest(e.to_string()))?;
        self.body = Some(Body::Json(value));
        Ok(self)
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn validate(mut self, validation: Validation) -> Self {
        self.validation = Some(validation);
        self
    }

    /// Resolve the final URL, headers and body against the client config.
    pub fn build(&self, config: &ClientConfig) -> Result<HttpRequest, ClientError> {
        let mut url = parse_absolute(&self.url)?;
        if !self.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&self.query);
        }

        let mut headers = config.default_headers.clone();
        if let Some(user_agent) = &config.user_agent {
            headers.set("user-agent", user_agent.as_str());
        }
        headers.extend(&self.headers);
        check_headers(&headers)?;

        let body = match &self.body {
            None => RequestBody::Empty,
            Some(Body::Bytes(bytes)) => RequestBody::Bytes(bytes.clone()),
            Some(Body::Json(value)) => {
                if !headers.contains("content-type") {
                    headers.set("content-type", "application/json");
                }
                let encoded = serde_json::to_vec(value)
                    .map_err(|e| ClientError::InvalidRequest(e.to_string()))?;
                RequestBody::Bytes(encoded)
            }
        };

        Ok(HttpRequest {
            method: self.method,
            url: url.to_string(),
            headers,
            body,
        })
    }
}

/// Parse `raw` and require an http(s) scheme and a host.
pub(crate) fn parse_absolute(raw: &str) -> Result<Url, ClientError> {
    let url = Url::parse(raw).map_err(|e| ClientError::InvalidRequest(format!("{raw}: {e}")))?;
    if url.cannot_be_a_base() || url.host().is_none() {
        return Err(ClientError::InvalidRequest(format!("{raw}: not an absolute URL")));
    }
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ClientError::InvalidRequest(format!(
            "{raw}: unsupported scheme {}",
            url.scheme()
        )));
    }
    Ok(url)
}

fn check_headers(headers: &Headers) -> Result<(), ClientError> {
    for (name, value) in headers.iter() {
        HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| ClientError::InvalidRequest(format!("header {name:?}: {e}")))?;
        HeaderValue::from_str(value)
            .map_err(|e| ClientError::InvalidRequest(format!("header {name:?} value: {e}")))?;
    }
    Ok(())
}
