//! Blocking execution of `HttpRequest` values over ureq.
//!
//! The agent is built with `http_status_as_error(false)` so every status code
//! comes back as data; validation happens afterwards against the caller's
//! policy. Connection pooling is left to the agent.

use std::fs::File;
use std::io;
use std::time::{Duration, Instant};

use tracing::debug;
use ureq::http::Response;
use ureq::typestate::{WithBody, WithoutBody};
use ureq::{Agent, Body, RequestBuilder};

use crate::config::{ClientConfig, Validation};
use crate::error::ClientError;
use crate::http::{Headers, HttpMethod, HttpRequest, HttpResponse, RequestBody};

pub(crate) struct Transport {
    agent: Agent,
    max_body_size: u64,
}

impl Transport {
    pub(crate) fn new(config: &ClientConfig) -> Self {
        let agent = Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(config.timeout)
            .build()
            .new_agent();
        Self {
            agent,
            max_body_size: config.max_body_size,
        }
    }

    /// Send `request` and return the response with its body still unread.
    pub(crate) fn send(
        &self,
        request: HttpRequest,
        timeout: Option<Duration>,
    ) -> Result<Response<Body>, ClientError> {
        let HttpRequest {
            method,
            url,
            headers,
            body,
        } = request;
        debug!(%method, %url, "sending request");
        let started = Instant::now();

        let result = match method {
            HttpMethod::Get => without_body(configure(self.agent.get(&url), &headers, timeout), body),
            HttpMethod::Delete => without_body(configure(self.agent.delete(&url), &headers, timeout), body),
            HttpMethod::Post => with_body(configure(self.agent.post(&url), &headers, timeout), body),
            HttpMethod::Put => with_body(configure(self.agent.put(&url), &headers, timeout), body),
        };

        match &result {
            Ok(response) => debug!(
                %method,
                %url,
                status = response.status().as_u16(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "response headers received"
            ),
            Err(e) => debug!(%method, %url, error = %e, "request failed"),
        }
        result
    }

    /// Send `request`, buffer the whole body and apply `validation`.
    pub(crate) fn fetch(
        &self,
        request: HttpRequest,
        timeout: Option<Duration>,
        validation: &Validation,
    ) -> Result<HttpResponse, ClientError> {
        let mut response = self.send(request, timeout)?;
        let status = response.status().as_u16();
        let headers = collect_headers(&response);
        let body = self.read_body(&mut response)?;
        let response = HttpResponse {
            status,
            headers,
            body,
        };
        validation.check(&response)?;
        Ok(response)
    }

    /// Read the body into memory, bounded by the configured cap.
    pub(crate) fn read_body(&self, response: &mut Response<Body>) -> Result<Vec<u8>, ClientError> {
        response
            .body_mut()
            .with_config()
            .limit(self.max_body_size)
            .read_to_vec()
            .map_err(classify)
    }
}

pub(crate) fn collect_headers(response: &Response<Body>) -> Headers {
    response
        .headers()
        .iter()
        .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str(), v)))
        .collect()
}

fn configure<B>(
    mut builder: RequestBuilder<B>,
    headers: &Headers,
    timeout: Option<Duration>,
) -> RequestBuilder<B> {
    for (name, value) in headers.iter() {
        builder = builder.header(name, value);
    }
    if let Some(timeout) = timeout {
        builder = builder.config().timeout_global(Some(timeout)).build();
    }
    builder
}

fn without_body(
    builder: RequestBuilder<WithoutBody>,
    body: RequestBody,
) -> Result<Response<Body>, ClientError> {
    match body {
        RequestBody::Empty => builder.call().map_err(classify),
        body => with_body(builder.force_send_body(), body),
    }
}

fn with_body(builder: RequestBuilder<WithBody>, body: RequestBody) -> Result<Response<Body>, ClientError> {
    let sent = match body {
        RequestBody::Empty => builder.send_empty(),
        RequestBody::Bytes(bytes) => builder.send(&bytes[..]),
        RequestBody::File(path) => {
            let file = File::open(&path).map_err(|e| ClientError::fs(&path, e))?;
            builder.send(file)
        }
    };
    sent.map_err(classify)
}

/// Map a ureq failure onto the facade's error kinds.
pub(crate) fn classify(error: ureq::Error) -> ClientError {
    match error {
        ureq::Error::Timeout(_) => ClientError::Timeout,
        ureq::Error::Io(e) if e.kind() == io::ErrorKind::TimedOut => ClientError::Timeout,
        ureq::Error::BodyExceedsLimit(limit) => ClientError::BodyTooLarge { limit },
        other => ClientError::Network(other.to_string()),
    }
}
