//! Asynchronous HTTP client facade.
//!
//! # Design
//! `Client` holds only immutable configuration and a pooled transport agent
//! behind an `Arc`, so clones are cheap and share connections. Each operation
//! first builds a plain `HttpRequest` (no I/O), then runs the blocking
//! exchange on tokio's blocking pool and awaits its `JoinHandle`. That handle
//! is the single completion channel for the call: it resolves exactly once,
//! and dropping the future detaches the worker so nothing is delivered after
//! cancellation.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::config::{ClientConfig, Validation};
use crate::descriptor::RequestDescriptor;
use crate::download::{Destination, Download, DownloadOutput};
use crate::error::ClientError;
use crate::http::{Headers, HttpResponse};
use crate::transport::{self, Transport};
use crate::upload::UploadPayload;

#[derive(Clone)]
pub struct Client {
    inner: Arc<Inner>,
}

struct Inner {
    config: ClientConfig,
    transport: Transport,
}

impl Default for Client {
    fn default() -> Self {
        Self::new(ClientConfig::default())
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client").field("config", &self.inner.config).finish()
    }
}

impl Client {
    pub fn new(config: ClientConfig) -> Self {
        let transport = Transport::new(&config);
        Self {
            inner: Arc::new(Inner { config, transport }),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Send `descriptor` and buffer the response. Non-2xx responses are only
    /// failures when validation is enabled on the descriptor or the client.
    pub async fn request(&self, descriptor: RequestDescriptor) -> Result<HttpResponse, ClientError> {
        let request = descriptor.build(self.config())?;
        let timeout = descriptor.timeout;
        let validation = self.validation_for(&descriptor);
        self.run(move |transport| transport.fetch(request, timeout, &validation))
            .await
    }

    /// Like `request`, then decode the body as JSON `T`.
    pub async fn request_decoded<T: DeserializeOwned>(
        &self,
        descriptor: RequestDescriptor,
    ) -> Result<T, ClientError> {
        self.request(descriptor).await?.json()
    }

    pub async fn get(&self, url: &str) -> Result<HttpResponse, ClientError> {
        self.request(RequestDescriptor::get(url)).await
    }

    pub async fn post_json<B: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<HttpResponse, ClientError> {
        self.request(RequestDescriptor::post(url).json(body)?).await
    }

    /// POST `payload` to `url` and buffer the server's answer.
    pub async fn upload(
        &self,
        payload: impl Into<UploadPayload>,
        url: &str,
    ) -> Result<HttpResponse, ClientError> {
        let request = payload.into().into_request(url, self.config())?;
        let validation = self.config().validation.clone();
        self.run(move |transport| transport.fetch(request, None, &validation))
            .await
    }

    /// GET `url` into memory, or into `destination` when one is given.
    pub async fn download(
        &self,
        url: &str,
        destination: Option<Destination>,
    ) -> Result<Download, ClientError> {
        self.download_with(RequestDescriptor::get(url), destination)
            .await
    }

    /// `download` with full control over headers, query and timeout.
    pub async fn download_with(
        &self,
        descriptor: RequestDescriptor,
        destination: Option<Destination>,
    ) -> Result<Download, ClientError> {
        let request = descriptor.build(self.config())?;
        let timeout = descriptor.timeout;
        let validation = self.validation_for(&descriptor);
        self.run(move |transport| {
            if let Some(destination) = &destination {
                destination.prepare()?;
            }

            let mut response = transport.send(request, timeout)?;
            let status = response.status().as_u16();
            let headers = transport::collect_headers(&response);
            if !validation.accepts(status) {
                let body = match transport.read_body(&mut response) {
                    Ok(body) => body,
                    Err(e) => {
                        debug!(status, error = %e, "could not read body of rejected download");
                        Vec::new()
                    }
                };
                return Err(ClientError::Status { status, body });
            }

            let output = match destination {
                None => DownloadOutput::Memory(transport.read_body(&mut response)?),
                Some(destination) => {
                    let expected = expected_length(&headers);
                    let mut reader = response.body_mut().as_reader();
                    let bytes_written = destination.write_from(&mut reader, expected)?;
                    DownloadOutput::File {
                        path: destination.path,
                        bytes_written,
                    }
                }
            };
            Ok(Download {
                status,
                headers,
                output,
            })
        })
        .await
    }

    fn validation_for(&self, descriptor: &RequestDescriptor) -> Validation {
        descriptor
            .validation
            .clone()
            .unwrap_or_else(|| self.config().validation.clone())
    }

    async fn run<T, F>(&self, work: F) -> Result<T, ClientError>
    where
        T: Send + 'static,
        F: FnOnce(&Transport) -> Result<T, ClientError> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || work(&inner.transport))
            .await
            .map_err(|e| ClientError::Aborted(e.to_string()))?
    }
}

/// Declared body length, when it describes the bytes we will actually read.
/// A content-encoded body is decoded by the transport, so its header length
/// does not match what lands on disk.
fn expected_length(headers: &Headers) -> Option<u64> {
    let encoded = headers
        .get("content-encoding")
        .is_some_and(|e| !e.eq_ignore_ascii_case("identity"));
    if encoded {
        return None;
    }
    headers.get("content-length").and_then(|v| v.trim().parse().ok())
}
