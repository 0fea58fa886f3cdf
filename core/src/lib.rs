//! Asynchronous HTTP client facade plus the sample calls built on it.
//!
//! # Overview
//! `Client` issues GET/POST/PUT/DELETE requests described by a
//! `RequestDescriptor`, decodes JSON responses into caller-supplied types,
//! uploads raw bytes, multipart forms and local files, and downloads
//! resources into memory or onto disk under an explicit `Destination` policy.
//!
//! # Design
//! - Building is separate from sending: descriptors and upload payloads turn
//!   into plain `HttpRequest` values without I/O, so encoding rules are unit
//!   tested directly.
//! - The transport is ureq, run on tokio's blocking pool; each call resolves
//!   its future exactly once.
//! - Status validation is opt-in (`Validation`), per client or per request.
//! - Every failure is a `ClientError`; nothing is retried or swallowed.

pub mod client;
pub mod config;
pub mod descriptor;
pub mod download;
pub mod error;
pub mod http;
pub mod multipart;
pub mod practice;
mod transport;
pub mod types;
pub mod upload;

pub use client::Client;
pub use config::{ClientConfig, Validation};
pub use descriptor::{Body, RequestDescriptor};
pub use download::{Destination, Download, DownloadOutput};
pub use error::{ClientError, ErrorKind};
pub use http::{Headers, HttpMethod, HttpRequest, HttpResponse, RequestBody};
pub use multipart::{MultipartForm, Part};
pub use practice::Practice;
pub use types::{HttpBinEcho, HttpBinResponse, UserContent};
pub use upload::UploadPayload;
