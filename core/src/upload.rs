//! Upload payloads and how each is framed as a POST.

use std::path::{Path, PathBuf};

use crate::config::ClientConfig;
use crate::descriptor::RequestDescriptor;
use crate::error::ClientError;
use crate::http::{HttpMethod, HttpRequest, RequestBody};
use crate::multipart::MultipartForm;

#[derive(Debug, Clone)]
pub enum UploadPayload {
    /// Sent as-is.
    Bytes(Vec<u8>),
    Multipart(MultipartForm),
    /// Streamed from disk.
    File(PathBuf),
}

impl UploadPayload {
    /// Frame the payload as a POST to `url`. The file variant is not opened
    /// here; the transport streams it when the request is sent.
    pub fn into_request(self, url: &str, config: &ClientConfig) -> Result<HttpRequest, ClientError> {
        let mut request = RequestDescriptor::new(HttpMethod::Post, url).build(config)?;
        let default_type = match self {
            UploadPayload::Bytes(bytes) => {
                request.body = RequestBody::Bytes(bytes);
                "application/octet-stream"
            }
            UploadPayload::Multipart(form) => {
                // The boundary must match the body, so this always wins.
                request.headers.set("content-type", form.content_type());
                request.body = RequestBody::Bytes(form.encode());
                return Ok(request);
            }
            UploadPayload::File(path) => {
                let guessed = mime_from_extension(&path);
                request.body = RequestBody::File(path);
                guessed
            }
        };
        if !request.headers.contains("content-type") {
            request.headers.set("content-type", default_type);
        }
        Ok(request)
    }
}

impl From<Vec<u8>> for UploadPayload {
    fn from(bytes: Vec<u8>) -> Self {
        UploadPayload::Bytes(bytes)
    }
}

impl From<MultipartForm> for UploadPayload {
    fn from(form: MultipartForm) -> Self {
        UploadPayload::Multipart(form)
    }
}

impl From<PathBuf> for UploadPayload {
    fn from(path: PathBuf) -> Self {
        UploadPayload::File(path)
    }
}

fn mime_from_extension(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "mp4" => "video/mp4",
        "mov" => "video/quicktime",
        "mp3" => "audio/mpeg",
        "pdf" => "application/pdf",
        "json" => "application/json",
        "txt" => "text/plain",
        _ => "application/octet-stream",
    }
}
