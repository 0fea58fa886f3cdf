//! The sample calls a host UI wires to buttons.
//!
//! Each call issues one facade operation against the echo service or the
//! mock user API, logs the outcome and hands the typed result back. Base URLs
//! are injectable so the same calls run against the local mock server.

use std::path::{Path, PathBuf};

use tracing::{error, info};

use crate::client::Client;
use crate::descriptor::RequestDescriptor;
use crate::download::{Destination, Download};
use crate::error::ClientError;
use crate::http::{Headers, HttpResponse};
use crate::multipart::MultipartForm;
use crate::types::{HttpBinEcho, HttpBinResponse, UserContent};

pub const HTTPBIN_BASE: &str = "https://httpbin.org";
pub const MOCK_API_BASE: &str = "https://678fef6349875e5a1a93e1a3.mockapi.io";

const USERS_PATH: &str = "/test-api/v1/basic";

#[derive(Debug, Clone)]
pub struct Practice {
    client: Client,
    httpbin_base: String,
    mock_api_base: String,
}

impl Default for Practice {
    fn default() -> Self {
        Self::new(Client::default(), HTTPBIN_BASE, MOCK_API_BASE)
    }
}

impl Practice {
    pub fn new(client: Client, httpbin_base: &str, mock_api_base: &str) -> Self {
        Self {
            client,
            httpbin_base: httpbin_base.trim_end_matches('/').to_string(),
            mock_api_base: mock_api_base.trim_end_matches('/').to_string(),
        }
    }

    fn httpbin(&self, path: &str) -> String {
        format!("{}{path}", self.httpbin_base)
    }

    fn users_url(&self) -> String {
        format!("{}{USERS_PATH}", self.mock_api_base)
    }

    /// GET `/get`, decoded down to the echoed URL.
    pub async fn simple_get(&self) -> Result<HttpBinResponse, ClientError> {
        let result = self
            .client
            .request_decoded::<HttpBinResponse>(RequestDescriptor::get(&self.httpbin("/get")))
            .await;
        report("simple_get", &result);
        result
    }

    /// GET `/get` with `category=Movies&genre=Action`.
    pub async fn parameter_get(&self) -> Result<HttpBinEcho, ClientError> {
        let descriptor = RequestDescriptor::get(&self.httpbin("/get"))
            .queries([("category", "Movies"), ("genre", "Action")]);
        let result = self.client.request_decoded(descriptor).await;
        report("parameter_get", &result);
        result
    }

    /// GET `/headers` with basic credentials and a JSON accept header.
    pub async fn header_get(&self) -> Result<HttpBinEcho, ClientError> {
        let headers = Headers::new()
            .authorization_basic("test@email.com", "testpassword")
            .accept("application/json");
        let descriptor = RequestDescriptor::get(&self.httpbin("/headers"))
            .queries([("category", "Movies"), ("genre", "Action")])
            .headers(headers);
        let result = self.client.request_decoded(descriptor).await;
        report("header_get", &result);
        result
    }

    /// Download the sample PNG into memory.
    pub async fn download_image(&self) -> Result<Download, ClientError> {
        let result = self.client.download(&self.httpbin("/image/png"), None).await;
        report_download("download_image", &result);
        result
    }

    /// Download the sample PNG to `dir/image.png`, replacing any previous
    /// copy and creating `dir` if needed.
    pub async fn download_image_to(&self, dir: &Path) -> Result<Download, ClientError> {
        let destination = Destination::new(dir.join("image.png"))
            .overwrite_existing(true)
            .create_intermediate_directories(true);
        let result = self
            .client
            .download(&self.httpbin("/image/png"), Some(destination))
            .await;
        report_download("download_image_to", &result);
        result
    }

    /// POST the raw bytes `data`.
    pub async fn upload_data(&self) -> Result<HttpResponse, ClientError> {
        let result = self
            .client
            .upload(b"data".to_vec(), &self.httpbin("/post"))
            .await;
        report("upload_data", &result);
        result
    }

    /// POST a two-part form: `one` and `two`.
    pub async fn multipart_upload(&self) -> Result<HttpResponse, ClientError> {
        let form = MultipartForm::new().append("one", "one").append("two", "two");
        let result = self.client.upload(form, &self.httpbin("/post")).await;
        report("multipart_upload", &result);
        result
    }

    /// Stream a local file as the POST body.
    pub async fn file_upload(&self, path: &Path) -> Result<HttpResponse, ClientError> {
        let result = self
            .client
            .upload(PathBuf::from(path), &self.httpbin("/post"))
            .await;
        report("file_upload", &result);
        result
    }

    pub async fn fetch_users(&self) -> Result<Vec<UserContent>, ClientError> {
        let result = self
            .client
            .request_decoded::<Vec<UserContent>>(RequestDescriptor::get(&self.users_url()))
            .await;
        report_count("fetch_users", &result);
        result
    }

    /// POST `user`, then fetch the list again so the caller sees the new
    /// state.
    pub async fn post_user(&self, user: &UserContent) -> Result<Vec<UserContent>, ClientError> {
        let response = match self.client.post_json(&self.users_url(), user).await {
            Ok(response) => response,
            Err(e) => {
                error!(call = "post_user", error = %e, "practice call failed");
                return Err(e);
            }
        };
        match response.text() {
            Ok(text) => info!(
                call = "post_user",
                status = response.status,
                response = text,
                "practice call succeeded"
            ),
            Err(_) => info!(
                call = "post_user",
                status = response.status,
                "practice call succeeded with a non-UTF-8 body"
            ),
        }
        self.fetch_users().await
    }
}

fn report<T: std::fmt::Debug>(call: &str, result: &Result<T, ClientError>) {
    match result {
        Ok(value) => info!(call, ?value, "practice call succeeded"),
        Err(e) => error!(call, error = %e, "practice call failed"),
    }
}

fn report_count<T>(call: &str, result: &Result<Vec<T>, ClientError>) {
    match result {
        Ok(items) => info!(call, count = items.len(), "practice call succeeded"),
        Err(e) => error!(call, error = %e, "practice call failed"),
    }
}

fn report_download(call: &str, result: &Result<Download, ClientError>) {
    match result {
        Ok(download) => info!(
            call,
            status = download.status,
            file = ?download.file_path(),
            bytes = download.bytes().map(<[u8]>::len),
            "practice download succeeded"
        ),
        Err(e) => error!(call, error = %e, "practice download failed"),
    }
}
