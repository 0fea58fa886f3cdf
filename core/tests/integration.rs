//! Facade operations exercised over real HTTP against the mock server.
//!
//! # Design
//! Each test starts its own mock server on a random port (so user-store state
//! never leaks between tests) and drives the async `Client` and the practice
//! calls through it end to end.

use std::time::Duration;

use http_facade::{
    Client, ClientConfig, ClientError, Destination, DownloadOutput, ErrorKind, HttpBinEcho,
    HttpBinResponse, MultipartForm, Practice, RequestDescriptor, UserContent, Validation,
};
use mock_server::SAMPLE_PNG;

/// Start the mock server on a random port and return its base URL.
fn start_server() -> String {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    format!("http://{addr}")
}

fn practice(base: &str) -> Practice {
    Practice::new(Client::default(), base, base)
}

/// A localhost URL nothing is listening on.
fn unreachable_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/get")
}

/// A server that answers with a 100-byte `Content-Length`, sends 10 bytes of
/// it and then goes quiet.
fn start_stalling_server() -> String {
    use std::io::{Read, Write};

    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    std::thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { continue };
            std::thread::spawn(move || {
                let mut buf = [0u8; 4096];
                let _ = stream.read(&mut buf);
                let _ = stream.write_all(
                    b"HTTP/1.1 200 OK\r\ncontent-type: image/png\r\ncontent-length: 100\r\n\r\n0123456789",
                );
                let _ = stream.flush();
                std::thread::sleep(Duration::from_secs(5));
            });
        }
    });
    format!("http://{addr}/image/png")
}

// ---------------------------------------------------------------------------
// request / request_decoded
// ---------------------------------------------------------------------------

#[tokio::test]
async fn simple_get_echoes_own_url() {
    let base = start_server();
    let echo = practice(&base).simple_get().await.unwrap();
    assert_eq!(echo, HttpBinResponse { url: format!("{base}/get") });
}

#[tokio::test]
async fn parameters_round_trip_through_echo() {
    let base = start_server();
    let echo = practice(&base).parameter_get().await.unwrap();
    assert_eq!(echo.args["category"], "Movies");
    assert_eq!(echo.args["genre"], "Action");
    assert_eq!(echo.url, format!("{base}/get?category=Movies&genre=Action"));
}

#[tokio::test]
async fn headers_reach_the_server() {
    let base = start_server();
    let echo = practice(&base).header_get().await.unwrap();
    assert_eq!(
        echo.header("authorization"),
        Some("Basic dGVzdEBlbWFpbC5jb206dGVzdHBhc3N3b3Jk")
    );
    assert_eq!(echo.header("accept"), Some("application/json"));
}

#[tokio::test]
async fn session_headers_apply_to_every_request() {
    let base = start_server();
    let client = Client::new(
        ClientConfig::default()
            .with_default_header("x-session", "abc")
            .with_user_agent("practice/1.0"),
    );
    let echo: HttpBinEcho = client
        .request_decoded(RequestDescriptor::get(&format!("{base}/headers")))
        .await
        .unwrap();
    assert_eq!(echo.header("x-session"), Some("abc"));
    assert_eq!(echo.header("user-agent"), Some("practice/1.0"));
}

#[tokio::test]
async fn json_body_is_posted() {
    let base = start_server();
    let user = UserContent {
        id: "5".to_string(),
        name: "Amish".to_string(),
        avatar: "empty string".to_string(),
    };
    let response = Client::default()
        .post_json(&format!("{base}/post"), &user)
        .await
        .unwrap();
    let echo: HttpBinEcho = response.json().unwrap();
    let posted: UserContent = serde_json::from_value(echo.json.unwrap()).unwrap();
    assert_eq!(posted, user);
}

#[tokio::test]
async fn shape_mismatch_is_decode_error_with_raw_body() {
    let base = start_server();
    let err = Client::default()
        .request_decoded::<Vec<UserContent>>(RequestDescriptor::get(&format!("{base}/get")))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Decode);
    let raw: serde_json::Value = serde_json::from_slice(err.partial_body().unwrap()).unwrap();
    assert_eq!(raw["url"], format!("{base}/get"));
}

#[tokio::test]
async fn error_status_is_data_without_validation() {
    let base = start_server();
    let response = Client::default()
        .get(&format!("{base}/status/404"))
        .await
        .unwrap();
    assert_eq!(response.status, 404);
    assert!(!response.is_success());
}

#[tokio::test]
async fn error_status_fails_with_validation() {
    let base = start_server();
    let descriptor =
        RequestDescriptor::get(&format!("{base}/status/500")).validate(Validation::successful());
    let err = Client::default().request(descriptor).await.unwrap_err();
    assert!(matches!(err, ClientError::Status { status: 500, .. }));

    let strict = Client::new(ClientConfig::default().with_validation(Validation::successful()));
    let err = strict.get(&format!("{base}/status/404")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Status);
    assert!(strict.get(&format!("{base}/status/204")).await.is_ok());
}

#[tokio::test]
async fn unreachable_host_is_network_error() {
    let client = Client::new(ClientConfig::default().with_timeout(Duration::from_secs(5)));
    let err = client.get(&unreachable_url()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Network);
}

#[tokio::test]
async fn slow_response_times_out() {
    let base = start_server();
    let descriptor =
        RequestDescriptor::get(&format!("{base}/delay/3")).timeout(Duration::from_millis(300));
    let started = std::time::Instant::now();
    let err = Client::default().request(descriptor).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Timeout);
    assert!(started.elapsed() < Duration::from_secs(3));
}

#[tokio::test]
async fn oversized_body_is_body_too_large() {
    let base = start_server();
    let mut config = ClientConfig::default();
    config.max_body_size = 50;
    let client = Client::new(config);

    let err = client.get(&format!("{base}/image/png")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BodyTooLarge);
    assert!(matches!(err, ClientError::BodyTooLarge { limit: 50 }));

    let err = client
        .download(&format!("{base}/image/png"), None)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BodyTooLarge);
}

#[tokio::test]
async fn malformed_descriptor_fails_before_connecting() {
    let client = Client::default();
    let err = client.get("ftp://example.com/x").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidRequest);

    let descriptor = RequestDescriptor::get(&unreachable_url()).header("bad header", "v");
    let err = client.request(descriptor).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidRequest);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_requests_never_cross_deliver() {
    let base = start_server();
    let client = Client::default();
    let a = client.request_decoded::<HttpBinEcho>(
        RequestDescriptor::get(&format!("{base}/delay/1")).query("who", "a"),
    );
    let b = client.request_decoded::<HttpBinEcho>(
        RequestDescriptor::get(&format!("{base}/get")).query("who", "b"),
    );
    let (a, b) = tokio::join!(a, b);
    let (a, b) = (a.unwrap(), b.unwrap());
    assert_eq!(a.url, format!("{base}/delay/1?who=a"));
    assert_eq!(b.url, format!("{base}/get?who=b"));
    assert_eq!(b.args["who"], "b");
}

// ---------------------------------------------------------------------------
// upload
// ---------------------------------------------------------------------------

#[tokio::test]
async fn raw_bytes_upload() {
    let base = start_server();
    let echo: HttpBinEcho = practice(&base).upload_data().await.unwrap().json().unwrap();
    assert_eq!(echo.data, "data");
    assert_eq!(echo.header("content-type"), Some("application/octet-stream"));
}

#[tokio::test]
async fn multipart_upload_sends_both_parts() {
    let base = start_server();
    let echo: HttpBinEcho = practice(&base)
        .multipart_upload()
        .await
        .unwrap()
        .json()
        .unwrap();
    assert_eq!(echo.form.len(), 2);
    assert_eq!(echo.form["one"], "one");
    assert_eq!(echo.form["two"], "two");
}

#[tokio::test]
async fn multipart_file_part_lands_in_files() {
    let base = start_server();
    let form = MultipartForm::new()
        .append("caption", "holiday")
        .append_file("clip", "clip.txt", "text/plain", "frames");
    let echo: HttpBinEcho = Client::default()
        .upload(form, &format!("{base}/post"))
        .await
        .unwrap()
        .json()
        .unwrap();
    assert_eq!(echo.form["caption"], "holiday");
    assert_eq!(echo.files["clip"], "frames");
}

#[tokio::test]
async fn file_upload_streams_contents() {
    let base = start_server();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.txt");
    std::fs::write(&path, "line one\nline two\n").unwrap();

    let echo: HttpBinEcho = practice(&base)
        .file_upload(&path)
        .await
        .unwrap()
        .json()
        .unwrap();
    assert_eq!(echo.data, "line one\nline two\n");
    assert_eq!(echo.header("content-type"), Some("text/plain"));
}

#[tokio::test]
async fn missing_upload_file_is_filesystem_error() {
    let base = start_server();
    let dir = tempfile::tempdir().unwrap();
    let err = practice(&base)
        .file_upload(&dir.path().join("video.mp4"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::FileSystem);
}

// ---------------------------------------------------------------------------
// download
// ---------------------------------------------------------------------------

#[tokio::test]
async fn download_into_memory() {
    let base = start_server();
    let download = practice(&base).download_image().await.unwrap();
    assert_eq!(download.status, 200);
    assert_eq!(download.bytes(), Some(SAMPLE_PNG));
    assert_eq!(download.content_length(), Some(SAMPLE_PNG.len() as u64));
}

#[tokio::test]
async fn download_to_new_directory() {
    let base = start_server();
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("pictures");

    let download = practice(&base).download_image_to(&target).await.unwrap();
    let path = target.join("image.png");
    assert_eq!(
        download.output,
        DownloadOutput::File {
            path: path.clone(),
            bytes_written: SAMPLE_PNG.len() as u64,
        }
    );
    assert_eq!(std::fs::read(&path).unwrap(), SAMPLE_PNG);
}

#[tokio::test]
async fn download_respects_overwrite_policy() {
    let base = start_server();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("image.png");
    std::fs::write(&path, b"previous").unwrap();
    let url = format!("{base}/image/png");
    let client = Client::default();

    let err = client
        .download(&url, Some(Destination::new(&path)))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::FileSystem);
    assert_eq!(std::fs::read(&path).unwrap(), b"previous");

    let download = client
        .download(&url, Some(Destination::new(&path).overwrite_existing(true)))
        .await
        .unwrap();
    let written = std::fs::metadata(&path).unwrap().len();
    assert_eq!(Some(written), download.content_length());
    assert_eq!(download.file_path(), Some(path.as_path()));
}

#[tokio::test]
async fn download_validation_failure_writes_nothing() {
    let base = start_server();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing.png");
    let client = Client::new(ClientConfig::default().with_validation(Validation::successful()));

    let err = client
        .download(&format!("{base}/status/404"), Some(Destination::new(&path)))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Status { status: 404, .. }));
    assert!(!path.exists());
}

#[tokio::test]
async fn rejected_download_keeps_the_body() {
    let base = start_server();
    let descriptor =
        RequestDescriptor::get(&format!("{base}/image/png")).validate(Validation::Range(300..400));
    let err = Client::default()
        .download_with(descriptor, None)
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Status { status: 200, .. }));
    assert_eq!(err.partial_body(), Some(SAMPLE_PNG));
}

#[tokio::test]
async fn download_from_unreachable_host_leaves_no_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("image.png");
    let err = Client::default()
        .download(&unreachable_url(), Some(Destination::new(&path)))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Network);
    assert!(!path.exists());
}

#[tokio::test]
async fn stalled_download_to_file_times_out_and_leaves_no_file() {
    let url = start_stalling_server();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("image.png");
    let descriptor = RequestDescriptor::get(&url).timeout(Duration::from_millis(500));

    let started = std::time::Instant::now();
    let err = Client::default()
        .download_with(descriptor, Some(Destination::new(&path)))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Timeout);
    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(!path.exists());
}

#[tokio::test]
async fn stalled_download_to_memory_times_out() {
    let url = start_stalling_server();
    let descriptor = RequestDescriptor::get(&url).timeout(Duration::from_millis(500));
    let err = Client::default()
        .download_with(descriptor, None)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Timeout);
}

// ---------------------------------------------------------------------------
// mock user API
// ---------------------------------------------------------------------------

#[tokio::test]
async fn post_user_then_fetch() {
    let base = start_server();
    let practice = practice(&base);
    assert!(practice.fetch_users().await.unwrap().is_empty());

    let user = UserContent {
        id: "5".to_string(),
        name: "Amish".to_string(),
        avatar: "empty string".to_string(),
    };
    let users = practice.post_user(&user).await.unwrap();
    assert_eq!(users, vec![user]);
}
