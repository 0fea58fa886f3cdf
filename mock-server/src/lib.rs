use std::{collections::BTreeMap, sync::Arc, time::Duration};

use axum::{
    body::Bytes,
    extract::{FromRequest, Multipart, Path, Query, Request, State},
    http::{header, HeaderMap, StatusCode, Uri},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

/// A 2x2 orange PNG served by `/image/png`.
pub const SAMPLE_PNG: &[u8] = &[
    0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x02, 0x00, 0x00, 0x00, 0x02, 0x08, 0x02, 0x00, 0x00, 0x00, 0xfd,
    0xd4, 0x9a, 0x73, 0x00, 0x00, 0x00, 0x10, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9c, 0x63, 0xf8,
    0xdf, 0xc0, 0x00, 0x44, 0x0c, 0x10, 0x0a, 0x00, 0x2d, 0xee, 0x05, 0xfd, 0x8b, 0x3f, 0x6e,
    0x84, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4e, 0x44, 0xae, 0x42, 0x60, 0x82,
];

/// Longest accepted `/delay/{secs}`.
pub const MAX_DELAY_SECS: u64 = 10;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserContent {
    pub id: String,
    pub name: String,
    pub avatar: String,
}

pub type Db = Arc<RwLock<Vec<UserContent>>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Vec::new()));
    Router::new()
        .route("/get", get(echo_get))
        .route("/headers", get(echo_headers))
        .route("/post", post(echo_post))
        .route("/image/png", get(image_png))
        .route("/status/{code}", get(status))
        .route("/delay/{secs}", get(delay))
        .route("/test-api/v1/basic", get(list_users).post(create_user))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn echo_get(
    Query(args): Query<BTreeMap<String, String>>,
    headers: HeaderMap,
    uri: Uri,
) -> Json<Value> {
    Json(json!({
        "args": args,
        "headers": header_map(&headers),
        "url": full_url(&headers, &uri),
    }))
}

async fn echo_headers(headers: HeaderMap) -> Json<Value> {
    Json(json!({ "headers": header_map(&headers) }))
}

async fn echo_post(request: Request) -> Result<Json<Value>, (StatusCode, String)> {
    let headers = request.headers().clone();
    let uri = request.uri().clone();
    let is_multipart = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("multipart/form-data"));

    let mut form = BTreeMap::new();
    let mut files = BTreeMap::new();
    let mut data = String::new();
    let mut body_json = Value::Null;

    if is_multipart {
        let mut multipart = Multipart::from_request(request, &())
            .await
            .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?
        {
            let name = field.name().unwrap_or_default().to_string();
            let is_file = field.file_name().is_some();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
            let value = String::from_utf8_lossy(&bytes).into_owned();
            if is_file {
                files.insert(name, value);
            } else {
                form.insert(name, value);
            }
        }
    } else {
        let bytes = axum::body::to_bytes(request.into_body(), usize::MAX)
            .await
            .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
        data = String::from_utf8_lossy(&bytes).into_owned();
        body_json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    }

    Ok(Json(json!({
        "args": {},
        "data": data,
        "files": files,
        "form": form,
        "headers": header_map(&headers),
        "json": body_json,
        "url": full_url(&headers, &uri),
    })))
}

async fn image_png() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "image/png")], Bytes::from_static(SAMPLE_PNG))
}

async fn status(Path(code): Path<u16>) -> Result<StatusCode, (StatusCode, String)> {
    StatusCode::from_u16(code).map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))
}

async fn delay(Path(secs): Path<u64>, headers: HeaderMap, uri: Uri) -> Json<Value> {
    tokio::time::sleep(Duration::from_secs(secs.min(MAX_DELAY_SECS))).await;
    Json(json!({
        "headers": header_map(&headers),
        "url": full_url(&headers, &uri),
    }))
}

async fn list_users(State(db): State<Db>) -> Json<Vec<UserContent>> {
    Json(db.read().await.clone())
}

async fn create_user(
    State(db): State<Db>,
    Json(mut input): Json<UserContent>,
) -> (StatusCode, Json<UserContent>) {
    if input.id.is_empty() {
        input.id = Uuid::new_v4().to_string();
    }
    db.write().await.push(input.clone());
    (StatusCode::CREATED, Json(input))
}

/// Headers keyed the way the echo service reports them: `Content-Type`,
/// not `content-type`. Repeated headers are joined with commas.
fn header_map(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut out: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in headers {
        let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
        out.entry(title_case(name.as_str()))
            .and_modify(|existing| {
                existing.push(',');
                existing.push_str(&value);
            })
            .or_insert(value);
    }
    out
}

fn title_case(name: &str) -> String {
    name.split('-')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}

fn full_url(headers: &HeaderMap, uri: &Uri) -> String {
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");
    format!("http://{host}{uri}")
}
