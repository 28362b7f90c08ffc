//! In-process stand-in for the Eco-Collect backend.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Multipart, Path, RawQuery, State};
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use eco_collect::api::ApiClient;
use eco_collect::session::Session;

pub const COOKIE_VALUE: &str = "session=abc123";
pub const PASSWORD: &str = "secret";
pub const CIVILIAN_ID: i64 = 3;

#[derive(Debug, Default)]
pub struct Calls {
    pub preview: usize,
    pub create: usize,
    pub list_own: usize,
    pub list_all: usize,
    pub approve: usize,
    pub centers: usize,
    pub logout: usize,
    pub uploads_queries: Vec<Option<String>>,
}

#[derive(Debug, Default)]
pub struct Failures {
    pub preview: bool,
    pub create: bool,
    pub approve: bool,
    pub centers: bool,
    pub list_all: bool,
}

#[derive(Debug, Default)]
pub struct Backend {
    pub calls: Calls,
    pub fail: Failures,
    pub uploads: Vec<Value>,
    pub logged_out: bool,
}

pub type Shared = Arc<Mutex<Backend>>;

pub struct FakeServer {
    pub url: String,
    pub state: Shared,
}

impl FakeServer {
    pub async fn start() -> Self {
        Self::with_uploads(Vec::new()).await
    }

    pub async fn with_uploads(uploads: Vec<Value>) -> Self {
        let state: Shared = Arc::new(Mutex::new(Backend {
            uploads,
            ..Backend::default()
        }));

        let app = Router::new()
            .route("/auth/login", post(login))
            .route("/auth/logout", post(logout))
            .route("/auth/me", get(me))
            .route("/uploads/", post(create_upload).get(own_uploads))
            .route("/uploads/all", get(all_uploads))
            .route("/uploads/approve/:id", patch(approve))
            .route("/api/centers/", get(centers))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            url: format!("http://{}", addr),
            state,
        }
    }

    pub fn client(&self) -> ApiClient {
        ApiClient::new(self.url.clone(), Duration::from_secs(5)).unwrap()
    }

    pub async fn login(&self, email: &str) -> Session {
        self.client().login(email, PASSWORD).await.unwrap()
    }

    pub fn backend(&self) -> std::sync::MutexGuard<'_, Backend> {
        self.state.lock().unwrap()
    }
}

pub fn upload(id: i64, user_id: i64, category: &str, weight: f64, not_verified: bool, points: i64) -> Value {
    json!({
        "id": id,
        "user_id": user_id,
        "centre_id": 1,
        "category": category,
        "confidence": 0.9,
        "weight": weight,
        "points_awarded": points,
        "not_verified": not_verified,
        "upload_date": format!("2024-05-{:02}T09:30:00", id.clamp(1, 28)),
    })
}

/// A small JPEG-named file on disk for the file picker path.
pub fn image_file() -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".jpg").tempfile().unwrap();
    file.write_all(&[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10]).unwrap();
    file.flush().unwrap();
    file
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

fn authorised(headers: &HeaderMap) -> bool {
    headers
        .get(COOKIE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.split("; ").any(|pair| pair == COOKIE_VALUE))
}

fn user_for(email: &str) -> Value {
    if email.starts_with("corp") {
        json!({ "id": 1, "user_name": "acme", "email": email, "role": "corporative", "point_score": 0 })
    } else {
        json!({ "id": CIVILIAN_ID, "user_name": "wanjiku", "email": email, "role": "civilian", "point_score": 35 })
    }
}

async fn login(Json(body): Json<Value>) -> Response {
    let email = body["email"].as_str().unwrap_or_default();
    if body["password"].as_str() != Some(PASSWORD) {
        return error(StatusCode::UNAUTHORIZED, "Invalid credentials");
    }
    (
        [(SET_COOKIE, format!("{}; HttpOnly; Path=/", COOKIE_VALUE))],
        Json(json!({ "message": "Logged in", "user": user_for(email) })),
    )
        .into_response()
}

async fn logout(State(state): State<Shared>) -> Response {
    let mut backend = state.lock().unwrap();
    backend.calls.logout += 1;
    backend.logged_out = true;
    Json(json!({ "message": "Logged out" })).into_response()
}

async fn me(State(state): State<Shared>, headers: HeaderMap) -> Response {
    if !authorised(&headers) || state.lock().unwrap().logged_out {
        return error(StatusCode::UNAUTHORIZED, "Unauthorized");
    }
    Json(json!({ "user": user_for("wanjiku@example.test") })).into_response()
}

async fn create_upload(
    State(state): State<Shared>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Response {
    let mut fields = HashMap::new();
    let mut file_bytes = 0;
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        if name == "file" {
            file_bytes = field.bytes().await.map(|b| b.len()).unwrap_or(0);
        } else {
            fields.insert(name, field.text().await.unwrap_or_default());
        }
    }
    if file_bytes == 0 {
        return error(StatusCode::BAD_REQUEST, "No file uploaded");
    }

    let mut backend = state.lock().unwrap();
    if fields.get("preview").map(String::as_str) == Some("true") {
        backend.calls.preview += 1;
        if backend.fail.preview {
            return (StatusCode::INTERNAL_SERVER_ERROR, "model crashed").into_response();
        }
        return Json(json!({ "upload": { "category": "plastic", "confidence": 0.87 } }))
            .into_response();
    }

    backend.calls.create += 1;
    if !authorised(&headers) {
        return error(StatusCode::UNAUTHORIZED, "Unauthorized");
    }
    if backend.fail.create {
        return error(StatusCode::INTERNAL_SERVER_ERROR, "Database error");
    }
    let (Some(weight), Some(centre_id)) = (
        fields.get("weight").and_then(|w| w.parse::<f64>().ok()),
        fields.get("centre_id").and_then(|c| c.parse::<i64>().ok()),
    ) else {
        return error(StatusCode::BAD_REQUEST, "Weight and centre_id are required");
    };

    let id = backend.uploads.len() as i64 + 100;
    let mut record = upload(id, CIVILIAN_ID, "plastic", weight, true, 0);
    record["centre_id"] = json!(centre_id);
    backend.uploads.push(record.clone());
    (StatusCode::CREATED, Json(json!({ "upload": record }))).into_response()
}

async fn own_uploads(
    State(state): State<Shared>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> Response {
    let mut backend = state.lock().unwrap();
    backend.calls.list_own += 1;
    backend.calls.uploads_queries.push(query);
    if !authorised(&headers) {
        return error(StatusCode::UNAUTHORIZED, "Unauthorized");
    }
    let mine: Vec<Value> = backend
        .uploads
        .iter()
        .filter(|u| u["user_id"] == json!(CIVILIAN_ID))
        .cloned()
        .collect();
    Json(json!({ "uploads": mine })).into_response()
}

async fn all_uploads(State(state): State<Shared>) -> Response {
    let mut backend = state.lock().unwrap();
    backend.calls.list_all += 1;
    if backend.fail.list_all {
        return error(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error");
    }
    Json(json!({ "uploads": backend.uploads })).into_response()
}

async fn approve(State(state): State<Shared>, Path(id): Path<i64>) -> Response {
    let mut backend = state.lock().unwrap();
    backend.calls.approve += 1;
    if backend.fail.approve {
        return (StatusCode::INTERNAL_SERVER_ERROR, "").into_response();
    }
    match backend.uploads.iter_mut().find(|u| u["id"] == json!(id)) {
        Some(record) => {
            record["not_verified"] = json!(false);
            Json(json!({ "message": "Upload verified", "upload_id": id })).into_response()
        }
        None => error(StatusCode::NOT_FOUND, "Upload not found"),
    }
}

async fn centers(State(state): State<Shared>) -> Response {
    let mut backend = state.lock().unwrap();
    backend.calls.centers += 1;
    if backend.fail.centers {
        return error(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error");
    }
    Json(json!([
        {
            "id": 1,
            "name": "Kibarani Depot",
            "company": "Acme Recycling",
            "location": "Mombasa",
            "contact": "0700 000 000",
            "time_open": "08:00-17:00",
            "location_url": null
        },
        { "id": 2, "name": "Gikomba Drop-off", "location": "Nairobi" }
    ]))
    .into_response()
}
