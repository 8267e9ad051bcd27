//! In-process stand-in for the DocFlow services.
//!
//! One axum router answers for all four services. Every request is recorded
//! as `"<METHOD> <path>"` together with its JSON body, and any call can be
//! made to fail with a 500.

#![allow(dead_code)]

use axum::extract::{Multipart, Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use docflow::{Config, DocFlowClient};
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::sync::{Arc, Mutex};

pub const TOKEN: &str = "token-1";
pub const DOCUMENT_BYTES: &[u8] = b"%PDF-1.7 signed test document";

#[derive(Debug, Clone, PartialEq)]
pub struct UploadedPart {
    pub name: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

#[derive(Default)]
pub struct MockState {
    calls: Mutex<Vec<(String, Value)>>,
    failing: Mutex<HashSet<String>>,
    uploads: Mutex<Vec<Vec<UploadedPart>>>,
    signers: Mutex<Value>,
    verification: Mutex<Value>,
    edited_profile: Mutex<Option<Value>>,
}

impl MockState {
    /// Make `call` (for example `"PUT /documents/1a2b/expiration"`) answer 500.
    pub fn fail(&self, call: &str) {
        self.failing.lock().unwrap().insert(call.to_owned());
    }

    pub fn set_signers(&self, signers: Value) {
        *self.signers.lock().unwrap() = signers;
    }

    pub fn set_verification(&self, entries: Value) {
        *self.verification.lock().unwrap() = entries;
    }

    /// Calls in arrival order.
    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(call, _)| call.clone())
            .collect()
    }

    /// JSON body of the last request for `call`.
    pub fn body(&self, call: &str) -> Option<Value> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(recorded, _)| recorded == call)
            .map(|(_, body)| body.clone())
    }

    pub fn uploads(&self) -> Vec<Vec<UploadedPart>> {
        self.uploads.lock().unwrap().clone()
    }

    fn hit(&self, call: String, body: Value) -> Result<(), StatusCode> {
        let fails = self.failing.lock().unwrap().contains(&call);
        self.calls.lock().unwrap().push((call, body));
        if fails {
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        } else {
            Ok(())
        }
    }
}

type Shared = State<Arc<MockState>>;

fn profile(id: &str, first_name: &str, email: &str) -> Value {
    json!({
        "id": id,
        "email": email,
        "firstName": first_name,
        "lastName": "Tester",
        "position": "Engineer",
    })
}

async fn read_parts(mut multipart: Multipart) -> Vec<UploadedPart> {
    let mut parts = Vec::new();
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_owned();
        let file_name = field.file_name().map(str::to_owned);
        let content_type = field.content_type().map(str::to_owned);
        let data = field.bytes().await.unwrap().to_vec();
        parts.push(UploadedPart {
            name,
            file_name,
            content_type,
            data,
        });
    }
    parts
}

async fn own_profile(State(state): Shared, headers: HeaderMap) -> Result<Json<Value>, StatusCode> {
    state.hit("GET /api/profile".to_owned(), Value::Null)?;
    let expected = format!("Bearer {}", TOKEN);
    let authorized = headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        == Some(expected.as_str());
    if !authorized {
        return Err(StatusCode::UNAUTHORIZED);
    }
    let edited = state.edited_profile.lock().unwrap().clone();
    Ok(Json(
        edited.unwrap_or_else(|| profile("7", "Alice", "alice@example.com")),
    ))
}

async fn update_own_profile(
    State(state): Shared,
    Json(body): Json<Value>,
) -> Result<StatusCode, StatusCode> {
    state.hit("PUT /api/profile".to_owned(), body.clone())?;
    *state.edited_profile.lock().unwrap() = Some(body);
    Ok(StatusCode::OK)
}

async fn change_password(State(state): Shared, Json(body): Json<Value>) -> Result<StatusCode, StatusCode> {
    state.hit("PUT /api/auth/password".to_owned(), body)?;
    Ok(StatusCode::OK)
}

async fn lookup(
    State(state): Shared,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<Value>, StatusCode> {
    state.hit("GET /api/profile/lookup".to_owned(), json!(query))?;
    match (query.get("email"), query.get("iin")) {
        (Some(email), _) if email == "bob@example.com" => {
            Ok(Json(profile("8", "Bob", "bob@example.com")))
        }
        (_, Some(iin)) if iin == "900101300123" => {
            Ok(Json(profile("9", "Carol", "carol@example.com")))
        }
        _ => Err(StatusCode::NOT_FOUND),
    }
}

async fn next_id(State(state): Shared) -> Result<Json<Value>, StatusCode> {
    state.hit("GET /documents/next-id".to_owned(), Value::Null)?;
    Ok(Json(json!("1a2b")))
}

async fn upload(State(state): Shared, multipart: Multipart) -> Result<StatusCode, StatusCode> {
    let parts = read_parts(multipart).await;
    state.hit("POST /documents/upload".to_owned(), Value::Null)?;
    state.uploads.lock().unwrap().push(parts);
    Ok(StatusCode::CREATED)
}

async fn list_metadata(
    State(state): Shared,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<Value>, StatusCode> {
    state.hit("GET /documents/metadata".to_owned(), json!(query))?;
    Ok(Json(json!([
        {"id": "1a2b", "name": "Lease", "contentType": "application/pdf", "type": "DRAFT"},
        {"id": "3c", "name": "NDA", "contentType": "application/pdf", "type": "SENT",
         "expirationDate": "2030-01-01T00:00:00.000", "tags": ["legal"]},
    ])))
}

async fn download(State(state): Shared, Path(id): Path<String>) -> Result<Vec<u8>, StatusCode> {
    state.hit(format!("GET /documents/{}", id), Value::Null)?;
    Ok(DOCUMENT_BYTES.to_vec())
}

async fn put_tags(
    State(state): Shared,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Result<StatusCode, StatusCode> {
    state.hit(format!("PUT /documents/{}/tags", id), body)?;
    Ok(StatusCode::OK)
}

async fn put_expiration(
    State(state): Shared,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Result<StatusCode, StatusCode> {
    state.hit(format!("PUT /documents/{}/expiration", id), body)?;
    Ok(StatusCode::OK)
}

async fn start_approval(State(state): Shared, Json(body): Json<Value>) -> Result<StatusCode, StatusCode> {
    state.hit("POST /approvals".to_owned(), body)?;
    Ok(StatusCode::CREATED)
}

async fn signers(State(state): Shared, Path(id): Path<String>) -> Result<Json<Value>, StatusCode> {
    state.hit(format!("GET /approvals/{}/signers", id), Value::Null)?;
    Ok(Json(state.signers.lock().unwrap().clone()))
}

async fn signature(State(state): Shared, Json(body): Json<Value>) -> Result<StatusCode, StatusCode> {
    state.hit("POST /signatures".to_owned(), body)?;
    Ok(StatusCode::CREATED)
}

async fn verify_v2(State(state): Shared, multipart: Multipart) -> Result<Json<Value>, StatusCode> {
    let parts = read_parts(multipart).await;
    let id = parts
        .iter()
        .find(|part| part.name == "id")
        .map(|part| String::from_utf8_lossy(&part.data).into_owned());
    state.hit("POST /v2/verify".to_owned(), json!({ "id": id }))?;
    Ok(Json(state.verification.lock().unwrap().clone()))
}

async fn verify_legacy(State(state): Shared, multipart: Multipart) -> Result<Json<Value>, StatusCode> {
    let parts = read_parts(multipart).await;
    state.hit("POST /verify".to_owned(), json!({ "parts": parts.len() }))?;
    Ok(Json(json!([
        {"name": "Alice Tester", "date": "2024-08-01", "certificate": "Valid", "reason": "Approved"}
    ])))
}

async fn templates(State(state): Shared) -> Result<Json<Value>, StatusCode> {
    state.hit("GET /templates".to_owned(), Value::Null)?;
    Ok(Json(json!([{"id": "lease", "name": "Lease agreement"}])))
}

async fn template_fields(State(state): Shared, Path(id): Path<String>) -> Result<Json<Value>, StatusCode> {
    state.hit(format!("GET /templates/{}/fields", id), Value::Null)?;
    Ok(Json(json!([
        {"name": "tenant", "label": "Tenant", "required": true},
        {"name": "city"},
    ])))
}

async fn fill_template(
    State(state): Shared,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Vec<u8>, StatusCode> {
    state.hit(format!("POST /templates/{}/fill", id), body)?;
    Ok(b"rendered".to_vec())
}

async fn tags(State(state): Shared, Path(user_id): Path<String>) -> Result<Json<Value>, StatusCode> {
    state.hit(format!("GET /tags/{}", user_id), Value::Null)?;
    Ok(Json(json!(["legal", "hr"])))
}

async fn add_tag(
    State(state): Shared,
    Path(user_id): Path<String>,
    Json(body): Json<Value>,
) -> Result<StatusCode, StatusCode> {
    state.hit(format!("POST /tags/{}", user_id), body)?;
    Ok(StatusCode::CREATED)
}

async fn delete_tag(
    State(state): Shared,
    Path(user_id): Path<String>,
    Json(body): Json<Value>,
) -> Result<StatusCode, StatusCode> {
    state.hit(format!("DELETE /tags/{}", user_id), body)?;
    Ok(StatusCode::OK)
}

fn router(state: Arc<MockState>) -> Router {
    Router::new()
        .route("/api/profile", get(own_profile).put(update_own_profile))
        .route("/api/auth/password", put(change_password))
        .route("/api/profile/lookup", get(lookup))
        .route("/documents/next-id", get(next_id))
        .route("/documents/upload", post(upload))
        .route("/documents/metadata", get(list_metadata))
        .route("/documents/{id}", get(download))
        .route("/documents/{id}/tags", put(put_tags))
        .route("/documents/{id}/expiration", put(put_expiration))
        .route("/tags/{user_id}", get(tags).post(add_tag).delete(delete_tag))
        .route("/approvals", post(start_approval))
        .route("/approvals/{id}/signers", get(signers))
        .route("/signatures", post(signature))
        .route("/v2/verify", post(verify_v2))
        .route("/verify", post(verify_legacy))
        .route("/templates", get(templates))
        .route("/templates/{id}/fields", get(template_fields))
        .route("/templates/{id}/fill", post(fill_template))
        .with_state(state)
}

pub struct MockBackend {
    pub state: Arc<MockState>,
    pub base_url: String,
}

impl MockBackend {
    pub async fn start() -> Self {
        let state = Arc::new(MockState::default());
        state.set_signers(json!([]));
        state.set_verification(json!([]));

        let addr = SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, 0));
        let listener = tokio::net::TcpListener::bind(addr).await.expect("bind");
        let bound_addr = listener.local_addr().expect("local addr");
        let app = router(state.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve");
        });

        MockBackend {
            state,
            base_url: format!("http://{}", bound_addr),
        }
    }

    pub fn config(&self) -> Config {
        Config {
            auth_url: self.base_url.clone(),
            documents_url: self.base_url.clone(),
            approval_url: self.base_url.clone(),
            templates_url: self.base_url.clone(),
            request_timeout_secs: 5,
            ..Config::default()
        }
    }

    /// A client that already carries the test token.
    pub fn client(&self) -> DocFlowClient {
        let mut client = DocFlowClient::new(self.config()).expect("client");
        client.set_access_token(Some(TOKEN.to_owned()));
        client
    }
}
