//! In-process stand-in for the identity provider's admin API, for tests.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use axum::extract::{Path, Query, Request, State};
use axum::http::{StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use serde_json::{Value, json};
use tokio::net::TcpListener;

const TOKEN: &str = "mock-token";
const BEARER: &str = "Bearer mock-token";

#[derive(Default)]
pub struct MockState {
    pub realms: HashSet<String>,
    pub roles: Vec<String>,
    /// `(id, clientId)`
    pub clients: Vec<(String, String)>,
    /// `(id, username)`
    pub users: Vec<(String, String)>,
    /// user id -> mapped role names
    pub mappings: HashMap<String, Vec<String>>,
    pub failing_roles: HashSet<String>,
}

type Shared = Arc<Mutex<MockState>>;

pub struct MockIdp {
    pub url: String,
    state: Shared,
}

impl MockIdp {
    pub const PASSWORD: &'static str = "admin-secret";

    pub async fn start() -> Self {
        let state: Shared = Arc::default();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let app = router(Arc::clone(&state));
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        Self { url, state }
    }

    pub fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }

    /// Make role creation for `name` answer 500.
    pub fn fail_role(&self, name: &str) {
        self.state().failing_roles.insert(name.to_string());
    }
}

fn router(state: Shared) -> Router {
    let admin = Router::new()
        .route("/admin/realms", post(create_realm))
        .route("/admin/realms/{realm}", get(get_realm))
        .route("/admin/realms/{realm}/roles", get(list_roles).post(create_role))
        .route(
            "/admin/realms/{realm}/clients",
            get(list_clients).post(create_client),
        )
        .route("/admin/realms/{realm}/users", get(list_users).post(create_user))
        .route(
            "/admin/realms/{realm}/users/{id}/role-mappings/realm",
            post(map_roles),
        )
        .route_layer(middleware::from_fn(require_token));

    Router::new()
        .route("/realms/master/protocol/openid-connect/token", post(token))
        .merge(admin)
        .with_state(state)
}

async fn require_token(req: Request, next: Next) -> Response {
    let auth = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    if auth != Some(BEARER) {
        return (StatusCode::UNAUTHORIZED, "missing or invalid token").into_response();
    }
    next.run(req).await
}

async fn token(Form(form): Form<HashMap<String, String>>) -> Response {
    let valid = form.get("grant_type").map(String::as_str) == Some("password")
        && form.get("client_id").map(String::as_str) == Some("admin-cli")
        && form.get("password").map(String::as_str) == Some(MockIdp::PASSWORD);
    if valid {
        Json(json!({ "access_token": TOKEN })).into_response()
    } else {
        (StatusCode::UNAUTHORIZED, "invalid_grant").into_response()
    }
}

async fn create_realm(State(state): State<Shared>, Json(body): Json<Value>) -> StatusCode {
    let Some(name) = body["realm"].as_str().filter(|n| !n.is_empty()) else {
        return StatusCode::BAD_REQUEST;
    };
    if state.lock().unwrap().realms.insert(name.to_string()) {
        StatusCode::CREATED
    } else {
        StatusCode::CONFLICT
    }
}

async fn get_realm(State(state): State<Shared>, Path(realm): Path<String>) -> Response {
    if state.lock().unwrap().realms.contains(&realm) {
        Json(json!({ "realm": realm })).into_response()
    } else {
        StatusCode::NOT_FOUND.into_response()
    }
}

async fn create_role(
    State(state): State<Shared>,
    Path(realm): Path<String>,
    Json(body): Json<Value>,
) -> StatusCode {
    let mut s = state.lock().unwrap();
    if !s.realms.contains(&realm) {
        return StatusCode::NOT_FOUND;
    }
    let Some(name) = body["name"].as_str() else {
        return StatusCode::BAD_REQUEST;
    };
    if s.failing_roles.contains(name) {
        return StatusCode::INTERNAL_SERVER_ERROR;
    }
    if s.roles.iter().any(|r| r == name) {
        return StatusCode::CONFLICT;
    }
    s.roles.push(name.to_string());
    StatusCode::CREATED
}

async fn list_roles(State(state): State<Shared>, Path(realm): Path<String>) -> Response {
    let s = state.lock().unwrap();
    if !s.realms.contains(&realm) {
        return StatusCode::NOT_FOUND.into_response();
    }
    let roles: Vec<Value> = s
        .roles
        .iter()
        .enumerate()
        .map(|(i, name)| json!({ "id": format!("role-{i}"), "name": name }))
        .collect();
    Json(roles).into_response()
}

async fn list_clients(
    State(state): State<Shared>,
    Path(realm): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let s = state.lock().unwrap();
    if !s.realms.contains(&realm) {
        return StatusCode::NOT_FOUND.into_response();
    }
    let found: Vec<Value> = s
        .clients
        .iter()
        .filter(|(_, client_id)| query.get("clientId").is_none_or(|q| q == client_id))
        .map(|(id, client_id)| json!({ "id": id, "clientId": client_id }))
        .collect();
    Json(found).into_response()
}

async fn create_client(
    State(state): State<Shared>,
    Path(realm): Path<String>,
    Json(body): Json<Value>,
) -> StatusCode {
    let mut s = state.lock().unwrap();
    if !s.realms.contains(&realm) {
        return StatusCode::NOT_FOUND;
    }
    let Some(client_id) = body["clientId"].as_str() else {
        return StatusCode::BAD_REQUEST;
    };
    let id = format!("client-{}", s.clients.len());
    s.clients.push((id, client_id.to_string()));
    StatusCode::CREATED
}

async fn list_users(
    State(state): State<Shared>,
    Path(realm): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let s = state.lock().unwrap();
    if !s.realms.contains(&realm) {
        return StatusCode::NOT_FOUND.into_response();
    }
    let found: Vec<Value> = s
        .users
        .iter()
        .filter(|(_, username)| query.get("username").is_none_or(|q| q == username))
        .map(|(id, username)| json!({ "id": id, "username": username }))
        .collect();
    Json(found).into_response()
}

async fn create_user(
    State(state): State<Shared>,
    Path(realm): Path<String>,
    Json(body): Json<Value>,
) -> StatusCode {
    let mut s = state.lock().unwrap();
    if !s.realms.contains(&realm) {
        return StatusCode::NOT_FOUND;
    }
    let Some(username) = body["username"].as_str() else {
        return StatusCode::BAD_REQUEST;
    };
    if body["credentials"][0]["temporary"] != json!(false) {
        return StatusCode::BAD_REQUEST;
    }
    let id = format!("user-{}", s.users.len());
    s.users.push((id, username.to_string()));
    StatusCode::CREATED
}

async fn map_roles(
    State(state): State<Shared>,
    Path((realm, id)): Path<(String, String)>,
    Json(roles): Json<Vec<Value>>,
) -> StatusCode {
    let mut s = state.lock().unwrap();
    if !s.realms.contains(&realm) || !s.users.iter().any(|(uid, _)| *uid == id) {
        return StatusCode::NOT_FOUND;
    }
    let names = roles
        .iter()
        .filter_map(|r| r["name"].as_str().map(str::to_string))
        .collect();
    s.mappings.insert(id, names);
    StatusCode::NO_CONTENT
}
