//! Integration tests for the address book service.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p addressbook-integration-tests
//! ```
//!
//! Tests drive the real router in-process with `tower::ServiceExt::oneshot`
//! over the in-memory collection and an in-memory session store, so no
//! database or running server is needed. [`TestApp::login`] stands in for
//! the platform's login service by writing the session identity.

use std::sync::Arc;

use axum::{
    Json, Router,
    body::Body,
    extract::Request,
    http::{Method, StatusCode, header},
    routing::post,
};
use serde_json::Value;
use tower::ServiceExt;
use tower_sessions::{MemoryStore, Session};

use addressbook_core::{DomainCode, UserId};
use addressbook_server::db::InMemoryAddresses;
use addressbook_server::middleware::{create_session_layer, set_current_user};
use addressbook_server::models::CurrentUser;
use addressbook_server::routes;
use addressbook_server::services::AddressService;
use addressbook_server::state::AppState;

/// Test-only login endpoint.
pub const LOGIN_PATH: &str = "/__test/login";

async fn login(session: Session, Json(user): Json<CurrentUser>) -> StatusCode {
    match set_current_user(&session, &user).await {
        Ok(()) => StatusCode::NO_CONTENT,
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// A caller identity for tests.
#[must_use]
pub fn user(id: &str, permissions: &[&str]) -> CurrentUser {
    CurrentUser {
        id: UserId::new(id),
        domain: DomainCode::new("acme"),
        permissions: permissions.iter().map(ToString::to_string).collect(),
    }
}

/// An administrator holding `address.add`.
#[must_use]
pub fn admin() -> CurrentUser {
    user("admin-1", &["address.add"])
}

/// The service under test, wired to in-memory storage.
#[derive(Clone)]
pub struct TestApp {
    router: Router,
    store: InMemoryAddresses,
    service: AddressService,
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

impl TestApp {
    /// Build a fresh app with empty storage and sessions.
    #[must_use]
    pub fn new() -> Self {
        let store = InMemoryAddresses::new();
        let service = AddressService::new(Arc::new(store.clone()));

        let router = Router::new()
            .merge(routes::routes())
            .route(LOGIN_PATH, post(login))
            .layer(create_session_layer(MemoryStore::default(), false))
            .with_state(AppState::new(service.clone()));

        Self {
            router,
            store,
            service,
        }
    }

    /// The backing collection, for inspecting what was stored.
    #[must_use]
    pub const fn store(&self) -> &InMemoryAddresses {
        &self.store
    }

    /// The address service behind the router.
    #[must_use]
    pub const fn service(&self) -> &AddressService {
        &self.service
    }

    /// Log `user` in and return the session cookie (`name=value`).
    ///
    /// # Panics
    ///
    /// Panics if the login request fails or sets no cookie.
    pub async fn login(&self, user: &CurrentUser) -> String {
        let body = serde_json::to_value(user).expect("serialize user");
        let response = self
            .router
            .clone()
            .oneshot(json_request(Method::POST, LOGIN_PATH, None, &body))
            .await
            .expect("login request");
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(';').next())
            .map(str::to_string)
            .expect("session cookie")
    }

    /// Send a request and return the status and body.
    ///
    /// `body`, when given, is sent as JSON. Non-JSON bodies come back as a
    /// JSON string.
    ///
    /// # Panics
    ///
    /// Panics if the router fails to respond.
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        cookie: Option<&str>,
        body: Option<&Value>,
    ) -> (StatusCode, Value) {
        let request = match body {
            Some(body) => json_request(method, uri, cookie, body),
            None => empty_request(method, uri, cookie),
        };
        self.dispatch(request).await
    }

    async fn dispatch(&self, request: Request) -> (StatusCode, Value) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router response");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("response body");
        let value = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));

        (status, value)
    }

    /// `GET uri` as `cookie`.
    pub async fn get(&self, uri: &str, cookie: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, Some(cookie), None).await
    }

    /// Send `body` as JSON with `method` as `cookie`.
    pub async fn json(
        &self,
        method: Method,
        uri: &str,
        cookie: &str,
        body: &Value,
    ) -> (StatusCode, Value) {
        self.send(method, uri, Some(cookie), Some(body)).await
    }

    /// Send a form-encoded `body` with `method` as `cookie`.
    ///
    /// # Panics
    ///
    /// Panics if the router fails to respond.
    pub async fn form(
        &self,
        method: Method,
        uri: &str,
        cookie: &str,
        body: &str,
    ) -> (StatusCode, Value) {
        let request = builder(method, uri, Some(cookie))
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .expect("valid request");
        self.dispatch(request).await
    }
}

fn builder(method: Method, uri: &str, cookie: Option<&str>) -> axum::http::request::Builder {
    let builder = Request::builder().method(method).uri(uri);
    match cookie {
        Some(cookie) => builder.header(header::COOKIE, cookie),
        None => builder,
    }
}

fn json_request(method: Method, uri: &str, cookie: Option<&str>, body: &Value) -> Request {
    builder(method, uri, cookie)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("valid request")
}

fn empty_request(method: Method, uri: &str, cookie: Option<&str>) -> Request {
    builder(method, uri, cookie)
        .body(Body::empty())
        .expect("valid request")
}
