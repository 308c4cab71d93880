//! End-to-end tests for the address HTTP API.
//!
//! Each test builds its own in-memory app; nothing is shared between tests.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use axum::http::{Method, StatusCode};
use serde_json::{Value, json};

use addressbook_core::{AddressPatch, DomainCode, UserId};
use addressbook_integration_tests::{TestApp, admin, user};
use addressbook_server::services::{Caller, UserAddress};

async fn add(app: &TestApp, cookie: &str, body: Value) -> Value {
    let (status, body) = app
        .json(Method::POST, "/address/admin/add", cookie, &body)
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    body["addr"].clone()
}

fn home(id_user: &str, nr: &str) -> Value {
    json!({
        "id_user": id_user,
        "type": "personal",
        "address": "Via Roma",
        "nr": nr,
        "city": "Milan"
    })
}

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn test_health_endpoints() {
    let app = TestApp::new();

    let (status, body) = app.send(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!("ok"));

    let (status, _) = app.send(Method::GET, "/health/ready", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

// ============================================================================
// Permission gate
// ============================================================================

#[tokio::test]
async fn test_admin_endpoints_require_login() {
    let app = TestApp::new();
    let (status, body) = app
        .send(
            Method::POST,
            "/address/admin/add",
            None,
            Some(&home("u1", "1")),
        )
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["ok"], json!(false));
    assert!(app.store().is_empty().await);
}

#[tokio::test]
async fn test_admin_endpoints_require_permission() {
    let app = TestApp::new();
    let cookie = app.login(&user("u1", &["address.view"])).await;

    let (status, body) = app
        .json(Method::POST, "/address/admin/add", &cookie, &home("u1", "1"))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], json!("Missing permission: address.add"));

    let (status, _) = app.get("/address/admin/list", &cookie).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_self_service_endpoints_require_login() {
    let app = TestApp::new();
    let (status, _) = app.send(Method::GET, "/address/list", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.send(Method::GET, "/address/details", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Add
// ============================================================================

#[tokio::test]
async fn test_add_round_trip() {
    let app = TestApp::new();
    let cookie = app.login(&admin()).await;

    let addr = add(&app, &cookie, home("u1", "12")).await;
    let id = addr["id"].as_str().unwrap();
    assert!(id.starts_with("addr-"));
    assert_eq!(addr["domain"], json!("acme"));
    assert_eq!(addr["id_user"], json!("u1"));
    assert_eq!(addr["type"], json!("personal"));
    assert_eq!(addr["nr"], json!("12"));

    let (status, body) = app.get("/address/admin/list", &cookie).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], json!(true));
    assert_eq!(body["addrs"], json!([addr]));
}

#[tokio::test]
async fn test_add_missing_required_fields_names_them_and_stores_nothing() {
    let app = TestApp::new();
    let cookie = app.login(&admin()).await;

    for (payload, expected) in [
        (json!({ "nr": "1", "type": "personal" }), json!(["address"])),
        (json!({ "address": "Via Roma", "type": "personal" }), json!(["nr"])),
        (json!({ "address": "Via Roma", "nr": "1" }), json!(["type"])),
        (json!({ "address": "  ", "nr": "1", "type": "personal" }), json!(["address"])),
        (json!({ "name": "Home" }), json!(["address", "nr", "type"])),
    ] {
        let (status, body) = app
            .json(Method::POST, "/address/admin/add", &cookie, &payload)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{payload}");
        assert_eq!(body["ok"], json!(false));
        assert_eq!(body["missing"], expected, "{payload}");
    }

    assert!(app.store().is_empty().await);
}

#[tokio::test]
async fn test_add_drops_unknown_keys() {
    let app = TestApp::new();
    let cookie = app.login(&admin()).await;

    let mut payload = home("u1", "1");
    payload["visible"] = json!(true);
    payload["domain"] = json!("elsewhere");
    let addr = add(&app, &cookie, payload).await;

    assert!(addr.get("visible").is_none());
    assert_eq!(addr["domain"], json!("acme"));
}

#[tokio::test]
async fn test_add_accepts_form_encoded_body() {
    let app = TestApp::new();
    let cookie = app.login(&admin()).await;

    let (status, body) = app
        .form(
            Method::POST,
            "/address/admin/add",
            &cookie,
            "address=Via+Roma&nr=12&type=personal&city=Milan",
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["addr"]["address"], json!("Via Roma"));
    assert_eq!(body["addr"]["nr"], json!("12"));
    assert_eq!(app.store().len().await, 1);
}

#[tokio::test]
async fn test_add_accepts_numeric_street_number() {
    let app = TestApp::new();
    let cookie = app.login(&admin()).await;

    let addr = add(
        &app,
        &cookie,
        json!({ "address": "Via Roma", "nr": 12, "zip": 20121, "type": "personal" }),
    )
    .await;
    assert_eq!(addr["nr"], json!("12"));
    assert_eq!(addr["zip"], json!("20121"));
}

// ============================================================================
// Update / fields
// ============================================================================

#[tokio::test]
async fn test_update_missing_id_is_not_found_and_changes_nothing() {
    let app = TestApp::new();
    let cookie = app.login(&admin()).await;
    let before = add(&app, &cookie, home("u1", "1")).await;

    let (status, body) = app
        .json(
            Method::PATCH,
            "/address/admin/update",
            &cookie,
            &json!({ "id": "addr-missing", "city": "Rome" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "ok": false, "message": "Address not found" }));

    let (_, body) = app.get("/address/admin/list", &cookie).await;
    assert_eq!(body["addrs"], json!([before]));
}

#[tokio::test]
async fn test_update_requires_id() {
    let app = TestApp::new();
    let cookie = app.login(&admin()).await;

    let (status, body) = app
        .json(
            Method::PATCH,
            "/address/admin/update",
            &cookie,
            &json!({ "city": "Rome" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["missing"], json!(["id"]));
}

#[tokio::test]
async fn test_update_merges_fields() {
    let app = TestApp::new();
    let cookie = app.login(&admin()).await;
    let before = add(&app, &cookie, home("u1", "1")).await;

    let (status, body) = app
        .json(
            Method::PATCH,
            "/address/admin/update",
            &cookie,
            &json!({ "id": before["id"], "zip": "20100", "nr": "2" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let mut expected = before.clone();
    expected["zip"] = json!("20100");
    expected["nr"] = json!("2");
    assert_eq!(body["addr"], expected);
}

#[tokio::test]
async fn test_fields_patch_changes_only_given_field() {
    let app = TestApp::new();
    let cookie = app.login(&admin()).await;
    let before = add(&app, &cookie, home("u1", "1")).await;

    let (status, body) = app
        .json(
            Method::PATCH,
            "/address/admin/fields",
            &cookie,
            &json!({ "id": before["id"], "data": { "city": "Rome" } }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let mut expected = before.clone();
    expected["city"] = json!("Rome");
    assert_eq!(body["addr"], expected);
}

#[tokio::test]
async fn test_fields_patch_rejects_unknown_fields() {
    let app = TestApp::new();
    let cookie = app.login(&admin()).await;
    let before = add(&app, &cookie, home("u1", "1")).await;

    let (status, body) = app
        .json(
            Method::PATCH,
            "/address/admin/fields",
            &cookie,
            &json!({ "id": before["id"], "data": { "colour": "red" } }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["ok"], json!(false));

    let (status, body) = app
        .json(
            Method::PATCH,
            "/address/admin/fields",
            &cookie,
            &json!({ "id": before["id"] }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["missing"], json!(["data"]));
}

#[tokio::test]
async fn test_fields_patch_missing_id_is_not_found() {
    let app = TestApp::new();
    let cookie = app.login(&admin()).await;

    let (status, _) = app
        .json(
            Method::PATCH,
            "/address/admin/fields",
            &cookie,
            &json!({ "id": "addr-missing", "data": { "city": "Rome" } }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(app.store().is_empty().await);
}

// ============================================================================
// List
// ============================================================================

#[tokio::test]
async fn test_admin_list_pages_are_disjoint_and_complete() {
    let app = TestApp::new();
    let cookie = app.login(&admin()).await;
    for nr in ["1", "2", "3", "4"] {
        add(&app, &cookie, home("u1", nr)).await;
    }
    add(&app, &cookie, home("u2", "9")).await;

    let (_, first) = app
        .get("/address/admin/list?id_user=u1&rows=2&skip=0", &cookie)
        .await;
    let (_, second) = app
        .get("/address/admin/list?id_user=u1&rows=2&skip=2", &cookie)
        .await;
    let (_, all) = app
        .get("/address/admin/list?id_user=u1&rows=-1&skip=0", &cookie)
        .await;

    let first = first["addrs"].as_array().unwrap().clone();
    let second = second["addrs"].as_array().unwrap().clone();
    assert_eq!(first.len(), 2);
    assert_eq!(second.len(), 2);
    assert!(first.iter().all(|a| !second.contains(a)));
    let pages: Vec<Value> = [first, second].concat();
    assert_eq!(Value::Array(pages), all["addrs"]);
}

#[tokio::test]
async fn test_admin_list_without_user_returns_everything() {
    let app = TestApp::new();
    let cookie = app.login(&admin()).await;
    add(&app, &cookie, home("u1", "1")).await;
    add(&app, &cookie, home("u2", "2")).await;

    let (_, body) = app.get("/address/admin/list", &cookie).await;
    assert_eq!(body["addrs"].as_array().unwrap().len(), 2);

    let (status, body) = app.get("/address/admin/list?id_user=%20%20", &cookie).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["addrs"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_admin_list_rejects_negative_skip() {
    let app = TestApp::new();
    let cookie = app.login(&admin()).await;

    let (status, body) = app.get("/address/admin/list?skip=-1", &cookie).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["ok"], json!(false));
}

// ============================================================================
// Delete
// ============================================================================

#[tokio::test]
async fn test_delete_missing_id_succeeds() {
    let app = TestApp::new();
    let cookie = app.login(&admin()).await;

    let (status, body) = app
        .json(
            Method::DELETE,
            "/address/admin/del",
            &cookie,
            &json!({ "id": "addr-missing" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "ok": true, "id": "addr-missing" }));
}

#[tokio::test]
async fn test_delete_removes_address() {
    let app = TestApp::new();
    let cookie = app.login(&admin()).await;
    let addr = add(&app, &cookie, home("u1", "1")).await;
    let id = addr["id"].as_str().unwrap();

    let (status, body) = app
        .send(
            Method::DELETE,
            &format!("/address/admin/del?id={id}"),
            Some(&cookie),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], json!(id));
    assert!(app.store().is_empty().await);
}

#[tokio::test]
async fn test_delete_requires_id() {
    let app = TestApp::new();
    let cookie = app.login(&admin()).await;

    let (status, body) = app
        .send(Method::DELETE, "/address/admin/del", Some(&cookie), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["missing"], json!(["id"]));
}

// ============================================================================
// Self-service
// ============================================================================

#[tokio::test]
async fn test_self_service_sees_only_own_addresses() {
    let app = TestApp::new();
    let admin_cookie = app.login(&admin()).await;
    let mine = add(&app, &admin_cookie, home("u1", "1")).await;
    let theirs = add(&app, &admin_cookie, home("u2", "2")).await;

    let cookie = app.login(&user("u1", &[])).await;

    let (status, body) = app.get("/address/list", &cookie).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["addrs"], json!([mine]));

    let (status, body) = app.get("/address/details", &cookie).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["addr"], mine);

    let uri = format!("/address/details?id={}", mine["id"].as_str().unwrap());
    let (status, body) = app.get(&uri, &cookie).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["addr"], mine);

    let uri = format!("/address/details?id={}", theirs["id"].as_str().unwrap());
    let (status, body) = app.get(&uri, &cookie).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], json!("Address not found"));
}

#[tokio::test]
async fn test_self_service_list_paginates() {
    let app = TestApp::new();
    let admin_cookie = app.login(&admin()).await;
    for nr in ["1", "2", "3"] {
        add(&app, &admin_cookie, home("u1", nr)).await;
    }

    let cookie = app.login(&user("u1", &[])).await;
    let (_, body) = app.get("/address/list?rows=2&skip=1", &cookie).await;
    let nrs: Vec<_> = body["addrs"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["nr"].clone())
        .collect();
    assert_eq!(nrs, vec![json!("2"), json!("3")]);
}

// ============================================================================
// Programmatic add
// ============================================================================

#[tokio::test]
async fn test_unique_programmatic_add_is_visible_over_http() {
    let app = TestApp::new();
    let caller = Caller::new(UserId::new("u1"), DomainCode::new("acme"));
    for nr in ["1", "2"] {
        app.service()
            .add_for_user(
                &caller,
                UserAddress {
                    patch: AddressPatch {
                        kind: Some("invoice".to_string()),
                        address: Some("Via Roma".to_string()),
                        nr: Some(nr.to_string()),
                        ..AddressPatch::default()
                    },
                    unique: true,
                    ..UserAddress::new(UserId::new("u1"))
                },
            )
            .await
            .unwrap();
    }

    let cookie = app.login(&user("u1", &[])).await;
    let (_, body) = app.get("/address/list", &cookie).await;
    let addrs = body["addrs"].as_array().unwrap();
    assert_eq!(addrs.len(), 1);
    assert_eq!(addrs[0]["type"], json!("invoice"));
    assert_eq!(addrs[0]["nr"], json!("2"));
}
