//! Admin panel flows against the mock REST API.

use axum::http::{Method, StatusCode};
use serde_json::{Value, json};
use storehouse_integration_tests::{Browser, FormPart, MockApi, order_json};

fn profile(permissions: Value) -> Value {
    json!({
        "_id": "a1",
        "username": "ops",
        "fullName": "Olive Ops",
        "roleName": "Operations",
        "permissions": permissions
    })
}

/// Sign in as an admin holding `permissions`.
async fn signed_in(api: &MockApi, permissions: Value) -> Browser {
    api.ok(
        Method::POST,
        "/admin/auth/login",
        json!({ "token": "admin-token", "admin": profile(permissions) }),
    );
    let mut browser = Browser::new(api.admin());

    let page = browser
        .post_form(
            "/auth/login",
            &[("identifier", "ops"), ("password", "hunter22")],
        )
        .await;
    assert!(page.redirects_to("/"), "sign-in failed: {page:?}");
    browser
}

fn order_manager() -> Value {
    json!([{ "module": "order", "capabilities": ["view", "update"] }])
}

fn promotion_manager() -> Value {
    json!([{ "module": "promotion", "capabilities": ["view", "create", "update"] }])
}

fn product_manager() -> Value {
    json!([{ "module": "product", "capabilities": ["view", "create", "update"] }])
}

fn product_fields() -> Vec<FormPart> {
    vec![
        FormPart::text("name", "Linen Shirt"),
        FormPart::text("category_id", "c1"),
        FormPart::text("price", "45"),
        FormPart::text("status", "active"),
    ]
}

#[tokio::test]
async fn test_pages_require_sign_in() {
    let api = MockApi::start().await;
    let mut browser = Browser::new(api.admin());

    let page = browser.get("/orders").await;
    assert!(page.redirects_to("/auth/login"));
    assert!(api.calls().iter().all(|c| !c.path.starts_with("/admin/order")));
}

#[tokio::test]
async fn test_rejected_sign_in_shows_message() {
    let api = MockApi::start().await;
    api.reject(
        Method::POST,
        "/admin/auth/login",
        StatusCode::UNAUTHORIZED,
        "Invalid username or password",
    );
    let mut browser = Browser::new(api.admin());

    let page = browser
        .post_form("/auth/login", &[("identifier", "ops"), ("password", "nope")])
        .await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("Invalid username or password"));

    let page = browser.get("/").await;
    assert!(page.redirects_to("/auth/login"));
}

#[tokio::test]
async fn test_blank_sign_in_makes_no_request() {
    let api = MockApi::start().await;
    let mut browser = Browser::new(api.admin());

    let page = browser
        .post_form("/auth/login", &[("identifier", " "), ("password", "")])
        .await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("Password is required"));
    assert!(api.calls_to(&Method::POST, "/admin/auth/login").is_empty());
}

#[tokio::test]
async fn test_missing_permission_is_forbidden_without_request() {
    let api = MockApi::start().await;
    let mut browser = signed_in(&api, order_manager()).await;

    let page = browser.get("/roles").await;
    assert_eq!(page.status, StatusCode::FORBIDDEN);
    assert!(api.calls().iter().all(|c| !c.path.starts_with("/admin/role")));
}

#[tokio::test]
async fn test_unchanged_order_status_sends_nothing() {
    let api = MockApi::start().await;
    api.ok(
        Method::GET,
        "/admin/order/o1",
        order_json("o1", "SH-1001", "shipped"),
    );
    let mut browser = signed_in(&api, order_manager()).await;

    let page = browser
        .post_form(
            "/orders/o1/status",
            &[("current", "shipped"), ("status", "shipped")],
        )
        .await;
    assert!(page.redirects_to("/orders/o1"));
    assert!(api.calls_to(&Method::PATCH, "/admin/order/o1/status").is_empty());

    let page = browser.get("/orders/o1").await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("The order is already shipped."));
}

#[tokio::test]
async fn test_order_status_change_is_stamped() {
    let api = MockApi::start().await;
    api.ok(Method::PATCH, "/admin/order/o1/status", json!(null));
    api.ok(
        Method::GET,
        "/admin/order/o1",
        order_json("o1", "SH-1001", "delivered"),
    );
    let mut browser = signed_in(&api, order_manager()).await;

    let page = browser
        .post_form(
            "/orders/o1/status",
            &[("current", "shipped"), ("status", "delivered")],
        )
        .await;
    assert!(page.redirects_to("/orders/o1"));

    let patches = api.calls_to(&Method::PATCH, "/admin/order/o1/status");
    assert_eq!(patches.len(), 1);
    assert_eq!(
        patches[0].json(),
        json!({ "status": "delivered", "updatedBy": "a1" })
    );
    assert_eq!(
        patches[0].authorization.as_deref(),
        Some("Bearer admin-token")
    );

    let page = browser.get("/orders/o1").await;
    assert!(page.body.contains("Order status changed to Delivered."));
}

#[tokio::test]
async fn test_unknown_order_status_is_bad_request() {
    let api = MockApi::start().await;
    let mut browser = signed_in(&api, order_manager()).await;

    let page = browser
        .post_form(
            "/orders/o1/status",
            &[("current", "shipped"), ("status", "lost")],
        )
        .await;
    assert_eq!(page.status, StatusCode::BAD_REQUEST);
    assert!(api.calls().iter().all(|c| c.method != Method::PATCH));
}

#[tokio::test]
async fn test_expired_token_signs_out() {
    let api = MockApi::start().await;
    api.reject(
        Method::GET,
        "/admin/order",
        StatusCode::UNAUTHORIZED,
        "jwt expired",
    );
    let mut browser = signed_in(&api, order_manager()).await;

    let page = browser.get("/orders").await;
    assert!(page.redirects_to("/auth/login"));

    let page = browser.get("/").await;
    assert!(page.redirects_to("/auth/login"));
}

#[tokio::test]
async fn test_promotion_window_checked_before_request() {
    let api = MockApi::start().await;
    let mut browser = signed_in(&api, promotion_manager()).await;

    let page = browser
        .post_form(
            "/promotions",
            &[
                ("code", "SUMMER10"),
                ("discount_type", "percent"),
                ("discount_value", "10"),
                ("min_order_value", "0"),
                ("start_date", "2026-09-01T00:00"),
                ("end_date", "2026-06-01T00:00"),
                ("status", "active"),
            ],
        )
        .await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("End date must be after the start date"));
    assert!(page.body.contains("SUMMER10"));
    assert!(api.calls_to(&Method::POST, "/admin/promotion").is_empty());
}

#[tokio::test]
async fn test_promotion_created_with_actor() {
    let api = MockApi::start().await;
    api.ok(Method::POST, "/admin/promotion", json!({ "_id": "pr1" }));
    let mut browser = signed_in(&api, promotion_manager()).await;

    let page = browser
        .post_form(
            "/promotions",
            &[
                ("code", "SUMMER10"),
                ("discount_type", "percent"),
                ("discount_value", "10"),
                ("min_order_value", "0"),
                ("start_date", "2026-06-01T00:00"),
                ("end_date", "2026-09-01T00:00"),
                ("status", "active"),
            ],
        )
        .await;
    assert!(page.redirects_to("/promotions"));

    let created = api.calls_to(&Method::POST, "/admin/promotion");
    assert_eq!(created.len(), 1);
    let body = created[0].json();
    assert_eq!(body["code"], "SUMMER10");
    assert_eq!(body["discountType"], "percent");
    assert_eq!(body["createdBy"], "a1");
    assert!(body.get("updatedBy").is_none());
}

#[tokio::test]
async fn test_promotion_rejection_keeps_form() {
    let api = MockApi::start().await;
    api.reject(
        Method::POST,
        "/admin/promotion",
        StatusCode::CONFLICT,
        "Promotion code already exists",
    );
    let mut browser = signed_in(&api, promotion_manager()).await;

    let page = browser
        .post_form(
            "/promotions",
            &[
                ("code", "SUMMER10"),
                ("discount_type", "amount"),
                ("discount_value", "5"),
                ("min_order_value", "20"),
                ("start_date", "2026-06-01T00:00"),
                ("end_date", "2026-09-01T00:00"),
                ("status", "active"),
            ],
        )
        .await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("Promotion code already exists"));
    assert!(page.body.contains("SUMMER10"));
}

#[tokio::test]
async fn test_rejected_image_type_keeps_product_form() {
    let api = MockApi::start().await;
    api.ok(
        Method::GET,
        "/admin/product/category",
        json!([{ "_id": "c1", "name": "Shirts" }]),
    );
    let mut browser = signed_in(&api, product_manager()).await;

    let mut parts = product_fields();
    parts.push(FormPart::file("images", "front.png", "image/png", b"png-front"));
    parts.push(FormPart::file("images", "back.jpg", "image/jpeg", b"jpg-back"));
    parts.push(FormPart::file("images", "scan.bmp", "image/bmp", b"bmp-scan"));

    let page = browser.post_multipart("/products", &parts).await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(
        page.body
            .contains("scan.bmp: only JPEG, PNG, WebP and GIF images are allowed")
    );
    assert!(page.body.contains("Linen Shirt"));
    assert!(api.calls_to(&Method::POST, "/admin/product").is_empty());
}

#[tokio::test]
async fn test_product_created_with_images_in_upload_order() {
    let api = MockApi::start().await;
    api.ok(Method::POST, "/admin/product", json!({ "_id": "p9" }));
    let mut browser = signed_in(&api, product_manager()).await;

    let mut parts = product_fields();
    parts.push(FormPart::file("images", "front.png", "image/png", b"png-front"));
    parts.push(FormPart::file("images", "back.jpg", "image/jpeg", b"jpg-back"));

    let page = browser.post_multipart("/products", &parts).await;
    assert!(page.redirects_to("/products"), "create failed: {page:?}");

    let created = api.calls_to(&Method::POST, "/admin/product");
    assert_eq!(created.len(), 1);
    let call = &created[0];
    assert_eq!(call.multipart_files("images"), vec!["front.png", "back.jpg"]);
    assert_eq!(call.multipart_text("name"), Some("Linen Shirt"));
    assert_eq!(call.multipart_text("category"), Some("c1"));
    assert_eq!(call.multipart_text("createdBy"), Some("a1"));
    assert_eq!(call.multipart_text("updatedBy"), None);
    assert_eq!(call.authorization.as_deref(), Some("Bearer admin-token"));
}
