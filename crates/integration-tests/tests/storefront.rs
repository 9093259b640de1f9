//! Storefront flows against the mock REST API.

use axum::http::{Method, StatusCode};
use serde_json::json;
use storehouse_core::cart::GuestCart;
use storehouse_integration_tests::{Browser, MockApi, order_json, product_json};

fn guest_cart(browser: &Browser) -> GuestCart {
    browser
        .cookie(GuestCart::COOKIE_NAME)
        .map(|raw| GuestCart::from_cookie_value(raw).expect("cart cookie decodes"))
        .unwrap_or_default()
}

/// A guest browser holding two caps in the cookie cart.
async fn guest_with_cart(api: &MockApi) -> Browser {
    api.ok(Method::GET, "/api/product/p1", product_json("p1", "Canvas Cap", 10));
    let mut browser = Browser::new(api.storefront());
    browser
        .post_form("/cart/add", &[("product_id", "p1"), ("quantity", "2")])
        .await;
    assert!(browser.cookie("cart").is_some());
    browser
}

const CHECKOUT_FIELDS: &[(&str, &str)] = &[
    ("full_name", "Ada Lovelace"),
    ("email", "Ada@Example.com"),
    ("phone", "555-010-2030"),
    ("address", "1 Loop St"),
    ("payment_method", "cod"),
    ("promotion_code", " spring26 "),
    ("note", ""),
];

async fn sign_in_customer(api: &MockApi) -> Browser {
    api.ok(
        Method::POST,
        "/api/auth/login",
        json!({
            "token": "customer-token",
            "user": { "_id": "u1", "name": "Ada", "email": "ada@example.com" }
        }),
    );
    let mut browser = Browser::new(api.storefront());
    let page = browser
        .post_form(
            "/auth/login",
            &[("identifier", "ada@example.com"), ("password", "secret")],
        )
        .await;
    assert!(page.redirects_to("/"));
    browser
}

async fn request_code(browser: &mut Browser, api: &MockApi) {
    api.ok(Method::POST, "/api/order/tracking/otp", json!(null));
    let page = browser
        .post_form("/track/otp", &[("email", "ada@example.com")])
        .await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("We sent a code to ada@example.com."));
}

#[tokio::test]
async fn test_health() {
    let api = MockApi::start().await;
    let mut browser = Browser::new(api.storefront());

    let page = browser.get("/health").await;
    assert_eq!(page.status, StatusCode::OK);
    assert_eq!(page.body, "ok");
}

#[tokio::test]
async fn test_guest_cart_accumulates_in_cookie() {
    let api = MockApi::start().await;
    api.ok(Method::GET, "/api/product/p1", product_json("p1", "Canvas Cap", 10));
    let mut browser = Browser::new(api.storefront());

    let page = browser
        .post_form("/cart/add", &[("product_id", "p1"), ("quantity", "2")])
        .await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("Added to your cart."));
    assert_eq!(guest_cart(&browser).item_count(), 2);

    browser
        .post_form("/cart/add", &[("product_id", "p1"), ("quantity", "3")])
        .await;
    let cart = guest_cart(&browser);
    assert_eq!(cart.items().len(), 1);
    assert_eq!(cart.item_count(), 5);
    assert_eq!(cart.items()[0].name, "Canvas Cap");

    // Guests never touch the server cart.
    assert!(api.calls_to(&Method::POST, "/api/cart").is_empty());
    assert!(api.calls_to(&Method::GET, "/api/cart").is_empty());
}

#[tokio::test]
async fn test_guest_cart_quantity_zero_removes_line() {
    let api = MockApi::start().await;
    api.ok(Method::GET, "/api/product/p1", product_json("p1", "Canvas Cap", 10));
    let mut browser = Browser::new(api.storefront());

    browser
        .post_form("/cart/add", &[("product_id", "p1"), ("quantity", "1")])
        .await;
    assert!(browser.cookie("cart").is_some());

    let page = browser
        .post_form("/cart/update", &[("product_id", "p1"), ("quantity", "0")])
        .await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("Your cart is empty."));
    assert!(browser.cookie("cart").is_none());
}

#[tokio::test]
async fn test_unavailable_product_is_not_added() {
    let api = MockApi::start().await;
    let mut product = product_json("p2", "Wool Scarf", 30);
    product["stock"] = json!(0);
    api.ok(Method::GET, "/api/product/p2", product);
    let mut browser = Browser::new(api.storefront());

    let page = browser
        .post_form("/cart/add", &[("product_id", "p2")])
        .await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("Wool Scarf is not available right now"));
    assert!(browser.cookie("cart").is_none());
}

#[tokio::test]
async fn test_search_uses_search_endpoint_only() {
    let api = MockApi::start().await;
    api.ok(
        Method::GET,
        "/api/product/search",
        json!([product_json("p1", "Canvas Cap", 10)]),
    );
    let mut browser = Browser::new(api.storefront());

    let page = browser.get("/products?q=cap").await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("Canvas Cap"));

    let searches = api.calls_to(&Method::GET, "/api/product/search");
    assert_eq!(searches.len(), 1);
    assert_eq!(searches[0].query.as_deref(), Some("q=cap"));
    assert!(api.calls_to(&Method::GET, "/api/product").is_empty());
}

#[tokio::test]
async fn test_listing_failure_shows_dialog() {
    let api = MockApi::start().await;
    api.reject(
        Method::GET,
        "/api/product",
        StatusCode::SERVICE_UNAVAILABLE,
        "Catalog is being updated",
    );
    let mut browser = Browser::new(api.storefront());

    let page = browser.get("/products").await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("Catalog is being updated"));
}

#[tokio::test]
async fn test_tracking_empty_code_makes_no_request() {
    let api = MockApi::start().await;
    let mut browser = Browser::new(api.storefront());
    request_code(&mut browser, &api).await;

    let sent = api.calls_to(&Method::POST, "/api/order/tracking/otp");
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].json(), json!({ "email": "ada@example.com" }));

    let page = browser.post_form("/track/lookup", &[("otp", "   ")]).await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("Please enter the code we emailed you"));
    assert!(api.calls_to(&Method::POST, "/api/order/tracking").is_empty());
}

#[tokio::test]
async fn test_tracking_invalid_email_makes_no_request() {
    let api = MockApi::start().await;
    let mut browser = Browser::new(api.storefront());

    let page = browser
        .post_form("/track/otp", &[("email", "not-an-email")])
        .await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("Please enter a valid email address"));
    assert!(api.calls().iter().all(|c| c.path != "/api/order/tracking/otp"));
}

#[tokio::test]
async fn test_tracking_shows_orders_for_code() {
    let api = MockApi::start().await;
    api.ok(
        Method::POST,
        "/api/order/tracking",
        json!([order_json("o1", "SH-1001", "shipped")]),
    );
    let mut browser = Browser::new(api.storefront());
    request_code(&mut browser, &api).await;

    let page = browser.post_form("/track/lookup", &[("otp", " 482913 ")]).await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("Your orders"));
    assert!(page.body.contains("SH-1001"));
    assert!(page.body.contains("Shipped"));

    let lookups = api.calls_to(&Method::POST, "/api/order/tracking");
    assert_eq!(lookups.len(), 1);
    assert_eq!(
        lookups[0].json(),
        json!({ "email": "ada@example.com", "otp": "482913" })
    );
}

#[tokio::test]
async fn test_tracking_without_orders_shows_notice() {
    let api = MockApi::start().await;
    api.ok(Method::POST, "/api/order/tracking", json!([]));
    let mut browser = Browser::new(api.storefront());
    request_code(&mut browser, &api).await;

    let page = browser.post_form("/track/lookup", &[("otp", "482913")]).await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("No orders were found for ada@example.com."));
    assert!(!page.body.contains("Your orders"));
}

#[tokio::test]
async fn test_tracking_wrong_code_shows_server_message() {
    let api = MockApi::start().await;
    api.reject(
        Method::POST,
        "/api/order/tracking",
        StatusCode::BAD_REQUEST,
        "The code has expired",
    );
    let mut browser = Browser::new(api.storefront());
    request_code(&mut browser, &api).await;

    let page = browser.post_form("/track/lookup", &[("otp", "111111")]).await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("The code has expired"));
}

#[tokio::test]
async fn test_failed_cart_write_refetches_server_cart() {
    let api = MockApi::start().await;
    api.reject(
        Method::POST,
        "/api/cart",
        StatusCode::BAD_REQUEST,
        "Only 2 left in stock",
    );
    api.ok(
        Method::GET,
        "/api/cart",
        json!({
            "items": [
                { "product": { "_id": "p1", "name": "Canvas Cap" }, "quantity": 2, "price": 10 }
            ],
            "total": 20
        }),
    );
    let mut browser = sign_in_customer(&api).await;

    let page = browser
        .post_form("/cart/update", &[("product_id", "p1"), ("quantity", "5")])
        .await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("Only 2 left in stock"));
    assert!(page.body.contains("Canvas Cap"));

    let cart_calls: Vec<_> = api
        .calls()
        .into_iter()
        .filter(|c| c.path == "/api/cart")
        .collect();
    assert_eq!(cart_calls.len(), 2);
    assert_eq!(cart_calls[0].method, Method::POST);
    assert_eq!(cart_calls[0].json(), json!({ "productId": "p1", "quantity": 5 }));
    assert_eq!(cart_calls[1].method, Method::GET);
    assert!(
        cart_calls
            .iter()
            .all(|c| c.authorization.as_deref() == Some("Bearer customer-token"))
    );
}

#[tokio::test]
async fn test_unreadable_server_cart_shows_dialog_on_add() {
    let api = MockApi::start().await;
    api.reject(
        Method::GET,
        "/api/cart",
        StatusCode::SERVICE_UNAVAILABLE,
        "Cart service is busy",
    );
    let mut browser = sign_in_customer(&api).await;

    let page = browser
        .post_form("/cart/add", &[("product_id", "p1"), ("quantity", "1")])
        .await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("Cart service is busy"));
    assert!(page.body.contains("Your cart is empty."));
    assert!(api.calls_to(&Method::POST, "/api/cart").is_empty());
}

#[tokio::test]
async fn test_guest_checkout_sends_cookie_lines_and_clears_cart() {
    let api = MockApi::start().await;
    api.ok(
        Method::POST,
        "/api/order",
        order_json("o9", "SH-2001", "pending"),
    );
    let mut browser = guest_with_cart(&api).await;

    let page = browser.post_form("/checkout", CHECKOUT_FIELDS).await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("SH-2001"));
    assert!(
        page.set_cookies
            .iter()
            .any(|c| c.starts_with("cart=;") && c.contains("Max-Age=0")),
        "cart cookie not cleared: {:?}",
        page.set_cookies
    );
    assert!(browser.cookie("cart").is_none());

    let orders = api.calls_to(&Method::POST, "/api/order");
    assert_eq!(orders.len(), 1);
    let body = orders[0].json();
    assert_eq!(body["items"], json!([{ "productId": "p1", "quantity": 2 }]));
    assert_eq!(body["promotionCode"], "SPRING26");
    assert_eq!(body["paymentMethod"], "cod");
    assert_eq!(body["shippingInfo"]["email"], "ada@example.com");
    assert!(orders[0].authorization.is_none());
}

#[tokio::test]
async fn test_checkout_with_empty_cart_goes_back_to_cart() {
    let api = MockApi::start().await;
    let mut browser = Browser::new(api.storefront());

    let page = browser.post_form("/checkout", CHECKOUT_FIELDS).await;
    assert!(page.redirects_to("/cart"));
    assert!(api.calls_to(&Method::POST, "/api/order").is_empty());

    let page = browser.get("/cart").await;
    assert!(page.body.contains("Your cart is empty."));
}

#[tokio::test]
async fn test_invalid_checkout_contact_rerenders_form() {
    let api = MockApi::start().await;
    let mut browser = guest_with_cart(&api).await;

    let page = browser
        .post_form(
            "/checkout",
            &[
                ("full_name", "Ada Lovelace"),
                ("email", "not-an-email"),
                ("phone", ""),
                ("address", "1 Loop St"),
                ("payment_method", "cod"),
            ],
        )
        .await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("Phone is required"));
    assert!(page.body.contains("Ada Lovelace"));
    assert!(api.calls_to(&Method::POST, "/api/order").is_empty());
    assert!(browser.cookie("cart").is_some());
}
