//! Integration tests for Storehouse.
//!
//! Both front ends are driven in-process through their routers against
//! [`MockApi`], a throwaway REST server on an ephemeral port that answers
//! canned envelopes and records every request it receives.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p storehouse-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `storefront` - cart, search and order tracking flows
//! - `admin` - sign-in, permission checks and form guards

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::{BTreeMap, HashMap};
use std::net::IpAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::{
    Json, Router,
    body::{Body, Bytes, to_bytes},
    extract::State,
    http::{HeaderMap, Method, Request, StatusCode, Uri, header},
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use tower::ServiceExt;

/// Timeout handed to both API clients.
const API_TIMEOUT_SECS: &str = "5";

/// Boundary used by [`Browser::post_multipart`].
const MULTIPART_BOUNDARY: &str = "storehouse-test-boundary";

/// One request received by the mock API.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub body: String,
}

impl RecordedCall {
    /// The request body parsed as JSON, `Null` if it was not JSON.
    #[must_use]
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).unwrap_or(Value::Null)
    }

    /// Value of a text part when the body was `multipart/form-data`.
    #[must_use]
    pub fn multipart_text(&self, name: &str) -> Option<&str> {
        let marker = format!("name=\"{name}\"\r\n");
        let start = self.body.find(&marker)?;
        let rest = self.body.get(start..)?;
        let value_start = rest.find("\r\n\r\n")? + 4;
        let value = rest.get(value_start..)?;
        value.find("\r\n").and_then(|end| value.get(..end))
    }

    /// File names of the parts called `name`, in body order.
    #[must_use]
    pub fn multipart_files(&self, name: &str) -> Vec<String> {
        let marker = format!("name=\"{name}\"; filename=\"");
        self.body
            .match_indices(&marker)
            .filter_map(|(at, _)| {
                let rest = self.body.get(at + marker.len()..)?;
                rest.find('"').and_then(|end| rest.get(..end)).map(String::from)
            })
            .collect()
    }
}

type Canned = HashMap<(Method, String), (StatusCode, Value)>;

#[derive(Default)]
struct MockState {
    calls: Mutex<Vec<RecordedCall>>,
    responses: Mutex<Canned>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Stand-in for the REST API.
///
/// Unregistered routes answer `404` with a failure envelope. The category
/// list used by the storefront navigation answers an empty list unless
/// replaced.
#[derive(Clone)]
pub struct MockApi {
    url: String,
    state: Arc<MockState>,
}

impl MockApi {
    /// Bind to an ephemeral port and start serving.
    ///
    /// # Panics
    ///
    /// Panics if no local port can be bound.
    pub async fn start() -> Self {
        let state = Arc::new(MockState::default());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock API");
        let addr = listener.local_addr().expect("Mock API has no address");

        let router = Router::new()
            .fallback(respond)
            .with_state(Arc::clone(&state));
        tokio::spawn(async move { axum::serve(listener, router).await });

        let mock = Self {
            url: format!("http://{addr}"),
            state,
        };
        mock.ok(Method::GET, "/api/product/category", json!([]));
        mock
    }

    /// Base URL the front ends are pointed at.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Answer `method path` with a success envelope around `data`.
    pub fn ok(&self, method: Method, path: &str, data: Value) {
        self.respond_with(
            method,
            path,
            StatusCode::OK,
            json!({ "success": true, "data": data }),
        );
    }

    /// Answer `method path` with a failure envelope.
    pub fn reject(&self, method: Method, path: &str, status: StatusCode, message: &str) {
        self.respond_with(
            method,
            path,
            status,
            json!({ "success": false, "message": message }),
        );
    }

    /// Answer `method path` with an arbitrary body.
    pub fn respond_with(&self, method: Method, path: &str, status: StatusCode, body: Value) {
        lock(&self.state.responses).insert((method, path.to_string()), (status, body));
    }

    /// Every request received so far, oldest first.
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        lock(&self.state.calls).clone()
    }

    /// Requests received for `method path`.
    #[must_use]
    pub fn calls_to(&self, method: &Method, path: &str) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|call| call.method == *method && call.path == path)
            .collect()
    }

    /// Storefront router talking to this mock.
    ///
    /// # Panics
    ///
    /// Panics if the application state cannot be built.
    #[must_use]
    pub fn storefront(&self) -> Router {
        use storehouse_storefront::config::{ApiConfig, StorefrontConfig};
        use storehouse_storefront::state::AppState;

        let config = StorefrontConfig {
            host: IpAddr::from([127, 0, 0, 1]),
            port: 0,
            base_url: "http://localhost:3000".to_string(),
            api: ApiConfig::from_values(Some(&self.url), Some(API_TIMEOUT_SECS))
                .expect("Invalid storefront API config"),
            log_json: false,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 0.0,
            sentry_traces_sample_rate: 0.0,
        };
        let state = AppState::new(config).expect("Failed to build storefront state");
        storehouse_storefront::app(state)
    }

    /// Admin router talking to this mock.
    ///
    /// # Panics
    ///
    /// Panics if the application state cannot be built.
    #[must_use]
    pub fn admin(&self) -> Router {
        use storehouse_admin::config::{AdminConfig, ApiConfig};
        use storehouse_admin::state::AppState;

        let config = AdminConfig {
            host: IpAddr::from([127, 0, 0, 1]),
            port: 0,
            base_url: "http://localhost:3001".to_string(),
            api: ApiConfig::from_values(Some(&self.url), Some(API_TIMEOUT_SECS))
                .expect("Invalid admin API config"),
            log_json: false,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 0.0,
            sentry_traces_sample_rate: 0.0,
        };
        let state = AppState::new(config).expect("Failed to build admin state");
        storehouse_admin::app(state)
    }
}

async fn respond(
    State(state): State<Arc<MockState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let call = RecordedCall {
        method: method.clone(),
        path: uri.path().to_string(),
        query: uri.query().map(String::from),
        authorization: headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(String::from),
        body: String::from_utf8_lossy(&body).into_owned(),
    };
    let canned = lock(&state.responses)
        .get(&(method, call.path.clone()))
        .cloned();
    lock(&state.calls).push(call);

    match canned {
        Some((status, body)) => (status, Json(body)).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "success": false, "message": "Not found" })),
        )
            .into_response(),
    }
}

/// A rendered response.
#[derive(Debug)]
pub struct Page {
    pub status: StatusCode,
    pub location: Option<String>,
    /// Raw `Set-Cookie` header values.
    pub set_cookies: Vec<String>,
    pub body: String,
}

/// One part of a `multipart/form-data` submission.
#[derive(Debug, Clone)]
pub struct FormPart {
    name: String,
    file: Option<(String, String)>,
    bytes: Vec<u8>,
}

impl FormPart {
    #[must_use]
    pub fn text(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            file: None,
            bytes: value.as_bytes().to_vec(),
        }
    }

    #[must_use]
    pub fn file(name: &str, file_name: &str, content_type: &str, bytes: &[u8]) -> Self {
        Self {
            name: name.to_string(),
            file: Some((file_name.to_string(), content_type.to_string())),
            bytes: bytes.to_vec(),
        }
    }

    fn write_to(&self, body: &mut Vec<u8>) {
        body.extend_from_slice(format!("--{MULTIPART_BOUNDARY}\r\n").as_bytes());
        let disposition = match &self.file {
            Some((file_name, content_type)) => format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{file_name}\"\r\n\
                 Content-Type: {content_type}\r\n\r\n",
                self.name
            ),
            None => format!(
                "Content-Disposition: form-data; name=\"{}\"\r\n\r\n",
                self.name
            ),
        };
        body.extend_from_slice(disposition.as_bytes());
        body.extend_from_slice(&self.bytes);
        body.extend_from_slice(b"\r\n");
    }
}

impl Page {
    /// Whether the response redirects to `path`.
    #[must_use]
    pub fn redirects_to(&self, path: &str) -> bool {
        self.status.is_redirection() && self.location.as_deref() == Some(path)
    }
}

/// Drives a router the way a browser would, keeping cookies between
/// requests.
pub struct Browser {
    app: Router,
    cookies: BTreeMap<String, String>,
}

impl Browser {
    #[must_use]
    pub const fn new(app: Router) -> Self {
        Self {
            app,
            cookies: BTreeMap::new(),
        }
    }

    /// Current value of a cookie.
    #[must_use]
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    /// # Panics
    ///
    /// Panics if the request cannot be built.
    pub async fn get(&mut self, uri: &str) -> Page {
        let request = self
            .request(Method::GET, uri)
            .body(Body::empty())
            .expect("Invalid GET request");
        self.send(request).await
    }

    /// Submit a URL-encoded form.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built.
    pub async fn post_form(&mut self, uri: &str, fields: &[(&str, &str)]) -> Page {
        let body = fields
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");
        let request = self
            .request(Method::POST, uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .expect("Invalid POST request");
        self.send(request).await
    }

    /// Submit a `multipart/form-data` body.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built.
    pub async fn post_multipart(&mut self, uri: &str, parts: &[FormPart]) -> Page {
        let mut body = Vec::new();
        for part in parts {
            part.write_to(&mut body);
        }
        body.extend_from_slice(format!("--{MULTIPART_BOUNDARY}--\r\n").as_bytes());

        let request = self
            .request(Method::POST, uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={MULTIPART_BOUNDARY}"),
            )
            .body(Body::from(body))
            .expect("Invalid multipart request");
        self.send(request).await
    }

    fn request(&self, method: Method, uri: &str) -> axum::http::request::Builder {
        let builder = Request::builder().method(method).uri(uri);
        if self.cookies.is_empty() {
            return builder;
        }
        let cookie = self
            .cookies
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("; ");
        builder.header(header::COOKIE, cookie)
    }

    async fn send(&mut self, request: Request<Body>) -> Page {
        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .unwrap_or_else(|never| match never {});

        self.store_cookies(response.headers());
        let set_cookies = response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(String::from)
            .collect();
        let status = response.status();
        let location = response
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read response body");

        Page {
            status,
            location,
            set_cookies,
            body: String::from_utf8_lossy(&body).into_owned(),
        }
    }

    fn store_cookies(&mut self, headers: &HeaderMap) {
        for value in headers.get_all(header::SET_COOKIE) {
            let Ok(value) = value.to_str() else {
                continue;
            };
            let mut parts = value.split(';').map(str::trim);
            let Some((name, cookie)) = parts.next().and_then(|pair| pair.split_once('=')) else {
                continue;
            };
            let expired = parts.any(|attr| attr.eq_ignore_ascii_case("max-age=0"));
            if expired {
                self.cookies.remove(name);
            } else {
                self.cookies.insert(name.to_string(), cookie.to_string());
            }
        }
    }
}

/// An active product as the catalog endpoints return it.
#[must_use]
pub fn product_json(id: &str, name: &str, price: u32) -> Value {
    json!({
        "_id": id,
        "name": name,
        "description": "",
        "category": { "_id": "c1", "name": "Hats" },
        "price": price,
        "images": [{ "url": format!("/uploads/{id}.jpg"), "position": 0 }],
        "status": "active",
        "stock": 20
    })
}

/// A guest order as the tracking and admin endpoints return it.
#[must_use]
pub fn order_json(id: &str, code: &str, status: &str) -> Value {
    json!({
        "_id": id,
        "orderCode": code,
        "customer": null,
        "shippingInfo": {
            "fullName": "Ada Lovelace",
            "email": "ada@example.com",
            "phone": "555-0100",
            "address": "1 Loop St"
        },
        "items": [
            {
                "product": { "_id": "p1", "name": "Canvas Cap" },
                "quantity": 2,
                "price": 10,
                "total": 20
            }
        ],
        "total": 20,
        "status": status,
        "paymentStatus": "pending",
        "paymentMethod": "cod",
        "createdAt": "2026-05-01T10:00:00Z"
    })
}
