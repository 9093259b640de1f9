//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Home page
//! GET  /health                 - Health check
//!
//! # Products
//! GET  /products               - Product listing (?page, ?category, ?q)
//! GET  /products/{id}          - Product detail
//!
//! # Cart
//! GET  /cart                   - Cart page
//! POST /cart/add               - Add to cart
//! POST /cart/update            - Replace a line quantity (0 removes)
//! POST /cart/remove            - Remove a line
//! GET  /cart/count             - Cart count badge (fragment)
//!
//! # Checkout
//! GET  /checkout               - Checkout form
//! POST /checkout               - Place order
//!
//! # Order tracking
//! GET  /track                  - Current tracking step
//! POST /track/otp              - Request a code for an email
//! POST /track/lookup           - Submit the code
//! POST /track/back             - Start over
//!
//! # Auth
//! GET  /auth/login             - Login page
//! POST /auth/login             - Login action
//! GET  /auth/register          - Register page
//! POST /auth/register          - Register action
//! POST /auth/logout            - Logout action
//!
//! # Account (requires auth)
//! GET  /account                - Order history
//! GET  /account/orders/{id}    - Order detail
//! ```

pub mod account;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod home;
pub mod products;
pub mod track;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use storehouse_core::{Category, Notice};
use tower_sessions::Session;

use crate::models::CurrentCustomer;
use crate::services::notice;
use crate::state::AppState;

/// Data every page template needs: navigation, who is signed in, and the
/// dialog to show.
#[derive(Debug, Clone)]
pub struct Layout {
    pub customer_name: Option<String>,
    pub categories: Arc<Vec<Category>>,
    pub notice: Option<Notice>,
}

impl Layout {
    /// Build the layout, taking any notice left by a redirect.
    pub async fn load(
        state: &AppState,
        session: &Session,
        customer: Option<&CurrentCustomer>,
    ) -> Self {
        Self {
            customer_name: customer.map(|c| c.name.clone()),
            categories: state.categories().await,
            notice: notice::take(session).await,
        }
    }

    /// Show `notice` instead of any pending one.
    #[must_use]
    pub fn with_notice(mut self, notice: Notice) -> Self {
        self.notice = Some(notice);
        self
    }
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{id}", get(products::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/count", get(cart::count))
}

/// Create the order tracking routes router.
pub fn track_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(track::show))
        .route("/otp", post(track::request_otp))
        .route("/lookup", post(track::lookup))
        .route("/back", post(track::back))
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/register", get(auth::register_page).post(auth::register))
        .route("/logout", post(auth::logout))
}

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(account::index))
        .route("/orders/{id}", get(account::order))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .nest("/products", product_routes())
        .nest("/cart", cart_routes())
        .route("/checkout", get(checkout::show).post(checkout::place))
        .nest("/track", track_routes())
        .nest("/account", account_routes())
        .nest("/auth", auth_routes())
}
