//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                            - Dashboard
//! GET  /health                      - Health check
//!
//! # Auth
//! GET  /auth/login                  - Login page
//! POST /auth/login                  - Login action
//! POST /auth/logout                 - Logout action
//!
//! # Products
//! GET  /products                    - Product list (?page, ?category)
//! GET  /products/new                - Create form
//! POST /products                    - Create (multipart)
//! GET  /products/{id}/edit          - Edit form
//! POST /products/{id}               - Update (multipart)
//! POST /products/{id}/delete        - Delete
//!
//! # Categories, roles, accounts, promotions
//! GET  /{resource}                  - List
//! GET  /{resource}/new              - Create form
//! POST /{resource}                  - Create
//! GET  /{resource}/{id}/edit        - Edit form
//! POST /{resource}/{id}             - Update
//! POST /{resource}/{id}/delete      - Delete
//!
//! # Orders
//! GET  /orders                      - Order list (?status, ?page)
//! GET  /orders/{id}                 - Order detail
//! POST /orders/{id}/status          - Change order status
//! POST /orders/{id}/payment-status  - Change payment status
//! ```
//!
//! HTML forms cannot send PUT or DELETE, so updates and deletes are POSTs to
//! the record's path.

pub mod accounts;
pub mod auth;
pub mod categories;
pub mod dashboard;
pub mod orders;
pub mod products;
pub mod promotions;
pub mod roles;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use storehouse_core::validation::MAX_IMAGE_BYTES;
use storehouse_core::{Capability, Module, Notice, Page};
use tower_sessions::Session;

use crate::models::CurrentAdmin;
use crate::services::notice;
use crate::state::AppState;

/// Most images one product form may carry.
const MAX_IMAGES_PER_REQUEST: usize = 10;

/// One sidebar entry.
#[derive(Debug, Clone)]
pub struct NavLink {
    pub href: &'static str,
    pub label: &'static str,
    pub active: bool,
}

/// Path of the list page for a module.
#[must_use]
pub const fn module_path(module: Module) -> &'static str {
    match module {
        Module::Product => "/products",
        Module::Category => "/categories",
        Module::Order => "/orders",
        Module::Promotion => "/promotions",
        Module::Role => "/roles",
        Module::Account => "/accounts",
    }
}

/// Data every page template needs: who is signed in, the sidebar and the
/// dialog to show.
#[derive(Debug, Clone, Default)]
pub struct Layout {
    pub admin_name: Option<String>,
    pub role_name: Option<String>,
    pub nav: Vec<NavLink>,
    pub notice: Option<Notice>,
}

impl Layout {
    /// Build the layout for a signed-in admin, taking any pending notice.
    ///
    /// The sidebar only lists modules the admin's role can view.
    pub async fn load(session: &Session, admin: &CurrentAdmin, active: Option<Module>) -> Self {
        let nav = Module::ALL
            .iter()
            .copied()
            .filter(|&module| admin.can(module, Capability::View))
            .map(|module| NavLink {
                href: module_path(module),
                label: module.label(),
                active: active == Some(module),
            })
            .collect();

        Self {
            admin_name: Some(admin.profile.display_name().to_string()),
            role_name: admin.profile.role_name.clone(),
            nav,
            notice: notice::take(session).await,
        }
    }

    /// Layout for the signed-out login page.
    pub async fn guest(session: &Session) -> Self {
        Self {
            notice: notice::take(session).await,
            ..Self::default()
        }
    }

    /// Show `notice` instead of any pending one.
    #[must_use]
    pub fn with_notice(mut self, notice: Notice) -> Self {
        self.notice = Some(notice);
        self
    }
}

/// Which write buttons a list page shows.
#[derive(Debug, Clone, Copy)]
pub struct Actions {
    pub create: bool,
    pub update: bool,
    pub delete: bool,
}

impl Actions {
    #[must_use]
    pub fn for_module(admin: &CurrentAdmin, module: Module) -> Self {
        Self {
            create: admin.can(module, Capability::Create),
            update: admin.can(module, Capability::Update),
            delete: admin.can(module, Capability::Delete),
        }
    }
}

/// Path of one record under a list path.
#[must_use]
pub fn record_path(base: &str, id: &str) -> String {
    format!("{base}/{}", urlencoding::encode(id))
}

/// An `<option>` of a select box.
#[derive(Debug, Clone)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

/// Options for a wire enum, selecting `selected` or else the first one.
pub fn enum_options<T: Copy>(
    all: &[T],
    selected: &str,
    wire: fn(T) -> &'static str,
    label: fn(T) -> &'static str,
) -> Vec<SelectOption> {
    all.iter()
        .enumerate()
        .map(|(i, &item)| SelectOption {
            value: wire(item).to_string(),
            label: label(item).to_string(),
            selected: wire(item) == selected || (selected.is_empty() && i == 0),
        })
        .collect()
}

/// Options for a list of records, with a leading blank "choose" entry.
pub fn record_options<'a>(
    records: impl IntoIterator<Item = (&'a str, &'a str)>,
    selected: &str,
    placeholder: &str,
) -> Vec<SelectOption> {
    std::iter::once(SelectOption {
        value: String::new(),
        label: placeholder.to_string(),
        selected: selected.is_empty(),
    })
    .chain(records.into_iter().map(|(id, name)| SelectOption {
        value: id.to_string(),
        label: name.to_string(),
        selected: id == selected,
    }))
    .collect()
}

/// Previous/next links under a paged table.
#[derive(Debug, Clone)]
pub struct Pagination {
    pub page: u32,
    pub total_pages: u32,
    pub prev_href: Option<String>,
    pub next_href: Option<String>,
}

impl Pagination {
    /// `base` is the list path including any other query parameters, ending
    /// in `?` or `&`.
    #[must_use]
    pub fn new<T>(page: &Page<T>, base: &str) -> Self {
        Self {
            page: page.page,
            total_pages: page.total_pages(),
            prev_href: (page.page > 1).then(|| format!("{base}page={}", page.page - 1)),
            next_href: page
                .has_next()
                .then(|| format!("{base}page={}", page.page + 1)),
        }
    }
}

/// Format an optional API timestamp for a table cell.
#[must_use]
pub fn format_date(value: Option<chrono::DateTime<chrono::Utc>>) -> String {
    value.map_or_else(String::new, |dt| dt.format("%Y-%m-%d %H:%M").to_string())
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", post(auth::logout))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index).post(products::create))
        .route("/new", get(products::new))
        .route("/{id}", post(products::update))
        .route("/{id}/edit", get(products::edit))
        .route("/{id}/delete", post(products::delete))
        .layer(DefaultBodyLimit::max(
            MAX_IMAGE_BYTES * MAX_IMAGES_PER_REQUEST + 64 * 1024,
        ))
}

/// Create the category routes router.
pub fn category_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(categories::index).post(categories::create))
        .route("/new", get(categories::new))
        .route("/{id}", post(categories::update))
        .route("/{id}/edit", get(categories::edit))
        .route("/{id}/delete", post(categories::delete))
}

/// Create the role routes router.
pub fn role_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(roles::index).post(roles::create))
        .route("/new", get(roles::new))
        .route("/{id}", post(roles::update))
        .route("/{id}/edit", get(roles::edit))
        .route("/{id}/delete", post(roles::delete))
}

/// Create the admin account routes router.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(accounts::index).post(accounts::create))
        .route("/new", get(accounts::new))
        .route("/{id}", post(accounts::update))
        .route("/{id}/edit", get(accounts::edit))
        .route("/{id}/delete", post(accounts::delete))
}

/// Create the promotion routes router.
pub fn promotion_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(promotions::index).post(promotions::create))
        .route("/new", get(promotions::new))
        .route("/{id}", post(promotions::update))
        .route("/{id}/edit", get(promotions::edit))
        .route("/{id}/delete", post(promotions::delete))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index))
        .route("/{id}", get(orders::show))
        .route("/{id}/status", post(orders::update_status))
        .route("/{id}/payment-status", post(orders::update_payment_status))
}

/// Create all routes for the admin panel.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard::dashboard))
        .nest("/auth", auth_routes())
        .nest("/products", product_routes())
        .nest("/categories", category_routes())
        .nest("/roles", role_routes())
        .nest("/accounts", account_routes())
        .nest("/promotions", promotion_routes())
        .nest("/orders", order_routes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use storehouse_core::ActiveStatus;

    #[test]
    fn test_enum_options_default_to_first() {
        let options = enum_options(
            ActiveStatus::ALL,
            "",
            ActiveStatus::as_str,
            ActiveStatus::label,
        );
        assert_eq!(options.len(), 2);
        assert!(options[0].selected);
        assert!(!options[1].selected);

        let options = enum_options(
            ActiveStatus::ALL,
            "inactive",
            ActiveStatus::as_str,
            ActiveStatus::label,
        );
        assert!(!options[0].selected);
        assert!(options[1].selected);
    }

    #[test]
    fn test_record_options_placeholder() {
        let options = record_options(
            [("c1", "Shoes"), ("c2", "Hats")],
            "c2",
            "Choose a category",
        );
        assert_eq!(options.len(), 3);
        assert_eq!(options[0].label, "Choose a category");
        assert!(!options[0].selected);
        assert!(options[2].selected);
    }

    #[test]
    fn test_pagination_links() {
        let page = Page {
            items: vec![1, 2],
            total: 45,
            page: 2,
            limit: 20,
        };
        let pager = Pagination::new(&page, "/orders?status=shipped&");
        assert_eq!(pager.total_pages, 3);
        assert_eq!(
            pager.prev_href.as_deref(),
            Some("/orders?status=shipped&page=1")
        );
        assert_eq!(
            pager.next_href.as_deref(),
            Some("/orders?status=shipped&page=3")
        );
    }
}
