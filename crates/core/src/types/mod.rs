//! Core types for Storehouse.
//!
//! This module provides type-safe wrappers for common domain concepts and
//! the records exchanged with the remote REST API.

#[macro_use]
mod macros;

pub mod access;
pub mod api_url;
pub mod catalog;
pub mod customer;
pub mod email;
pub mod envelope;
pub mod id;
pub mod notice;
pub mod order;
pub mod price;
pub mod promotion;
pub mod status;

pub use access::{
    AdminAccount, AdminProfile, Capability, Module, Permission, Role, RoleRef, permits,
};
pub use api_url::{ApiBaseUrl, ApiUrlError, BLOCKED_PORTS, DEFAULT_API_URL};
pub use catalog::{Category, CategoryRef, Product, ProductImage, ProductRef, ProductSummary};
pub use customer::{Customer, CustomerRef};
pub use email::{Email, EmailError};
pub use envelope::{ApiEnvelope, Page};
pub use id::*;
pub use notice::{Notice, NoticeKind};
pub use order::{Order, OrderItem, ShippingContact};
pub use price::{CurrencyCode, Price, discount_percent};
pub use promotion::{Promotion, PromotionCode, PromotionCodeError};
pub use status::*;
