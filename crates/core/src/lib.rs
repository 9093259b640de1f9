//! Storehouse Core - Shared types library.
//!
//! This crate provides common types used across all Storehouse components:
//! - `storefront` - Public-facing shop (catalog, cart, checkout, order tracking)
//! - `admin` - Back-office panel (catalog, roles, accounts, orders, promotions)
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no HTTP
//! clients. Both binaries talk to the remote REST API, which owns every
//! record; the types here describe what that API sends and accepts.
//!
//! # Modules
//!
//! - [`types`] - IDs, prices, emails, statuses, and the API records
//! - [`cart`] - Guest cart cookie codec and quantity projection
//! - [`tracking`] - Steps of the OTP-gated order lookup
//! - [`validation`] - Form validation run before any API call

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod tracking;
pub mod types;
pub mod validation;

pub use types::*;
