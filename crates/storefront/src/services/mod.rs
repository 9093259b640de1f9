//! Request-level logic shared by route handlers.
//!
//! # Services
//!
//! - `cart` - Guest cookie cart and server cart reconciliation
//! - `notice` - One-shot dialogs carried across redirects

pub mod cart;
pub mod notice;
