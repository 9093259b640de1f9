//! Helpers shared by the route handlers.

pub mod notice;
pub mod upload;
