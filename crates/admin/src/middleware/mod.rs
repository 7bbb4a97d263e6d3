//! Back-office access control.
//!
//! The admin binary accepts the same bearer tokens as the storefront; what a
//! caller may do comes from their `admin_user_role` row.

pub mod auth;

pub use auth::{AdminUser, RequireAdmin, RequireWriter};
