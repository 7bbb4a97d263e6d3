//! Pet Shop Core - Shared domain types and business rules.
//!
//! This crate provides the types and rules used across all pet shop components:
//! - `storefront` - Public JSON API (catalog, cart, checkout, booking, blog)
//! - `admin` - Back-office API
//! - `cli` - Command-line tools for migrations and seeding
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. Everything that decides *what* should happen
//! (shipping fees, slot availability, wizard transitions, totals) lives here so
//! it can be tested without a database.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, CEP, money helpers and status enums
//! - [`shipping`] - Rate-band lookup and fee calculation
//! - [`schedule`] - Fixed appointment slots and availability
//! - [`booking`] - Appointment booking wizard and appointment planning
//! - [`checkout`] - Checkout wizard, payment methods and order totals
//! - [`cart`] - Cart arithmetic
//! - [`contact`] - `WhatsApp` and maps deep links

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod booking;
pub mod cart;
pub mod checkout;
pub mod contact;
pub mod schedule;
pub mod shipping;
pub mod types;

pub use types::*;
