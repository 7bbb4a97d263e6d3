//! Business logic and external clients for the storefront.
//!
//! # Services
//!
//! - `auth` - Bearer token verification
//! - `booking` - Appointment booking over a storage seam
//! - `checkout` - Order placement, hosted payment and cancellation
//! - `functions` - Serverless functions client (payments, e-mail, calendar)
//! - `notifications` - Best-effort booking notifications
//! - `shipping` - Shipping quotes
//! - `viacep` - Postal-code lookup

pub mod auth;
pub mod booking;
pub mod checkout;
pub mod functions;
pub mod notifications;
pub mod shipping;
pub mod viacep;
