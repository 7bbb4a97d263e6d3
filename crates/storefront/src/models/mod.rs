//! Domain models for the storefront.
//!
//! Models map one-to-one onto rows of the `petshop` schema and derive
//! [`sqlx::FromRow`] so repositories can load them with runtime queries.
//! Values that carry invariants (ids, CEPs, enums) are decoded into their
//! `petshop-core` types, so a malformed row fails at the boundary.

pub mod blog;
pub mod booking;
pub mod catalog;
pub mod order;
pub mod shipping;

pub use blog::BlogPost;
pub use booking::{Appointment, AppointmentView, Client, Pet, Service};
pub use catalog::{Product, ProductDetail, Review};
pub use order::{Order, OrderDetail, OrderItem};
pub use shipping::ShippingRate;

use serde::Serialize;

/// One page of a paginated listing.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
    pub total_pages: u32,
}

impl<T> Page<T> {
    #[must_use]
    pub fn new(items: Vec<T>, total: i64, page: u32, per_page: u32) -> Self {
        let per_page_i64 = i64::from(per_page.max(1));
        let pages = (total.max(0) + per_page_i64 - 1) / per_page_i64;
        Self {
            items,
            total,
            page,
            per_page,
            total_pages: u32::try_from(pages).unwrap_or(u32::MAX),
        }
    }
}

/// Page number and size of a listing request.
///
/// Out-of-range values are clamped: pages start at 1 and sizes stay within
/// `1..=max_per_page`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
}

impl Pagination {
    #[must_use]
    pub fn new(page: Option<u32>, per_page: Option<u32>, default_per_page: u32, max_per_page: u32) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            per_page: per_page.unwrap_or(default_per_page).clamp(1, max_per_page),
        }
    }

    #[must_use]
    pub fn limit(self) -> i64 {
        i64::from(self.per_page)
    }

    #[must_use]
    pub fn offset(self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.per_page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_clamps() {
        let p = Pagination::new(Some(0), Some(500), 12, 60);
        assert_eq!(p, Pagination { page: 1, per_page: 60 });
        let p = Pagination::new(Some(3), None, 12, 60);
        assert_eq!(p.offset(), 24);
        assert_eq!(p.limit(), 12);
    }

    #[test]
    fn test_total_pages_rounds_up() {
        assert_eq!(Page::<()>::new(vec![], 25, 1, 12).total_pages, 3);
        assert_eq!(Page::<()>::new(vec![], 24, 1, 12).total_pages, 2);
        assert_eq!(Page::<()>::new(vec![], 0, 1, 12).total_pages, 0);
    }
}
