//! Cart arithmetic.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::shipping::ParcelLine;
use crate::{ProductId, round_money};

/// Largest quantity accepted for a single cart line.
pub const MAX_LINE_QUANTITY: u32 = 99;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    #[error("quantity must be between 1 and {max}", max = MAX_LINE_QUANTITY)]
    InvalidQuantity,
    #[error("only {available} unit(s) of {product} in stock")]
    InsufficientStock { product: String, available: i32 },
    #[error("{0} is no longer available")]
    ProductUnavailable(String),
    #[error("the cart is empty")]
    Empty,
}

/// One product in a cart, priced at the product's current price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight_kg: Option<Decimal>,
}

impl CartLine {
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }

    #[must_use]
    pub const fn parcel_line(&self) -> ParcelLine {
        ParcelLine {
            unit_weight_kg: self.weight_kg,
            quantity: self.quantity,
        }
    }
}

/// A customer's cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    pub lines: Vec<CartLine>,
}

impl Cart {
    #[must_use]
    pub const fn new(lines: Vec<CartLine>) -> Self {
        Self { lines }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Σ unit price × quantity, rounded to cents.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        round_money(self.lines.iter().map(CartLine::line_total).sum())
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines.iter().map(|line| line.quantity).sum()
    }

    /// Set a line's quantity. Zero removes the line.
    ///
    /// Returns `false` if the product is not in the cart.
    pub fn set_quantity(&mut self, product_id: ProductId, quantity: u32) -> bool {
        let Some(pos) = self.lines.iter().position(|l| l.product_id == product_id) else {
            return false;
        };
        if quantity == 0 {
            self.lines.remove(pos);
        } else if let Some(line) = self.lines.get_mut(pos) {
            line.quantity = quantity;
        }
        true
    }

    pub fn parcel_lines(&self) -> impl Iterator<Item = ParcelLine> + '_ {
        self.lines.iter().map(CartLine::parcel_line)
    }
}

/// Check a requested line quantity against the product's stock.
///
/// Zero is accepted here; callers treat it as removal.
///
/// # Errors
///
/// Returns [`CartError::InvalidQuantity`] above [`MAX_LINE_QUANTITY`] and
/// [`CartError::InsufficientStock`] when the stock cannot cover it.
pub fn check_quantity(product: &str, quantity: u32, stock: i32) -> Result<(), CartError> {
    if quantity > MAX_LINE_QUANTITY {
        return Err(CartError::InvalidQuantity);
    }
    if i64::from(quantity) > i64::from(stock) {
        return Err(CartError::InsufficientStock {
            product: product.to_string(),
            available: stock.max(0),
        });
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn line(id: i64, price: &str, quantity: u32) -> CartLine {
        CartLine {
            product_id: ProductId::new(id),
            name: format!("Product {id}"),
            unit_price: price.parse().unwrap(),
            quantity,
            image_url: None,
            weight_kg: None,
        }
    }

    #[test]
    fn test_subtotal_is_sum_of_price_times_quantity() {
        let cart = Cart::new(vec![line(1, "19.90", 2), line(2, "5.35", 3)]);
        assert_eq!(cart.subtotal(), "55.85".parse::<Decimal>().unwrap());
        assert_eq!(cart.item_count(), 5);
    }

    #[test]
    fn test_quantity_zero_removes_line() {
        let mut cart = Cart::new(vec![line(1, "10", 1), line(2, "20", 2)]);
        assert!(cart.set_quantity(ProductId::new(1), 0));
        assert_eq!(cart.lines.len(), 1);
        assert_eq!(cart.lines[0].product_id, ProductId::new(2));
        assert_eq!(cart.subtotal(), Decimal::from(40));
    }

    #[test]
    fn test_set_quantity_updates_and_reports_missing() {
        let mut cart = Cart::new(vec![line(1, "10", 1)]);
        assert!(cart.set_quantity(ProductId::new(1), 4));
        assert_eq!(cart.subtotal(), Decimal::from(40));
        assert!(!cart.set_quantity(ProductId::new(9), 1));
    }

    #[test]
    fn test_empty_cart() {
        let cart = Cart::default();
        assert!(cart.is_empty());
        assert_eq!(cart.subtotal(), Decimal::ZERO);
        assert_eq!(cart.item_count(), 0);
    }

    #[test]
    fn test_check_quantity_against_stock() {
        assert!(check_quantity("Ração", 3, 3).is_ok());
        assert!(check_quantity("Ração", 0, 0).is_ok());
        assert_eq!(
            check_quantity("Ração", 4, 3),
            Err(CartError::InsufficientStock {
                product: "Ração".to_string(),
                available: 3
            })
        );
        assert_eq!(check_quantity("Ração", 100, 500), Err(CartError::InvalidQuantity));
    }
}
