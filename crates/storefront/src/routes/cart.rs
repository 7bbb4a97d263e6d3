//! Shopping cart.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, put},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use petshop_core::cart::{Cart, CartError, CartLine, check_quantity};
use petshop_core::{ProductId, UserId};

use crate::db::{CartRepository, ProductRepository};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::RequireAuth;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/cart", get(show_cart).post(add_to_cart))
        .route(
            "/api/cart/{product_id}",
            put(update_quantity).delete(remove_from_cart),
        )
}

/// The cart as returned to the client.
#[derive(Debug, Serialize)]
pub struct CartView {
    pub items: Vec<CartLine>,
    pub subtotal: Decimal,
    pub item_count: u32,
}

impl From<Cart> for CartView {
    fn from(cart: Cart) -> Self {
        Self {
            subtotal: cart.subtotal(),
            item_count: cart.item_count(),
            items: cart.lines,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AddToCart {
    pub product_id: ProductId,
    #[serde(default = "one")]
    pub quantity: u32,
}

const fn one() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
pub struct SetQuantity {
    pub quantity: u32,
}

async fn load(state: &AppState, user_id: UserId) -> Result<Json<CartView>> {
    let cart = CartRepository::new(state.pool()).get(user_id).await?;
    Ok(Json(cart.into()))
}

/// Check that `quantity` units of an active product are in stock.
async fn ensure_available(state: &AppState, product_id: ProductId, quantity: u32) -> Result<()> {
    let product = ProductRepository::new(state.pool())
        .get(product_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {product_id}")))?;
    if !product.active {
        return Err(CartError::ProductUnavailable(product.name).into());
    }
    check_quantity(&product.name, quantity, product.stock)?;
    Ok(())
}

fn to_db_quantity(quantity: u32) -> Result<i32> {
    i32::try_from(quantity).map_err(|_| CartError::InvalidQuantity.into())
}

async fn show_cart(RequireAuth(user): RequireAuth, State(state): State<AppState>) -> Result<Json<CartView>> {
    load(&state, user.id).await
}

#[tracing::instrument(skip(state, user), fields(user_id = %user.id))]
async fn add_to_cart(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Json(body): Json<AddToCart>,
) -> Result<Json<CartView>> {
    if body.quantity == 0 {
        return Err(CartError::InvalidQuantity.into());
    }
    let carts = CartRepository::new(state.pool());
    let current = carts.quantity(user.id, body.product_id).await?.unwrap_or(0);
    let wanted = u32::try_from(current).unwrap_or(0).saturating_add(body.quantity);
    ensure_available(&state, body.product_id, wanted).await?;

    carts.add(user.id, body.product_id, to_db_quantity(body.quantity)?).await?;
    let product_id = body.product_id.to_string();
    add_breadcrumb("cart", "Added to cart", Some(&[("product_id", product_id.as_str())]));
    load(&state, user.id).await
}

async fn update_quantity(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(product_id): Path<ProductId>,
    Json(body): Json<SetQuantity>,
) -> Result<Json<CartView>> {
    let carts = CartRepository::new(state.pool());
    if body.quantity == 0 {
        carts.remove(user.id, product_id).await?;
    } else {
        ensure_available(&state, product_id, body.quantity).await?;
        carts
            .set_quantity(user.id, product_id, to_db_quantity(body.quantity)?)
            .await?;
    }
    load(&state, user.id).await
}

async fn remove_from_cart(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(product_id): Path<ProductId>,
) -> Result<Json<CartView>> {
    CartRepository::new(state.pool()).remove(user.id, product_id).await?;
    load(&state, user.id).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cart_view_totals() {
        let line = |id: i64, price: &str, quantity: u32| CartLine {
            product_id: ProductId::new(id),
            name: format!("produto {id}"),
            unit_price: price.parse().unwrap(),
            quantity,
            image_url: None,
            weight_kg: None,
        };
        let view = CartView::from(Cart::new(vec![line(1, "49.90", 2), line(2, "12.50", 1)]));
        assert_eq!(view.subtotal, "112.30".parse::<Decimal>().unwrap());
        assert_eq!(view.item_count, 3);
        assert_eq!(view.items.len(), 2);
    }
}
