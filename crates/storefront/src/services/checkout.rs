//! Order placement and payment handoff.
//!
//! Placing an order walks a [`CheckoutWizard`] through its guards, prices
//! the cart and shipping server-side and writes the order in one
//! transaction. Card payments then get a hosted checkout session from the
//! `create-checkout` function; the other methods stay `pending` until the
//! shop confirms the payment by hand.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use thiserror::Error;

use petshop_core::checkout::{CheckoutError, CheckoutWizard, DeliveryAddress, PaymentMethod};
use petshop_core::shipping::{ShippingError, ShippingQuote, resolve_shipping};
use petshop_core::{OrderId, OrderStatus};

use super::auth::AuthUser;
use super::functions::{CheckoutLine, CheckoutRequest, FunctionsClient, FunctionsError};
use super::shipping::cart_weight;
use crate::db::{CartRepository, OrderRepository, RepositoryError, ShippingRateRepository};
use crate::models::{Order, OrderDetail};

#[derive(Debug, Error)]
pub enum CheckoutServiceError {
    #[error(transparent)]
    Invalid(#[from] CheckoutError),

    #[error(transparent)]
    Shipping(#[from] ShippingError),

    /// The order exists but the hosted checkout could not be opened.
    #[error("could not start payment for order {order_id}: {source}")]
    PaymentSession {
        order_id: OrderId,
        source: FunctionsError,
    },

    #[error("payment verification failed: {0}")]
    Verification(FunctionsError),

    #[error("order not found")]
    OrderNotFound,

    #[error("session does not belong to this order")]
    SessionMismatch,

    #[error("an order that is {0} cannot be canceled")]
    NotCancelable(OrderStatus),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Checkout request body.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutBody {
    pub address: DeliveryAddress,
    pub payment_method: PaymentMethod,
}

/// A placed order and where to pay for it.
#[derive(Debug, Clone, Serialize)]
pub struct PlacedOrder {
    pub order: OrderDetail,
    pub shipping: ShippingQuote,
    /// Hosted checkout URL for card payments.
    pub payment_url: Option<String>,
}

/// Payment state after verification.
#[derive(Debug, Clone, Serialize)]
pub struct VerifiedPayment {
    pub order_id: OrderId,
    pub status: OrderStatus,
    pub paid: bool,
}

/// Checkout operations for the signed-in customer.
pub struct CheckoutService<'a> {
    pool: &'a PgPool,
    functions: &'a FunctionsClient,
    base_url: &'a str,
}

impl<'a> CheckoutService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool, functions: &'a FunctionsClient, base_url: &'a str) -> Self {
        Self {
            pool,
            functions,
            base_url,
        }
    }

    /// Place an order from the caller's cart.
    ///
    /// # Errors
    ///
    /// Validation errors for the address or an empty cart, `Shipping` when
    /// the CEP is not served, `Repository(Conflict)` when stock ran out, and
    /// `PaymentSession` when a card order was created but the hosted
    /// checkout could not be opened (the order stays `pending`).
    #[tracing::instrument(skip(self, user, body), fields(user_id = %user.id, method = %body.payment_method))]
    pub async fn place_order(&self, user: &AuthUser, body: &CheckoutBody) -> Result<PlacedOrder, CheckoutServiceError> {
        let mut wizard = CheckoutWizard::new();
        wizard.set_address(&body.address)?;
        wizard.next()?;
        wizard.set_payment(body.payment_method)?;
        wizard.next()?;
        let (address, method) = wizard
            .review()
            .map(|(address, method)| (address.clone(), method))
            .ok_or(CheckoutError::WrongStep(wizard.step()))?;

        let cart = CartRepository::new(self.pool).get(user.id).await?;
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart.into());
        }

        let bands = ShippingRateRepository::new(self.pool).active_bands().await?;
        let shipping = resolve_shipping(&bands, &address.cep, cart_weight(&cart))?;

        let order = OrderRepository::new(self.pool)
            .place(user.id, &cart, &address, method, shipping.fee)
            .await?;
        wizard.submitted(order.order.id)?;
        tracing::info!(order_id = %order.order.id, total = %order.order.total, "Order placed");

        let payment_url = if method.uses_hosted_checkout() {
            Some(self.open_session(user, &order).await?)
        } else {
            None
        };

        Ok(PlacedOrder {
            order,
            shipping,
            payment_url,
        })
    }

    async fn open_session(&self, user: &AuthUser, order: &OrderDetail) -> Result<String, CheckoutServiceError> {
        let order_id = order.order.id;
        let request = checkout_request(order, user.email.clone(), self.base_url);
        let session = self
            .functions
            .create_checkout(&request)
            .await
            .map_err(|source| CheckoutServiceError::PaymentSession { order_id, source })?;
        OrderRepository::new(self.pool)
            .set_payment_session(order_id, &session.session_id)
            .await?;
        Ok(session.url)
    }

    /// Confirm a hosted payment and mark the order paid.
    ///
    /// Calling this again after the order left `pending` only reports the
    /// current status.
    ///
    /// # Errors
    ///
    /// `OrderNotFound` for someone else's order, `SessionMismatch` when the
    /// session is not the order's, `Verification` when the function fails.
    #[tracing::instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn verify(
        &self,
        user: &AuthUser,
        order_id: OrderId,
        session_id: &str,
    ) -> Result<VerifiedPayment, CheckoutServiceError> {
        let orders = OrderRepository::new(self.pool);
        let order = owned_order(orders.get(order_id).await?, user)?;
        if order.payment_session_id.as_deref() != Some(session_id) {
            return Err(CheckoutServiceError::SessionMismatch);
        }
        if order.status != OrderStatus::Pending {
            return Ok(verified(&order));
        }

        let verification = self
            .functions
            .verify_payment(session_id)
            .await
            .map_err(CheckoutServiceError::Verification)?;
        if !verification.is_paid() {
            return Ok(verified(&order));
        }

        let order = match orders
            .transition(order_id, OrderStatus::Pending, OrderStatus::Paid)
            .await?
        {
            Some(updated) => {
                tracing::info!(%order_id, "Payment confirmed");
                updated
            }
            None => orders.get(order_id).await?.ok_or(CheckoutServiceError::OrderNotFound)?,
        };
        Ok(verified(&order))
    }

    /// Cancel one of the caller's orders.
    ///
    /// # Errors
    ///
    /// `OrderNotFound` for someone else's order and `NotCancelable` when the
    /// order's status does not allow it.
    #[tracing::instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn cancel(&self, user: &AuthUser, order_id: OrderId) -> Result<Order, CheckoutServiceError> {
        let orders = OrderRepository::new(self.pool);
        let order = owned_order(orders.get(order_id).await?, user)?;
        let target = order
            .status
            .customer_cancellation()
            .ok_or(CheckoutServiceError::NotCancelable(order.status))?;

        orders
            .transition(order_id, order.status, target)
            .await?
            .ok_or(CheckoutServiceError::NotCancelable(order.status))
    }
}

fn owned_order(order: Option<Order>, user: &AuthUser) -> Result<Order, CheckoutServiceError> {
    order
        .filter(|order| order.user_id == user.id)
        .ok_or(CheckoutServiceError::OrderNotFound)
}

const fn verified(order: &Order) -> VerifiedPayment {
    VerifiedPayment {
        order_id: order.id,
        status: order.status,
        paid: matches!(
            order.status,
            OrderStatus::Paid | OrderStatus::Preparing | OrderStatus::Shipped | OrderStatus::Delivered | OrderStatus::Completed
        ),
    }
}

/// Body of the `create-checkout` call for an order.
#[must_use]
pub fn checkout_request(order: &OrderDetail, customer_email: Option<String>, base_url: &str) -> CheckoutRequest {
    let base = base_url.trim_end_matches('/');
    let order_id = order.order.id;
    CheckoutRequest {
        order_id,
        items: order
            .items
            .iter()
            .map(|item| CheckoutLine {
                name: item.product_name.clone(),
                unit_price: item.unit_price,
                quantity: item.quantity,
            })
            .collect(),
        shipping_fee: order.order.shipping_fee,
        customer_email,
        success_url: format!("{base}/checkout/success?order_id={order_id}&session_id={{CHECKOUT_SESSION_ID}}"),
        cancel_url: format!("{base}/checkout/cancel?order_id={order_id}"),
    }
}
