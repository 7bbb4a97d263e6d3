//! Unified error handling with Sentry integration.
//!
//! Handlers return `Result<T, AppError>`. Server-side failures (database,
//! upstream functions) are captured to Sentry before responding; every error
//! is rendered as JSON `{"error": "..."}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use petshop_core::booking::BookingError;
use petshop_core::cart::CartError;
use petshop_core::checkout::CheckoutError;
use petshop_core::schedule::ScheduleError;
use petshop_core::shipping::ShippingError;
use petshop_core::CepError;

use crate::db::RepositoryError;
use crate::services::auth::AuthError;
use crate::services::booking::BookingServiceError;
use crate::services::checkout::CheckoutServiceError;
use crate::services::shipping::QuoteError;
use crate::services::viacep::CepLookupError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Bearer token missing or invalid.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Well-formed request the shop cannot serve (e.g. region not served).
    #[error("Unprocessable: {0}")]
    Unprocessable(String),

    /// Request conflicts with current state (slot taken, out of stock).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Caller is authenticated but not allowed.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// External service (functions, `ViaCEP`) failed.
    #[error("Upstream error: {0}")]
    Upstream(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Database(err) => match err {
                RepositoryError::NotFound => StatusCode::NOT_FOUND,
                RepositoryError::Conflict(_) => StatusCode::CONFLICT,
                RepositoryError::Database(_) | RepositoryError::DataCorruption(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Auth(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Message shown to the client; internal details stay in the logs.
    fn public_message(&self) -> String {
        match self {
            Self::Database(RepositoryError::NotFound) => "Not found".to_owned(),
            Self::Database(RepositoryError::Conflict(msg)) => msg.clone(),
            Self::Database(_) => "Internal server error".to_owned(),
            Self::Auth(_) => "Authentication required".to_owned(),
            Self::NotFound(msg)
            | Self::BadRequest(msg)
            | Self::Unprocessable(msg)
            | Self::Conflict(msg)
            | Self::Forbidden(msg)
            | Self::Upstream(msg) => msg.clone(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let body = serde_json::json!({ "error": self.public_message() });
        (status, Json(body)).into_response()
    }
}

impl From<CepError> for AppError {
    fn from(err: CepError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl From<CartError> for AppError {
    fn from(err: CartError) -> Self {
        match err {
            CartError::InsufficientStock { .. } => Self::Conflict(err.to_string()),
            CartError::ProductUnavailable(_) => Self::Unprocessable(err.to_string()),
            CartError::InvalidQuantity | CartError::Empty => Self::BadRequest(err.to_string()),
        }
    }
}

impl From<ShippingError> for AppError {
    fn from(err: ShippingError) -> Self {
        match err {
            ShippingError::NegativeWeight | ShippingError::WeightTooLarge => {
                Self::BadRequest(err.to_string())
            }
            ShippingError::RegionNotServed(_) => Self::Unprocessable(err.to_string()),
        }
    }
}

impl From<QuoteError> for AppError {
    fn from(err: QuoteError) -> Self {
        match err {
            QuoteError::Cep(e) => e.into(),
            QuoteError::Shipping(e) => e.into(),
            QuoteError::Repository(e) => e.into(),
        }
    }
}

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::Schedule(ScheduleError::SlotTaken(_)) => Self::Conflict(err.to_string()),
            _ => Self::BadRequest(err.to_string()),
        }
    }
}

impl From<BookingServiceError> for AppError {
    fn from(err: BookingServiceError) -> Self {
        match err {
            BookingServiceError::Invalid(e) => e.into(),
            BookingServiceError::SlotTaken => Self::Conflict(err.to_string()),
            BookingServiceError::PetNotFound => Self::NotFound(err.to_string()),
            BookingServiceError::InvalidTime => Self::BadRequest(err.to_string()),
            BookingServiceError::Repository(e) => e.into(),
        }
    }
}

impl From<CheckoutError> for AppError {
    fn from(err: CheckoutError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl From<CheckoutServiceError> for AppError {
    fn from(err: CheckoutServiceError) -> Self {
        match err {
            CheckoutServiceError::Invalid(e) => e.into(),
            CheckoutServiceError::Shipping(e) => e.into(),
            CheckoutServiceError::PaymentSession { order_id, .. } => {
                tracing::error!(error = %err, "Hosted checkout unavailable");
                Self::Upstream(format!(
                    "order {order_id} was created but the payment could not be started; it stays pending"
                ))
            }
            CheckoutServiceError::Verification(_) => {
                tracing::error!(error = %err, "Payment verification unavailable");
                Self::Upstream("payment verification is unavailable, try again later".to_owned())
            }
            CheckoutServiceError::OrderNotFound => Self::NotFound(err.to_string()),
            CheckoutServiceError::SessionMismatch => Self::BadRequest(err.to_string()),
            CheckoutServiceError::NotCancelable(_) => Self::Conflict(err.to_string()),
            CheckoutServiceError::Repository(e) => e.into(),
        }
    }
}

impl From<CepLookupError> for AppError {
    fn from(err: CepLookupError) -> Self {
        match err {
            CepLookupError::NotFound(_) => Self::NotFound(err.to_string()),
            CepLookupError::Http(_) | CepLookupError::Api(_) => {
                tracing::error!(error = %err, "CEP lookup failed");
                Self::Upstream("postal-code lookup is unavailable".to_owned())
            }
        }
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context for the authenticated caller.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Add a breadcrumb for a customer action.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of actions
/// leading up to an error.
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use petshop_core::{Cep, OrderId, OrderStatus};

    fn get_status(err: impl Into<AppError>) -> StatusCode {
        err.into().into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("product 123".to_string());
        assert_eq!(err.to_string(), "Not found: product 123");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(get_status(AppError::BadRequest("x".into())), StatusCode::BAD_REQUEST);
        assert_eq!(get_status(AppError::Forbidden("x".into())), StatusCode::FORBIDDEN);
        assert_eq!(get_status(AuthError::MissingToken), StatusCode::UNAUTHORIZED);
        assert_eq!(get_status(RepositoryError::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(
            get_status(RepositoryError::Conflict("stock".into())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(RepositoryError::DataCorruption("bad row".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_domain_errors_map_to_statuses() {
        let cep = Cep::parse("69900000").unwrap();
        assert_eq!(get_status(ShippingError::RegionNotServed(cep)), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(get_status(CepError::Empty), StatusCode::BAD_REQUEST);
        assert_eq!(get_status(ShippingError::WeightTooLarge), StatusCode::BAD_REQUEST);
        assert_eq!(get_status(BookingError::NoPetSelected), StatusCode::BAD_REQUEST);
        assert_eq!(
            get_status(BookingError::Schedule(ScheduleError::SlotTaken("09:00".into()))),
            StatusCode::CONFLICT
        );
        assert_eq!(get_status(BookingServiceError::SlotTaken), StatusCode::CONFLICT);
        assert_eq!(
            get_status(CheckoutServiceError::NotCancelable(OrderStatus::Shipped)),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(CheckoutServiceError::PaymentSession {
                order_id: OrderId::new(5),
                source: crate::services::functions::FunctionsError::Parse("x".into()),
            }),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            get_status(CepLookupError::NotFound("99999-999".into())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(CartError::InsufficientStock {
                product: "Ração".into(),
                available: 1
            }),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_internal_details_hidden() {
        let err = AppError::from(RepositoryError::DataCorruption(
            "connection string leaked".into(),
        ));
        assert_eq!(err.public_message(), "Internal server error");
    }
}
