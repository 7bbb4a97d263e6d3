//! Client for the shop's serverless functions.
//!
//! Each function is invoked as `POST {functions_url}/{name}` with a JSON body
//! and the shared API key as a bearer token:
//!
//! - `create-checkout` - hosted card-payment session for an order
//! - `verify-payment` - status of a hosted session
//! - `send-appointment-email` - confirmation e-mail for a booking
//! - `create-calendar-event` - calendar entry for a booking

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use petshop_core::OrderId;

use crate::config::FunctionsConfig;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors that can occur when calling a function.
#[derive(Debug, Error)]
pub enum FunctionsError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Function returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// One line of a hosted checkout.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutLine {
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: i32,
}

/// Request body of `create-checkout`.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutRequest {
    pub order_id: OrderId,
    pub items: Vec<CheckoutLine>,
    pub shipping_fee: Decimal,
    pub customer_email: Option<String>,
    pub success_url: String,
    pub cancel_url: String,
}

/// A hosted checkout session.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    pub session_id: String,
    pub url: String,
}

/// Result of `verify-payment`.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentVerification {
    /// Provider status, e.g. `paid`, `unpaid`, `expired`.
    pub status: String,
}

impl PaymentVerification {
    #[must_use]
    pub fn is_paid(&self) -> bool {
        self.status.eq_ignore_ascii_case("paid")
    }
}

/// Appointment details sent to the e-mail and calendar functions.
#[derive(Debug, Clone, Serialize)]
pub struct AppointmentNotice {
    pub client_name: String,
    pub client_email: Option<String>,
    pub pet_name: String,
    pub service_name: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

/// Client for the serverless functions.
#[derive(Clone)]
pub struct FunctionsClient {
    client: reqwest::Client,
    base_url: String,
}

impl FunctionsClient {
    /// Create a new functions client.
    ///
    /// # Errors
    ///
    /// Returns error if the API key is not a valid header value or the HTTP
    /// client fails to build.
    pub fn new(config: &FunctionsConfig) -> Result<Self, FunctionsError> {
        let mut headers = HeaderMap::new();
        let bearer = format!("Bearer {}", config.api_key.expose_secret());
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&bearer)
                .map_err(|e| FunctionsError::Parse(format!("Invalid API key format: {e}")))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_owned(),
        })
    }

    fn endpoint(&self, name: &str) -> String {
        format!("{}/{name}", self.base_url)
    }

    async fn invoke<B, T>(&self, name: &str, body: &B) -> Result<T, FunctionsError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let response = self.client.post(self.endpoint(name)).json(body).send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(FunctionsError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| FunctionsError::Parse(e.to_string()))
    }

    /// Open a hosted card-payment session for an order.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the response is malformed.
    #[tracing::instrument(skip(self, request), fields(order_id = %request.order_id))]
    pub async fn create_checkout(&self, request: &CheckoutRequest) -> Result<CheckoutSession, FunctionsError> {
        self.invoke("create-checkout", request).await
    }

    /// Ask the payment provider whether a session was paid.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the response is malformed.
    #[tracing::instrument(skip(self))]
    pub async fn verify_payment(&self, session_id: &str) -> Result<PaymentVerification, FunctionsError> {
        self.invoke(
            "verify-payment",
            &serde_json::json!({ "session_id": session_id }),
        )
        .await
    }

    /// Send the booking confirmation e-mail.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    pub async fn send_appointment_email(&self, notice: &AppointmentNotice) -> Result<(), FunctionsError> {
        let _: serde_json::Value = self.invoke("send-appointment-email", notice).await?;
        Ok(())
    }

    /// Create the calendar event for a booking.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    pub async fn create_calendar_event(&self, notice: &AppointmentNotice) -> Result<(), FunctionsError> {
        let _: serde_json::Value = self.invoke("create-calendar-event", notice).await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    #[test]
    fn test_endpoint_joins_without_double_slash() {
        let client = FunctionsClient::new(&FunctionsConfig {
            url: "https://fn.example.com/functions/v1/".to_owned(),
            api_key: SecretString::from("functions-key".to_owned()),
        })
        .unwrap();
        assert_eq!(
            client.endpoint("create-checkout"),
            "https://fn.example.com/functions/v1/create-checkout"
        );
    }

    #[test]
    fn test_invalid_key_rejected() {
        let result = FunctionsClient::new(&FunctionsConfig {
            url: "https://fn.example.com".to_owned(),
            api_key: SecretString::from("bad\nkey".to_owned()),
        });
        assert!(matches!(result, Err(FunctionsError::Parse(_))));
    }

    #[test]
    fn test_paid_status_is_case_insensitive() {
        let paid: PaymentVerification = serde_json::from_str(r#"{"status":"PAID"}"#).unwrap();
        assert!(paid.is_paid());
        let open: PaymentVerification = serde_json::from_str(r#"{"status":"unpaid"}"#).unwrap();
        assert!(!open.is_paid());
    }
}
