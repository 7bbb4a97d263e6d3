//! Checkout wizard, payment methods and order totals.
//!
//! ```text
//! Address -> Payment -> Review -> Submitted
//! ```
//!
//! The storefront never trusts amounts sent by the client; [`OrderTotals`] is
//! always computed from current product prices and the resolved shipping fee.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cart::Cart;
use crate::{Cep, CepError, OrderId, round_money};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckoutError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("state must be a two-letter code")]
    InvalidState,
    #[error(transparent)]
    Cep(#[from] CepError),
    #[error("choose a payment method to continue")]
    NoPaymentMethod,
    #[error("the cart is empty")]
    EmptyCart,
    #[error("this action is not available on the {0} step")]
    WrongStep(CheckoutStep),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutStep {
    Address = 1,
    Payment = 2,
    Review = 3,
    Submitted = 4,
}

impl std::fmt::Display for CheckoutStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Address => write!(f, "address"),
            Self::Payment => write!(f, "payment"),
            Self::Review => write!(f, "review"),
            Self::Submitted => write!(f, "submitted"),
        }
    }
}

/// How the customer pays.
///
/// Stored as the `petshop.payment_method` Postgres enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "petshop.payment_method", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    CreditCard,
    DebitCard,
    Pix,
    Boleto,
    Cash,
}

impl PaymentMethod {
    pub const ALL: [Self; 5] = [
        Self::CreditCard,
        Self::DebitCard,
        Self::Pix,
        Self::Boleto,
        Self::Cash,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CreditCard => "credit_card",
            Self::DebitCard => "debit_card",
            Self::Pix => "pix",
            Self::Boleto => "boleto",
            Self::Cash => "cash",
        }
    }

    /// Card payments are completed on the processor's hosted page; the rest
    /// are confirmed manually by the shop.
    #[must_use]
    pub const fn uses_hosted_checkout(self) -> bool {
        matches!(self, Self::CreditCard | Self::DebitCard)
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|method| method.as_str() == s)
            .ok_or_else(|| format!("invalid payment method: {s}"))
    }
}

/// Delivery address as typed by the customer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryAddress {
    pub cep: String,
    pub street: String,
    pub number: String,
    #[serde(default)]
    pub complement: Option<String>,
    pub neighborhood: String,
    pub city: String,
    pub state: String,
}

/// A delivery address whose CEP parsed and whose fields are filled in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidAddress {
    pub cep: Cep,
    pub street: String,
    pub number: String,
    pub complement: Option<String>,
    pub neighborhood: String,
    pub city: String,
    pub state: String,
}

impl DeliveryAddress {
    /// Validate and normalize.
    ///
    /// # Errors
    ///
    /// Returns the first missing field, an invalid state code or a CEP error.
    pub fn validate(&self) -> Result<ValidAddress, CheckoutError> {
        let cep = Cep::parse(&self.cep)?;
        let required = [
            ("street", &self.street),
            ("number", &self.number),
            ("neighborhood", &self.neighborhood),
            ("city", &self.city),
            ("state", &self.state),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(CheckoutError::MissingField(name));
            }
        }
        let state = self.state.trim().to_uppercase();
        if state.len() != 2 || !state.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(CheckoutError::InvalidState);
        }
        Ok(ValidAddress {
            cep,
            street: self.street.trim().to_string(),
            number: self.number.trim().to_string(),
            complement: self
                .complement
                .as_deref()
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string),
            neighborhood: self.neighborhood.trim().to_string(),
            city: self.city.trim().to_string(),
            state,
        })
    }
}

impl ValidAddress {
    /// Single-line form stored on the order.
    #[must_use]
    pub fn single_line(&self) -> String {
        let complement = self
            .complement
            .as_deref()
            .map(|c| format!(" ({c})"))
            .unwrap_or_default();
        format!(
            "{}, {}{complement} - {}, {}/{} - CEP {}",
            self.street,
            self.number,
            self.neighborhood,
            self.city,
            self.state,
            self.cep.formatted()
        )
    }
}

/// Amounts of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OrderTotals {
    pub subtotal: Decimal,
    pub shipping_fee: Decimal,
    pub total: Decimal,
}

impl OrderTotals {
    #[must_use]
    pub fn compute(cart: &Cart, shipping_fee: Decimal) -> Self {
        let subtotal = cart.subtotal();
        let shipping_fee = round_money(shipping_fee);
        Self {
            subtotal,
            shipping_fee,
            total: subtotal + shipping_fee,
        }
    }
}

/// The checkout wizard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutWizard {
    Address {
        address: Option<ValidAddress>,
    },
    Payment {
        address: ValidAddress,
        method: Option<PaymentMethod>,
    },
    Review {
        address: ValidAddress,
        method: PaymentMethod,
    },
    Submitted {
        order_id: OrderId,
    },
}

impl Default for CheckoutWizard {
    fn default() -> Self {
        Self::Address { address: None }
    }
}

impl CheckoutWizard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn step(&self) -> CheckoutStep {
        match self {
            Self::Address { .. } => CheckoutStep::Address,
            Self::Payment { .. } => CheckoutStep::Payment,
            Self::Review { .. } => CheckoutStep::Review,
            Self::Submitted { .. } => CheckoutStep::Submitted,
        }
    }

    /// # Errors
    ///
    /// Only allowed on the address step; the address must validate.
    pub fn set_address(&mut self, input: &DeliveryAddress) -> Result<(), CheckoutError> {
        let Self::Address { address } = self else {
            return Err(CheckoutError::WrongStep(self.step()));
        };
        *address = Some(input.validate()?);
        Ok(())
    }

    /// # Errors
    ///
    /// Only allowed on the payment step.
    pub fn set_payment(&mut self, chosen: PaymentMethod) -> Result<(), CheckoutError> {
        let Self::Payment { method, .. } = self else {
            return Err(CheckoutError::WrongStep(self.step()));
        };
        *method = Some(chosen);
        Ok(())
    }

    /// Advance if the current step is complete.
    ///
    /// # Errors
    ///
    /// Returns the missing piece and leaves the wizard unchanged.
    pub fn next(&mut self) -> Result<CheckoutStep, CheckoutError> {
        let advanced = match self {
            Self::Address { address } => {
                let Some(address) = address.take() else {
                    return Err(CheckoutError::MissingField("address"));
                };
                Self::Payment {
                    address,
                    method: None,
                }
            }
            Self::Payment { address, method } => {
                let Some(method) = *method else {
                    return Err(CheckoutError::NoPaymentMethod);
                };
                Self::Review {
                    address: address.clone(),
                    method,
                }
            }
            Self::Review { .. } | Self::Submitted { .. } => {
                return Err(CheckoutError::WrongStep(self.step()));
            }
        };
        *self = advanced;
        Ok(self.step())
    }

    /// # Errors
    ///
    /// Not available on the first step or after submission.
    pub fn back(&mut self) -> Result<CheckoutStep, CheckoutError> {
        let previous = match self {
            Self::Payment { address, .. } => Self::Address {
                address: Some(address.clone()),
            },
            Self::Review { address, method } => Self::Payment {
                address: address.clone(),
                method: Some(*method),
            },
            Self::Address { .. } | Self::Submitted { .. } => {
                return Err(CheckoutError::WrongStep(self.step()));
            }
        };
        *self = previous;
        Ok(self.step())
    }

    /// Address and payment method under review.
    #[must_use]
    pub const fn review(&self) -> Option<(&ValidAddress, PaymentMethod)> {
        match self {
            Self::Review { address, method } => Some((address, *method)),
            _ => None,
        }
    }

    /// # Errors
    ///
    /// Only allowed from the review step.
    pub fn submitted(&mut self, order_id: OrderId) -> Result<(), CheckoutError> {
        if !matches!(self, Self::Review { .. }) {
            return Err(CheckoutError::WrongStep(self.step()));
        }
        *self = Self::Submitted { order_id };
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::ProductId;
    use crate::cart::CartLine;

    fn address() -> DeliveryAddress {
        DeliveryAddress {
            cep: "01310-100".to_string(),
            street: "Av. Paulista".to_string(),
            number: "1000".to_string(),
            complement: Some(" apto 12 ".to_string()),
            neighborhood: "Bela Vista".to_string(),
            city: "São Paulo".to_string(),
            state: "sp".to_string(),
        }
    }

    #[test]
    fn test_address_validation() {
        let valid = address().validate().unwrap();
        assert_eq!(valid.state, "SP");
        assert_eq!(valid.complement.as_deref(), Some("apto 12"));
        assert_eq!(
            valid.single_line(),
            "Av. Paulista, 1000 (apto 12) - Bela Vista, São Paulo/SP - CEP 01310-100"
        );

        let mut missing = address();
        missing.city = " ".to_string();
        assert_eq!(missing.validate(), Err(CheckoutError::MissingField("city")));

        let mut bad_cep = address();
        bad_cep.cep = "1310-100".to_string();
        assert!(matches!(bad_cep.validate(), Err(CheckoutError::Cep(_))));

        let mut bad_state = address();
        bad_state.state = "São".to_string();
        assert_eq!(bad_state.validate(), Err(CheckoutError::InvalidState));
    }

    #[test]
    fn test_wizard_guards() {
        let mut wizard = CheckoutWizard::new();
        assert_eq!(wizard.next(), Err(CheckoutError::MissingField("address")));

        wizard.set_address(&address()).unwrap();
        assert_eq!(wizard.next(), Ok(CheckoutStep::Payment));
        assert_eq!(wizard.next(), Err(CheckoutError::NoPaymentMethod));
        assert_eq!(wizard.step(), CheckoutStep::Payment);

        wizard.set_payment(PaymentMethod::Pix).unwrap();
        assert_eq!(wizard.next(), Ok(CheckoutStep::Review));
        let (review_address, method) = wizard.review().unwrap();
        assert_eq!(review_address.city, "São Paulo");
        assert_eq!(method, PaymentMethod::Pix);

        assert_eq!(wizard.back(), Ok(CheckoutStep::Payment));
        assert_eq!(wizard.next(), Ok(CheckoutStep::Review));

        wizard.submitted(OrderId::new(42)).unwrap();
        assert_eq!(wizard.step(), CheckoutStep::Submitted);
        assert!(wizard.back().is_err());
    }

    #[test]
    fn test_hosted_checkout_only_for_cards() {
        let hosted: Vec<PaymentMethod> = PaymentMethod::ALL
            .into_iter()
            .filter(|m| m.uses_hosted_checkout())
            .collect();
        assert_eq!(hosted, [PaymentMethod::CreditCard, PaymentMethod::DebitCard]);
        assert_eq!(
            "debit_card".parse::<PaymentMethod>().unwrap(),
            PaymentMethod::DebitCard
        );
        assert_eq!(
            serde_json::to_string(&PaymentMethod::CreditCard).unwrap(),
            "\"credit_card\""
        );
    }

    #[test]
    fn test_order_totals() {
        let cart = Cart::new(vec![CartLine {
            product_id: ProductId::new(1),
            name: "Ração".to_string(),
            unit_price: "49.90".parse().unwrap(),
            quantity: 2,
            image_url: None,
            weight_kg: None,
        }]);
        let totals = OrderTotals::compute(&cart, "14.6".parse().unwrap());
        assert_eq!(totals.subtotal, "99.80".parse::<Decimal>().unwrap());
        assert_eq!(totals.shipping_fee, "14.60".parse::<Decimal>().unwrap());
        assert_eq!(totals.total, "114.40".parse::<Decimal>().unwrap());
    }
}
