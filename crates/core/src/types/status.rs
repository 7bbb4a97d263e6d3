//! Status enums for orders and back-office roles.

use serde::{Deserialize, Serialize};

/// Lifecycle status of an order.
///
/// Stored as the `petshop.order_status` Postgres enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "petshop.order_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Created, payment not confirmed yet.
    #[default]
    Pending,
    Paid,
    Preparing,
    Shipped,
    Delivered,
    Canceled,
    RefundInProgress,
    Refunded,
    Completed,
}

impl OrderStatus {
    pub const ALL: [Self; 9] = [
        Self::Pending,
        Self::Paid,
        Self::Preparing,
        Self::Shipped,
        Self::Delivered,
        Self::Canceled,
        Self::RefundInProgress,
        Self::Refunded,
        Self::Completed,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Preparing => "preparing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Canceled => "canceled",
            Self::RefundInProgress => "refund_in_progress",
            Self::Refunded => "refunded",
            Self::Completed => "completed",
        }
    }

    /// Status an order moves to when its customer asks to cancel it.
    ///
    /// Unpaid orders are simply canceled; orders whose money was already
    /// captured but that have not left the shop go to refund. Anything that
    /// has shipped (or is already closed) cannot be canceled by the customer.
    #[must_use]
    pub const fn customer_cancellation(self) -> Option<Self> {
        match self {
            Self::Pending => Some(Self::Canceled),
            Self::Paid | Self::Preparing => Some(Self::RefundInProgress),
            _ => None,
        }
    }

    /// Whether the order still counts as open work for the shop.
    #[must_use]
    pub const fn is_open(self) -> bool {
        matches!(
            self,
            Self::Pending | Self::Paid | Self::Preparing | Self::Shipped | Self::RefundInProgress
        )
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("invalid order status: {s}"))
    }
}

/// Back-office role with different permission levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "petshop.admin_role", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum AdminRole {
    /// Full access to store management features.
    Admin,
    /// Read-only access to store data.
    Viewer,
}

impl AdminRole {
    #[must_use]
    pub const fn can_write(self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl std::fmt::Display for AdminRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Admin => write!(f, "admin"),
            Self::Viewer => write!(f, "viewer"),
        }
    }
}

impl std::str::FromStr for AdminRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "viewer" => Ok(Self::Viewer),
            _ => Err(format!("invalid admin role: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_serde_matches_as_str() {
        for status in OrderStatus::ALL {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_customer_cancellation() {
        assert_eq!(
            OrderStatus::Pending.customer_cancellation(),
            Some(OrderStatus::Canceled)
        );
        assert_eq!(
            OrderStatus::Paid.customer_cancellation(),
            Some(OrderStatus::RefundInProgress)
        );
        assert_eq!(
            OrderStatus::Preparing.customer_cancellation(),
            Some(OrderStatus::RefundInProgress)
        );
        assert_eq!(OrderStatus::Shipped.customer_cancellation(), None);
        assert_eq!(OrderStatus::Canceled.customer_cancellation(), None);
        assert_eq!(OrderStatus::Completed.customer_cancellation(), None);
    }

    #[test]
    fn test_admin_role_round_trip() {
        assert_eq!("admin".parse::<AdminRole>().unwrap(), AdminRole::Admin);
        assert_eq!("viewer".parse::<AdminRole>().unwrap(), AdminRole::Viewer);
        assert!("root".parse::<AdminRole>().is_err());
        assert!(AdminRole::Admin.can_write());
        assert!(!AdminRole::Viewer.can_write());
    }
}
