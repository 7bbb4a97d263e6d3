//! Dashboard overview.

use axum::{Json, Router, extract::State, routing::get};
use chrono::NaiveDate;
use serde::Serialize;

use petshop_core::OrderStatus;
use petshop_storefront::db::{OrderRepository, ProductRepository};
use petshop_storefront::error::Result;
use petshop_storefront::models::{AppointmentView, Product};

use super::appointments::agenda;
use crate::middleware::RequireAdmin;
use crate::state::AppState;

/// Products at or below this many units are flagged.
pub const LOW_STOCK_THRESHOLD: i32 = 5;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/dashboard", get(dashboard))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusCount {
    pub status: OrderStatus,
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct Dashboard {
    pub date: NaiveDate,
    pub orders_by_status: Vec<StatusCount>,
    /// Orders that still need work from the shop.
    pub open_orders: i64,
    pub todays_appointments: Vec<AppointmentView>,
    pub low_stock: Vec<Product>,
}

fn status_counts(rows: Vec<(OrderStatus, i64)>) -> (Vec<StatusCount>, i64) {
    let open = rows
        .iter()
        .filter(|(status, _)| status.is_open())
        .map(|(_, count)| count)
        .sum();
    let counts = rows
        .into_iter()
        .map(|(status, count)| StatusCount { status, count })
        .collect();
    (counts, open)
}

#[tracing::instrument(skip_all)]
async fn dashboard(
    RequireAdmin(_): RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<Dashboard>> {
    let date = state.today();
    let rows = OrderRepository::new(state.pool()).count_by_status().await?;
    let (orders_by_status, open_orders) = status_counts(rows);
    let todays_appointments = agenda(&state, date).await?;
    let low_stock = ProductRepository::new(state.pool())
        .low_stock(LOW_STOCK_THRESHOLD)
        .await?;

    Ok(Json(Dashboard {
        date,
        orders_by_status,
        open_orders,
        todays_appointments,
        low_stock,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_orders_skip_closed_statuses() {
        let (counts, open) = status_counts(vec![
            (OrderStatus::Pending, 2),
            (OrderStatus::Shipped, 3),
            (OrderStatus::Delivered, 10),
            (OrderStatus::Canceled, 4),
        ]);
        assert_eq!(open, 5);
        assert_eq!(counts.len(), 4);
        assert_eq!(
            counts.first(),
            Some(&StatusCount {
                status: OrderStatus::Pending,
                count: 2
            })
        );
    }
}
