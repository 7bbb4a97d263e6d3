//! Grooming agenda.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, put},
};
use chrono::NaiveDate;
use serde::Deserialize;

use petshop_core::AppointmentId;
use petshop_core::schedule::day_bounds;
use petshop_storefront::db::AppointmentRepository;
use petshop_storefront::error::{AppError, Result};
use petshop_storefront::models::AppointmentView;

use crate::middleware::{RequireAdmin, RequireWriter};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/appointments", get(by_date))
        .route("/api/appointments/{id}/attended", put(set_attended))
}

#[derive(Debug, Deserialize)]
pub struct AgendaQuery {
    /// Shop-local day; today when absent.
    pub date: Option<NaiveDate>,
}

/// Appointments of one shop-local day, in time order.
///
/// # Errors
///
/// Returns `AppError::BadRequest` for a date the offset cannot represent.
pub async fn agenda(state: &AppState, date: NaiveDate) -> Result<Vec<AppointmentView>> {
    let (from, to) = day_bounds(date, state.shop_offset())
        .ok_or_else(|| AppError::BadRequest(format!("invalid date {date}")))?;
    Ok(AppointmentRepository::new(state.pool()).between(from, to).await?)
}

async fn by_date(
    RequireAdmin(_): RequireAdmin,
    State(state): State<AppState>,
    Query(query): Query<AgendaQuery>,
) -> Result<Json<Vec<AppointmentView>>> {
    let date = query.date.unwrap_or_else(|| state.today());
    Ok(Json(agenda(&state, date).await?))
}

#[derive(Debug, Deserialize)]
pub struct AttendedBody {
    pub attended: bool,
}

#[tracing::instrument(skip(state, admin), fields(admin_id = %admin.user.id))]
async fn set_attended(
    RequireWriter(admin): RequireWriter,
    State(state): State<AppState>,
    Path(id): Path<AppointmentId>,
    Json(body): Json<AttendedBody>,
) -> Result<StatusCode> {
    AppointmentRepository::new(state.pool())
        .set_attended(id, body.attended)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
