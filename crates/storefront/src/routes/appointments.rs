//! Booking: services, pets, availability and appointments.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
};
use chrono::NaiveDate;
use serde::Deserialize;

use petshop_core::booking::{BookingError, NewPet};
use petshop_core::schedule;

use crate::db::{AppointmentRepository, ClientRepository, RepositoryError, ServiceRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::{AppointmentView, Pet, Service};
use crate::services::booking::{
    BookingOutcome, BookingRequest, BookingService, BookingStore, DayAvailability, PgBookingStore,
    day_availability,
};
use crate::state::AppState;

/// Booking submission route, rate limited separately in `main`.
pub fn submit_router() -> Router<AppState> {
    Router::new().route("/api/appointments", post(book))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/appointments", get(my_appointments))
        .route("/api/appointments/availability", get(availability))
        .route("/api/services", get(list_services))
        .route("/api/pets", get(my_pets).post(register_pet))
}

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub date: NaiveDate,
}

#[tracing::instrument(skip(state))]
async fn availability(
    State(state): State<AppState>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<DayAvailability>> {
    schedule::is_bookable_date(query.date, state.today()).map_err(BookingError::from)?;
    let store = PgBookingStore::new(state.pool());
    Ok(Json(day_availability(&store, query.date, state.shop_offset()).await))
}

async fn list_services(State(state): State<AppState>) -> Result<Json<Vec<Service>>> {
    Ok(Json(ServiceRepository::new(state.pool()).list(false).await?))
}

#[tracing::instrument(skip(state, user, request), fields(user_id = %user.id))]
async fn book(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Json(request): Json<BookingRequest>,
) -> Result<(StatusCode, Json<BookingOutcome>)> {
    let services = ServiceRepository::new(state.pool())
        .get_active(&request.service_ids)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => {
                AppError::BadRequest("one or more services are not available".to_owned())
            }
            other => other.into(),
        })?;
    let choices = services.iter().map(Service::choice).collect();

    let store = PgBookingStore::new(state.pool());
    let booking = BookingService::new(
        &store,
        state.functions(),
        state.shop_offset(),
        state.config().whatsapp_number.as_deref(),
    );
    let mut wizard = booking.prepare(&request, choices, state.today()).await?;
    let outcome = booking.submit(&user, &mut wizard).await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

async fn my_appointments(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
) -> Result<Json<Vec<AppointmentView>>> {
    let Some(client) = ClientRepository::new(state.pool()).find_by_user(user.id).await? else {
        return Ok(Json(Vec::new()));
    };
    Ok(Json(
        AppointmentRepository::new(state.pool()).for_client(client.id).await?,
    ))
}

async fn my_pets(RequireAuth(user): RequireAuth, State(state): State<AppState>) -> Result<Json<Vec<Pet>>> {
    let clients = ClientRepository::new(state.pool());
    let Some(client) = clients.find_by_user(user.id).await? else {
        return Ok(Json(Vec::new()));
    };
    Ok(Json(clients.pets(client.id).await?))
}

async fn register_pet(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Json(pet): Json<NewPet>,
) -> Result<(StatusCode, Json<Pet>)> {
    if pet.name.trim().is_empty() {
        return Err(BookingError::PetNameRequired.into());
    }
    let store = PgBookingStore::new(state.pool());
    let client = store.ensure_client(&user).await?;
    let pet = ClientRepository::new(state.pool())
        .create_pet(client.id, &pet)
        .await?;
    Ok((StatusCode::CREATED, Json(pet)))
}
