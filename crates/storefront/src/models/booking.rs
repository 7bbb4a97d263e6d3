//! Clients, pets, services and appointments.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use petshop_core::booking::ServiceChoice;
use petshop_core::{AppointmentId, ClientId, PetId, PetType, ServiceId, UserId};

/// The booking profile of a signed-in customer.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Client {
    pub id: ClientId,
    pub user_id: UserId,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Pet {
    pub id: PetId,
    pub client_id: ClientId,
    pub name: String,
    pub species: PetType,
    pub breed: Option<String>,
    pub notes: Option<String>,
}

/// A bookable service (bath, grooming, vet visit...).
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Service {
    pub id: ServiceId,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub duration_minutes: i32,
    pub active: bool,
}

impl Service {
    #[must_use]
    pub fn choice(&self) -> ServiceChoice {
        ServiceChoice {
            id: self.id,
            name: self.name.clone(),
            duration_minutes: u32::try_from(self.duration_minutes).unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Appointment {
    pub id: AppointmentId,
    pub client_id: ClientId,
    pub pet_id: PetId,
    pub service_id: ServiceId,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub attended: bool,
    pub created_at: DateTime<Utc>,
}

/// An appointment joined with the names shown in listings.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct AppointmentView {
    pub id: AppointmentId,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub attended: bool,
    pub service_id: ServiceId,
    pub service_name: String,
    pub pet_id: PetId,
    pub pet_name: String,
    pub client_name: String,
}
