//! Appointments.
//!
//! `appointment.starts_at` is unique, so two bookings for the same slot can
//! never both commit; the loser gets [`RepositoryError::Conflict`].

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use petshop_core::booking::{PetChoice, PlannedAppointment};
use petshop_core::{AppointmentId, ClientId};

use super::RepositoryError;
use super::clients::{find_pet, insert_pet};
use crate::models::{Appointment, AppointmentView, Pet};

const SLOT_TAKEN: &str = "the selected time slot was just booked by someone else";

const VIEW_QUERY: &str = r"
    SELECT a.id, a.starts_at, a.ends_at, a.attended,
           a.service_id, s.name AS service_name,
           a.pet_id, p.name AS pet_name,
           c.name AS client_name
    FROM petshop.appointment a
    JOIN petshop.service s ON s.id = a.service_id
    JOIN petshop.pet p ON p.id = a.pet_id
    JOIN petshop.client c ON c.id = a.client_id
";

pub struct AppointmentRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AppointmentRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Start instants of appointments in `[from, to)`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn starts_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<DateTime<Utc>>, RepositoryError> {
        let starts = sqlx::query_scalar::<_, DateTime<Utc>>(
            r"
            SELECT starts_at FROM petshop.appointment
            WHERE starts_at >= $1 AND starts_at < $2
            ORDER BY starts_at
            ",
        )
        .bind(from)
        .bind(to)
        .fetch_all(self.pool)
        .await?;
        Ok(starts)
    }

    /// Which of `starts` are already booked.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn taken(&self, starts: &[DateTime<Utc>]) -> Result<Vec<DateTime<Utc>>, RepositoryError> {
        let taken = sqlx::query_scalar::<_, DateTime<Utc>>(
            "SELECT starts_at FROM petshop.appointment WHERE starts_at = ANY($1)",
        )
        .bind(starts)
        .fetch_all(self.pool)
        .await?;
        Ok(taken)
    }

    /// Resolve the pet and insert all planned appointments in one
    /// transaction.
    ///
    /// A new pet is only kept if every appointment is written.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if an existing pet does not belong
    /// to `client_id` and `RepositoryError::Conflict` if any slot is already
    /// booked. Nothing is written in either case.
    pub async fn book(
        &self,
        client_id: ClientId,
        pet: &PetChoice,
        planned: &[PlannedAppointment],
    ) -> Result<(Pet, Vec<Appointment>), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let pet = match pet {
            PetChoice::Existing(pet_id) => find_pet(&mut *tx, client_id, *pet_id)
                .await?
                .ok_or(RepositoryError::NotFound)?,
            PetChoice::New(details) => insert_pet(&mut *tx, client_id, details).await?,
        };

        let mut created = Vec::with_capacity(planned.len());
        for plan in planned {
            let appointment = sqlx::query_as::<_, Appointment>(
                r"
                INSERT INTO petshop.appointment (client_id, pet_id, service_id, starts_at, ends_at)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id, client_id, pet_id, service_id, starts_at, ends_at, attended, created_at
                ",
            )
            .bind(client_id)
            .bind(pet.id)
            .bind(plan.service_id)
            .bind(plan.starts_at)
            .bind(plan.ends_at)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| RepositoryError::from_unique(e, SLOT_TAKEN))?;
            created.push(appointment);
        }

        tx.commit().await?;
        Ok((pet, created))
    }

    /// A client's appointments, upcoming first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn for_client(&self, client_id: ClientId) -> Result<Vec<AppointmentView>, RepositoryError> {
        let appointments = sqlx::query_as::<_, AppointmentView>(&format!(
            "{VIEW_QUERY} WHERE a.client_id = $1 ORDER BY a.starts_at DESC"
        ))
        .bind(client_id)
        .fetch_all(self.pool)
        .await?;
        Ok(appointments)
    }

    /// All appointments starting in `[from, to)`, in time order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<AppointmentView>, RepositoryError> {
        let appointments = sqlx::query_as::<_, AppointmentView>(&format!(
            "{VIEW_QUERY} WHERE a.starts_at >= $1 AND a.starts_at < $2 ORDER BY a.starts_at"
        ))
        .bind(from)
        .bind(to)
        .fetch_all(self.pool)
        .await?;
        Ok(appointments)
    }

    /// Record whether the pet showed up.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the appointment does not exist.
    pub async fn set_attended(&self, id: AppointmentId, attended: bool) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE petshop.appointment SET attended = $2 WHERE id = $1")
            .bind(id)
            .bind(attended)
            .execute(self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
