//! Booking clients and their pets.

use sqlx::{PgExecutor, PgPool};

use petshop_core::booking::NewPet;
use petshop_core::{ClientId, PetId, UserId};

use super::RepositoryError;
use crate::models::{Client, Pet};

pub struct ClientRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ClientRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_user(&self, user_id: UserId) -> Result<Option<Client>, RepositoryError> {
        let client = sqlx::query_as::<_, Client>(
            "SELECT id, user_id, name, email, phone FROM petshop.client WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;
        Ok(client)
    }

    /// Return the user's client record, creating it on first use.
    ///
    /// An existing record keeps its name; a missing e-mail is filled in.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the upsert fails.
    pub async fn ensure(
        &self,
        user_id: UserId,
        name: &str,
        email: Option<&str>,
    ) -> Result<Client, RepositoryError> {
        let client = sqlx::query_as::<_, Client>(
            r"
            INSERT INTO petshop.client (user_id, name, email)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id)
            DO UPDATE SET email = COALESCE(petshop.client.email, EXCLUDED.email)
            RETURNING id, user_id, name, email, phone
            ",
        )
        .bind(user_id)
        .bind(name)
        .bind(email)
        .fetch_one(self.pool)
        .await?;
        Ok(client)
    }

    /// Pets of a client, by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn pets(&self, client_id: ClientId) -> Result<Vec<Pet>, RepositoryError> {
        let pets = sqlx::query_as::<_, Pet>(
            r"
            SELECT id, client_id, name, species, breed, notes
            FROM petshop.pet WHERE client_id = $1 ORDER BY name, id
            ",
        )
        .bind(client_id)
        .fetch_all(self.pool)
        .await?;
        Ok(pets)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create_pet(&self, client_id: ClientId, pet: &NewPet) -> Result<Pet, RepositoryError> {
        insert_pet(self.pool, client_id, pet).await
    }
}

/// A pet, only if it belongs to `client_id`.
pub(crate) async fn find_pet<'e>(
    executor: impl PgExecutor<'e>,
    client_id: ClientId,
    pet_id: PetId,
) -> Result<Option<Pet>, RepositoryError> {
    let pet = sqlx::query_as::<_, Pet>(
        r"
        SELECT id, client_id, name, species, breed, notes
        FROM petshop.pet WHERE id = $1 AND client_id = $2
        ",
    )
    .bind(pet_id)
    .bind(client_id)
    .fetch_optional(executor)
    .await?;
    Ok(pet)
}

/// Pet insert usable inside a caller's transaction.
pub(crate) async fn insert_pet<'e>(
    executor: impl PgExecutor<'e>,
    client_id: ClientId,
    pet: &NewPet,
) -> Result<Pet, RepositoryError> {
    let pet = sqlx::query_as::<_, Pet>(
        r"
        INSERT INTO petshop.pet (client_id, name, species, breed, notes)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, client_id, name, species, breed, notes
        ",
    )
    .bind(client_id)
    .bind(pet.name.trim())
    .bind(pet.species)
    .bind(pet.breed.as_deref().map(str::trim).filter(|b| !b.is_empty()))
    .bind(pet.notes.as_deref().map(str::trim).filter(|n| !n.is_empty()))
    .fetch_one(executor)
    .await?;
    Ok(pet)
}
