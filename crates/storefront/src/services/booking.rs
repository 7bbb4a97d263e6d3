//! Appointment booking.
//!
//! The handler walks a [`BookingWizard`] through its guarded steps; this
//! module turns the confirmed draft into rows: it resolves the client and
//! pet, checks that every planned start is free, writes all appointments in
//! one transaction and then fires best-effort notifications.

use std::future::Future;

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use thiserror::Error;

use petshop_core::booking::{
    BookingDraft, BookingError, BookingWizard, PetChoice, PlannedAppointment, ServiceChoice,
};
use petshop_core::contact;
use petshop_core::schedule::{self, SlotAvailability};
use petshop_core::{ClientId, ServiceId};

use super::auth::AuthUser;
use super::functions::AppointmentNotice;
use super::notifications::{Notifier, notify_all};
use crate::db::{AppointmentRepository, ClientRepository, RepositoryError, ServiceRepository};
use crate::models::{Appointment, Client, Pet};

/// Errors from submitting a booking.
#[derive(Debug, Error)]
pub enum BookingServiceError {
    /// A wizard guard failed.
    #[error(transparent)]
    Invalid(#[from] BookingError),

    /// One of the planned start times is already booked.
    #[error("slot already booked")]
    SlotTaken,

    /// The chosen pet does not belong to the caller.
    #[error("pet not found")]
    PetNotFound,

    /// The draft's date and time do not map to an instant.
    #[error("invalid appointment time")]
    InvalidTime,

    #[error(transparent)]
    Repository(RepositoryError),
}

impl From<RepositoryError> for BookingServiceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Conflict(_) => Self::SlotTaken,
            other => Self::Repository(other),
        }
    }
}

/// Booking request body.
#[derive(Debug, Clone, Deserialize)]
pub struct BookingRequest {
    pub service_ids: Vec<ServiceId>,
    pub pet: PetChoice,
    pub date: NaiveDate,
    /// Slot label, `HH:MM`.
    pub time: String,
}

/// Result of a successful booking.
#[derive(Debug, Clone, Serialize)]
pub struct BookingOutcome {
    pub created: usize,
    pub appointments: Vec<Appointment>,
    /// Link for contacting the shop about the booking, when configured.
    pub whatsapp_link: Option<String>,
}

/// Storage used by the booking flow.
pub trait BookingStore: Send + Sync {
    /// Find or create the client record of a user.
    fn ensure_client(&self, user: &AuthUser) -> impl Future<Output = Result<Client, RepositoryError>> + Send;

    /// Start instants among `starts` that are already booked.
    fn taken(
        &self,
        starts: &[DateTime<Utc>],
    ) -> impl Future<Output = Result<Vec<DateTime<Utc>>, RepositoryError>> + Send;

    /// Start instants of all appointments in `[from, to)`.
    fn booked_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> impl Future<Output = Result<Vec<DateTime<Utc>>, RepositoryError>> + Send;

    /// Load the client's pet (or register the new one) and write every
    /// planned appointment atomically. `NotFound` for a pet the client
    /// doesn't own.
    fn book(
        &self,
        client_id: ClientId,
        pet: &PetChoice,
        planned: &[PlannedAppointment],
    ) -> impl Future<Output = Result<(Pet, Vec<Appointment>), RepositoryError>> + Send;
}

/// [`BookingStore`] backed by `PostgreSQL`.
pub struct PgBookingStore<'a> {
    pool: &'a PgPool,
}

impl<'a> PgBookingStore<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }
}

impl BookingStore for PgBookingStore<'_> {
    async fn ensure_client(&self, user: &AuthUser) -> Result<Client, RepositoryError> {
        let name = user
            .email
            .as_deref()
            .and_then(|email| email.split('@').next())
            .unwrap_or("Cliente");
        ClientRepository::new(self.pool)
            .ensure(user.id, name, user.email.as_deref())
            .await
    }

    async fn taken(&self, starts: &[DateTime<Utc>]) -> Result<Vec<DateTime<Utc>>, RepositoryError> {
        AppointmentRepository::new(self.pool).taken(starts).await
    }

    async fn booked_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<DateTime<Utc>>, RepositoryError> {
        AppointmentRepository::new(self.pool).starts_between(from, to).await
    }

    async fn book(
        &self,
        client_id: ClientId,
        pet: &PetChoice,
        planned: &[PlannedAppointment],
    ) -> Result<(Pet, Vec<Appointment>), RepositoryError> {
        AppointmentRepository::new(self.pool)
            .book(client_id, pet, planned)
            .await
    }
}

/// Slot availability for a day, and whether storage could be consulted.
#[derive(Debug, Clone, Serialize)]
pub struct DayAvailability {
    pub date: NaiveDate,
    pub checked: bool,
    pub slots: Vec<SlotAvailability>,
}

/// Availability of the fixed slots on `date`.
///
/// If the lookup fails every slot is reported available with
/// `checked: false`; the unique start-time constraint still rejects a
/// double booking on submit.
pub async fn day_availability<S: BookingStore>(
    store: &S,
    date: NaiveDate,
    offset: FixedOffset,
) -> DayAvailability {
    let occupied = match schedule::day_bounds(date, offset) {
        Some((from, to)) => match store.booked_between(from, to).await {
            Ok(starts) => Some(schedule::occupied_times(&starts, offset)),
            Err(e) => {
                tracing::warn!(error = %e, %date, "Availability lookup failed, showing all slots");
                None
            }
        },
        None => None,
    };

    DayAvailability {
        date,
        checked: occupied.is_some(),
        slots: schedule::slot_availability(&occupied.unwrap_or_default()),
    }
}

/// Booking orchestration over a store and a notifier.
pub struct BookingService<'a, S, N> {
    store: &'a S,
    notifier: &'a N,
    offset: FixedOffset,
    whatsapp_number: Option<&'a str>,
}

impl<'a, S: BookingStore, N: Notifier> BookingService<'a, S, N> {
    #[must_use]
    pub const fn new(
        store: &'a S,
        notifier: &'a N,
        offset: FixedOffset,
        whatsapp_number: Option<&'a str>,
    ) -> Self {
        Self {
            store,
            notifier,
            offset,
            whatsapp_number,
        }
    }

    /// Walk the wizard through every step for a one-shot API request.
    ///
    /// `services` must be the active services matching the request ids.
    ///
    /// # Errors
    ///
    /// Returns the first failed guard (repeated or missing service, no pet,
    /// weekend or past date, unknown or taken slot).
    pub async fn prepare(
        &self,
        request: &BookingRequest,
        services: Vec<ServiceChoice>,
        today: NaiveDate,
    ) -> Result<BookingWizard, BookingServiceError> {
        let mut wizard = BookingWizard::new();
        for (n, service) in services.iter().enumerate() {
            if services.iter().take(n).any(|earlier| earlier.id == service.id) {
                return Err(BookingError::DuplicateService(service.id).into());
            }
        }
        for service in services {
            wizard.toggle_service(service)?;
        }
        wizard.next()?;
        wizard.select_pet(request.pet.clone())?;
        wizard.next()?;
        wizard.select_date(request.date, today)?;
        let availability = day_availability(self.store, request.date, self.offset).await;
        wizard.select_time(&request.time, &availability.slots)?;
        wizard.next()?;
        Ok(wizard)
    }

    /// Persist a confirmed wizard and notify.
    ///
    /// # Errors
    ///
    /// Returns `BookingServiceError::SlotTaken` if any planned start is
    /// already booked (checked up front and again by the unique constraint),
    /// `PetNotFound` for a pet that isn't the caller's, and repository errors.
    #[tracing::instrument(skip(self, user, wizard), fields(user_id = %user.id))]
    pub async fn submit(
        &self,
        user: &AuthUser,
        wizard: &mut BookingWizard,
    ) -> Result<BookingOutcome, BookingServiceError> {
        let draft = wizard
            .draft()
            .cloned()
            .ok_or(BookingError::WrongStep(wizard.step()))?;

        let planned = draft.plan(self.offset).ok_or(BookingServiceError::InvalidTime)?;
        let starts: Vec<DateTime<Utc>> = planned.iter().map(|p| p.starts_at).collect();
        if !self.store.taken(&starts).await?.is_empty() {
            return Err(BookingServiceError::SlotTaken);
        }

        let client = self.store.ensure_client(user).await?;
        let (pet, appointments) = self
            .store
            .book(client.id, &draft.pet, &planned)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => BookingServiceError::PetNotFound,
                other => other.into(),
            })?;

        wizard.complete(appointments.len())?;
        tracing::info!(created = appointments.len(), "Appointments booked");

        let notices = notices_for(&draft, &client, &pet, &planned);
        notify_all(self.notifier, &notices).await;

        let whatsapp_link = self.whatsapp_number.map(|number| {
            let message = contact::booking_message(
                &pet.name,
                &draft.date.format("%d/%m/%Y").to_string(),
                &schedule::slot_label(draft.time),
            );
            contact::whatsapp_link(number, &message)
        });

        Ok(BookingOutcome {
            created: appointments.len(),
            appointments,
            whatsapp_link,
        })
    }
}

fn notices_for(
    draft: &BookingDraft,
    client: &Client,
    pet: &Pet,
    planned: &[PlannedAppointment],
) -> Vec<AppointmentNotice> {
    draft
        .services
        .iter()
        .zip(planned)
        .map(|(service, slot)| AppointmentNotice {
            client_name: client.name.clone(),
            client_email: client.email.clone(),
            pet_name: pet.name.clone(),
            service_name: service.name.clone(),
            starts_at: slot.starts_at,
            ends_at: slot.ends_at,
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use petshop_core::booking::NewPet;
    use petshop_core::schedule::DEFAULT_UTC_OFFSET_HOURS;
    use petshop_core::{AppointmentId, PetId, PetType, UserId};

    use crate::services::functions::FunctionsError;

    #[derive(Default)]
    struct FakeStore {
        booked: Mutex<Vec<Appointment>>,
        pets: Mutex<Vec<Pet>>,
        fail_lookup: bool,
        /// Reads miss rows booked concurrently.
        stale_reads: bool,
    }

    impl FakeStore {
        fn with_booked(starts: &[DateTime<Utc>]) -> Self {
            let store = Self::default();
            {
                let mut booked = store.booked.lock().unwrap();
                for (n, start) in starts.iter().enumerate() {
                    booked.push(appointment(n, ClientId::new(99), PetId::new(99), ServiceId::new(1), *start));
                }
            }
            store
        }
    }

    fn appointment(
        n: usize,
        client_id: ClientId,
        pet_id: PetId,
        service_id: ServiceId,
        starts_at: DateTime<Utc>,
    ) -> Appointment {
        Appointment {
            id: AppointmentId::new(i64::try_from(n).unwrap() + 1),
            client_id,
            pet_id,
            service_id,
            starts_at,
            ends_at: starts_at + chrono::Duration::minutes(60),
            attended: false,
            created_at: Utc::now(),
        }
    }

    impl BookingStore for FakeStore {
        async fn ensure_client(&self, user: &AuthUser) -> Result<Client, RepositoryError> {
            Ok(Client {
                id: ClientId::new(7),
                user_id: user.id,
                name: "Ana".to_owned(),
                email: user.email.clone(),
                phone: None,
            })
        }

        async fn taken(&self, starts: &[DateTime<Utc>]) -> Result<Vec<DateTime<Utc>>, RepositoryError> {
            if self.stale_reads {
                return Ok(Vec::new());
            }
            let booked = self.booked.lock().unwrap();
            Ok(booked
                .iter()
                .map(|a| a.starts_at)
                .filter(|start| starts.contains(start))
                .collect())
        }

        async fn booked_between(
            &self,
            from: DateTime<Utc>,
            to: DateTime<Utc>,
        ) -> Result<Vec<DateTime<Utc>>, RepositoryError> {
            if self.fail_lookup {
                return Err(RepositoryError::DataCorruption("lookup failed".to_owned()));
            }
            if self.stale_reads {
                return Ok(Vec::new());
            }
            let booked = self.booked.lock().unwrap();
            Ok(booked
                .iter()
                .map(|a| a.starts_at)
                .filter(|start| *start >= from && *start < to)
                .collect())
        }

        async fn book(
            &self,
            client_id: ClientId,
            pet: &PetChoice,
            planned: &[PlannedAppointment],
        ) -> Result<(Pet, Vec<Appointment>), RepositoryError> {
            let mut booked = self.booked.lock().unwrap();
            if booked.iter().any(|a| planned.iter().any(|p| p.starts_at == a.starts_at)) {
                return Err(RepositoryError::Conflict("slot taken".to_owned()));
            }
            let pet = match pet {
                PetChoice::Existing(id) if *id == PetId::new(3) => Pet {
                    id: *id,
                    client_id,
                    name: "Rex".to_owned(),
                    species: PetType::Dog,
                    breed: None,
                    notes: None,
                },
                PetChoice::Existing(_) => return Err(RepositoryError::NotFound),
                PetChoice::New(details) => {
                    let pet = Pet {
                        id: PetId::new(11),
                        client_id,
                        name: details.name.clone(),
                        species: details.species,
                        breed: details.breed.clone(),
                        notes: details.notes.clone(),
                    };
                    self.pets.lock().unwrap().push(pet.clone());
                    pet
                }
            };
            let base = booked.len();
            let created: Vec<Appointment> = planned
                .iter()
                .enumerate()
                .map(|(k, p)| {
                    let mut row = appointment(base + k, client_id, pet.id, p.service_id, p.starts_at);
                    row.ends_at = p.ends_at;
                    row
                })
                .collect();
            booked.extend(created.iter().cloned());
            Ok((pet, created))
        }
    }

    #[derive(Default)]
    struct FakeNotifier {
        fail: bool,
        emails: AtomicUsize,
        events: AtomicUsize,
    }

    impl Notifier for FakeNotifier {
        async fn appointment_email(&self, _notice: &AppointmentNotice) -> Result<(), FunctionsError> {
            self.emails.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(FunctionsError::Api {
                    status: 500,
                    message: "mail down".to_owned(),
                });
            }
            Ok(())
        }

        async fn calendar_event(&self, _notice: &AppointmentNotice) -> Result<(), FunctionsError> {
            self.events.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(FunctionsError::Parse("bad calendar".to_owned()));
            }
            Ok(())
        }
    }

    fn offset() -> FixedOffset {
        schedule::shop_offset(DEFAULT_UTC_OFFSET_HOURS).unwrap()
    }

    // Monday
    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2030, 3, 4).unwrap()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2030, 3, 1).unwrap()
    }

    fn at(hour: u32) -> DateTime<Utc> {
        schedule::slot_start(
            monday(),
            chrono::NaiveTime::from_hms_opt(hour, 0, 0).unwrap(),
            offset(),
        )
        .unwrap()
    }

    fn services() -> Vec<ServiceChoice> {
        vec![
            ServiceChoice {
                id: ServiceId::new(1),
                name: "Banho".to_owned(),
                duration_minutes: 60,
            },
            ServiceChoice {
                id: ServiceId::new(2),
                name: "Tosa".to_owned(),
                duration_minutes: 90,
            },
        ]
    }

    fn user() -> AuthUser {
        AuthUser {
            id: UserId::from(uuid::Uuid::nil()),
            email: Some("ana@example.com".to_owned()),
        }
    }

    fn request(pet: PetChoice, time: &str) -> BookingRequest {
        BookingRequest {
            service_ids: vec![ServiceId::new(1), ServiceId::new(2)],
            pet,
            date: monday(),
            time: time.to_owned(),
        }
    }

    #[tokio::test]
    async fn test_two_services_create_two_rows_an_hour_apart() {
        let store = FakeStore::default();
        let notifier = FakeNotifier::default();
        let service = BookingService::new(&store, &notifier, offset(), Some("+55 11 99999-0000"));

        let mut wizard = service
            .prepare(&request(PetChoice::Existing(PetId::new(3)), "09:00"), services(), today())
            .await
            .unwrap();
        let outcome = service.submit(&user(), &mut wizard).await.unwrap();

        assert_eq!(outcome.created, 2);
        let [first, second] = outcome.appointments.as_slice() else {
            panic!("expected two appointments");
        };
        assert_eq!(first.starts_at, at(9));
        assert_eq!(second.starts_at, at(10));
        assert_eq!(second.ends_at, at(10) + chrono::Duration::minutes(90));
        assert_eq!(first.pet_id, second.pet_id);
        assert_eq!(first.client_id, second.client_id);
        assert_eq!(wizard, BookingWizard::Success { created: 2 });
        assert_eq!(notifier.emails.load(Ordering::SeqCst), 2);
        assert_eq!(notifier.events.load(Ordering::SeqCst), 2);
        assert!(
            outcome
                .whatsapp_link
                .unwrap()
                .starts_with("https://wa.me/5511999990000?text=")
        );
    }

    #[tokio::test]
    async fn test_taken_follow_up_slot_rejected() {
        // 09:00 is free but the second service would start at 10:00.
        let store = FakeStore::with_booked(&[at(10)]);
        let notifier = FakeNotifier::default();
        let service = BookingService::new(&store, &notifier, offset(), None);

        let mut wizard = service
            .prepare(&request(PetChoice::Existing(PetId::new(3)), "09:00"), services(), today())
            .await
            .unwrap();
        let err = service.submit(&user(), &mut wizard).await.unwrap_err();

        assert!(matches!(err, BookingServiceError::SlotTaken));
        assert_eq!(store.booked.lock().unwrap().len(), 1);
        assert_eq!(notifier.emails.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_taken_chosen_slot_fails_the_guard() {
        let store = FakeStore::with_booked(&[at(9)]);
        let notifier = FakeNotifier::default();
        let service = BookingService::new(&store, &notifier, offset(), None);

        let err = service
            .prepare(&request(PetChoice::Existing(PetId::new(3)), "09:00"), services(), today())
            .await
            .unwrap_err();
        assert!(matches!(err, BookingServiceError::Invalid(BookingError::Schedule(_))));
    }

    #[tokio::test]
    async fn test_notification_failures_do_not_fail_booking() {
        let store = FakeStore::default();
        let notifier = FakeNotifier {
            fail: true,
            ..FakeNotifier::default()
        };
        let service = BookingService::new(&store, &notifier, offset(), None);
        let pet = PetChoice::New(NewPet {
            name: "Mia".to_owned(),
            species: PetType::Cat,
            breed: None,
            notes: None,
        });

        let mut wizard = service
            .prepare(&request(pet, "14:00"), services(), today())
            .await
            .unwrap();
        let outcome = service.submit(&user(), &mut wizard).await.unwrap();

        assert_eq!(outcome.created, 2);
        assert!(outcome.whatsapp_link.is_none());
        assert_eq!(notifier.emails.load(Ordering::SeqCst), 2);
        assert_eq!(notifier.events.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_concurrent_booking_keeps_no_new_pet() {
        let store = FakeStore {
            stale_reads: true,
            ..FakeStore::with_booked(&[at(15)])
        };
        let notifier = FakeNotifier::default();
        let service = BookingService::new(&store, &notifier, offset(), None);
        let pet = PetChoice::New(NewPet {
            name: "Thor".to_owned(),
            species: PetType::Dog,
            breed: None,
            notes: None,
        });

        let mut wizard = service
            .prepare(&request(pet, "14:00"), services(), today())
            .await
            .unwrap();
        let err = service.submit(&user(), &mut wizard).await.unwrap_err();

        assert!(matches!(err, BookingServiceError::SlotTaken));
        assert!(store.pets.lock().unwrap().is_empty());
        assert_eq!(store.booked.lock().unwrap().len(), 1);
        assert_eq!(notifier.emails.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_foreign_pet_rejected() {
        let store = FakeStore::default();
        let notifier = FakeNotifier::default();
        let service = BookingService::new(&store, &notifier, offset(), None);

        let mut wizard = service
            .prepare(&request(PetChoice::Existing(PetId::new(42)), "08:00"), services(), today())
            .await
            .unwrap();
        let err = service.submit(&user(), &mut wizard).await.unwrap_err();
        assert!(matches!(err, BookingServiceError::PetNotFound));
        assert!(store.booked.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_repeated_service_rejected() {
        let store = FakeStore::default();
        let notifier = FakeNotifier::default();
        let service = BookingService::new(&store, &notifier, offset(), None);
        let mut repeated = request(PetChoice::Existing(PetId::new(3)), "09:00");
        repeated.service_ids.push(ServiceId::new(1));
        let mut choices = services();
        choices.extend(services().into_iter().take(1));

        let err = service.prepare(&repeated, choices, today()).await.unwrap_err();
        assert!(matches!(
            err,
            BookingServiceError::Invalid(BookingError::DuplicateService(id)) if id == ServiceId::new(1)
        ));
        assert!(store.booked.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_weekend_rejected() {
        let store = FakeStore::default();
        let notifier = FakeNotifier::default();
        let service = BookingService::new(&store, &notifier, offset(), None);
        let mut saturday = request(PetChoice::Existing(PetId::new(3)), "08:00");
        saturday.date = NaiveDate::from_ymd_opt(2030, 3, 2).unwrap();

        let err = service.prepare(&saturday, services(), today()).await.unwrap_err();
        assert!(matches!(err, BookingServiceError::Invalid(BookingError::Schedule(_))));
    }

    #[tokio::test]
    async fn test_availability_marks_booked_slots() {
        let store = FakeStore::with_booked(&[at(8), at(14)]);
        let day = day_availability(&store, monday(), offset()).await;

        assert!(day.checked);
        let unavailable: Vec<&str> = day
            .slots
            .iter()
            .filter(|slot| !slot.available)
            .map(|slot| slot.time.as_str())
            .collect();
        assert_eq!(unavailable, vec!["08:00", "14:00"]);
        assert_eq!(day.slots.iter().filter(|slot| slot.available).count(), 6);
    }

    #[tokio::test]
    async fn test_availability_lookup_failure_is_permissive() {
        let store = FakeStore {
            fail_lookup: true,
            ..FakeStore::default()
        };
        let day = day_availability(&store, monday(), offset()).await;

        assert!(!day.checked);
        assert_eq!(day.slots.len(), 8);
        assert!(day.slots.iter().all(|slot| slot.available));
    }
}
