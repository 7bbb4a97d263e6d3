//! Appointment booking wizard.
//!
//! The wizard is a tagged union: each step carries exactly the data that has
//! been collected so far, and moving forward is only possible when the
//! current step's guard is satisfied.
//!
//! ```text
//! ServiceSelection -> PetSelection -> DateTimeSelection -> Confirmation -> Success
//! ```
//!
//! A failed guard leaves the wizard on its current step and returns a
//! [`BookingError`] whose message can be shown to the customer as is.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::schedule::{self, ScheduleError};
use crate::{PetId, PetType, ServiceId};

/// Validation failures while moving through the wizard.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BookingError {
    #[error("select at least one service to continue")]
    NoServiceSelected,
    #[error("service {0} was requested more than once")]
    DuplicateService(ServiceId),
    #[error("select a pet to continue")]
    NoPetSelected,
    #[error("select a date and a time slot to continue")]
    NoSlotSelected,
    #[error("the pet's name is required")]
    PetNameRequired,
    #[error(transparent)]
    Schedule(#[from] ScheduleError),
    #[error("this action is not available on the {0} step")]
    WrongStep(BookingStep),
}

/// Wizard step, numbered from 1 as shown to the customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStep {
    ServiceSelection = 1,
    PetSelection = 2,
    DateTimeSelection = 3,
    Confirmation = 4,
    Success = 5,
}

impl std::fmt::Display for BookingStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::ServiceSelection => "service selection",
            Self::PetSelection => "pet selection",
            Self::DateTimeSelection => "date and time selection",
            Self::Confirmation => "confirmation",
            Self::Success => "success",
        };
        f.write_str(name)
    }
}

/// A service picked in the first step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceChoice {
    pub id: ServiceId,
    pub name: String,
    pub duration_minutes: u32,
}

/// Details for a pet registered during booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPet {
    pub name: String,
    pub species: PetType,
    #[serde(default)]
    pub breed: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// The pet an appointment is for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PetChoice {
    Existing(PetId),
    New(NewPet),
}

/// Everything needed to submit a booking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingDraft {
    pub services: Vec<ServiceChoice>,
    pub pet: PetChoice,
    pub date: NaiveDate,
    pub time: NaiveTime,
}

/// An appointment row about to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedAppointment {
    pub service_id: ServiceId,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

impl BookingDraft {
    /// One appointment per selected service.
    ///
    /// The first starts at the chosen slot and each following one starts an
    /// hour later, so services booked together never share a start time.
    /// Each appointment ends after its service's duration.
    #[must_use]
    pub fn plan(&self, offset: FixedOffset) -> Option<Vec<PlannedAppointment>> {
        let first = schedule::slot_start(self.date, self.time, offset)?;
        let planned = self
            .services
            .iter()
            .zip(0_i64..)
            .map(|(service, k)| {
                let starts_at = first + Duration::minutes(schedule::SLOT_MINUTES * k);
                PlannedAppointment {
                    service_id: service.id,
                    starts_at,
                    ends_at: starts_at + Duration::minutes(i64::from(service.duration_minutes)),
                }
            })
            .collect();
        Some(planned)
    }
}

/// The booking wizard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookingWizard {
    ServiceSelection {
        services: Vec<ServiceChoice>,
    },
    PetSelection {
        services: Vec<ServiceChoice>,
        pet: Option<PetChoice>,
    },
    DateTimeSelection {
        services: Vec<ServiceChoice>,
        pet: PetChoice,
        date: Option<NaiveDate>,
        time: Option<NaiveTime>,
    },
    Confirmation(BookingDraft),
    Success {
        created: usize,
    },
}

impl Default for BookingWizard {
    fn default() -> Self {
        Self::ServiceSelection {
            services: Vec::new(),
        }
    }
}

impl BookingWizard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn step(&self) -> BookingStep {
        match self {
            Self::ServiceSelection { .. } => BookingStep::ServiceSelection,
            Self::PetSelection { .. } => BookingStep::PetSelection,
            Self::DateTimeSelection { .. } => BookingStep::DateTimeSelection,
            Self::Confirmation(_) => BookingStep::Confirmation,
            Self::Success { .. } => BookingStep::Success,
        }
    }

    /// Add a service, or remove it if it is already selected.
    ///
    /// # Errors
    ///
    /// Only allowed on the service selection step.
    pub fn toggle_service(&mut self, choice: ServiceChoice) -> Result<(), BookingError> {
        let Self::ServiceSelection { services } = self else {
            return Err(BookingError::WrongStep(self.step()));
        };
        if let Some(pos) = services.iter().position(|s| s.id == choice.id) {
            services.remove(pos);
        } else {
            services.push(choice);
        }
        Ok(())
    }

    /// Choose the pet.
    ///
    /// # Errors
    ///
    /// Only allowed on the pet selection step; a new pet needs a name.
    pub fn select_pet(&mut self, choice: PetChoice) -> Result<(), BookingError> {
        let Self::PetSelection { pet, .. } = self else {
            return Err(BookingError::WrongStep(self.step()));
        };
        if let PetChoice::New(new_pet) = &choice
            && new_pet.name.trim().is_empty()
        {
            return Err(BookingError::PetNameRequired);
        }
        *pet = Some(choice);
        Ok(())
    }

    /// Choose the date. Clears any previously chosen slot.
    ///
    /// # Errors
    ///
    /// Only allowed on the date/time step; weekends and past dates are
    /// rejected.
    pub fn select_date(&mut self, chosen: NaiveDate, today: NaiveDate) -> Result<(), BookingError> {
        let Self::DateTimeSelection { date, time, .. } = self else {
            return Err(BookingError::WrongStep(self.step()));
        };
        schedule::is_bookable_date(chosen, today)?;
        *date = Some(chosen);
        *time = None;
        Ok(())
    }

    /// Choose a slot among those offered for the selected date.
    ///
    /// # Errors
    ///
    /// Only allowed on the date/time step after a date was chosen; the slot
    /// must be a candidate slot and currently available.
    pub fn select_time(
        &mut self,
        label: &str,
        availability: &[schedule::SlotAvailability],
    ) -> Result<(), BookingError> {
        let Self::DateTimeSelection { date, time, .. } = self else {
            return Err(BookingError::WrongStep(self.step()));
        };
        if date.is_none() {
            return Err(BookingError::NoSlotSelected);
        }
        let slot = schedule::parse_slot(label)?;
        let wanted = schedule::slot_label(slot);
        if availability
            .iter()
            .any(|s| s.time == wanted && !s.available)
        {
            return Err(ScheduleError::SlotTaken(wanted).into());
        }
        *time = Some(slot);
        Ok(())
    }

    /// Advance to the next step if the current step's guard holds.
    ///
    /// # Errors
    ///
    /// Returns the guard's validation error and leaves the wizard unchanged.
    pub fn next(&mut self) -> Result<BookingStep, BookingError> {
        let advanced = match self {
            Self::ServiceSelection { services } => {
                if services.is_empty() {
                    return Err(BookingError::NoServiceSelected);
                }
                Self::PetSelection {
                    services: std::mem::take(services),
                    pet: None,
                }
            }
            Self::PetSelection { services, pet } => {
                let Some(pet) = pet.take() else {
                    return Err(BookingError::NoPetSelected);
                };
                Self::DateTimeSelection {
                    services: std::mem::take(services),
                    pet,
                    date: None,
                    time: None,
                }
            }
            Self::DateTimeSelection {
                services,
                pet,
                date,
                time,
            } => {
                let (Some(date), Some(time)) = (*date, *time) else {
                    return Err(BookingError::NoSlotSelected);
                };
                Self::Confirmation(BookingDraft {
                    services: std::mem::take(services),
                    pet: pet.clone(),
                    date,
                    time,
                })
            }
            Self::Confirmation(_) | Self::Success { .. } => {
                return Err(BookingError::WrongStep(self.step()));
            }
        };
        *self = advanced;
        Ok(self.step())
    }

    /// Go back one step, keeping what was already chosen.
    ///
    /// # Errors
    ///
    /// There is nothing before service selection, and a finished booking
    /// cannot be reopened.
    pub fn back(&mut self) -> Result<BookingStep, BookingError> {
        let previous = match self {
            Self::PetSelection { services, .. } => Self::ServiceSelection {
                services: std::mem::take(services),
            },
            Self::DateTimeSelection { services, pet, .. } => Self::PetSelection {
                services: std::mem::take(services),
                pet: Some(pet.clone()),
            },
            Self::Confirmation(draft) => Self::DateTimeSelection {
                services: std::mem::take(&mut draft.services),
                pet: draft.pet.clone(),
                date: Some(draft.date),
                time: Some(draft.time),
            },
            Self::ServiceSelection { .. } | Self::Success { .. } => {
                return Err(BookingError::WrongStep(self.step()));
            }
        };
        *self = previous;
        Ok(self.step())
    }

    /// The draft being confirmed, if on the confirmation step.
    #[must_use]
    pub const fn draft(&self) -> Option<&BookingDraft> {
        match self {
            Self::Confirmation(draft) => Some(draft),
            _ => None,
        }
    }

    /// Record a successful submission.
    ///
    /// # Errors
    ///
    /// Only allowed from the confirmation step.
    pub fn complete(&mut self, created: usize) -> Result<(), BookingError> {
        if !matches!(self, Self::Confirmation(_)) {
            return Err(BookingError::WrongStep(self.step()));
        }
        *self = Self::Success { created };
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::schedule::{DEFAULT_UTC_OFFSET_HOURS, shop_offset, slot_availability};
    use std::collections::BTreeSet;

    fn bath() -> ServiceChoice {
        ServiceChoice {
            id: ServiceId::new(1),
            name: "Bath".to_string(),
            duration_minutes: 60,
        }
    }

    fn grooming() -> ServiceChoice {
        ServiceChoice {
            id: ServiceId::new(2),
            name: "Grooming".to_string(),
            duration_minutes: 90,
        }
    }

    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    fn at_date_step() -> BookingWizard {
        let mut wizard = BookingWizard::new();
        wizard.toggle_service(bath()).unwrap();
        wizard.toggle_service(grooming()).unwrap();
        wizard.next().unwrap();
        wizard.select_pet(PetChoice::Existing(PetId::new(7))).unwrap();
        wizard.next().unwrap();
        wizard
    }

    #[test]
    fn test_cannot_leave_service_step_without_service() {
        let mut wizard = BookingWizard::new();
        assert_eq!(wizard.next(), Err(BookingError::NoServiceSelected));
        assert_eq!(wizard.step(), BookingStep::ServiceSelection);
    }

    #[test]
    fn test_toggle_service_twice_deselects() {
        let mut wizard = BookingWizard::new();
        wizard.toggle_service(bath()).unwrap();
        wizard.toggle_service(bath()).unwrap();
        assert_eq!(wizard.next(), Err(BookingError::NoServiceSelected));
    }

    #[test]
    fn test_no_pet_does_not_advance_past_step_two() {
        let mut wizard = BookingWizard::new();
        wizard.toggle_service(bath()).unwrap();
        assert_eq!(wizard.next(), Ok(BookingStep::PetSelection));

        let err = wizard.next().unwrap_err();
        assert_eq!(err, BookingError::NoPetSelected);
        assert_eq!(err.to_string(), "select a pet to continue");
        assert_eq!(wizard.step(), BookingStep::PetSelection);
    }

    #[test]
    fn test_new_pet_needs_name() {
        let mut wizard = BookingWizard::new();
        wizard.toggle_service(bath()).unwrap();
        wizard.next().unwrap();
        let err = wizard
            .select_pet(PetChoice::New(NewPet {
                name: "  ".to_string(),
                species: PetType::Dog,
                breed: None,
                notes: None,
            }))
            .unwrap_err();
        assert_eq!(err, BookingError::PetNameRequired);
    }

    #[test]
    fn test_date_and_slot_required() {
        let mut wizard = at_date_step();
        assert_eq!(wizard.next(), Err(BookingError::NoSlotSelected));

        wizard.select_date(monday(), monday()).unwrap();
        assert_eq!(wizard.next(), Err(BookingError::NoSlotSelected));

        let slots = slot_availability(&BTreeSet::new());
        wizard.select_time("09:00", &slots).unwrap();
        assert_eq!(wizard.next(), Ok(BookingStep::Confirmation));
    }

    #[test]
    fn test_taken_slot_cannot_be_selected() {
        let mut wizard = at_date_step();
        wizard.select_date(monday(), monday()).unwrap();
        let occupied: BTreeSet<String> = ["08:00".to_string()].into();
        let slots = slot_availability(&occupied);
        assert_eq!(
            wizard.select_time("08:00", &slots),
            Err(BookingError::Schedule(ScheduleError::SlotTaken(
                "08:00".to_string()
            )))
        );
    }

    #[test]
    fn test_weekend_rejected() {
        let mut wizard = at_date_step();
        let saturday = NaiveDate::from_ymd_opt(2026, 10, 24).unwrap();
        assert_eq!(
            wizard.select_date(saturday, monday()),
            Err(BookingError::Schedule(ScheduleError::Weekend))
        );
    }

    #[test]
    fn test_back_keeps_selection() {
        let mut wizard = at_date_step();
        assert_eq!(wizard.back(), Ok(BookingStep::PetSelection));
        assert_eq!(wizard.next(), Ok(BookingStep::DateTimeSelection));
        assert_eq!(wizard.back(), Ok(BookingStep::PetSelection));
        assert_eq!(wizard.back(), Ok(BookingStep::ServiceSelection));
        assert!(wizard.back().is_err());
        assert_eq!(wizard.next(), Ok(BookingStep::PetSelection));
    }

    #[test]
    fn test_two_services_planned_one_hour_apart() {
        let mut wizard = at_date_step();
        wizard.select_date(monday(), monday()).unwrap();
        wizard
            .select_time("10:00", &slot_availability(&BTreeSet::new()))
            .unwrap();
        wizard.next().unwrap();

        let offset = shop_offset(DEFAULT_UTC_OFFSET_HOURS).unwrap();
        let plan = wizard.draft().unwrap().plan(offset).unwrap();
        assert_eq!(plan.len(), 2);
        assert_eq!(plan[1].starts_at - plan[0].starts_at, Duration::hours(1));
        assert_eq!(plan[0].service_id, ServiceId::new(1));
        assert_eq!(plan[1].service_id, ServiceId::new(2));
        assert_eq!(plan[1].ends_at - plan[1].starts_at, Duration::minutes(90));
        assert_eq!(plan[0].starts_at.to_rfc3339(), "2026-10-19T13:00:00+00:00");

        wizard.complete(plan.len()).unwrap();
        assert_eq!(wizard, BookingWizard::Success { created: 2 });
    }

    #[test]
    fn test_complete_only_from_confirmation() {
        let mut wizard = at_date_step();
        assert_eq!(
            wizard.complete(1),
            Err(BookingError::WrongStep(BookingStep::DateTimeSelection))
        );
    }
}
