//! Best-effort booking notifications.
//!
//! A booking is final once its rows are committed. E-mail and calendar
//! delivery happen afterwards; failures are logged at WARN (which the
//! Sentry tracing layer turns into an event) and dropped. Nothing retries.

use std::future::Future;

use super::functions::{AppointmentNotice, FunctionsClient, FunctionsError};

/// Delivery channel for appointment notifications.
pub trait Notifier: Send + Sync {
    fn appointment_email(
        &self,
        notice: &AppointmentNotice,
    ) -> impl Future<Output = Result<(), FunctionsError>> + Send;

    fn calendar_event(
        &self,
        notice: &AppointmentNotice,
    ) -> impl Future<Output = Result<(), FunctionsError>> + Send;
}

impl Notifier for FunctionsClient {
    async fn appointment_email(&self, notice: &AppointmentNotice) -> Result<(), FunctionsError> {
        self.send_appointment_email(notice).await
    }

    async fn calendar_event(&self, notice: &AppointmentNotice) -> Result<(), FunctionsError> {
        self.create_calendar_event(notice).await
    }
}

/// Outcome counts of a notification round.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NotifyReport {
    pub emails_failed: usize,
    pub events_failed: usize,
}

/// Send the e-mail and calendar event for every notice, swallowing failures.
pub async fn notify_all<N: Notifier>(notifier: &N, notices: &[AppointmentNotice]) -> NotifyReport {
    let mut report = NotifyReport::default();
    for notice in notices {
        if let Err(e) = notifier.appointment_email(notice).await {
            report.emails_failed += 1;
            tracing::warn!(
                error = %e,
                starts_at = %notice.starts_at,
                service = %notice.service_name,
                "Failed to send appointment e-mail"
            );
        }
        if let Err(e) = notifier.calendar_event(notice).await {
            report.events_failed += 1;
            tracing::warn!(
                error = %e,
                starts_at = %notice.starts_at,
                service = %notice.service_name,
                "Failed to create calendar event"
            );
        }
    }
    report
}
