// libs/appointment-cell/src/services/notification.rs
use std::fmt;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::models::{Appointment, AppointmentKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Booked,
    Cancelled,
    Rescheduled,
    Reminder,
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotificationKind::Booked => write!(f, "booked"),
            NotificationKind::Cancelled => write!(f, "cancelled"),
            NotificationKind::Rescheduled => write!(f, "rescheduled"),
            NotificationKind::Reminder => write!(f, "reminder"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub appointment_id: Uuid,
    pub patient_id: String,
    pub practitioner_id: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn for_appointment(
        kind: NotificationKind,
        appointment: &Appointment,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            kind,
            appointment_id: appointment.id(),
            patient_id: appointment.patient_id().to_string(),
            practitioner_id: appointment.practitioner_id().to_string(),
            message: format_message(kind, appointment),
            created_at,
        }
    }
}

/// Receives appointment events from the booking service.
///
/// Delivery is best-effort: implementations swallow their own failures and
/// never report back to the caller. `at` is the service clock's "now".
#[cfg_attr(test, mockall::automock)]
pub trait Notifier {
    fn notify(&self, kind: NotificationKind, appointment: &Appointment, at: DateTime<Utc>);
}

/// Emits every notification as a tracing event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, kind: NotificationKind, appointment: &Appointment, _at: DateTime<Utc>) {
        info!(
            appointment_id = %appointment.id(),
            patient_id = %appointment.patient_id(),
            kind = %kind,
            "{}", format_message(kind, appointment)
        );
    }
}

/// Keeps every notification it receives, oldest first.
#[derive(Debug, Default)]
pub struct InMemoryNotifier {
    sent: Mutex<Vec<Notification>>,
}

impl InMemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent
            .lock()
            .map(|sent| sent.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    pub fn latest(&self) -> Option<Notification> {
        self.sent().pop()
    }

    pub fn count_of(&self, kind: NotificationKind) -> usize {
        self.sent().iter().filter(|n| n.kind == kind).count()
    }
}

impl Notifier for InMemoryNotifier {
    fn notify(&self, kind: NotificationKind, appointment: &Appointment, at: DateTime<Utc>) {
        let notification = Notification::for_appointment(kind, appointment, at);
        let mut sent = self.sent.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        sent.push(notification);
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&self, _kind: NotificationKind, _appointment: &Appointment, _at: DateTime<Utc>) {}
}

pub fn format_message(kind: NotificationKind, appointment: &Appointment) -> String {
    let when = appointment.scheduled_at().format("%Y-%m-%d %H:%M UTC");
    let detail = match appointment.kind() {
        AppointmentKind::Routine(details) => {
            format!("routine visit at {} ({} min)", details.clinic, details.duration_minutes)
        }
        AppointmentKind::Emergency(details) => format!(
            "EMERGENCY {} (triage {})",
            details.emergency_code, details.triage_level
        ),
        AppointmentKind::Online(details) => format!(
            "online session on {} (token {})",
            details.platform, details.session_token
        ),
    };

    match kind {
        NotificationKind::Booked => format!(
            "Patient {} booked with {} on {}: {}",
            appointment.patient_id(),
            appointment.practitioner_id(),
            when,
            detail
        ),
        NotificationKind::Cancelled => format!(
            "Appointment {} for patient {} on {} was cancelled: {}",
            appointment.id(),
            appointment.patient_id(),
            when,
            detail
        ),
        NotificationKind::Rescheduled => format!(
            "Patient {} rescheduled with {} to {}: {}",
            appointment.patient_id(),
            appointment.practitioner_id(),
            when,
            detail
        ),
        NotificationKind::Reminder => format!(
            "Reminder: patient {} sees {} on {}: {}",
            appointment.patient_id(),
            appointment.practitioner_id(),
            when,
            detail
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn emergency() -> Appointment {
        let at = Utc.with_ymd_and_hms(2030, 1, 15, 9, 0, 0).unwrap();
        Appointment::new(Uuid::new_v4(), "P1", "D1", at, AppointmentKind::emergency("red", 1), at)
    }

    #[test]
    fn messages_carry_variant_details() {
        let appointment = emergency();

        let booked = format_message(NotificationKind::Booked, &appointment);
        assert!(booked.contains("EMERGENCY RED"));
        assert!(booked.contains("2030-01-15 09:00 UTC"));

        let online = Appointment::new(
            Uuid::new_v4(),
            "P2",
            "D1",
            appointment.scheduled_at(),
            AppointmentKind::online_with_token("Zoom", "abc123"),
            appointment.created_at(),
        );
        assert!(format_message(NotificationKind::Reminder, &online).contains("token abc123"));
    }

    #[test]
    fn in_memory_notifier_records_in_order() {
        let notifier = InMemoryNotifier::new();
        let appointment = emergency();

        let at = appointment.created_at();
        let later = at + chrono::Duration::minutes(5);
        notifier.notify(NotificationKind::Booked, &appointment, at);
        notifier.notify(NotificationKind::Cancelled, &appointment, later);

        let sent = notifier.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].kind, NotificationKind::Booked);
        assert_eq!(sent[0].created_at, at);
        assert_eq!(sent[1].created_at, later);
        assert_eq!(sent[1].appointment_id, appointment.id());
        assert_eq!(notifier.latest().map(|n| n.kind), Some(NotificationKind::Cancelled));
        assert_eq!(notifier.count_of(NotificationKind::Reminder), 0);
    }

    #[test]
    fn notification_kinds_serialize_snake_case() {
        assert_eq!(
            serde_json::to_string(&NotificationKind::Rescheduled).unwrap(),
            "\"rescheduled\""
        );
    }
}
