// libs/appointment-cell/src/services/lifecycle.rs
use chrono::{DateTime, Duration, Utc};
use tracing::{debug, warn};

use crate::models::{Appointment, AppointmentError, AppointmentStatus};

#[derive(Debug, Default, Clone, Copy)]
pub struct AppointmentLifecycleService;

impl AppointmentLifecycleService {
    pub fn new() -> Self {
        Self
    }

    /// Validate that a status transition is allowed
    pub fn validate_status_transition(
        &self,
        appointment: &Appointment,
        new_status: AppointmentStatus,
    ) -> Result<(), AppointmentError> {
        let current_status = appointment.status();
        debug!("Validating status transition from {} to {}", current_status, new_status);

        if !self.get_valid_transitions(current_status).contains(&new_status) {
            warn!(
                appointment_id = %appointment.id(),
                "Invalid status transition attempted: {} -> {}", current_status, new_status
            );
            return Err(AppointmentError::InvalidState {
                id: appointment.id(),
                status: current_status,
            });
        }

        Ok(())
    }

    /// Get all valid next statuses for a given current status
    pub fn get_valid_transitions(&self, current_status: AppointmentStatus) -> Vec<AppointmentStatus> {
        match current_status {
            AppointmentStatus::Scheduled => {
                vec![AppointmentStatus::Completed, AppointmentStatus::Cancelled]
            }
            // Terminal states - no transitions allowed
            AppointmentStatus::Completed | AppointmentStatus::Cancelled => vec![],
        }
    }

    /// A booking may land at "now" but never before it.
    pub fn validate_appointment_timing(
        &self,
        scheduled_at: DateTime<Utc>,
        current_time: DateTime<Utc>,
    ) -> Result<(), AppointmentError> {
        if scheduled_at < current_time {
            return Err(AppointmentError::InvalidTime(format!(
                "{} is in the past (now is {})",
                scheduled_at, current_time
            )));
        }
        Ok(())
    }

    /// End of a slot starting at `scheduled_at`; the whole slot must be representable.
    pub fn validate_appointment_end(
        &self,
        scheduled_at: DateTime<Utc>,
        duration: Duration,
    ) -> Result<DateTime<Utc>, AppointmentError> {
        scheduled_at.checked_add_signed(duration).ok_or_else(|| {
            AppointmentError::InvalidTime(format!(
                "{} plus {} minutes is out of range",
                scheduled_at,
                duration.num_minutes()
            ))
        })
    }

    /// Whether a reminder is due: still scheduled and starting within `lead` from now.
    pub fn is_due_for_reminder(
        &self,
        status: AppointmentStatus,
        scheduled_at: DateTime<Utc>,
        current_time: DateTime<Utc>,
        lead: Duration,
    ) -> bool {
        // a horizon past the last representable instant covers everything ahead
        let within_lead = current_time
            .checked_add_signed(lead)
            .map_or(true, |horizon| scheduled_at <= horizon);

        status == AppointmentStatus::Scheduled && scheduled_at >= current_time && within_lead
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AppointmentKind;
    use assert_matches::assert_matches;
    use uuid::Uuid;

    fn appointment_with(status: AppointmentStatus) -> Appointment {
        let now = Utc::now();
        let mut appointment = Appointment::new(
            Uuid::new_v4(),
            "P1",
            "D1",
            now,
            AppointmentKind::routine("ENT", 20),
            now,
        );
        appointment.transition_to(status, now);
        appointment
    }

    #[test]
    fn terminal_states_have_no_exits() {
        let service = AppointmentLifecycleService::new();

        assert!(service.get_valid_transitions(AppointmentStatus::Completed).is_empty());
        assert!(service.get_valid_transitions(AppointmentStatus::Cancelled).is_empty());
        assert_eq!(service.get_valid_transitions(AppointmentStatus::Scheduled).len(), 2);
    }

    #[test]
    fn transitions_out_of_terminal_states_are_rejected() {
        let service = AppointmentLifecycleService::new();
        let cancelled = appointment_with(AppointmentStatus::Cancelled);

        assert_matches!(
            service.validate_status_transition(&cancelled, AppointmentStatus::Completed),
            Err(AppointmentError::InvalidState { status: AppointmentStatus::Cancelled, .. })
        );
        assert!(service
            .validate_status_transition(&appointment_with(AppointmentStatus::Scheduled), AppointmentStatus::Cancelled)
            .is_ok());
    }

    #[test]
    fn timing_accepts_now_and_rejects_the_past() {
        let service = AppointmentLifecycleService::new();
        let now = Utc::now();

        assert!(service.validate_appointment_timing(now, now).is_ok());
        assert_matches!(
            service.validate_appointment_timing(now - Duration::seconds(1), now),
            Err(AppointmentError::InvalidTime(_))
        );
    }

    #[test]
    fn reminders_fall_inside_the_lead_window() {
        let service = AppointmentLifecycleService::new();
        let now = Utc::now();
        let lead = Duration::hours(24);

        assert!(service.is_due_for_reminder(AppointmentStatus::Scheduled, now + Duration::hours(3), now, lead));
        assert!(!service.is_due_for_reminder(AppointmentStatus::Scheduled, now + Duration::hours(30), now, lead));
        assert!(!service.is_due_for_reminder(AppointmentStatus::Cancelled, now + Duration::hours(3), now, lead));
    }

    #[test]
    fn reminder_horizon_past_the_end_of_time_does_not_overflow() {
        let service = AppointmentLifecycleService::new();
        let now = DateTime::<Utc>::MAX_UTC - Duration::hours(1);

        assert!(service.is_due_for_reminder(
            AppointmentStatus::Scheduled,
            DateTime::<Utc>::MAX_UTC,
            now,
            Duration::hours(24)
        ));
    }

    #[test]
    fn slot_end_must_be_representable() {
        let service = AppointmentLifecycleService::new();
        let late = DateTime::<Utc>::MAX_UTC - Duration::minutes(5);

        assert_matches!(
            service.validate_appointment_end(late, Duration::minutes(20)),
            Err(AppointmentError::InvalidTime(_))
        );
        assert_eq!(
            service
                .validate_appointment_end(late, Duration::minutes(5))
                .unwrap(),
            DateTime::<Utc>::MAX_UTC
        );
    }
}
