// libs/appointment-cell/src/services/conflict.rs
use chrono::{DateTime, Duration, Utc};
use tracing::debug;
use uuid::Uuid;

use shared_config::ConflictPolicy;

use crate::models::{Appointment, AppointmentStatus};

pub struct ConflictDetectionService {
    policy: ConflictPolicy,
}

impl ConflictDetectionService {
    pub fn new(policy: ConflictPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> ConflictPolicy {
        self.policy
    }

    /// Find the first active appointment of `practitioner_id` that collides with
    /// a booking starting at `start` and lasting `duration`.
    ///
    /// `exclude` skips one record, used when rescheduling an appointment onto
    /// a new time.
    pub fn find_conflict<'a>(
        &self,
        existing: impl IntoIterator<Item = &'a Appointment>,
        practitioner_id: &str,
        start: DateTime<Utc>,
        duration: Duration,
        exclude: Option<Uuid>,
    ) -> Option<&'a Appointment> {
        debug!(
            practitioner_id = %practitioner_id,
            policy = ?self.policy,
            "Checking conflicts at {}", start
        );

        let end = start
            .checked_add_signed(duration)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        existing.into_iter().find(|appointment| {
            if Some(appointment.id()) == exclude
                || appointment.practitioner_id() != practitioner_id
                || !self.is_active_appointment(appointment.status())
            {
                return false;
            }

            match self.policy {
                ConflictPolicy::ExactTime => appointment.scheduled_at() == start,
                ConflictPolicy::WindowOverlap => self.appointments_overlap(
                    start,
                    end,
                    appointment.scheduled_at(),
                    appointment.scheduled_end(),
                ),
            }
        })
    }

    fn appointments_overlap(
        &self,
        start1: DateTime<Utc>,
        end1: DateTime<Utc>,
        start2: DateTime<Utc>,
        end2: DateTime<Utc>,
    ) -> bool {
        // Two appointments overlap if:
        // start1 < end2 AND start2 < end1
        start1 < end2 && start2 < end1
    }

    fn is_active_appointment(&self, status: AppointmentStatus) -> bool {
        status == AppointmentStatus::Scheduled
    }
}
