// libs/appointment-cell/src/services/booking.rs
use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde_json::json;
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_config::{ClinicConfig, SchedulingConfig, MAX_REMINDER_LEAD_HOURS};
use shared_utils::{Clock, SystemClock};

use crate::models::{
    Appointment, AppointmentError, AppointmentFilter, AppointmentKind, AppointmentStats,
    AppointmentStatus, BookAppointmentRequest,
};
use crate::services::audit::{AuditAction, AuditEntry, AuditService};
use crate::services::conflict::ConflictDetectionService;
use crate::services::lifecycle::AppointmentLifecycleService;
use crate::services::notification::{NotificationKind, Notifier, TracingNotifier};
use crate::services::pricing::PricingService;
use crate::services::repository::AppointmentRepository;

/// Books appointments and moves them through their lifecycle.
///
/// Every operation checks all of its preconditions before touching the
/// repository or the notifier, so a failed call leaves no trace.
pub struct AppointmentBookingService {
    repository: AppointmentRepository,
    conflict_service: ConflictDetectionService,
    lifecycle_service: AppointmentLifecycleService,
    pricing_service: PricingService,
    audit: AuditService,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    config: SchedulingConfig,
}

impl AppointmentBookingService {
    pub fn new(config: &ClinicConfig) -> Self {
        Self::with_collaborators(config, Arc::new(TracingNotifier), Arc::new(SystemClock))
    }

    pub fn with_collaborators(
        config: &ClinicConfig,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository: AppointmentRepository::new(),
            conflict_service: ConflictDetectionService::new(config.scheduling.conflict_policy),
            lifecycle_service: AppointmentLifecycleService::new(),
            pricing_service: PricingService::new(),
            audit: AuditService::new(),
            notifier,
            clock,
            config: config.scheduling.clone(),
        }
    }

    pub fn book(
        &mut self,
        patient_id: impl Into<String>,
        practitioner_id: impl Into<String>,
        scheduled_at: DateTime<Utc>,
        kind: AppointmentKind,
    ) -> Result<Appointment, AppointmentError> {
        self.book_request(BookAppointmentRequest::new(
            patient_id,
            practitioner_id,
            scheduled_at,
            kind,
        ))
    }

    pub fn book_request(
        &mut self,
        request: BookAppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        debug!(
            patient_id = %request.patient_id,
            practitioner_id = %request.practitioner_id,
            variant = %request.kind.variant(),
            "Booking appointment at {}", request.scheduled_at
        );

        self.validate_booking_request(&request)?;

        let now = self.clock.now();
        if let Err(e) = self
            .lifecycle_service
            .validate_appointment_timing(request.scheduled_at, now)
        {
            warn!(patient_id = %request.patient_id, "Rejected booking: {}", e);
            return Err(e);
        }

        let duration = request.kind.expected_duration();
        self.lifecycle_service
            .validate_appointment_end(request.scheduled_at, duration)?;
        self.ensure_slot_free(&request.practitioner_id, request.scheduled_at, duration, None)?;
        self.ensure_daily_capacity(&request.practitioner_id, request.scheduled_at, None)?;

        let appointment = Appointment::new(
            Uuid::new_v4(),
            request.patient_id,
            request.practitioner_id,
            request.scheduled_at,
            request.kind,
            now,
        );
        self.repository.add(appointment.clone())?;
        self.notifier.notify(NotificationKind::Booked, &appointment, now);
        self.audit.record(
            AuditAction::Booked,
            appointment.id(),
            now,
            json!({
                "patient_id": appointment.patient_id(),
                "practitioner_id": appointment.practitioner_id(),
                "variant": appointment.variant(),
                "scheduled_at": appointment.scheduled_at(),
            }),
        );

        info!(
            appointment_id = %appointment.id(),
            practitioner_id = %appointment.practitioner_id(),
            priority = %appointment.priority(),
            "Appointment booked"
        );
        Ok(appointment)
    }

    pub fn cancel(&mut self, id: Uuid) -> Result<Appointment, AppointmentError> {
        let now = self.clock.now();
        let appointment = self.transition(id, AppointmentStatus::Cancelled, now)?;
        self.notifier.notify(NotificationKind::Cancelled, &appointment, now);
        self.audit.record(AuditAction::Cancelled, id, now, json!({}));
        info!(appointment_id = %id, "Appointment cancelled");
        Ok(appointment)
    }

    pub fn complete(&mut self, id: Uuid) -> Result<Appointment, AppointmentError> {
        let now = self.clock.now();
        let appointment = self.transition(id, AppointmentStatus::Completed, now)?;
        self.audit.record(AuditAction::Completed, id, now, json!({}));
        info!(appointment_id = %id, "Appointment completed");
        Ok(appointment)
    }

    /// Cancel `id` and book the same visit at `new_time`.
    ///
    /// The scheduled time of a record never changes; the returned appointment
    /// is a new record with its own id.
    pub fn reschedule(
        &mut self,
        id: Uuid,
        new_time: DateTime<Utc>,
    ) -> Result<Appointment, AppointmentError> {
        let original = self.repository.get(id)?.clone();
        self.lifecycle_service
            .validate_status_transition(&original, AppointmentStatus::Cancelled)?;

        let now = self.clock.now();
        let duration = original.kind().expected_duration();
        self.lifecycle_service.validate_appointment_timing(new_time, now)?;
        self.lifecycle_service.validate_appointment_end(new_time, duration)?;
        self.ensure_slot_free(original.practitioner_id(), new_time, duration, Some(id))?;
        self.ensure_daily_capacity(original.practitioner_id(), new_time, Some(id))?;

        let cancelled = self.transition(id, AppointmentStatus::Cancelled, now)?;
        self.notifier.notify(NotificationKind::Cancelled, &cancelled, now);
        self.audit.record(
            AuditAction::Cancelled,
            id,
            now,
            json!({ "rescheduled_to": new_time }),
        );

        let replacement = Appointment::new(
            Uuid::new_v4(),
            original.patient_id(),
            original.practitioner_id(),
            new_time,
            original.kind().clone(),
            now,
        );
        self.repository.add(replacement.clone())?;
        self.notifier.notify(NotificationKind::Rescheduled, &replacement, now);
        self.audit.record(
            AuditAction::Rescheduled,
            replacement.id(),
            now,
            json!({ "previous_id": id, "scheduled_at": new_time }),
        );

        info!(
            appointment_id = %replacement.id(),
            previous_id = %id,
            "Appointment rescheduled to {}", new_time
        );
        Ok(replacement)
    }

    pub fn delete(&mut self, id: Uuid) -> Result<Appointment, AppointmentError> {
        let removed = self.repository.delete(id)?;
        self.audit.record(
            AuditAction::Deleted,
            id,
            self.clock.now(),
            json!({ "status": removed.status() }),
        );
        info!(appointment_id = %id, "Appointment deleted");
        Ok(removed)
    }

    pub fn get(&self, id: Uuid) -> Result<&Appointment, AppointmentError> {
        self.repository.get(id)
    }

    pub fn list(&self, filter: AppointmentFilter) -> impl Iterator<Item = &Appointment> + '_ {
        self.repository.list(filter)
    }

    pub fn list_by_practitioner(
        &self,
        practitioner_id: &str,
    ) -> impl Iterator<Item = &Appointment> + '_ {
        self.repository
            .list(AppointmentFilter::by_practitioner(practitioner_id))
    }

    pub fn list_by_patient(&self, patient_id: &str) -> impl Iterator<Item = &Appointment> + '_ {
        self.repository.list(AppointmentFilter::by_patient(patient_id))
    }

    pub fn list_on_date(&self, date: NaiveDate) -> impl Iterator<Item = &Appointment> + '_ {
        self.repository.list_on_date(date)
    }

    /// Notify every scheduled appointment starting within the reminder lead time.
    pub fn send_reminders(&self) -> Vec<Uuid> {
        let now = self.clock.now();
        let lead = Duration::hours(
            self.config
                .reminder_lead_hours
                .clamp(0, MAX_REMINDER_LEAD_HOURS),
        );

        let mut reminded = Vec::new();
        for appointment in self
            .repository
            .list(AppointmentFilter::by_status(AppointmentStatus::Scheduled))
        {
            if self.lifecycle_service.is_due_for_reminder(
                appointment.status(),
                appointment.scheduled_at(),
                now,
                lead,
            ) {
                self.notifier
                    .notify(NotificationKind::Reminder, appointment, now);
                reminded.push(appointment.id());
            }
        }

        info!("Sent {} appointment reminders", reminded.len());
        reminded
    }

    pub fn stats(&self) -> AppointmentStats {
        let mut stats = AppointmentStats::default();
        let mut by_practitioner = BTreeMap::new();
        let mut by_variant = BTreeMap::new();

        for appointment in self.repository.list(AppointmentFilter::all()) {
            stats.total_appointments += 1;
            match appointment.status() {
                AppointmentStatus::Scheduled => stats.scheduled_appointments += 1,
                AppointmentStatus::Completed => stats.completed_appointments += 1,
                AppointmentStatus::Cancelled => stats.cancelled_appointments += 1,
            }
            *by_practitioner
                .entry(appointment.practitioner_id().to_string())
                .or_insert(0) += 1;
            *by_variant.entry(appointment.variant()).or_insert(0) += 1;
        }

        stats.by_practitioner = by_practitioner;
        stats.by_variant = by_variant;
        stats
    }

    /// Consultation fee for a stored appointment
    pub fn quote(&self, id: Uuid) -> Result<f64, AppointmentError> {
        let appointment = self.repository.get(id)?;
        Ok(self.pricing_service.calculate_price(appointment.kind()))
    }

    /// Routine visit at `clinic` lasting the configured default length.
    pub fn default_routine(&self, clinic: impl Into<String>) -> AppointmentKind {
        AppointmentKind::routine(clinic, self.config.default_routine_minutes)
    }

    pub fn repository(&self) -> &AppointmentRepository {
        &self.repository
    }

    /// Every recorded mutation, oldest first.
    pub fn audit_log(&self) -> &[AuditEntry] {
        self.audit.entries()
    }

    pub fn audit_for(&self, id: Uuid) -> Vec<&AuditEntry> {
        self.audit.for_appointment(id)
    }

    pub fn audit_by_action(&self, action: AuditAction) -> Vec<&AuditEntry> {
        self.audit.by_action(action)
    }

    // ==============================================================================
    // PRIVATE HELPER METHODS
    // ==============================================================================

    fn validate_booking_request(
        &self,
        request: &BookAppointmentRequest,
    ) -> Result<(), AppointmentError> {
        if request.patient_id.trim().is_empty() {
            return Err(AppointmentError::ValidationError(
                "patient_id must not be empty".to_string(),
            ));
        }
        if request.practitioner_id.trim().is_empty() {
            return Err(AppointmentError::ValidationError(
                "practitioner_id must not be empty".to_string(),
            ));
        }
        request.kind.validate()
    }

    fn ensure_slot_free(
        &self,
        practitioner_id: &str,
        start: DateTime<Utc>,
        duration: Duration,
        exclude: Option<Uuid>,
    ) -> Result<(), AppointmentError> {
        let existing = self
            .repository
            .list(AppointmentFilter::by_practitioner(practitioner_id));

        match self
            .conflict_service
            .find_conflict(existing, practitioner_id, start, duration, exclude)
        {
            Some(conflict) => {
                warn!(
                    practitioner_id = %practitioner_id,
                    existing_id = %conflict.id(),
                    "Scheduling conflict at {}", start
                );
                Err(AppointmentError::Conflict {
                    practitioner_id: practitioner_id.to_string(),
                    scheduled_at: start,
                    existing: conflict.id(),
                })
            }
            None => Ok(()),
        }
    }

    fn ensure_daily_capacity(
        &self,
        practitioner_id: &str,
        scheduled_at: DateTime<Utc>,
        exclude: Option<Uuid>,
    ) -> Result<(), AppointmentError> {
        let date = scheduled_at.date_naive();
        let limit = self.config.daily_limit_per_practitioner;
        let load = self
            .repository
            .practitioner_load_on(practitioner_id, date, exclude);

        if load >= limit {
            warn!(
                practitioner_id = %practitioner_id,
                load,
                limit,
                "Daily booking limit reached for {}", date
            );
            return Err(AppointmentError::DailyLimitExceeded {
                practitioner_id: practitioner_id.to_string(),
                date,
                limit,
            });
        }
        Ok(())
    }

    fn transition(
        &mut self,
        id: Uuid,
        new_status: AppointmentStatus,
        now: DateTime<Utc>,
    ) -> Result<Appointment, AppointmentError> {
        let mut appointment = self.repository.get(id)?.clone();
        self.lifecycle_service
            .validate_status_transition(&appointment, new_status)?;

        appointment.transition_to(new_status, now);
        self.repository.update(appointment.clone())?;
        Ok(appointment)
    }
}
