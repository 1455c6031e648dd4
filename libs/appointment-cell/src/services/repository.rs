// libs/appointment-cell/src/services/repository.rs
use chrono::NaiveDate;
use tracing::debug;
use uuid::Uuid;

use shared_database::InMemoryStore;

use crate::models::{Appointment, AppointmentError, AppointmentFilter, AppointmentStatus};

/// Canonical owner of every appointment record.
#[derive(Debug, Default)]
pub struct AppointmentRepository {
    store: InMemoryStore<Appointment>,
}

impl AppointmentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, appointment: Appointment) -> Result<(), AppointmentError> {
        debug!(appointment_id = %appointment.id(), "Adding appointment");
        self.store.insert(appointment)?;
        Ok(())
    }

    pub fn get(&self, id: Uuid) -> Result<&Appointment, AppointmentError> {
        Ok(self.store.get(&id)?)
    }

    pub fn update(&mut self, appointment: Appointment) -> Result<(), AppointmentError> {
        debug!(appointment_id = %appointment.id(), status = %appointment.status(), "Updating appointment");
        self.store.replace(appointment)?;
        Ok(())
    }

    pub fn delete(&mut self, id: Uuid) -> Result<Appointment, AppointmentError> {
        debug!(appointment_id = %id, "Deleting appointment");
        Ok(self.store.remove(&id)?)
    }

    /// Lazily walks the stored appointments in insertion order.
    ///
    /// Each call starts a fresh pass over whatever is stored at that moment.
    pub fn list(&self, filter: AppointmentFilter) -> impl Iterator<Item = &Appointment> + '_ {
        self.store.iter().filter(move |appointment| filter.matches(appointment))
    }

    pub fn list_on_date(&self, date: NaiveDate) -> impl Iterator<Item = &Appointment> + '_ {
        self.store
            .iter()
            .filter(move |appointment| appointment.scheduled_at().date_naive() == date)
    }

    /// Non-cancelled appointments of `practitioner_id` on `date`, skipping `exclude`.
    pub fn practitioner_load_on(
        &self,
        practitioner_id: &str,
        date: NaiveDate,
        exclude: Option<Uuid>,
    ) -> usize {
        self.list(AppointmentFilter::by_practitioner(practitioner_id))
            .filter(|appointment| {
                appointment.status() != AppointmentStatus::Cancelled
                    && appointment.scheduled_at().date_naive() == date
                    && Some(appointment.id()) != exclude
            })
            .count()
    }

    /// Matching appointments, most urgent first, then earliest first.
    pub fn by_priority(&self, filter: AppointmentFilter) -> Vec<&Appointment> {
        let mut appointments: Vec<&Appointment> = self.list(filter).collect();
        appointments.sort_by(|a, b| {
            b.priority()
                .cmp(&a.priority())
                .then_with(|| a.scheduled_at().cmp(&b.scheduled_at()))
        });
        appointments
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.store.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}
