use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_utils::{Clock, SystemClock};

use crate::models::{
    Patient, PatientCategory, PatientError, PatientFilter, PatientKind, PatientStatus,
    RegisterPatientRequest,
};
use crate::services::notification::{PatientEvent, PatientNotifier, TracingPatientNotifier};
use crate::services::repository::PatientRepository;

const MAX_AGE: u8 = 130;

pub struct PatientService {
    repository: PatientRepository,
    notifier: Arc<dyn PatientNotifier>,
    clock: Arc<dyn Clock>,
}

impl Default for PatientService {
    fn default() -> Self {
        Self::new()
    }
}

impl PatientService {
    pub fn new() -> Self {
        Self::with_collaborators(Arc::new(TracingPatientNotifier), Arc::new(SystemClock))
    }

    pub fn with_collaborators(notifier: Arc<dyn PatientNotifier>, clock: Arc<dyn Clock>) -> Self {
        Self {
            repository: PatientRepository::new(),
            notifier,
            clock,
        }
    }

    pub fn register(&mut self, request: RegisterPatientRequest) -> Result<Patient, PatientError> {
        debug!("Registering patient: {}", request.full_name);

        if let Err(e) = validate_request(&request) {
            warn!("Rejected patient registration: {}", e);
            return Err(e);
        }

        let now = self.clock.now();
        let patient = Patient::new(
            Uuid::new_v4(),
            request.full_name.trim(),
            request.age,
            request.gender,
            request.kind,
            now,
        );
        self.repository.add(patient.clone())?;

        self.notifier.notify(PatientEvent::Registered, &patient);
        if patient.is_critical() {
            self.notifier.notify(PatientEvent::CriticalArrival, &patient);
        }

        info!(patient_id = %patient.id(), category = ?patient.category(), "Patient registered");
        Ok(patient)
    }

    pub fn get(&self, id: Uuid) -> Result<&Patient, PatientError> {
        self.repository.get(id)
    }

    pub fn add_note(&mut self, id: Uuid, note: &str) -> Result<Patient, PatientError> {
        if note.trim().is_empty() {
            return Err(PatientError::ValidationError("note must not be empty".to_string()));
        }

        let mut patient = self.repository.get(id)?.clone();
        patient.push_note(note.trim().to_string(), self.clock.now());
        self.repository.update(patient.clone())?;

        debug!(patient_id = %id, notes = patient.notes().len(), "Note added");
        Ok(patient)
    }

    pub fn discharge(&mut self, id: Uuid) -> Result<Patient, PatientError> {
        let mut patient = self.repository.get(id)?.clone();
        if !patient.is_active() {
            warn!(patient_id = %id, "Discharge attempted for {} patient", patient.status());
            return Err(PatientError::InvalidState {
                id,
                status: patient.status(),
            });
        }

        patient.mark_discharged(self.clock.now());
        self.repository.update(patient.clone())?;
        self.notifier.notify(PatientEvent::Discharged, &patient);

        info!(patient_id = %id, "Patient discharged");
        Ok(patient)
    }

    pub fn delete(&mut self, id: Uuid) -> Result<Patient, PatientError> {
        let removed = self.repository.delete(id)?;
        info!(patient_id = %id, "Patient record deleted");
        Ok(removed)
    }

    pub fn list(&self, filter: PatientFilter) -> impl Iterator<Item = &Patient> + '_ {
        self.repository.list(filter)
    }

    /// Case-insensitive substring match on the patient's name.
    pub fn search(&self, query: &str) -> Vec<&Patient> {
        let needle = query.trim().to_lowercase();
        self.repository
            .list(PatientFilter::all())
            .filter(|patient| patient.full_name().to_lowercase().contains(&needle))
            .collect()
    }

    pub fn critical_emergencies(&self) -> Vec<&Patient> {
        self.repository
            .list(PatientFilter::active())
            .filter(|patient| patient.is_critical())
            .collect()
    }

    /// Up to `limit` active emergency patients, most severe first.
    pub fn highest_risk(&self, limit: usize) -> Vec<&Patient> {
        let mut emergencies: Vec<&Patient> = self
            .repository
            .list(PatientFilter {
                status: Some(PatientStatus::Active),
                category: Some(PatientCategory::Emergency),
            })
            .collect();
        emergencies.sort_by_key(|patient| (patient.acuity(), patient.registered_at()));
        emergencies.truncate(limit);
        emergencies
    }

    pub fn average_age(&self) -> Option<f64> {
        if self.repository.is_empty() {
            return None;
        }
        let total: u64 = self
            .repository
            .list(PatientFilter::all())
            .map(|patient| patient.age() as u64)
            .sum();
        Some(total as f64 / self.repository.len() as f64)
    }
}

fn validate_request(request: &RegisterPatientRequest) -> Result<(), PatientError> {
    if request.full_name.trim().chars().count() < 2 {
        return Err(PatientError::ValidationError(
            "full_name must be at least 2 characters".to_string(),
        ));
    }
    if request.age > MAX_AGE {
        return Err(PatientError::ValidationError(format!(
            "age must be between 0 and {}, got {}",
            MAX_AGE, request.age
        )));
    }
    if request.gender.trim().is_empty() {
        return Err(PatientError::ValidationError("gender must not be empty".to_string()));
    }

    match &request.kind {
        PatientKind::Inpatient { room, ward, .. } => {
            if room.trim().is_empty() || ward.trim().is_empty() {
                return Err(PatientError::ValidationError(
                    "inpatients need a room and a ward".to_string(),
                ));
            }
        }
        PatientKind::Outpatient { clinic, .. } => {
            if clinic.trim().is_empty() {
                return Err(PatientError::ValidationError("clinic must not be empty".to_string()));
            }
        }
        PatientKind::Emergency {
            acuity, arrival_mode, ..
        } => {
            if !(1..=5).contains(acuity) {
                return Err(PatientError::ValidationError(format!(
                    "acuity must be between 1 and 5, got {}",
                    acuity
                )));
            }
            if arrival_mode.trim().is_empty() {
                return Err(PatientError::ValidationError(
                    "arrival_mode must not be empty".to_string(),
                ));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::notification::MockPatientNotifier;
    use assert_matches::assert_matches;
    use shared_utils::test_utils::fixed_clock;

    fn emergency(name: &str, acuity: u8) -> RegisterPatientRequest {
        RegisterPatientRequest {
            full_name: name.to_string(),
            age: 40,
            gender: "F".to_string(),
            kind: PatientKind::Emergency {
                acuity,
                accident: true,
                arrival_mode: "ambulance".to_string(),
            },
        }
    }

    #[test]
    fn critical_arrivals_raise_an_extra_event() {
        let mut notifier = MockPatientNotifier::new();
        notifier
            .expect_notify()
            .withf(|event, _| *event == PatientEvent::Registered)
            .times(2)
            .return_const(());
        notifier
            .expect_notify()
            .withf(|event, patient| {
                *event == PatientEvent::CriticalArrival && patient.full_name() == "Ana Silva"
            })
            .times(1)
            .return_const(());

        let mut service = PatientService::with_collaborators(Arc::new(notifier), fixed_clock());
        service.register(emergency("Ana Silva", 1)).unwrap();
        service.register(emergency("Bo Lind", 4)).unwrap();
    }

    #[test]
    fn invalid_registrations_are_not_stored() {
        let mut notifier = MockPatientNotifier::new();
        notifier.expect_notify().times(0);
        let mut service = PatientService::with_collaborators(Arc::new(notifier), fixed_clock());

        assert_matches!(
            service.register(emergency("X", 2)),
            Err(PatientError::ValidationError(_))
        );
        assert_matches!(
            service.register(emergency("Ana Silva", 0)),
            Err(PatientError::ValidationError(_))
        );

        let mut too_old = emergency("Ana Silva", 3);
        too_old.age = 131;
        assert_matches!(service.register(too_old), Err(PatientError::ValidationError(_)));
        assert_eq!(service.list(PatientFilter::all()).count(), 0);
    }
}
