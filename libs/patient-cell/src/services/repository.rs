use tracing::debug;
use uuid::Uuid;

use shared_database::InMemoryStore;

use crate::models::{Patient, PatientError, PatientFilter};

#[derive(Debug, Default)]
pub struct PatientRepository {
    store: InMemoryStore<Patient>,
}

impl PatientRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, patient: Patient) -> Result<(), PatientError> {
        debug!(patient_id = %patient.id(), "Adding patient");
        Ok(self.store.insert(patient)?)
    }

    pub fn get(&self, id: Uuid) -> Result<&Patient, PatientError> {
        Ok(self.store.get(&id)?)
    }

    pub fn update(&mut self, patient: Patient) -> Result<(), PatientError> {
        debug!(patient_id = %patient.id(), "Updating patient");
        Ok(self.store.replace(patient)?)
    }

    pub fn delete(&mut self, id: Uuid) -> Result<Patient, PatientError> {
        Ok(self.store.remove(&id)?)
    }

    /// Lazily walks matching patients in registration order.
    pub fn list(&self, filter: PatientFilter) -> impl Iterator<Item = &Patient> + '_ {
        self.store.iter().filter(move |patient| filter.matches(patient))
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PatientKind;
    use assert_matches::assert_matches;
    use chrono::Utc;

    fn outpatient() -> Patient {
        Patient::new(
            Uuid::new_v4(),
            "Mei Chen",
            34,
            "F",
            PatientKind::Outpatient {
                clinic: "Dermatology".to_string(),
                practitioner_id: None,
            },
            Utc::now(),
        )
    }

    #[test]
    fn adding_the_same_id_twice_is_a_duplicate_key() {
        let mut repository = PatientRepository::new();
        let patient = outpatient();

        repository.add(patient.clone()).unwrap();

        assert_matches!(repository.add(patient.clone()), Err(PatientError::DuplicateKey(_)));
        assert_eq!(repository.len(), 1);
        assert_eq!(repository.get(patient.id()).unwrap(), &patient);
    }

    #[test]
    fn update_and_delete_need_an_existing_record() {
        let mut repository = PatientRepository::new();
        let patient = outpatient();

        assert_matches!(repository.update(patient.clone()), Err(PatientError::NotFound(_)));
        assert_matches!(repository.delete(patient.id()), Err(PatientError::NotFound(_)));
    }
}
