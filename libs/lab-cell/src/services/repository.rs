use uuid::Uuid;

use shared_database::InMemoryStore;

use crate::models::{LabError, LabTest, ResultStatus};

#[derive(Debug, Default)]
pub struct LabTestRepository {
    store: InMemoryStore<LabTest>,
}

impl LabTestRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, test: LabTest) -> Result<(), LabError> {
        Ok(self.store.insert(test)?)
    }

    pub fn get(&self, id: Uuid) -> Result<&LabTest, LabError> {
        Ok(self.store.get(&id)?)
    }

    pub fn update(&mut self, test: LabTest) -> Result<(), LabError> {
        Ok(self.store.replace(test)?)
    }

    pub fn delete(&mut self, id: Uuid) -> Result<LabTest, LabError> {
        Ok(self.store.remove(&id)?)
    }

    pub fn list(&self) -> impl Iterator<Item = &LabTest> + '_ {
        self.store.iter()
    }

    pub fn for_patient<'a>(&'a self, patient_id: &'a str) -> impl Iterator<Item = &'a LabTest> + 'a {
        self.store
            .iter()
            .filter(move |test| test.patient_id() == patient_id)
    }

    /// Tests whose normalized type label equals `test_type` (case-insensitive).
    pub fn by_type(&self, test_type: &str) -> impl Iterator<Item = &LabTest> + '_ {
        let wanted = crate::models::normalize_label(test_type);
        self.store
            .iter()
            .filter(move |test| test.test_type() == wanted)
    }

    pub fn critical(&self) -> impl Iterator<Item = &LabTest> + '_ {
        self.store
            .iter()
            .filter(|test| test.result_status() == ResultStatus::Critical)
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
    use crate::models::{LabTestKind, ReferenceRange};
    use assert_matches::assert_matches;
    use chrono::Utc;

    fn hemogram(patient: &str) -> LabTest {
        LabTest::new(
            Uuid::new_v4(),
            patient,
            "Dr. Aydin",
            LabTestKind::Blood {
                panel: "hemogram".to_string(),
                analyte: "Hemoglobin".to_string(),
                reference: ReferenceRange::new(12.0, 17.5, "g/dL"),
                fasting_required: false,
            },
            Utc::now(),
        )
    }

    #[test]
    fn add_then_get_returns_an_equal_record() {
        let mut repository = LabTestRepository::new();
        let test = hemogram("P1");

        repository.add(test.clone()).unwrap();

        assert_eq!(repository.get(test.id()).unwrap(), &test);
        assert_matches!(repository.add(test), Err(LabError::DuplicateKey(_)));
        assert_eq!(repository.len(), 1);
    }

    #[test]
    fn delete_and_update_require_an_existing_record() {
        let mut repository = LabTestRepository::new();
        let test = hemogram("P1");

        assert_matches!(repository.update(test.clone()), Err(LabError::NotFound(_)));
        repository.add(test.clone()).unwrap();
        repository.add(hemogram("P2")).unwrap();

        assert_eq!(repository.delete(test.id()).unwrap(), test);
        assert_matches!(repository.delete(test.id()), Err(LabError::NotFound(_)));
        assert_eq!(repository.for_patient("P2").count(), 1);
        assert_eq!(repository.by_type("blood_hemogram").count(), 1);
    }
}
