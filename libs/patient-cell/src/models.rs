use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_database::Record;
use shared_models::StoreError;

/// A registered patient. Status and notes only change through `PatientService`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    id: Uuid,
    full_name: String,
    age: u8,
    gender: String,
    status: PatientStatus,
    kind: PatientKind,
    notes: Vec<String>,
    registered_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Patient {
    pub fn new(
        id: Uuid,
        full_name: impl Into<String>,
        age: u8,
        gender: impl Into<String>,
        kind: PatientKind,
        registered_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            full_name: full_name.into(),
            age,
            gender: gender.into(),
            status: PatientStatus::Active,
            kind,
            notes: Vec::new(),
            registered_at,
            updated_at: registered_at,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    pub fn age(&self) -> u8 {
        self.age
    }

    pub fn gender(&self) -> &str {
        &self.gender
    }

    pub fn status(&self) -> PatientStatus {
        self.status
    }

    pub fn kind(&self) -> &PatientKind {
        &self.kind
    }

    pub fn notes(&self) -> &[String] {
        &self.notes
    }

    pub fn registered_at(&self) -> DateTime<Utc> {
        self.registered_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn category(&self) -> PatientCategory {
        self.kind.category()
    }

    /// Triage acuity for emergency patients; 1 is the most severe.
    pub fn acuity(&self) -> Option<u8> {
        match &self.kind {
            PatientKind::Emergency { acuity, .. } => Some(*acuity),
            _ => None,
        }
    }

    pub fn is_critical(&self) -> bool {
        self.acuity().is_some_and(|acuity| acuity <= CRITICAL_ACUITY)
    }

    pub fn is_active(&self) -> bool {
        self.status == PatientStatus::Active
    }

    pub(crate) fn push_note(&mut self, note: String, at: DateTime<Utc>) {
        self.notes.push(note);
        self.updated_at = at;
    }

    pub(crate) fn mark_discharged(&mut self, at: DateTime<Utc>) {
        self.status = PatientStatus::Discharged;
        self.updated_at = at;
    }
}

impl Record for Patient {
    type Id = Uuid;

    fn record_id(&self) -> &Uuid {
        &self.id
    }
}

pub const CRITICAL_ACUITY: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatientStatus {
    Active,
    Discharged,
}

impl fmt::Display for PatientStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatientStatus::Active => write!(f, "active"),
            PatientStatus::Discharged => write!(f, "discharged"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "category", rename_all = "snake_case")]
pub enum PatientKind {
    Inpatient {
        room: String,
        ward: String,
        bed: Option<String>,
    },
    Outpatient {
        clinic: String,
        practitioner_id: Option<String>,
    },
    Emergency {
        acuity: u8,
        accident: bool,
        arrival_mode: String,
    },
}

impl PatientKind {
    pub fn category(&self) -> PatientCategory {
        match self {
            PatientKind::Inpatient { .. } => PatientCategory::Inpatient,
            PatientKind::Outpatient { .. } => PatientCategory::Outpatient,
            PatientKind::Emergency { .. } => PatientCategory::Emergency,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatientCategory {
    Inpatient,
    Outpatient,
    Emergency,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterPatientRequest {
    pub full_name: String,
    pub age: u8,
    pub gender: String,
    pub kind: PatientKind,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientFilter {
    pub status: Option<PatientStatus>,
    pub category: Option<PatientCategory>,
}

impl PatientFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn active() -> Self {
        Self {
            status: Some(PatientStatus::Active),
            category: None,
        }
    }

    pub fn by_category(category: PatientCategory) -> Self {
        Self {
            status: None,
            category: Some(category),
        }
    }

    pub fn matches(&self, patient: &Patient) -> bool {
        self.status.map_or(true, |status| patient.status() == status)
            && self.category.map_or(true, |category| patient.category() == category)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
pub enum PatientError {
    #[error("Patient not found: {0}")]
    NotFound(String),

    #[error("Patient already exists: {0}")]
    DuplicateKey(String),

    #[error("Patient {id} cannot change from status {status}")]
    InvalidState { id: Uuid, status: PatientStatus },

    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl From<StoreError> for PatientError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(key) => PatientError::NotFound(key),
            StoreError::DuplicateKey(key) => PatientError::DuplicateKey(key),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_serialize_with_a_category_tag() {
        let kind = serde_json::to_value(PatientKind::Emergency {
            acuity: 2,
            accident: true,
            arrival_mode: "ambulance".to_string(),
        })
        .unwrap();

        assert_eq!(kind["category"], "emergency");
        assert_eq!(kind["acuity"], 2);
        assert_eq!(
            serde_json::to_string(&PatientStatus::Discharged).unwrap(),
            "\"discharged\""
        );
    }

    #[test]
    fn only_low_acuity_emergencies_are_critical() {
        let now = Utc::now();
        let emergency = |acuity| {
            Patient::new(
                Uuid::new_v4(),
                "Ana Silva",
                40,
                "F",
                PatientKind::Emergency {
                    acuity,
                    accident: false,
                    arrival_mode: "walk-in".to_string(),
                },
                now,
            )
        };

        assert!(emergency(CRITICAL_ACUITY).is_critical());
        assert!(!emergency(CRITICAL_ACUITY + 1).is_critical());
        assert!(emergency(3).is_active());
        assert_eq!(emergency(1).updated_at(), now);
    }
}
