use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::Patient;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatientEvent {
    Registered,
    Discharged,
    CriticalArrival,
}

#[cfg_attr(test, mockall::automock)]
pub trait PatientNotifier {
    fn notify(&self, event: PatientEvent, patient: &Patient);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TracingPatientNotifier;

impl PatientNotifier for TracingPatientNotifier {
    fn notify(&self, event: PatientEvent, patient: &Patient) {
        match event {
            PatientEvent::CriticalArrival => warn!(
                patient_id = %patient.id(),
                acuity = ?patient.acuity(),
                "Critical emergency arrival: {}", patient.full_name()
            ),
            PatientEvent::Registered => {
                info!(patient_id = %patient.id(), "Registered {}", patient.full_name())
            }
            PatientEvent::Discharged => {
                info!(patient_id = %patient.id(), "Discharged {}", patient.full_name())
            }
        }
    }
}

/// Records `(event, patient id)` pairs in arrival order.
#[derive(Debug, Default)]
pub struct InMemoryPatientNotifier {
    events: Mutex<Vec<(PatientEvent, Uuid)>>,
}

impl InMemoryPatientNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<(PatientEvent, Uuid)> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }
}

impl PatientNotifier for InMemoryPatientNotifier {
    fn notify(&self, event: PatientEvent, patient: &Patient) {
        let mut events = self.events.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        events.push((event, patient.id()));
    }
}
