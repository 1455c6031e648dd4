// =====================================================================================
// CRITICAL RESULT ALERTS
// =====================================================================================

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tracing::{error, warn};
use uuid::Uuid;

use crate::models::{AlertSeverity, CriticalAlert, LabError, LabTest, LabTestKind};

#[derive(Debug, Default)]
pub struct AlertService {
    alerts: Vec<CriticalAlert>,
}

impl AlertService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise an alert when `test` carries a critical result.
    pub fn maybe_create_alert(&mut self, test: &LabTest, at: DateTime<Utc>) -> Option<CriticalAlert> {
        if !test.is_critical() {
            return None;
        }

        let alert = CriticalAlert {
            id: Uuid::new_v4(),
            test_id: test.id(),
            patient_id: test.patient_id().to_string(),
            severity: severity_for(test.kind()),
            message: format!(
                "Critical result: test_id={}, type={}, patient_id={}",
                test.id(),
                test.test_type(),
                test.patient_id()
            ),
            created_at: at,
            acknowledged: false,
        };

        match alert.severity {
            AlertSeverity::High => error!(
                alert_id = %alert.id,
                test_id = %test.id(),
                severity = ?alert.severity,
                "CRITICAL ALERT TRIGGERED: {}", alert.message
            ),
            AlertSeverity::Medium | AlertSeverity::Low => warn!(
                alert_id = %alert.id,
                test_id = %test.id(),
                "CRITICAL RESULT: {}", alert.message
            ),
        }

        self.alerts.push(alert.clone());
        Some(alert)
    }

    pub fn unacknowledged(&self) -> Vec<&CriticalAlert> {
        self.alerts.iter().filter(|alert| !alert.acknowledged).collect()
    }

    pub fn acknowledge(&mut self, alert_id: Uuid) -> Result<(), LabError> {
        let alert = self
            .alerts
            .iter_mut()
            .find(|alert| alert.id == alert_id)
            .ok_or_else(|| LabError::NotFound(alert_id.to_string()))?;
        alert.acknowledged = true;
        Ok(())
    }

    pub fn all(&self) -> &[CriticalAlert] {
        &self.alerts
    }

    /// Unacknowledged alerts per severity.
    pub fn summary(&self) -> BTreeMap<AlertSeverity, usize> {
        let mut summary = BTreeMap::new();
        for alert in self.unacknowledged() {
            *summary.entry(alert.severity).or_insert(0) += 1;
        }
        summary
    }
}

fn severity_for(kind: &LabTestKind) -> AlertSeverity {
    match kind {
        LabTestKind::Imaging { .. } | LabTestKind::Biopsy { .. } => AlertSeverity::High,
        LabTestKind::Blood { .. } => AlertSeverity::Medium,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LabResult, ResultStatus};
    use assert_matches::assert_matches;

    fn completed_biopsy(result_status: ResultStatus) -> LabTest {
        let now = Utc::now();
        let mut test = LabTest::new(
            Uuid::new_v4(),
            "P1",
            "Dr. Kaya",
            LabTestKind::Biopsy {
                specimen_site: "Skin".to_string(),
                specimen_type: "PUNCH".to_string(),
            },
            now,
        );
        test.mark_in_progress(now);
        test.record_result(
            LabResult::report("Nodular melanoma, 2mm depth"),
            result_status,
            None,
            now,
        );
        test
    }

    #[test]
    fn only_critical_results_raise_alerts() {
        let mut alerts = AlertService::new();

        assert!(alerts
            .maybe_create_alert(&completed_biopsy(ResultStatus::Borderline), Utc::now())
            .is_none());

        let alert = alerts
            .maybe_create_alert(&completed_biopsy(ResultStatus::Critical), Utc::now())
            .unwrap();
        assert_eq!(alert.severity, AlertSeverity::High);
        assert!(alert.message.contains("BIOPSY_PUNCH"));
        assert_eq!(alerts.unacknowledged().len(), 1);
    }

    #[test]
    fn acknowledging_clears_from_the_open_list() {
        let mut alerts = AlertService::new();
        let alert = alerts
            .maybe_create_alert(&completed_biopsy(ResultStatus::Critical), Utc::now())
            .unwrap();

        alerts.acknowledge(alert.id).unwrap();

        assert!(alerts.unacknowledged().is_empty());
        assert!(alerts.summary().is_empty());
        assert_eq!(alerts.all().len(), 1);
        assert_matches!(alerts.acknowledge(Uuid::new_v4()), Err(LabError::NotFound(_)));
    }
}
