use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use shared_database::Record;
use shared_models::StoreError;

// ==============================================================================
// LAB TEST
// ==============================================================================

/// A single ordered test. State only changes through `LabTestService`; every
/// change is appended to the test's own audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabTest {
    id: Uuid,
    patient_id: String,
    ordered_by: String,
    kind: LabTestKind,
    status: TestStatus,
    ordered_at: DateTime<Utc>,
    collected_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    result: Option<LabResult>,
    result_status: ResultStatus,
    result_note: Option<String>,
    cancel_reason: Option<String>,
    audit: Vec<LabAuditEntry>,
}

impl LabTest {
    pub fn new(
        id: Uuid,
        patient_id: impl Into<String>,
        ordered_by: impl Into<String>,
        kind: LabTestKind,
        ordered_at: DateTime<Utc>,
    ) -> Self {
        let mut test = Self {
            id,
            patient_id: patient_id.into(),
            ordered_by: ordered_by.into(),
            kind,
            status: TestStatus::Ordered,
            ordered_at,
            collected_at: None,
            completed_at: None,
            result: None,
            result_status: ResultStatus::Unknown,
            result_note: None,
            cancel_reason: None,
            audit: Vec::new(),
        };
        test.log(
            LabAuditAction::Created,
            ordered_at,
            json!({ "status": test.status, "test_type": test.test_type() }),
        );
        test
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn patient_id(&self) -> &str {
        &self.patient_id
    }

    pub fn ordered_by(&self) -> &str {
        &self.ordered_by
    }

    pub fn kind(&self) -> &LabTestKind {
        &self.kind
    }

    pub fn status(&self) -> TestStatus {
        self.status
    }

    pub fn ordered_at(&self) -> DateTime<Utc> {
        self.ordered_at
    }

    pub fn collected_at(&self) -> Option<DateTime<Utc>> {
        self.collected_at
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    pub fn result(&self) -> Option<&LabResult> {
        self.result.as_ref()
    }

    pub fn result_status(&self) -> ResultStatus {
        self.result_status
    }

    pub fn result_note(&self) -> Option<&str> {
        self.result_note.as_deref()
    }

    pub fn cancel_reason(&self) -> Option<&str> {
        self.cancel_reason.as_deref()
    }

    /// Every change made to this test, oldest first.
    pub fn audit_trail(&self) -> &[LabAuditEntry] {
        &self.audit
    }

    /// Normalized label such as `BLOOD_BIOCHEM` or `IMAGING_XRAY`.
    pub fn test_type(&self) -> String {
        self.kind.test_type()
    }

    pub fn is_critical(&self) -> bool {
        self.result_status == ResultStatus::Critical
    }

    pub(crate) fn mark_collected(&mut self, at: DateTime<Utc>) {
        self.status = TestStatus::Collected;
        self.collected_at = Some(at);
        self.log(LabAuditAction::Collected, at, json!({ "collected_at": at }));
    }

    pub(crate) fn mark_in_progress(&mut self, at: DateTime<Utc>) {
        self.status = TestStatus::InProgress;
        self.log(LabAuditAction::Started, at, json!({ "status": self.status }));
    }

    pub(crate) fn mark_cancelled(&mut self, reason: Option<String>, at: DateTime<Utc>) {
        self.status = TestStatus::Cancelled;
        self.log(LabAuditAction::Cancelled, at, json!({ "reason": reason }));
        self.cancel_reason = reason;
    }

    pub(crate) fn record_result(
        &mut self,
        result: LabResult,
        result_status: ResultStatus,
        note: Option<String>,
        at: DateTime<Utc>,
    ) {
        self.log(
            LabAuditAction::Resulted,
            at,
            json!({ "result_status": result_status, "result": result.to_string() }),
        );
        self.result = Some(result);
        self.result_status = result_status;
        self.result_note = note;
        self.status = TestStatus::Completed;
        self.completed_at = Some(at);
    }

    fn log(&mut self, action: LabAuditAction, at: DateTime<Utc>, payload: serde_json::Value) {
        self.audit.push(LabAuditEntry {
            action,
            at,
            payload,
        });
    }
}

impl Record for LabTest {
    type Id = Uuid;

    fn record_id(&self) -> &Uuid {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LabTestKind {
    Blood {
        panel: String,
        analyte: String,
        reference: ReferenceRange,
        fasting_required: bool,
    },
    Imaging {
        modality: String,
        body_part: String,
        contrast_used: bool,
    },
    Biopsy {
        specimen_site: String,
        specimen_type: String,
    },
}

impl LabTestKind {
    pub fn test_type(&self) -> String {
        let (base, suffix) = match self {
            LabTestKind::Blood { panel, .. } => ("BLOOD", panel),
            LabTestKind::Imaging { modality, .. } => ("IMAGING", modality),
            LabTestKind::Biopsy { specimen_type, .. } => ("BIOPSY", specimen_type),
        };
        format!("{}_{}", base, normalize_label(suffix))
    }

    pub fn family(&self) -> &'static str {
        match self {
            LabTestKind::Blood { .. } => "blood",
            LabTestKind::Imaging { .. } => "imaging",
            LabTestKind::Biopsy { .. } => "biopsy",
        }
    }
}

pub fn normalize_label(value: &str) -> String {
    value.trim().to_uppercase().replace(' ', "_")
}

/// Inclusive normal range for a numeric analyte.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceRange {
    pub low: f64,
    pub high: f64,
    pub unit: String,
}

impl ReferenceRange {
    pub fn new(low: f64, high: f64, unit: impl Into<String>) -> Self {
        Self {
            low,
            high,
            unit: unit.into(),
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        self.low <= value && value <= self.high
    }
}

impl fmt::Display for ReferenceRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{} {}", self.low, self.high, self.unit)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestStatus {
    Ordered,
    Collected,
    InProgress,
    Completed,
    Cancelled,
}

impl TestStatus {
    pub fn can_transition_to(&self, next: TestStatus) -> bool {
        matches!(
            (self, next),
            (TestStatus::Ordered, TestStatus::Collected)
                | (TestStatus::Ordered, TestStatus::InProgress)
                | (TestStatus::Ordered, TestStatus::Cancelled)
                | (TestStatus::Collected, TestStatus::InProgress)
                | (TestStatus::Collected, TestStatus::Cancelled)
                | (TestStatus::InProgress, TestStatus::Completed)
                | (TestStatus::InProgress, TestStatus::Cancelled)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TestStatus::Completed | TestStatus::Cancelled)
    }
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TestStatus::Ordered => "ordered",
            TestStatus::Collected => "collected",
            TestStatus::InProgress => "in_progress",
            TestStatus::Completed => "completed",
            TestStatus::Cancelled => "cancelled",
        };
        write!(f, "{}", label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultStatus {
    Unknown,
    Normal,
    Borderline,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabAuditAction {
    Created,
    Collected,
    Started,
    Resulted,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabAuditEntry {
    pub action: LabAuditAction,
    pub at: DateTime<Utc>,
    pub payload: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabResult {
    Numeric { value: f64, unit: String },
    Report(String),
}

impl LabResult {
    pub fn numeric(value: f64, unit: impl Into<String>) -> Self {
        LabResult::Numeric {
            value,
            unit: unit.into(),
        }
    }

    pub fn report(text: impl Into<String>) -> Self {
        LabResult::Report(text.into())
    }
}

impl fmt::Display for LabResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LabResult::Numeric { value, unit } => write!(f, "{} {}", value, unit),
            LabResult::Report(text) => write!(f, "{}", text),
        }
    }
}

// ==============================================================================
// REQUESTS, REPORTS & ALERTS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLabTestRequest {
    pub patient_id: String,
    pub ordered_by: String,
    pub kind: LabTestKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabReport {
    pub test_id: Uuid,
    pub patient_id: String,
    pub test_type: String,
    pub status: TestStatus,
    pub result_status: ResultStatus,
    pub result: Option<LabResult>,
    pub note: Option<String>,
    pub generated_at: DateTime<Utc>,
}

impl fmt::Display for LabReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[LabReport] test_id={} patient_id={}", self.test_id, self.patient_id)?;
        writeln!(f, "  type={}", self.test_type)?;
        writeln!(f, "  status={} result_status={:?}", self.status, self.result_status)?;
        writeln!(f, "  generated_at={}", self.generated_at.format("%d/%m/%Y %H:%M"))?;
        match &self.result {
            Some(result) => writeln!(f, "  result={}", result)?,
            None => writeln!(f, "  result=-")?,
        }
        write!(f, "  note={}", self.note.as_deref().unwrap_or(""))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriticalAlert {
    pub id: Uuid,
    pub test_id: Uuid,
    pub patient_id: String,
    pub severity: AlertSeverity,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub acknowledged: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LabStats {
    pub by_type: BTreeMap<String, usize>,
    pub by_status: BTreeMap<TestStatus, usize>,
    pub critical_rate: f64,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
pub enum LabError {
    #[error("Lab record not found: {0}")]
    NotFound(String),

    #[error("Lab test already exists: {0}")]
    DuplicateKey(String),

    #[error("Lab test {id} cannot move from {status} to {requested}")]
    InvalidState {
        id: Uuid,
        status: TestStatus,
        requested: TestStatus,
    },

    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl From<StoreError> for LabError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(key) => LabError::NotFound(key),
            StoreError::DuplicateKey(key) => LabError::DuplicateKey(key),
        }
    }
}
