// =====================================================================================
// LAB CELL - LAB TEST ORDERING, RESULTS & CRITICAL ALERTS
// =====================================================================================

pub mod models;
pub mod services;

pub use models::{
    AlertSeverity, CriticalAlert, LabAuditAction, LabAuditEntry, LabError, LabReport, LabResult,
    LabStats, LabTest, LabTestKind, ReferenceRange, ResultStatus, TestStatus,
};

pub use services::{AlertService, LabTestRepository, LabTestService};
