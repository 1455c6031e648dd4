// =====================================================================================
// APPOINTMENT AUDIT LOG
// =====================================================================================

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Booked,
    Cancelled,
    Completed,
    Rescheduled,
    Deleted,
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AuditAction::Booked => "booked",
            AuditAction::Cancelled => "cancelled",
            AuditAction::Completed => "completed",
            AuditAction::Rescheduled => "rescheduled",
            AuditAction::Deleted => "deleted",
        };
        write!(f, "{}", label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub event_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub action: AuditAction,
    pub appointment_id: Uuid,
    pub details: serde_json::Value,
}

/// Append-only record of every successful appointment mutation.
#[derive(Debug, Default)]
pub struct AuditService {
    entries: Vec<AuditEntry>,
}

impl AuditService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(
        &mut self,
        action: AuditAction,
        appointment_id: Uuid,
        timestamp: DateTime<Utc>,
        details: serde_json::Value,
    ) -> &AuditEntry {
        let entry = AuditEntry {
            event_id: Uuid::new_v4(),
            timestamp,
            action,
            appointment_id,
            details,
        };
        info!(
            event_id = %entry.event_id,
            appointment_id = %appointment_id,
            action = %action,
            "AUDIT: appointment {}", action
        );

        self.entries.push(entry);
        &self.entries[self.entries.len() - 1]
    }

    /// Every entry, oldest first.
    pub fn entries(&self) -> &[AuditEntry] {
        &self.entries
    }

    pub fn for_appointment(&self, appointment_id: Uuid) -> Vec<&AuditEntry> {
        self.entries
            .iter()
            .filter(|entry| entry.appointment_id == appointment_id)
            .collect()
    }

    pub fn by_action(&self, action: AuditAction) -> Vec<&AuditEntry> {
        self.entries
            .iter()
            .filter(|entry| entry.action == action)
            .collect()
    }
}
