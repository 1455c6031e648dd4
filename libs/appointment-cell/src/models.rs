// libs/appointment-cell/src/models.rs
use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_database::Record;
use shared_models::StoreError;

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

/// A booked appointment. Fields are read through getters; only the booking
/// service moves an appointment between statuses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    id: Uuid,
    patient_id: String,
    practitioner_id: String,
    scheduled_at: DateTime<Utc>,
    status: AppointmentStatus,
    kind: AppointmentKind,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Appointment {
    pub fn new(
        id: Uuid,
        patient_id: impl Into<String>,
        practitioner_id: impl Into<String>,
        scheduled_at: DateTime<Utc>,
        kind: AppointmentKind,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            patient_id: patient_id.into(),
            practitioner_id: practitioner_id.into(),
            scheduled_at,
            status: AppointmentStatus::Scheduled,
            kind,
            created_at,
            updated_at: created_at,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn patient_id(&self) -> &str {
        &self.patient_id
    }

    pub fn practitioner_id(&self) -> &str {
        &self.practitioner_id
    }

    pub fn scheduled_at(&self) -> DateTime<Utc> {
        self.scheduled_at
    }

    pub fn status(&self) -> AppointmentStatus {
        self.status
    }

    pub fn kind(&self) -> &AppointmentKind {
        &self.kind
    }

    pub fn variant(&self) -> AppointmentVariant {
        self.kind.variant()
    }

    pub fn priority(&self) -> Priority {
        priority(&self.kind)
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Calculate the scheduled end time from the variant's expected duration.
    /// Saturates at the last representable instant.
    pub fn scheduled_end(&self) -> DateTime<Utc> {
        self.scheduled_at
            .checked_add_signed(self.kind.expected_duration())
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub(crate) fn transition_to(&mut self, status: AppointmentStatus, at: DateTime<Utc>) {
        self.status = status;
        self.updated_at = at;
    }
}

impl Record for Appointment {
    type Id = Uuid;

    fn record_id(&self) -> &Uuid {
        &self.id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Scheduled,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, AppointmentStatus::Completed | AppointmentStatus::Cancelled)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Scheduled => write!(f, "scheduled"),
            AppointmentStatus::Completed => write!(f, "completed"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

// ==============================================================================
// APPOINTMENT VARIANTS
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentVariant {
    Routine,
    Emergency,
    Online,
}

impl fmt::Display for AppointmentVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentVariant::Routine => write!(f, "routine"),
            AppointmentVariant::Emergency => write!(f, "emergency"),
            AppointmentVariant::Online => write!(f, "online"),
        }
    }
}

/// Variant tag plus the fields only that variant carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "variant", rename_all = "snake_case")]
pub enum AppointmentKind {
    Routine(RoutineDetails),
    Emergency(EmergencyDetails),
    Online(OnlineDetails),
}

impl AppointmentKind {
    pub fn routine(clinic: impl Into<String>, duration_minutes: u32) -> Self {
        AppointmentKind::Routine(RoutineDetails {
            clinic: clinic.into(),
            duration_minutes,
        })
    }

    pub fn emergency(emergency_code: impl AsRef<str>, triage_level: u8) -> Self {
        AppointmentKind::Emergency(EmergencyDetails {
            emergency_code: emergency_code.as_ref().trim().to_uppercase(),
            triage_level,
        })
    }

    /// Online visit with a freshly generated session token.
    pub fn online(platform: impl Into<String>) -> Self {
        AppointmentKind::Online(OnlineDetails {
            platform: platform.into(),
            session_token: Uuid::new_v4().simple().to_string(),
        })
    }

    pub fn online_with_token(platform: impl Into<String>, session_token: impl Into<String>) -> Self {
        AppointmentKind::Online(OnlineDetails {
            platform: platform.into(),
            session_token: session_token.into(),
        })
    }

    pub fn variant(&self) -> AppointmentVariant {
        match self {
            AppointmentKind::Routine(_) => AppointmentVariant::Routine,
            AppointmentKind::Emergency(_) => AppointmentVariant::Emergency,
            AppointmentKind::Online(_) => AppointmentVariant::Online,
        }
    }

    /// How long the slot is expected to take; used by window-overlap conflict checks
    pub fn expected_duration(&self) -> Duration {
        match self {
            AppointmentKind::Routine(details) => Duration::minutes(details.duration_minutes as i64),
            AppointmentKind::Emergency(details) => {
                let extra_levels = 3i64.saturating_sub(details.triage_level as i64).max(0);
                Duration::minutes(EMERGENCY_BASE_MINUTES + extra_levels * 10)
            }
            AppointmentKind::Online(_) => Duration::minutes(ONLINE_MINUTES),
        }
    }

    pub fn session_token(&self) -> Option<&str> {
        match self {
            AppointmentKind::Online(details) => Some(&details.session_token),
            _ => None,
        }
    }

    /// Field-presence and range checks for the variant payload
    pub fn validate(&self) -> Result<(), AppointmentError> {
        match self {
            AppointmentKind::Routine(details) => {
                if details.clinic.trim().is_empty() {
                    return Err(AppointmentError::ValidationError("clinic must not be empty".to_string()));
                }
                if details.duration_minutes == 0 {
                    return Err(AppointmentError::ValidationError(
                        "duration_minutes must be positive".to_string(),
                    ));
                }
            }
            AppointmentKind::Emergency(details) => {
                if details.emergency_code.trim().is_empty() {
                    return Err(AppointmentError::ValidationError(
                        "emergency_code must not be empty".to_string(),
                    ));
                }
                if !(1..=5).contains(&details.triage_level) {
                    return Err(AppointmentError::ValidationError(format!(
                        "triage_level must be between 1 and 5, got {}",
                        details.triage_level
                    )));
                }
            }
            AppointmentKind::Online(details) => {
                if details.platform.trim().is_empty() {
                    return Err(AppointmentError::ValidationError("platform must not be empty".to_string()));
                }
                if details.session_token.trim().is_empty() {
                    return Err(AppointmentError::ValidationError(
                        "session_token must not be empty".to_string(),
                    ));
                }
            }
        }
        Ok(())
    }
}

const EMERGENCY_BASE_MINUTES: i64 = 30;
const ONLINE_MINUTES: i64 = 15;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutineDetails {
    pub clinic: String,
    pub duration_minutes: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmergencyDetails {
    pub emergency_code: String,
    /// 1 is the most urgent, 5 the least.
    pub triage_level: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnlineDetails {
    pub platform: String,
    pub session_token: String,
}

/// Display/sorting urgency. Never used to admit or reject a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    High,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::Low => write!(f, "low"),
            Priority::High => write!(f, "high"),
        }
    }
}

pub fn priority(kind: &AppointmentKind) -> Priority {
    match kind {
        AppointmentKind::Emergency(_) => Priority::High,
        AppointmentKind::Routine(_) | AppointmentKind::Online(_) => Priority::Low,
    }
}

// ==============================================================================
// REQUEST / QUERY MODELS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookAppointmentRequest {
    pub patient_id: String,
    pub practitioner_id: String,
    pub scheduled_at: DateTime<Utc>,
    pub kind: AppointmentKind,
}

impl BookAppointmentRequest {
    pub fn new(
        patient_id: impl Into<String>,
        practitioner_id: impl Into<String>,
        scheduled_at: DateTime<Utc>,
        kind: AppointmentKind,
    ) -> Self {
        Self {
            patient_id: patient_id.into(),
            practitioner_id: practitioner_id.into(),
            scheduled_at,
            kind,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppointmentFilter {
    pub status: Option<AppointmentStatus>,
    pub practitioner_id: Option<String>,
    pub patient_id: Option<String>,
}

impl AppointmentFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn by_status(status: AppointmentStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn by_practitioner(practitioner_id: impl Into<String>) -> Self {
        Self {
            practitioner_id: Some(practitioner_id.into()),
            ..Self::default()
        }
    }

    pub fn by_patient(patient_id: impl Into<String>) -> Self {
        Self {
            patient_id: Some(patient_id.into()),
            ..Self::default()
        }
    }

    pub fn with_status(mut self, status: AppointmentStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn matches(&self, appointment: &Appointment) -> bool {
        self.status.map_or(true, |status| appointment.status() == status)
            && self
                .practitioner_id
                .as_deref()
                .map_or(true, |id| appointment.practitioner_id() == id)
            && self
                .patient_id
                .as_deref()
                .map_or(true, |id| appointment.patient_id() == id)
    }
}

// ==============================================================================
// STATISTICS MODELS
// ==============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppointmentStats {
    pub total_appointments: usize,
    pub scheduled_appointments: usize,
    pub completed_appointments: usize,
    pub cancelled_appointments: usize,
    pub by_practitioner: BTreeMap<String, usize>,
    pub by_variant: BTreeMap<AppointmentVariant, usize>,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
pub enum AppointmentError {
    #[error("Appointment not found: {0}")]
    NotFound(String),

    #[error("Appointment already exists: {0}")]
    DuplicateKey(String),

    #[error("Practitioner {practitioner_id} already has appointment {existing} at {scheduled_at}")]
    Conflict {
        practitioner_id: String,
        scheduled_at: DateTime<Utc>,
        existing: Uuid,
    },

    #[error("Invalid appointment time: {0}")]
    InvalidTime(String),

    #[error("Practitioner {practitioner_id} already has {limit} appointments on {date}")]
    DailyLimitExceeded {
        practitioner_id: String,
        date: NaiveDate,
        limit: usize,
    },

    #[error("Appointment {id} cannot be modified in current status: {status}")]
    InvalidState { id: Uuid, status: AppointmentStatus },

    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl From<StoreError> for AppointmentError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(key) => AppointmentError::NotFound(key),
            StoreError::DuplicateKey(key) => AppointmentError::DuplicateKey(key),
        }
    }
}
