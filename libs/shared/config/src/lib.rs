use std::env;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// How two bookings for the same practitioner are judged to collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    /// Only an identical start instant is a conflict.
    #[default]
    ExactTime,
    /// `[start, start + expected duration)` intervals must not overlap.
    WindowOverlap,
}

impl FromStr for ConflictPolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "exact" | "exact_time" => Ok(ConflictPolicy::ExactTime),
            "window" | "window_overlap" => Ok(ConflictPolicy::WindowOverlap),
            other => Err(format!("unknown conflict policy: {}", other)),
        }
    }
}

/// Longest reminder lead time accepted, one year.
pub const MAX_REMINDER_LEAD_HOURS: i64 = 8760;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulingConfig {
    pub conflict_policy: ConflictPolicy,
    pub reminder_lead_hours: i64,
    pub default_routine_minutes: u32,
    /// Non-cancelled appointments one practitioner may hold on a single day.
    pub daily_limit_per_practitioner: usize,
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            conflict_policy: ConflictPolicy::ExactTime,
            reminder_lead_hours: 24,
            default_routine_minutes: 20,
            daily_limit_per_practitioner: 20,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabConfig {
    /// Relative distance outside a reference range still reported as borderline.
    pub borderline_tolerance: f64,
}

impl Default for LabConfig {
    fn default() -> Self {
        Self {
            borderline_tolerance: 0.10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ClinicConfig {
    pub scheduling: SchedulingConfig,
    pub lab: LabConfig,
}

impl ClinicConfig {
    pub fn from_env() -> Self {
        let scheduling_defaults = SchedulingConfig::default();
        let lab_defaults = LabConfig::default();

        let config = Self {
            scheduling: SchedulingConfig {
                conflict_policy: read_var(
                    "CLINIC_CONFLICT_POLICY",
                    scheduling_defaults.conflict_policy,
                ),
                reminder_lead_hours: read_var(
                    "CLINIC_REMINDER_LEAD_HOURS",
                    scheduling_defaults.reminder_lead_hours,
                ),
                default_routine_minutes: read_var(
                    "CLINIC_DEFAULT_ROUTINE_MINUTES",
                    scheduling_defaults.default_routine_minutes,
                ),
                daily_limit_per_practitioner: read_var(
                    "CLINIC_DAILY_LIMIT_PER_PRACTITIONER",
                    scheduling_defaults.daily_limit_per_practitioner,
                ),
            },
            lab: LabConfig {
                borderline_tolerance: read_var(
                    "LAB_BORDERLINE_TOLERANCE",
                    lab_defaults.borderline_tolerance,
                ),
            },
        };

        if !config.is_valid() {
            warn!("Clinic configuration out of range - falling back to defaults");
            return Self::default();
        }

        config
    }

    pub fn is_valid(&self) -> bool {
        (0..=MAX_REMINDER_LEAD_HOURS).contains(&self.scheduling.reminder_lead_hours)
            && self.scheduling.default_routine_minutes > 0
            && self.scheduling.daily_limit_per_practitioner > 0
            && (0.0..=1.0).contains(&self.lab.borderline_tolerance)
    }
}

fn read_var<T>(key: &str, default: T) -> T
where
    T: FromStr + std::fmt::Debug,
{
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("{} has unparsable value {:?}, using default {:?}", key, raw, default);
            default
        }),
        Err(_) => {
            warn!("{} not set, using default {:?}", key, default);
            default
        }
    }
}
