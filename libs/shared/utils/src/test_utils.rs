use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use tracing_subscriber::EnvFilter;

use shared_config::{ClinicConfig, ConflictPolicy};

use crate::clock::FixedClock;

/// Installs a test-friendly subscriber once; later calls are no-ops.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

/// Monday 2030-01-14 08:00 UTC, the "now" every fixture is anchored to.
pub fn reference_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2030, 1, 14, 8, 0, 0)
        .single()
        .unwrap_or_else(Utc::now)
}

pub fn fixed_clock() -> Arc<FixedClock> {
    Arc::new(FixedClock::new(reference_now()))
}

/// The day after [`reference_now`] at `hour:minute`.
pub fn tomorrow_at(hour: u32, minute: u32) -> DateTime<Utc> {
    (reference_now() + Duration::days(1))
        .date_naive()
        .and_hms_opt(hour, minute, 0)
        .map(|at| at.and_utc())
        .unwrap_or_else(reference_now)
}

pub struct TestConfig {
    pub conflict_policy: ConflictPolicy,
    pub reminder_lead_hours: i64,
    pub daily_limit_per_practitioner: usize,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            conflict_policy: ConflictPolicy::ExactTime,
            reminder_lead_hours: 24,
            daily_limit_per_practitioner: 20,
        }
    }
}

impl TestConfig {
    pub fn window() -> Self {
        Self {
            conflict_policy: ConflictPolicy::WindowOverlap,
            ..Self::default()
        }
    }

    pub fn to_clinic_config(&self) -> ClinicConfig {
        let mut config = ClinicConfig::default();
        config.scheduling.conflict_policy = self.conflict_policy;
        config.scheduling.reminder_lead_hours = self.reminder_lead_hours;
        config.scheduling.daily_limit_per_practitioner = self.daily_limit_per_practitioner;
        config
    }
}
