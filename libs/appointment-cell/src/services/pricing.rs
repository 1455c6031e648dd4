// libs/appointment-cell/src/services/pricing.rs
use tracing::debug;

use crate::models::{AppointmentKind, AppointmentVariant};

const ROUTINE_BASE_PRICE: f64 = 400.0;
const ROUTINE_INCLUDED_MINUTES: u32 = 20;
const ROUTINE_PER_EXTRA_MINUTE: f64 = 5.0;
const EMERGENCY_BASE_PRICE: f64 = 900.0;
const EMERGENCY_PER_TRIAGE_STEP: f64 = 120.0;
const ONLINE_FLAT_PRICE: f64 = 320.0;

#[derive(Debug, Default, Clone, Copy)]
pub struct PricingService;

impl PricingService {
    pub fn new() -> Self {
        Self
    }

    /// Calculate the consultation fee for an appointment
    pub fn calculate_price(&self, kind: &AppointmentKind) -> f64 {
        let price = match kind {
            AppointmentKind::Routine(details) => {
                let extra = details.duration_minutes.saturating_sub(ROUTINE_INCLUDED_MINUTES);
                ROUTINE_BASE_PRICE + ROUTINE_PER_EXTRA_MINUTE * extra as f64
            }
            AppointmentKind::Emergency(details) => {
                let steps = details.triage_level.saturating_sub(1);
                EMERGENCY_BASE_PRICE + EMERGENCY_PER_TRIAGE_STEP * steps as f64
            }
            AppointmentKind::Online(_) => ONLINE_FLAT_PRICE,
        };

        debug!("Calculated price {:.2} for {} appointment", price, kind.variant());
        price
    }

    pub fn base_price(&self, variant: AppointmentVariant) -> f64 {
        match variant {
            AppointmentVariant::Routine => ROUTINE_BASE_PRICE,
            AppointmentVariant::Emergency => EMERGENCY_BASE_PRICE,
            AppointmentVariant::Online => ONLINE_FLAT_PRICE,
        }
    }
}
