pub mod models;
pub mod services;

pub use models::*;
pub use services::{
    AppointmentBookingService, AppointmentRepository, AuditAction, AuditEntry, InMemoryNotifier,
    NoopNotifier, NotificationKind, Notifier, TracingNotifier,
};
