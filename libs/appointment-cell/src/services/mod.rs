pub mod audit;
pub mod booking;
pub mod conflict;
pub mod lifecycle;
pub mod notification;
pub mod pricing;
pub mod repository;

pub use audit::{AuditAction, AuditEntry, AuditService};
pub use booking::AppointmentBookingService;
pub use conflict::ConflictDetectionService;
pub use lifecycle::AppointmentLifecycleService;
pub use notification::{
    InMemoryNotifier, NoopNotifier, Notification, NotificationKind, Notifier, TracingNotifier,
};
pub use pricing::PricingService;
pub use repository::AppointmentRepository;
