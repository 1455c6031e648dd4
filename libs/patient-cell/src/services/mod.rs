pub mod notification;
pub mod patient;
pub mod repository;

pub use notification::{InMemoryPatientNotifier, PatientEvent, PatientNotifier, TracingPatientNotifier};
pub use patient::PatientService;
pub use repository::PatientRepository;
