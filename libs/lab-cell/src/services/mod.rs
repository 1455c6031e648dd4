pub mod alerts;
pub mod criticality;
pub mod repository;

pub use alerts::AlertService;
pub use lab_test::LabTestService;
pub use repository::LabTestRepository;
