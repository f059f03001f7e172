pub mod bulk;
pub mod driver;
pub mod response;

pub use bulk::{fast_path, AdmissionOutcome, BulkAdmission, FastPath};
pub use driver::{ClaimWorkflow, WorkflowSettings};
pub use response::AdvanceResponse;
