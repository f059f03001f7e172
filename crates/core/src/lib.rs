pub mod audit;
pub mod config;
pub mod domain;
pub mod errors;
pub mod ports;
pub mod routing;
pub mod workflow;

pub use audit::{AuditCategory, AuditContext, AuditEvent, AuditOutcome, InMemoryAuditSink};
pub use domain::claim::{Claim, ClaimId, ClaimStatus, ClaimType, RoutingPatch};
pub use domain::employee::Employee;
pub use domain::notification::{Notification, NotificationKind};
pub use errors::{RoutingError, StoreError};
pub use ports::{AuditSink, ClaimStore, DirectoryGateway, NotificationEmitter};
pub use routing::{Resolution, StageResolver, StageTable};
pub use workflow::{AdmissionOutcome, AdvanceResponse, BulkAdmission, ClaimWorkflow};
