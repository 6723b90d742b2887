// Resource operation pipeline shared by every create/read/update/delete endpoint

pub mod auth;
pub mod context;
pub mod envelope;
pub mod error;
pub mod outcome;
pub mod resource;
pub mod size_guard;

// Re-export core types
pub use auth::{gate_from_config, AllowAll, AuthGate, AuthOutcome, BearerPresence, JwtGate};
pub use context::{RequestContext, RequestId, REQUEST_ID_HEADER};
pub use envelope::CommonHeaders;
pub use error::{PipelineError, INTERNAL_ERROR_MARKER};
pub use outcome::{OperationResult, ValidateFn, ValidationOutcome};
pub use resource::{Operation, ResourcePipeline};
pub use size_guard::SizeGuard;
