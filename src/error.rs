use thiserror::Error;
use uuid::Uuid;

/// Engine-level failures surfaced to callers.
///
/// "No eligible candidate" is intentionally absent: an assignment that finds
/// nobody to take a lead is a valid terminal outcome
/// ([`AssignOutcome::Unassigned`](crate::assignment::AssignOutcome)), not an
/// error. Notification delivery failures are likewise never surfaced; they
/// are logged and swallowed at the emission site.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("lead {0} not found")]
    LeadNotFound(Uuid),

    #[error("employee {0} not found")]
    EmployeeNotFound(Uuid),

    #[error("campaign {0} not found")]
    CampaignNotFound(Uuid),

    /// Transient store failure. Surfaced as-is so the caller can apply its
    /// own retry policy; the engine never retries internally.
    #[error("persistence failure: {0}")]
    Persistence(String),
}
