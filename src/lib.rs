//! Lead routing and assignment engine.
//!
//! Routes inbound sales leads to agents under campaign, capacity and
//! priority constraints, tracks call-outcome state per lead, and reclaims
//! stale or failing assignments. Persistence, transport and auth live
//! outside this crate: stores and the notification sink are trait seams
//! wired in through [`EngineState`].

pub mod assignment;
pub mod audit;
pub mod error;
pub mod notify;
pub mod outcome;
pub mod reclaim;
pub mod shared;
pub mod store;

pub use assignment::{AssignOutcome, LeadEngine};
pub use audit::AssignmentLog;
pub use error::EngineError;
pub use notify::{ChannelSink, LoggingSink, NotificationSink};
pub use outcome::{CallOutcomeRequest, CallOutcomeResponse, LeadScore};
pub use reclaim::{ReclaimReport, ReclaimerConfig, StaleLeadReclaimer};
pub use shared::state::EngineState;
pub use store::MemoryStore;
