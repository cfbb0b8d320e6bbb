use crate::audit::AssignmentLog;
use crate::notify::NotificationSink;
use crate::store::{CampaignStore, EmployeeStore, LeadStore, SettingsStore};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Shared handles to the engine's collaborators plus the per-lead lock map.
///
/// Mutations to a single lead's assignment/tag fields and its audit append
/// are serialized through `lead_lock`. Nothing else is: concurrent pipeline
/// invocations across leads run freely, and load aggregates are recomputed
/// live, so two simultaneous assigns may pick the same least-loaded employee
/// before either commits. That soft consistency is accepted.
pub struct EngineState {
    pub leads: Arc<dyn LeadStore>,
    pub employees: Arc<dyn EmployeeStore>,
    pub campaigns: Arc<dyn CampaignStore>,
    pub settings: Arc<dyn SettingsStore>,
    pub audit: Arc<AssignmentLog>,
    pub notifier: Arc<dyn NotificationSink>,
    lead_locks: Mutex<HashMap<Uuid, Arc<Mutex<()>>>>,
}

impl EngineState {
    pub fn new(
        leads: Arc<dyn LeadStore>,
        employees: Arc<dyn EmployeeStore>,
        campaigns: Arc<dyn CampaignStore>,
        settings: Arc<dyn SettingsStore>,
        audit: Arc<AssignmentLog>,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            leads,
            employees,
            campaigns,
            settings,
            audit,
            notifier,
            lead_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Serialization point for a single lead's read-decide-write section.
    pub async fn lead_lock(&self, lead_id: Uuid) -> Arc<Mutex<()>> {
        let mut locks = self.lead_locks.lock().await;
        locks
            .entry(lead_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}
