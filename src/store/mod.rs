//! Store seams for the entities the engine reads and mutates.
//!
//! Persistence itself lives outside the engine; these traits are the
//! collaborator surface. Every query is scoped by tenant id; a store
//! implementation must never return another tenant's rows. [`MemoryStore`]
//! provides an in-process implementation used by tests and embedders.

pub mod memory;

pub use memory::MemoryStore;

use crate::error::EngineError;
use crate::shared::models::{
    AssignmentSettings, CallRecord, Campaign, CampaignAudience, Employee, Lead,
};
use async_trait::async_trait;
use uuid::Uuid;

#[async_trait]
pub trait LeadStore: Send + Sync {
    async fn get(&self, tenant_id: Uuid, lead_id: Uuid) -> Result<Option<Lead>, EngineError>;

    async fn update(&self, lead: &Lead) -> Result<(), EngineError>;

    async fn list_by_tenant(&self, tenant_id: Uuid) -> Result<Vec<Lead>, EngineError>;

    async fn append_call_record(&self, record: &CallRecord) -> Result<(), EngineError>;

    async fn call_records(&self, lead_id: Uuid) -> Result<Vec<CallRecord>, EngineError>;
}

#[async_trait]
pub trait EmployeeStore: Send + Sync {
    async fn get(&self, tenant_id: Uuid, employee_id: Uuid)
        -> Result<Option<Employee>, EngineError>;

    /// Active roster for a tenant.
    async fn active_by_tenant(&self, tenant_id: Uuid) -> Result<Vec<Employee>, EngineError>;
}

#[async_trait]
pub trait CampaignStore: Send + Sync {
    async fn active_by_tenant(&self, tenant_id: Uuid) -> Result<Vec<Campaign>, EngineError>;

    async fn audience(&self, campaign_id: Uuid) -> Result<Vec<CampaignAudience>, EngineError>;

    /// Atomic bump of the campaign's daily generation counter.
    async fn increment_leads_generated_today(
        &self,
        tenant_id: Uuid,
        campaign_id: Uuid,
    ) -> Result<(), EngineError>;
}

#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Settings for a tenant; falls back to [`AssignmentSettings::default`]
    /// when the tenant has none configured.
    async fn for_tenant(&self, tenant_id: Uuid) -> Result<AssignmentSettings, EngineError>;

    /// Tenants known to this store, for sweep-style jobs that iterate all of
    /// them.
    async fn tenant_ids(&self) -> Result<Vec<Uuid>, EngineError>;
}
