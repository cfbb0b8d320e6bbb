use crate::error::EngineError;
use crate::shared::models::{
    AssignmentSettings, CallRecord, Campaign, CampaignAudience, CampaignStatus, Employee,
    EmployeeStatus, Lead,
};
use crate::store::{CampaignStore, EmployeeStore, LeadStore, SettingsStore};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// In-memory store backing tests and single-process embedders. All four
/// store traits over `RwLock`ed maps.
#[derive(Default)]
pub struct MemoryStore {
    leads: RwLock<HashMap<Uuid, Lead>>,
    employees: RwLock<HashMap<Uuid, Employee>>,
    campaigns: RwLock<HashMap<Uuid, Campaign>>,
    audiences: RwLock<Vec<CampaignAudience>>,
    call_records: RwLock<Vec<CallRecord>>,
    settings: RwLock<HashMap<Uuid, AssignmentSettings>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_lead(&self, lead: Lead) {
        self.leads.write().await.insert(lead.id, lead);
    }

    pub async fn insert_employee(&self, employee: Employee) {
        self.employees.write().await.insert(employee.id, employee);
    }

    pub async fn insert_campaign(&self, campaign: Campaign) {
        self.campaigns.write().await.insert(campaign.id, campaign);
    }

    pub async fn insert_audience(&self, audience: CampaignAudience) {
        self.audiences.write().await.push(audience);
    }

    pub async fn set_settings(&self, tenant_id: Uuid, settings: AssignmentSettings) {
        self.settings.write().await.insert(tenant_id, settings);
    }

    pub async fn campaign(&self, campaign_id: Uuid) -> Option<Campaign> {
        self.campaigns.read().await.get(&campaign_id).cloned()
    }
}

#[async_trait]
impl LeadStore for MemoryStore {
    async fn get(&self, tenant_id: Uuid, lead_id: Uuid) -> Result<Option<Lead>, EngineError> {
        let leads = self.leads.read().await;
        Ok(leads
            .get(&lead_id)
            .filter(|l| l.tenant_id == tenant_id)
            .cloned())
    }

    async fn update(&self, lead: &Lead) -> Result<(), EngineError> {
        let mut leads = self.leads.write().await;
        leads.insert(lead.id, lead.clone());
        Ok(())
    }

    async fn list_by_tenant(&self, tenant_id: Uuid) -> Result<Vec<Lead>, EngineError> {
        let leads = self.leads.read().await;
        Ok(leads
            .values()
            .filter(|l| l.tenant_id == tenant_id)
            .cloned()
            .collect())
    }

    async fn append_call_record(&self, record: &CallRecord) -> Result<(), EngineError> {
        self.call_records.write().await.push(record.clone());
        Ok(())
    }

    async fn call_records(&self, lead_id: Uuid) -> Result<Vec<CallRecord>, EngineError> {
        let records = self.call_records.read().await;
        Ok(records
            .iter()
            .filter(|r| r.lead_id == lead_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl EmployeeStore for MemoryStore {
    async fn get(
        &self,
        tenant_id: Uuid,
        employee_id: Uuid,
    ) -> Result<Option<Employee>, EngineError> {
        let employees = self.employees.read().await;
        Ok(employees
            .get(&employee_id)
            .filter(|e| e.tenant_id == tenant_id)
            .cloned())
    }

    async fn active_by_tenant(&self, tenant_id: Uuid) -> Result<Vec<Employee>, EngineError> {
        let employees = self.employees.read().await;
        Ok(employees
            .values()
            .filter(|e| e.tenant_id == tenant_id && e.status == EmployeeStatus::Active)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl CampaignStore for MemoryStore {
    async fn active_by_tenant(&self, tenant_id: Uuid) -> Result<Vec<Campaign>, EngineError> {
        let campaigns = self.campaigns.read().await;
        Ok(campaigns
            .values()
            .filter(|c| c.tenant_id == tenant_id && c.status == CampaignStatus::Active)
            .cloned()
            .collect())
    }

    async fn audience(&self, campaign_id: Uuid) -> Result<Vec<CampaignAudience>, EngineError> {
        let audiences = self.audiences.read().await;
        Ok(audiences
            .iter()
            .filter(|a| a.campaign_id == campaign_id)
            .cloned()
            .collect())
    }

    async fn increment_leads_generated_today(
        &self,
        tenant_id: Uuid,
        campaign_id: Uuid,
    ) -> Result<(), EngineError> {
        let mut campaigns = self.campaigns.write().await;
        match campaigns
            .get_mut(&campaign_id)
            .filter(|c| c.tenant_id == tenant_id)
        {
            Some(campaign) => {
                campaign.leads_generated_today += 1;
                Ok(())
            }
            None => Err(EngineError::CampaignNotFound(campaign_id)),
        }
    }
}

#[async_trait]
impl SettingsStore for MemoryStore {
    async fn for_tenant(&self, tenant_id: Uuid) -> Result<AssignmentSettings, EngineError> {
        let settings = self.settings.read().await;
        Ok(settings.get(&tenant_id).cloned().unwrap_or_default())
    }

    async fn tenant_ids(&self) -> Result<Vec<Uuid>, EngineError> {
        let settings = self.settings.read().await;
        Ok(settings.keys().copied().collect())
    }
}
