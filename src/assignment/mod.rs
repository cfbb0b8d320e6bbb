//! The routing pipeline: campaign match, candidate pool, priority filter,
//! selection, commit.
//!
//! `assign` is invoked on lead creation and re-entered by the
//! disqualification policy and the stale-lead reclaimer, so the whole
//! pipeline is reentrant. Only the per-lead commit section is serialized;
//! everything before it works on a live snapshot and may race with other
//! leads' pipelines (accepted soft consistency, see `shared::state`).

pub mod campaign;
pub mod pool;
pub mod strategy;

use crate::error::EngineError;
use crate::notify::{employee_channel, tenant_admin_channel, NotificationSink};
use crate::shared::models::{
    AssignmentLogEntry, AssignmentMode, AssignmentType, Lead,
};
use crate::shared::state::EngineState;
use campaign::match_campaign;
use chrono::Utc;
use log::{info, warn};
use pool::{apply_priority_filter, build_campaign_pool, build_global_pool};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use strategy::strategy_for;
use uuid::Uuid;

/// Reason string recorded when a lead is auto-assigned outside any campaign.
pub const AUTO_ASSIGNMENT_REASON: &str = "Auto Assignment Rule";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case", tag = "result")]
pub enum AssignOutcome {
    Assigned {
        lead_id: Uuid,
        employee_id: Uuid,
        campaign_id: Option<Uuid>,
    },
    /// Nobody eligible took the lead. A valid terminal outcome, not an
    /// error.
    Unassigned { lead_id: Uuid, reason: String },
}

impl AssignOutcome {
    pub fn is_assigned(&self) -> bool {
        matches!(self, Self::Assigned { .. })
    }

    pub fn employee_id(&self) -> Option<Uuid> {
        match self {
            Self::Assigned { employee_id, .. } => Some(*employee_id),
            Self::Unassigned { .. } => None,
        }
    }
}

/// Carries re-entry context through the pipeline so reassignments exclude
/// the prior assignee, record where the lead came from, and never bump the
/// campaign daily counter a second time.
#[derive(Debug, Clone, Default)]
pub(crate) struct AssignContext {
    pub exclude_employee_id: Option<Uuid>,
    pub reassigned_from: Option<Uuid>,
    pub reason_override: Option<String>,
}

pub struct LeadEngine {
    state: Arc<EngineState>,
}

impl LeadEngine {
    pub fn new(state: Arc<EngineState>) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &Arc<EngineState> {
        &self.state
    }

    /// Route a lead to an agent. Entry point for lead creation and for any
    /// reassignment trigger.
    pub async fn assign(
        &self,
        lead_id: Uuid,
        tenant_id: Uuid,
        exclude_employee_id: Option<Uuid>,
    ) -> Result<AssignOutcome, EngineError> {
        self.assign_with(
            lead_id,
            tenant_id,
            AssignContext {
                exclude_employee_id,
                ..Default::default()
            },
        )
        .await
    }

    pub(crate) async fn assign_with(
        &self,
        lead_id: Uuid,
        tenant_id: Uuid,
        ctx: AssignContext,
    ) -> Result<AssignOutcome, EngineError> {
        let state = &self.state;
        let settings = state.settings.for_tenant(tenant_id).await?;
        let lead = state
            .leads
            .get(tenant_id, lead_id)
            .await?
            .ok_or(EngineError::LeadNotFound(lead_id))?;
        let now = Utc::now();

        let campaigns = state.campaigns.active_by_tenant(tenant_id).await?;
        let matched = match_campaign(&campaigns, &lead.source, now).cloned();

        let pool = match &matched {
            Some(campaign) => {
                build_campaign_pool(
                    state,
                    tenant_id,
                    campaign,
                    &settings,
                    ctx.exclude_employee_id,
                    now,
                )
                .await?
            }
            None if settings.mode == AssignmentMode::Manual => {
                info!(
                    "lead {lead_id}: manual tenant {tenant_id} and no campaign matched, leaving unassigned"
                );
                return Ok(AssignOutcome::Unassigned {
                    lead_id,
                    reason: "manual mode and no matching campaign".into(),
                });
            }
            None => {
                build_global_pool(state, tenant_id, &settings, ctx.exclude_employee_id, now)
                    .await?
            }
        };

        let pool = apply_priority_filter(pool, &lead, &settings);

        let strategy = strategy_for(&settings.load_balancing_strategy);
        let Some(candidate) = strategy.select(&pool) else {
            info!("lead {lead_id}: no eligible candidate, leaving unassigned");
            return Ok(AssignOutcome::Unassigned {
                lead_id,
                reason: "no eligible candidate".into(),
            });
        };
        let employee_id = candidate.employee_id;

        let reason = ctx.reason_override.clone().unwrap_or_else(|| {
            matched
                .as_ref()
                .map(|c| c.name.clone())
                .unwrap_or_else(|| AUTO_ASSIGNMENT_REASON.to_string())
        });

        // Commit section, serialized per lead.
        {
            let lock = state.lead_lock(lead_id).await;
            let _guard = lock.lock().await;

            let mut lead = state
                .leads
                .get(tenant_id, lead_id)
                .await?
                .ok_or(EngineError::LeadNotFound(lead_id))?;

            let first_assignment = lead.assigned_employee_id.is_none()
                && ctx.exclude_employee_id.is_none()
                && ctx.reassigned_from.is_none();

            lead.assigned_employee_id = Some(employee_id);
            lead.assigned_at = Some(now);
            lead.updated_at = now;
            state.leads.update(&lead).await?;

            if let Some(campaign) = &matched {
                if first_assignment {
                    state
                        .campaigns
                        .increment_leads_generated_today(tenant_id, campaign.id)
                        .await?;
                }
            }

            let mut entry = AssignmentLogEntry::new(
                lead_id,
                tenant_id,
                Some(employee_id),
                AssignmentType::Auto,
                reason.clone(),
            );
            if let Some(previous) = ctx.reassigned_from {
                entry = entry.with_reassigned_from(previous);
            }
            state.audit.append(entry).await;
        }

        info!("lead {lead_id} assigned to employee {employee_id} ({reason})");
        self.notify_assignment(&lead, tenant_id, employee_id, &reason);

        Ok(AssignOutcome::Assigned {
            lead_id,
            employee_id,
            campaign_id: matched.map(|c| c.id),
        })
    }

    /// Distribute the given leads round-robin across the given employees.
    /// No capacity checks; the same audit trail as auto assignment.
    pub async fn manual_assign(
        &self,
        tenant_id: Uuid,
        lead_ids: &[Uuid],
        employee_ids: &[Uuid],
        assigned_by: Option<Uuid>,
        reason: Option<String>,
    ) -> Result<Vec<AssignOutcome>, EngineError> {
        let state = &self.state;

        if employee_ids.is_empty() {
            return Ok(lead_ids
                .iter()
                .map(|&lead_id| AssignOutcome::Unassigned {
                    lead_id,
                    reason: "no employees provided".into(),
                })
                .collect());
        }

        for &employee_id in employee_ids {
            state
                .employees
                .get(tenant_id, employee_id)
                .await?
                .ok_or(EngineError::EmployeeNotFound(employee_id))?;
        }

        let reason = reason.unwrap_or_else(|| "Manual Assignment".to_string());
        let mut outcomes = Vec::with_capacity(lead_ids.len());

        for (i, &lead_id) in lead_ids.iter().enumerate() {
            let employee_id = employee_ids[i % employee_ids.len()];
            let now = Utc::now();

            let lead = {
                let lock = state.lead_lock(lead_id).await;
                let _guard = lock.lock().await;

                let mut lead = state
                    .leads
                    .get(tenant_id, lead_id)
                    .await?
                    .ok_or(EngineError::LeadNotFound(lead_id))?;

                let previous = lead.assigned_employee_id;
                lead.assigned_employee_id = Some(employee_id);
                lead.assigned_at = Some(now);
                lead.updated_at = now;
                state.leads.update(&lead).await?;

                let mut entry = AssignmentLogEntry::new(
                    lead_id,
                    tenant_id,
                    Some(employee_id),
                    AssignmentType::Manual,
                    reason.clone(),
                );
                if let Some(user) = assigned_by {
                    entry = entry.by_user(user);
                }
                if let Some(previous) = previous.filter(|&p| p != employee_id) {
                    entry = entry.with_reassigned_from(previous);
                }
                state.audit.append(entry).await;
                lead
            };

            self.notify_assignment(&lead, tenant_id, employee_id, &reason);
            outcomes.push(AssignOutcome::Assigned {
                lead_id,
                employee_id,
                campaign_id: None,
            });
        }

        Ok(outcomes)
    }

    /// Fire-and-forget delivery to the assignee's channel and the
    /// tenant-admin channel. Failures are logged and swallowed; the
    /// assignment has already committed.
    fn notify_assignment(&self, lead: &Lead, tenant_id: Uuid, employee_id: Uuid, reason: &str) {
        let notifier: Arc<dyn NotificationSink> = Arc::clone(&self.state.notifier);
        let payload = json!({
            "type": "lead_assigned",
            "lead_id": lead.id,
            "tenant_id": tenant_id,
            "employee_id": employee_id,
            "source": lead.source,
            "priority": lead.priority,
            "reason": reason,
        });

        tokio::spawn(async move {
            for channel in [employee_channel(employee_id), tenant_admin_channel(tenant_id)] {
                if let Err(e) = notifier.send(&channel, payload.clone()).await {
                    warn!("notification to {channel} failed: {e}");
                }
            }
        });
    }
}
