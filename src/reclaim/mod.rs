//! Periodic reclamation of assigned leads nobody has worked.
//!
//! A lead is stale when it is assigned, still in an early tag
//! (`NotContacted`/`Open`) and its assignment is older than the tenant's
//! revert window. Stale leads get their assignment cleared and re-enter the
//! routing pipeline. One lead failing never aborts the sweep.

use crate::assignment::{AssignContext, AssignOutcome, LeadEngine};
use crate::error::EngineError;
use crate::shared::models::{AssignmentMode, Lead};
use chrono::{Duration, Utc};
use log::{error, info};
use serde::Serialize;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::interval;
use uuid::Uuid;

const STALE_REVERT_REASON: &str = "Auto Revert (Stale lead)";

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct ReclaimReport {
    pub tenant_id: Uuid,
    pub scanned: usize,
    pub reverted: usize,
    pub reassigned: usize,
    pub failed: usize,
}

impl LeadEngine {
    /// Sweep one tenant for stale leads. No-op for manual-mode tenants.
    pub async fn reclaim_stale(&self, tenant_id: Uuid) -> Result<ReclaimReport, EngineError> {
        let state = self.state();
        let settings = state.settings.for_tenant(tenant_id).await?;
        let mut report = ReclaimReport {
            tenant_id,
            ..Default::default()
        };

        if settings.mode != AssignmentMode::Auto {
            return Ok(report);
        }

        let cutoff = Utc::now() - Duration::hours(settings.revert_time_hours);
        let stale: Vec<Lead> = state
            .leads
            .list_by_tenant(tenant_id)
            .await?
            .into_iter()
            .filter(|l| {
                l.assigned_employee_id.is_some()
                    && l.tag.is_early()
                    && l.assigned_at.is_some_and(|at| at < cutoff)
            })
            .collect();

        for lead in stale {
            report.scanned += 1;
            match self.revert_one(tenant_id, lead.id).await {
                Ok(Some(outcome)) => {
                    report.reverted += 1;
                    if outcome.is_assigned() {
                        report.reassigned += 1;
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    // Isolated: the rest of the sweep continues.
                    error!("stale revert failed for lead {}: {e}", lead.id);
                    report.failed += 1;
                }
            }
        }

        if report.scanned > 0 {
            info!(
                "stale sweep tenant {tenant_id}: {} reverted, {} reassigned, {} failed",
                report.reverted, report.reassigned, report.failed
            );
        }
        Ok(report)
    }

    /// Clear one stale lead's assignment and re-run the pipeline. The prior
    /// assignee is excluded first; if that leaves nobody, the pipeline runs
    /// again without the exclusion so the same agent can be re-picked when
    /// they are the only candidate. Returns `None` when the lead was no
    /// longer stale by the time its lock was taken.
    async fn revert_one(
        &self,
        tenant_id: Uuid,
        lead_id: Uuid,
    ) -> Result<Option<AssignOutcome>, EngineError> {
        let state = self.state();

        let previous = {
            let lock = state.lead_lock(lead_id).await;
            let _guard = lock.lock().await;

            let mut lead = state
                .leads
                .get(tenant_id, lead_id)
                .await?
                .ok_or(EngineError::LeadNotFound(lead_id))?;

            let Some(previous) = lead.assigned_employee_id.filter(|_| lead.tag.is_early()) else {
                return Ok(None);
            };

            lead.clear_assignment();
            state.leads.update(&lead).await?;
            previous
        };

        let ctx = AssignContext {
            exclude_employee_id: Some(previous),
            reassigned_from: Some(previous),
            reason_override: Some(STALE_REVERT_REASON.to_string()),
        };
        let outcome = self.assign_with(lead_id, tenant_id, ctx).await?;

        let outcome = match outcome {
            AssignOutcome::Unassigned { .. } => {
                self.assign_with(
                    lead_id,
                    tenant_id,
                    AssignContext {
                        exclude_employee_id: None,
                        reassigned_from: Some(previous),
                        reason_override: Some(STALE_REVERT_REASON.to_string()),
                    },
                )
                .await?
            }
            assigned => assigned,
        };

        Ok(Some(outcome))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ReclaimerConfig {
    pub tick: std::time::Duration,
}

impl Default for ReclaimerConfig {
    fn default() -> Self {
        Self {
            tick: std::time::Duration::from_secs(60),
        }
    }
}

/// Background loop driving [`LeadEngine::reclaim_stale`] across all known
/// tenants on a fixed tick.
pub struct StaleLeadReclaimer {
    engine: Arc<LeadEngine>,
    config: ReclaimerConfig,
}

impl StaleLeadReclaimer {
    pub fn new(engine: Arc<LeadEngine>, config: ReclaimerConfig) -> Self {
        Self { engine, config }
    }

    pub fn spawn(self) -> JoinHandle<()> {
        info!(
            "stale lead reclaimer started (tick every {:?})",
            self.config.tick
        );

        tokio::spawn(async move {
            let mut ticker = interval(self.config.tick);

            loop {
                ticker.tick().await;

                let tenants = match self.engine.state().settings.tenant_ids().await {
                    Ok(tenants) => tenants,
                    Err(e) => {
                        error!("stale sweep could not list tenants: {e}");
                        continue;
                    }
                };

                for tenant_id in tenants {
                    if let Err(e) = self.engine.reclaim_stale(tenant_id).await {
                        error!("stale sweep failed for tenant {tenant_id}: {e}");
                    }
                }
            }
        })
    }
}
