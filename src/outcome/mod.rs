//! Call-outcome tracking: the lead tag state machine, scoring, and the
//! disqualification/reassignment policy that runs after failed attempts.

use crate::assignment::{AssignContext, AssignOutcome, LeadEngine};
use crate::error::EngineError;
use crate::notify::employee_channel;
use crate::shared::models::{
    AssignmentLogEntry, AssignmentMode, AssignmentSettings, AssignmentType, CallOutcome,
    CallRecord, Lead, LeadPriority, LeadStatus, LeadTag,
};
use chrono::{DateTime, Duration, Utc};
use log::{info, warn};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct CallOutcomeRequest {
    pub lead_id: Uuid,
    pub tenant_id: Uuid,
    pub outcome: CallOutcome,
    pub next_call_at: Option<DateTime<Utc>>,
    pub drop_reason: Option<String>,
    pub not_connected_reason: Option<String>,
    pub remarks: Option<String>,
    pub priority: Option<LeadPriority>,
    pub duration_seconds: Option<i32>,
    pub create_reminder: bool,
}

impl CallOutcomeRequest {
    pub fn new(lead_id: Uuid, tenant_id: Uuid, outcome: CallOutcome) -> Self {
        Self {
            lead_id,
            tenant_id,
            outcome,
            next_call_at: None,
            drop_reason: None,
            not_connected_reason: None,
            remarks: None,
            priority: None,
            duration_seconds: None,
            create_reminder: false,
        }
    }

    pub fn next_call_at(mut self, at: DateTime<Utc>) -> Self {
        self.next_call_at = Some(at);
        self
    }

    pub fn drop_reason(mut self, reason: impl Into<String>) -> Self {
        self.drop_reason = Some(reason.into());
        self
    }

    pub fn not_connected_reason(mut self, reason: impl Into<String>) -> Self {
        self.not_connected_reason = Some(reason.into());
        self
    }

    pub fn remarks(mut self, remarks: impl Into<String>) -> Self {
        self.remarks = Some(remarks.into());
        self
    }

    pub fn priority(mut self, priority: LeadPriority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn duration_seconds(mut self, seconds: i32) -> Self {
        self.duration_seconds = Some(seconds);
        self
    }

    pub fn create_reminder(mut self) -> Self {
        self.create_reminder = true;
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CallOutcomeResponse {
    pub lead_id: Uuid,
    pub tag: LeadTag,
    pub status: LeadStatus,
    pub assigned_employee_id: Option<Uuid>,
    pub next_call_at: Option<DateTime<Utc>>,
    pub call_count: i32,
    pub connected_count: i32,
    pub not_connected_count: i32,
    pub score: LeadScore,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct LeadScore {
    /// Connected calls as a percentage of all calls, 0 when never called.
    pub success_rate: f64,
    /// Clamped to [0, 100].
    pub conversion_probability: f64,
    pub is_trending: bool,
}

/// Recompute the lead's scoring fields in place.
///
/// `probability = success_rate * 0.5 + tag bonus + priority bonus`, where
/// Interested gives +20, FollowUp +10 and High priority +10, clamped to
/// [0, 100]. Trending means probability above 70.
pub fn analyze_lead(lead: &mut Lead) -> LeadScore {
    let success_rate = if lead.call_count == 0 {
        0.0
    } else {
        lead.connected_count as f64 / lead.call_count as f64 * 100.0
    };

    let tag_bonus = match lead.tag {
        LeadTag::Interested => 20.0,
        LeadTag::FollowUp => 10.0,
        _ => 0.0,
    };
    let priority_bonus = if lead.priority == LeadPriority::High {
        10.0
    } else {
        0.0
    };

    let probability = (success_rate * 0.5 + tag_bonus + priority_bonus).clamp(0.0, 100.0);

    lead.call_success_rate = success_rate;
    lead.conversion_probability = probability;
    lead.is_trending = probability > 70.0;

    LeadScore {
        success_rate,
        conversion_probability: probability,
        is_trending: lead.is_trending,
    }
}

impl LeadEngine {
    /// Record one call result against a lead: advance the tag state machine,
    /// append the call record, recompute scoring, then run the
    /// disqualification policy for auto-mode tenants.
    pub async fn record_call_outcome(
        &self,
        req: CallOutcomeRequest,
    ) -> Result<CallOutcomeResponse, EngineError> {
        let state = self.state();
        let settings = state.settings.for_tenant(req.tenant_id).await?;
        let now = Utc::now();

        let lead = {
            let lock = state.lead_lock(req.lead_id).await;
            let _guard = lock.lock().await;

            let mut lead = state
                .leads
                .get(req.tenant_id, req.lead_id)
                .await?
                .ok_or(EngineError::LeadNotFound(req.lead_id))?;

            lead.call_count += 1;
            if let Some(priority) = req.priority {
                lead.priority = priority;
            }

            match req.outcome {
                CallOutcome::Connected => {
                    lead.connected_count += 1;
                    lead.tag = LeadTag::FollowUp;
                    if let Some(at) = req.next_call_at {
                        lead.next_call_at = Some(at);
                    }
                }
                CallOutcome::NotConnected => {
                    lead.not_connected_count += 1;
                    lead.tag = LeadTag::NotConnected;
                    lead.not_connected_reason = req.not_connected_reason.clone();
                    // No explicit retry time: schedule one call-gap out.
                    lead.next_call_at = Some(req.next_call_at.unwrap_or_else(|| {
                        now + Duration::minutes(settings.call_time_gap_minutes)
                    }));
                }
                CallOutcome::Dropped => {
                    lead.tag = LeadTag::Lost;
                    lead.drop_reason = req.drop_reason.clone();
                }
                CallOutcome::FollowUp => {
                    lead.tag = LeadTag::FollowUp;
                    lead.next_call_at = req.next_call_at;
                }
            }

            state
                .leads
                .append_call_record(&CallRecord {
                    id: Uuid::new_v4(),
                    lead_id: req.lead_id,
                    outcome: req.outcome,
                    remarks: req.remarks.clone(),
                    duration_seconds: req.duration_seconds,
                    occurred_at: now,
                })
                .await?;

            analyze_lead(&mut lead);
            lead.updated_at = now;
            state.leads.update(&lead).await?;
            lead
        };

        if req.create_reminder {
            self.send_follow_up_reminder(&lead);
        }

        if req.outcome != CallOutcome::Connected && settings.mode == AssignmentMode::Auto {
            self.evaluate_disqualification(&req, &settings).await?;
        }

        // Reload: the policy may have disqualified or reassigned the lead.
        let lead = state
            .leads
            .get(req.tenant_id, req.lead_id)
            .await?
            .ok_or(EngineError::LeadNotFound(req.lead_id))?;

        Ok(CallOutcomeResponse {
            lead_id: lead.id,
            tag: lead.tag,
            status: lead.status,
            assigned_employee_id: lead.assigned_employee_id,
            next_call_at: lead.next_call_at,
            call_count: lead.call_count,
            connected_count: lead.connected_count,
            not_connected_count: lead.not_connected_count,
            score: LeadScore {
                success_rate: lead.call_success_rate,
                conversion_probability: lead.conversion_probability,
                is_trending: lead.is_trending,
            },
        })
    }

    /// Recompute and persist the lead's scoring fields.
    pub async fn analyze(&self, tenant_id: Uuid, lead_id: Uuid) -> Result<LeadScore, EngineError> {
        let state = self.state();
        let lock = state.lead_lock(lead_id).await;
        let _guard = lock.lock().await;

        let mut lead = state
            .leads
            .get(tenant_id, lead_id)
            .await?
            .ok_or(EngineError::LeadNotFound(lead_id))?;

        let score = analyze_lead(&mut lead);
        lead.updated_at = Utc::now();
        state.leads.update(&lead).await?;
        Ok(score)
    }

    /// Failed-attempt threshold policy. Runs after every non-connected
    /// outcome for auto-mode tenants.
    async fn evaluate_disqualification(
        &self,
        req: &CallOutcomeRequest,
        settings: &AssignmentSettings,
    ) -> Result<(), EngineError> {
        let state = self.state();
        let records = state.leads.call_records(req.lead_id).await?;
        let failed_attempts = records
            .iter()
            .filter(|r| r.outcome != CallOutcome::Connected)
            .count() as i32;

        if failed_attempts < settings.max_call_attempts {
            return Ok(());
        }

        if settings.auto_disqualification {
            let lock = state.lead_lock(req.lead_id).await;
            let _guard = lock.lock().await;

            let mut lead = state
                .leads
                .get(req.tenant_id, req.lead_id)
                .await?
                .ok_or(EngineError::LeadNotFound(req.lead_id))?;

            lead.tag = LeadTag::Lost;
            lead.status = LeadStatus::Closed;
            lead.updated_at = Utc::now();
            state.leads.update(&lead).await?;

            let reason = format!(
                "Auto Disqualified (Reached {} failed attempts)",
                settings.max_call_attempts
            );
            info!("lead {}: {reason}", req.lead_id);
            state
                .audit
                .append(AssignmentLogEntry::new(
                    req.lead_id,
                    req.tenant_id,
                    lead.assigned_employee_id,
                    AssignmentType::Auto,
                    reason,
                ))
                .await;
        } else if settings.reassignment_on_disqualified {
            let previous = {
                let lock = state.lead_lock(req.lead_id).await;
                let _guard = lock.lock().await;

                let mut lead = state
                    .leads
                    .get(req.tenant_id, req.lead_id)
                    .await?
                    .ok_or(EngineError::LeadNotFound(req.lead_id))?;

                let previous = lead.assigned_employee_id;
                lead.clear_assignment();
                state.leads.update(&lead).await?;
                previous
            };

            let outcome = match previous {
                Some(previous) => {
                    self.assign_with(
                        req.lead_id,
                        req.tenant_id,
                        AssignContext {
                            exclude_employee_id: Some(previous),
                            reassigned_from: Some(previous),
                            reason_override: Some("Auto Reassigned".to_string()),
                        },
                    )
                    .await?
                }
                None => self.assign(req.lead_id, req.tenant_id, None).await?,
            };

            if let AssignOutcome::Unassigned { reason, .. } = &outcome {
                info!(
                    "lead {}: reassignment after {failed_attempts} failed attempts found nobody ({reason})",
                    req.lead_id
                );
            }
        }

        Ok(())
    }

    fn send_follow_up_reminder(&self, lead: &Lead) {
        let (Some(employee_id), Some(next_call_at)) =
            (lead.assigned_employee_id, lead.next_call_at)
        else {
            return;
        };

        let notifier = Arc::clone(&self.state().notifier);
        let payload = json!({
            "type": "follow_up_reminder",
            "lead_id": lead.id,
            "tenant_id": lead.tenant_id,
            "employee_id": employee_id,
            "next_call_at": next_call_at.to_rfc3339(),
        });

        tokio::spawn(async move {
            let channel = employee_channel(employee_id);
            if let Err(e) = notifier.send(&channel, payload).await {
                warn!("follow-up reminder to {channel} failed: {e}");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probability_is_clamped_and_trending_tracks_threshold() {
        let mut lead = Lead::new(Uuid::new_v4(), "web", LeadPriority::High);
        lead.call_count = 10;
        lead.connected_count = 10;
        lead.tag = LeadTag::Interested;

        // 100 * 0.5 + 20 + 10 = 80
        let score = analyze_lead(&mut lead);
        assert!((score.conversion_probability - 80.0).abs() < f64::EPSILON);
        assert!(score.is_trending);
        assert!(score.conversion_probability <= 100.0);
    }

    #[test]
    fn zero_calls_scores_zero_rate() {
        let mut lead = Lead::new(Uuid::new_v4(), "web", LeadPriority::Low);
        let score = analyze_lead(&mut lead);
        assert_eq!(score.success_rate, 0.0);
        assert_eq!(score.conversion_probability, 0.0);
        assert!(!score.is_trending);
    }

    #[test]
    fn follow_up_bonus_without_connects_stays_low() {
        let mut lead = Lead::new(Uuid::new_v4(), "web", LeadPriority::Medium);
        lead.call_count = 4;
        lead.connected_count = 1;
        lead.tag = LeadTag::FollowUp;

        // 25 * 0.5 + 10 = 22.5
        let score = analyze_lead(&mut lead);
        assert!((score.conversion_probability - 22.5).abs() < f64::EPSILON);
        assert!(!score.is_trending);
    }
}
