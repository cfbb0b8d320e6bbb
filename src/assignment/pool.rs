//! Candidate pool construction and the high-priority narrowing filter.

use crate::error::EngineError;
use crate::shared::models::{
    AssignmentSettings, Campaign, EmployeeLoad, EmployeeStatus, Lead, LeadPriority,
};
use crate::shared::state::EngineState;
use chrono::{DateTime, Utc};
use log::debug;
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct Candidate {
    pub employee_id: Uuid,
    pub is_investigation_officer: bool,
    pub load: EmployeeLoad,
}

/// Recompute per-employee load figures from the tenant's current leads.
///
/// `daily_assigned_count` counts leads assigned on `now`'s calendar day;
/// `active_balance` counts assigned leads whose tag is not terminal. Both
/// are live aggregates; nothing is cached between pipeline invocations.
pub fn compute_loads(leads: &[Lead], now: DateTime<Utc>) -> HashMap<Uuid, EmployeeLoad> {
    let today = now.date_naive();
    let mut loads: HashMap<Uuid, EmployeeLoad> = HashMap::new();

    for lead in leads {
        let Some(employee_id) = lead.assigned_employee_id else {
            continue;
        };
        let load = loads.entry(employee_id).or_default();

        if lead
            .assigned_at
            .is_some_and(|at| at.date_naive() == today)
        {
            load.daily_assigned_count += 1;
        }
        if !lead.tag.is_terminal() {
            load.active_balance += 1;
        }
    }

    loads
}

/// Eligible candidates from a campaign's audience. Capacity comes from the
/// audience row's overrides, or the tenant defaults; `is_unlimited` rows
/// bypass both caps. Inactive employees are dropped.
pub async fn build_campaign_pool(
    state: &EngineState,
    tenant_id: Uuid,
    campaign: &Campaign,
    settings: &AssignmentSettings,
    exclude_employee_id: Option<Uuid>,
    now: DateTime<Utc>,
) -> Result<Vec<Candidate>, EngineError> {
    let audience = state.campaigns.audience(campaign.id).await?;
    let leads = state.leads.list_by_tenant(tenant_id).await?;
    let loads = compute_loads(&leads, now);
    let audience_len = audience.len();

    let mut pool = Vec::new();
    for row in audience {
        if Some(row.employee_id) == exclude_employee_id {
            continue;
        }
        let Some(_employee) = state
            .employees
            .get(tenant_id, row.employee_id)
            .await?
            .filter(|e| e.status == EmployeeStatus::Active)
        else {
            continue;
        };

        let load = loads.get(&row.employee_id).copied().unwrap_or_default();

        let eligible = if row.is_unlimited {
            true
        } else {
            let daily_limit = row
                .daily_limit_override
                .unwrap_or(settings.leads_per_employee_per_day);
            let max_balance = row
                .max_balance_override
                .unwrap_or(settings.max_active_leads_balance);
            load.daily_assigned_count < daily_limit && load.active_balance < max_balance
        };

        if eligible {
            pool.push(Candidate {
                employee_id: row.employee_id,
                is_investigation_officer: row.is_investigation_officer,
                load,
            });
        }
    }

    debug!(
        "campaign {} pool: {} eligible of {} audience rows",
        campaign.id,
        pool.len(),
        audience_len
    );
    Ok(pool)
}

/// Eligible candidates from the tenant's whole active roster, judged
/// uniformly against the tenant defaults.
pub async fn build_global_pool(
    state: &EngineState,
    tenant_id: Uuid,
    settings: &AssignmentSettings,
    exclude_employee_id: Option<Uuid>,
    now: DateTime<Utc>,
) -> Result<Vec<Candidate>, EngineError> {
    let roster = state.employees.active_by_tenant(tenant_id).await?;
    let leads = state.leads.list_by_tenant(tenant_id).await?;
    let loads = compute_loads(&leads, now);

    let pool = roster
        .into_iter()
        .filter(|e| Some(e.id) != exclude_employee_id)
        .filter_map(|e| {
            let load = loads.get(&e.id).copied().unwrap_or_default();
            let eligible = load.daily_assigned_count < settings.leads_per_employee_per_day
                && load.active_balance < settings.max_active_leads_balance;
            eligible.then_some(Candidate {
                employee_id: e.id,
                is_investigation_officer: false,
                load,
            })
        })
        .collect::<Vec<_>>();

    debug!("global pool for tenant {tenant_id}: {} eligible", pool.len());
    Ok(pool)
}

/// Narrow the pool to investigation officers for high-priority leads.
/// An empty narrowed pool reverts to the unfiltered one rather than
/// blocking assignment.
pub fn apply_priority_filter(
    pool: Vec<Candidate>,
    lead: &Lead,
    settings: &AssignmentSettings,
) -> Vec<Candidate> {
    if !settings.priority_handling || lead.priority != LeadPriority::High {
        return pool;
    }

    let officers: Vec<Candidate> = pool
        .iter()
        .filter(|c| c.is_investigation_officer)
        .cloned()
        .collect();

    if officers.is_empty() {
        debug!(
            "no investigation officer available for high-priority lead {}, using full pool",
            lead.id
        );
        pool
    } else {
        officers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::models::{LeadStatus, LeadTag};
    use chrono::Duration;

    fn assigned_lead(tenant: Uuid, employee: Uuid, tag: LeadTag, hours_ago: i64) -> Lead {
        let mut lead = Lead::new(tenant, "web", LeadPriority::Medium);
        lead.tag = tag;
        lead.status = LeadStatus::Open;
        lead.assigned_employee_id = Some(employee);
        lead.assigned_at = Some(Utc::now() - Duration::hours(hours_ago));
        lead
    }

    #[test]
    fn terminal_tags_excluded_from_active_balance() {
        let tenant = Uuid::new_v4();
        let employee = Uuid::new_v4();
        let leads = vec![
            assigned_lead(tenant, employee, LeadTag::FollowUp, 1),
            assigned_lead(tenant, employee, LeadTag::Won, 1),
            assigned_lead(tenant, employee, LeadTag::Lost, 1),
            assigned_lead(tenant, employee, LeadTag::Closed, 1),
            assigned_lead(tenant, employee, LeadTag::Duplicate, 1),
        ];

        let loads = compute_loads(&leads, Utc::now());
        assert_eq!(loads[&employee].active_balance, 1);
        assert_eq!(loads[&employee].daily_assigned_count, 5);
    }

    #[test]
    fn daily_count_only_counts_today() {
        let tenant = Uuid::new_v4();
        let employee = Uuid::new_v4();
        let leads = vec![
            assigned_lead(tenant, employee, LeadTag::NotContacted, 1),
            assigned_lead(tenant, employee, LeadTag::NotContacted, 48),
        ];

        let loads = compute_loads(&leads, Utc::now());
        assert_eq!(loads[&employee].daily_assigned_count, 1);
        assert_eq!(loads[&employee].active_balance, 2);
    }

    #[test]
    fn priority_filter_narrows_then_reverts() {
        let settings = AssignmentSettings::default();
        let officer = Uuid::new_v4();
        let pool = vec![
            Candidate {
                employee_id: Uuid::new_v4(),
                is_investigation_officer: false,
                load: EmployeeLoad::default(),
            },
            Candidate {
                employee_id: officer,
                is_investigation_officer: true,
                load: EmployeeLoad::default(),
            },
        ];

        let mut high = Lead::new(Uuid::new_v4(), "web", LeadPriority::High);
        let narrowed = apply_priority_filter(pool.clone(), &high, &settings);
        assert_eq!(narrowed.len(), 1);
        assert_eq!(narrowed[0].employee_id, officer);

        // No officers at all: fall back to the unfiltered pool.
        let no_officers: Vec<Candidate> = pool
            .iter()
            .cloned()
            .map(|mut c| {
                c.is_investigation_officer = false;
                c
            })
            .collect();
        let kept = apply_priority_filter(no_officers, &high, &settings);
        assert_eq!(kept.len(), 2);

        // Low priority is untouched.
        high.priority = LeadPriority::Low;
        let kept = apply_priority_filter(pool, &high, &settings);
        assert_eq!(kept.len(), 2);
    }
}
