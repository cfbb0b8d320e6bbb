use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadPriority {
    Low,
    Medium,
    High,
}

/// Workflow state of a lead. `Won`, `Lost`, `Closed` and `Duplicate` are
/// terminal: leads carrying them no longer count toward an employee's
/// active balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadTag {
    NotContacted,
    Open,
    FollowUp,
    NotConnected,
    Interested,
    Won,
    Lost,
    Closed,
    Duplicate,
}

impl LeadTag {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Won | Self::Lost | Self::Closed | Self::Duplicate)
    }

    /// Tags a lead can sit in before anyone has worked it. Assigned leads
    /// still in one of these past the revert window are considered stale.
    pub fn is_early(&self) -> bool {
        matches!(self, Self::NotContacted | Self::Open)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadStatus {
    Open,
    Closed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lead {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub source: String,
    pub priority: LeadPriority,
    pub tag: LeadTag,
    pub status: LeadStatus,
    pub assigned_employee_id: Option<Uuid>,
    pub assigned_at: Option<DateTime<Utc>>,
    pub call_count: i32,
    pub connected_count: i32,
    pub not_connected_count: i32,
    pub next_call_at: Option<DateTime<Utc>>,
    pub drop_reason: Option<String>,
    pub not_connected_reason: Option<String>,
    pub call_success_rate: f64,
    pub conversion_probability: f64,
    pub is_trending: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Lead {
    pub fn new(tenant_id: Uuid, source: impl Into<String>, priority: LeadPriority) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            tenant_id,
            source: source.into(),
            priority,
            tag: LeadTag::NotContacted,
            status: LeadStatus::Open,
            assigned_employee_id: None,
            assigned_at: None,
            call_count: 0,
            connected_count: 0,
            not_connected_count: 0,
            next_call_at: None,
            drop_reason: None,
            not_connected_reason: None,
            call_success_rate: 0.0,
            conversion_probability: 0.0,
            is_trending: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn clear_assignment(&mut self) {
        self.assigned_employee_id = None;
        self.assigned_at = None;
        self.updated_at = Utc::now();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmployeeStatus {
    Active,
    Inactive,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Employee {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub status: EmployeeStatus,
}

impl Employee {
    pub fn new(tenant_id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            tenant_id,
            name: name.into(),
            status: EmployeeStatus::Active,
        }
    }
}

/// Per-employee load figures, recomputed by live aggregation over the lead
/// store rather than maintained as counters.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct EmployeeLoad {
    pub daily_assigned_count: i32,
    pub active_balance: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DailyLimitPolicy {
    Fixed(i32),
    Unlimited,
}

impl DailyLimitPolicy {
    /// Whether a campaign that has already generated `current` leads today
    /// can take one more.
    pub fn allows(&self, current: i32) -> bool {
        match self {
            Self::Fixed(n) => current < *n,
            Self::Unlimited => true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    Active,
    Paused,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub source: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub daily_limit: DailyLimitPolicy,
    pub leads_generated_today: i32,
    pub status: CampaignStatus,
}

impl Campaign {
    pub fn window_contains(&self, now: DateTime<Utc>) -> bool {
        self.starts_at <= now && now <= self.ends_at
    }
}

/// Membership row tying an employee to a campaign, with optional capacity
/// overrides on top of the tenant defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignAudience {
    pub campaign_id: Uuid,
    pub employee_id: Uuid,
    pub daily_limit_override: Option<i32>,
    pub max_balance_override: Option<i32>,
    pub is_unlimited: bool,
    pub is_investigation_officer: bool,
}

impl CampaignAudience {
    pub fn member(campaign_id: Uuid, employee_id: Uuid) -> Self {
        Self {
            campaign_id,
            employee_id,
            daily_limit_override: None,
            max_balance_override: None,
            is_unlimited: false,
            is_investigation_officer: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentMode {
    Manual,
    Auto,
}

/// Per-tenant routing configuration. Passed as an immutable value into every
/// pipeline invocation; the engine keeps no ambient settings state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentSettings {
    pub mode: AssignmentMode,
    pub leads_per_employee_per_day: i32,
    pub max_active_leads_balance: i32,
    pub revert_time_hours: i64,
    pub load_balancing_strategy: String,
    pub priority_handling: bool,
    pub max_call_attempts: i32,
    pub call_time_gap_minutes: i64,
    pub auto_disqualification: bool,
    pub reassignment_on_disqualified: bool,
}

impl Default for AssignmentSettings {
    fn default() -> Self {
        Self {
            mode: AssignmentMode::Auto,
            leads_per_employee_per_day: 10,
            max_active_leads_balance: 20,
            revert_time_hours: 24,
            load_balancing_strategy: "least_loaded".to_string(),
            priority_handling: true,
            max_call_attempts: 3,
            call_time_gap_minutes: 120,
            auto_disqualification: false,
            reassignment_on_disqualified: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallOutcome {
    Connected,
    NotConnected,
    Dropped,
    FollowUp,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallRecord {
    pub id: Uuid,
    pub lead_id: Uuid,
    pub outcome: CallOutcome,
    pub remarks: Option<String>,
    pub duration_seconds: Option<i32>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignedBy {
    System,
    User(Uuid),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentType {
    Auto,
    Manual,
}

/// Immutable, append-only record of one assignment decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentLogEntry {
    pub id: Uuid,
    pub lead_id: Uuid,
    pub tenant_id: Uuid,
    pub employee_id: Option<Uuid>,
    pub assigned_by: AssignedBy,
    pub assignment_type: AssignmentType,
    pub reassigned_from: Option<Uuid>,
    pub reason: String,
    pub timestamp: DateTime<Utc>,
}

impl AssignmentLogEntry {
    pub fn new(
        lead_id: Uuid,
        tenant_id: Uuid,
        employee_id: Option<Uuid>,
        assignment_type: AssignmentType,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            lead_id,
            tenant_id,
            employee_id,
            assigned_by: AssignedBy::System,
            assignment_type,
            reassigned_from: None,
            reason: reason.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn by_user(mut self, user_id: Uuid) -> Self {
        self.assigned_by = AssignedBy::User(user_id);
        self
    }

    pub fn with_reassigned_from(mut self, previous: Uuid) -> Self {
        self.reassigned_from = Some(previous);
        self
    }
}
