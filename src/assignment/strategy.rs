//! Pluggable tie-break between eligible candidates.
//!
//! The `load_balancing_strategy` setting names the strategy to use. Only
//! one behavior exists upstream (least active balance, then least daily
//! count), so every configured name currently resolves to [`LeastLoaded`].

use crate::assignment::pool::Candidate;
use log::debug;
use std::sync::Arc;

pub trait SelectionStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn select<'a>(&self, pool: &'a [Candidate]) -> Option<&'a Candidate>;
}

/// Ascending `(active_balance, daily_assigned_count)`, employee id as the
/// final key so equal loads still pick deterministically.
pub struct LeastLoaded;

impl SelectionStrategy for LeastLoaded {
    fn name(&self) -> &'static str {
        "least_loaded"
    }

    fn select<'a>(&self, pool: &'a [Candidate]) -> Option<&'a Candidate> {
        pool.iter().min_by_key(|c| {
            (
                c.load.active_balance,
                c.load.daily_assigned_count,
                c.employee_id,
            )
        })
    }
}

pub fn strategy_for(name: &str) -> Arc<dyn SelectionStrategy> {
    match name {
        "least_loaded" => Arc::new(LeastLoaded),
        other => {
            debug!("unknown load balancing strategy '{other}', using least_loaded");
            Arc::new(LeastLoaded)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::models::EmployeeLoad;
    use uuid::Uuid;

    fn candidate(balance: i32, daily: i32) -> Candidate {
        Candidate {
            employee_id: Uuid::new_v4(),
            is_investigation_officer: false,
            load: EmployeeLoad {
                daily_assigned_count: daily,
                active_balance: balance,
            },
        }
    }

    #[test]
    fn least_balance_wins() {
        let pool = vec![candidate(5, 0), candidate(2, 9), candidate(3, 1)];
        let picked = LeastLoaded.select(&pool).unwrap();
        assert_eq!(picked.load.active_balance, 2);
    }

    #[test]
    fn daily_count_breaks_balance_ties() {
        let pool = vec![candidate(2, 4), candidate(2, 1)];
        let picked = LeastLoaded.select(&pool).unwrap();
        assert_eq!(picked.load.daily_assigned_count, 1);
    }

    #[test]
    fn empty_pool_selects_nobody() {
        assert!(LeastLoaded.select(&[]).is_none());
    }

    #[test]
    fn unknown_strategy_name_falls_back() {
        assert_eq!(strategy_for("round_robin").name(), "least_loaded");
        assert_eq!(strategy_for("least_loaded").name(), "least_loaded");
    }
}
