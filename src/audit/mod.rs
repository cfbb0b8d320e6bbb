//! Append-only assignment history.
//!
//! Entries are immutable once appended; readers get clones. Capacity is
//! bounded; when full, the oldest entries fall off the front.

use crate::shared::models::AssignmentLogEntry;
use log::info;
use std::collections::VecDeque;
use tokio::sync::RwLock;
use uuid::Uuid;

pub struct AssignmentLog {
    entries: RwLock<VecDeque<AssignmentLogEntry>>,
    max_entries: usize,
}

impl AssignmentLog {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: RwLock::new(VecDeque::with_capacity(max_entries.min(1024))),
            max_entries,
        }
    }

    pub async fn append(&self, entry: AssignmentLogEntry) {
        let mut entries = self.entries.write().await;

        if entries.len() >= self.max_entries {
            entries.pop_front();
        }

        info!(
            "AUDIT: lead={} employee={:?} type={:?} reassigned_from={:?} - {}",
            entry.lead_id,
            entry.employee_id,
            entry.assignment_type,
            entry.reassigned_from,
            entry.reason
        );

        entries.push_back(entry);
    }

    pub async fn entries_for_lead(&self, lead_id: Uuid) -> Vec<AssignmentLogEntry> {
        let entries = self.entries.read().await;
        entries
            .iter()
            .filter(|e| e.lead_id == lead_id)
            .cloned()
            .collect()
    }

    pub async fn entries_for_tenant(&self, tenant_id: Uuid) -> Vec<AssignmentLogEntry> {
        let entries = self.entries.read().await;
        entries
            .iter()
            .filter(|e| e.tenant_id == tenant_id)
            .cloned()
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

impl Default for AssignmentLog {
    fn default() -> Self {
        Self::new(10_000)
    }
}
