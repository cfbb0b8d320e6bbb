//! Campaign matching: the first stage of the routing pipeline.

use crate::shared::models::{Campaign, CampaignStatus};
use chrono::{DateTime, Utc};
use log::debug;

/// Find the campaign a lead should be routed through.
///
/// A campaign matches when it is active, its source equals the lead's source
/// (case-insensitive) and its time window contains `now`. Campaigns whose
/// fixed daily limit is already exhausted are skipped: the lead falls
/// through to the next matching campaign or the global pool, and the
/// exhausted campaign's counter is left untouched. Several overlapping
/// matches tie-break on the smallest campaign id.
pub fn match_campaign<'a>(
    campaigns: &'a [Campaign],
    source: &str,
    now: DateTime<Utc>,
) -> Option<&'a Campaign> {
    let matched = campaigns
        .iter()
        .filter(|c| {
            c.status == CampaignStatus::Active
                && c.source.eq_ignore_ascii_case(source)
                && c.window_contains(now)
        })
        .filter(|c| {
            let open = c.daily_limit.allows(c.leads_generated_today);
            if !open {
                debug!(
                    "campaign {} ({}) at daily limit, skipping",
                    c.name, c.id
                );
            }
            open
        })
        .min_by_key(|c| c.id);

    if let Some(c) = matched {
        debug!("matched campaign {} ({}) for source {source}", c.name, c.id);
    }
    matched
}
