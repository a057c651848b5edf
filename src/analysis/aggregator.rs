//! Child→parent time rollup by activity category.
//!
//! Each worklog entry accrues to the topmost parent of the work item it
//! was logged on. Total time moves with every entry together with
//! exactly one of the dev/test/other counters, so
//! `total == dev + test + other` holds for every bucket.

use std::collections::HashMap;

use crate::config::ActivityNames;
use crate::models::{ActivityKind, Hierarchy, TimeBucket, Ticket};
use crate::timehub::Worklog;

/// Roll worklog time up into per-ticket buckets.
///
/// Every ticket gets a bucket, all-zero when nothing was logged.
/// Entries on a child accrue to its parent; entries on an id outside
/// the query scope keep a bucket of their own, which the report never
/// reads.
pub fn aggregate_worklogs(
    tickets: &[Ticket],
    hierarchy: &Hierarchy,
    worklogs: &[Worklog],
    activities: &ActivityNames,
) -> HashMap<String, TimeBucket> {
    let child_to_parent = hierarchy.invert();

    let mut buckets: HashMap<String, TimeBucket> = HashMap::new();
    for ticket in tickets {
        buckets.entry(ticket.id.clone()).or_default();
    }

    for log in worklogs {
        let work_id = log.work_item_id.to_string();
        let target = child_to_parent.get(&work_id).cloned().unwrap_or(work_id);
        let kind = classify(log.activity_name(), activities);
        buckets
            .entry(target)
            .or_default()
            .record(log.period_length, kind);
    }

    buckets
}

/// Exact-match activity classification.
///
/// An unset configured name matches nothing, so unlabeled entries can
/// never be counted as dev or test time.
fn classify(label: &str, activities: &ActivityNames) -> ActivityKind {
    if !activities.dev.is_empty() && label == activities.dev {
        ActivityKind::Dev
    } else if !activities.test.is_empty() && label == activities.test {
        ActivityKind::Test
    } else {
        ActivityKind::Other
    }
}
