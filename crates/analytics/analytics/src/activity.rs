//! Recent-activity feed assembly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tutorhub_core::{Activity, ActivityKind};

/// An activity flattened into the feed's uniform shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    pub user: String,
    pub summary: String,
    pub timestamp: DateTime<Utc>,
}

impl From<&Activity> for ActivityRecord {
    fn from(activity: &Activity) -> Self {
        Self {
            id: activity.id(),
            kind: activity.kind(),
            user: activity.user().to_string(),
            summary: activity.summary(),
            timestamp: activity.timestamp(),
        }
    }
}

/// Merges per-kind batches into one feed of at most `limit` records,
/// newest first, ties broken by higher id.
pub fn assemble<I>(batches: I, limit: usize) -> Vec<ActivityRecord>
where
    I: IntoIterator<Item = Vec<Activity>>,
{
    let mut activities: Vec<Activity> = batches.into_iter().flatten().collect();
    activities.sort_by(|a, b| {
        b.timestamp()
            .cmp(&a.timestamp())
            .then_with(|| b.id().cmp(&a.id()))
            .then_with(|| a.kind().cmp(&b.kind()))
    });
    activities.truncate(limit);
    activities.iter().map(ActivityRecord::from).collect()
}
