use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db_types::Tracking;

//--------------------------------------  TrackingSnapshot   ---------------------------------------------------------
/// A tracking record together with its derived fields, computed at read time. This is what event subscribers and
/// HTTP clients receive; the derived fields are never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingSnapshot {
    #[serde(flatten)]
    pub tracking: Tracking,
    pub progress_percentage: u8,
    pub time_remaining_secs: i64,
}

impl TrackingSnapshot {
    pub fn new(tracking: Tracking, now: DateTime<Utc>) -> Self {
        let progress_percentage = tracking.progress_percentage();
        let time_remaining_secs = tracking.time_remaining(now).num_seconds();
        Self { tracking, progress_percentage, time_remaining_secs }
    }
}

//--------------------------------------   NearbyTracking    ---------------------------------------------------------
/// A pickup candidate returned by the rider matcher, with its distance from the queried point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NearbyTracking {
    pub tracking: Tracking,
    pub distance_m: f64,
}
