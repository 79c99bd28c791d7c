use log::*;

use crate::{
    api::tracking_objects::NearbyTracking,
    db_types::GeoPoint,
    traits::{TrackingDatabase, TrackingError},
};

/// `RiderMatcherApi` answers the geospatial pickup query: which deliveries could a rider at a given point take on.
pub struct RiderMatcherApi<B> {
    db: B,
}

impl<B> RiderMatcherApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> RiderMatcherApi<B>
where B: TrackingDatabase
{
    /// Active trackings in `ReadyForPickup` or `OutForDelivery` within `max_distance_m` meters of `point`, nearest
    /// first. No candidates is an empty list, not an error.
    pub async fn find_nearby(&self, point: GeoPoint, max_distance_m: f64) -> Result<Vec<NearbyTracking>, TrackingError> {
        let matches = self.db.fetch_trackings_near(point, max_distance_m).await?;
        debug!("📍️ {} pickup candidates within {max_distance_m}m of {point}", matches.len());
        Ok(matches.into_iter().map(|(tracking, distance_m)| NearbyTracking { tracking, distance_m }).collect())
    }
}
