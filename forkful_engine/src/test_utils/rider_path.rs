//! A deterministic rider-location source. Production location updates come from rider devices through the HTTP
//! surface; tests drive the same `update_location` calls from an interpolated path instead of a wall-clock timer.
use crate::db_types::GeoPoint;

pub struct RiderPath {
    from: GeoPoint,
    to: GeoPoint,
    steps: u32,
}

impl RiderPath {
    pub fn new(from: GeoPoint, to: GeoPoint, steps: u32) -> Self {
        assert!(steps > 0, "a rider path needs at least one step");
        Self { from, to, steps }
    }

    /// The positions along the path, `steps` in total. The final position is exactly the destination, not a
    /// floating-point approximation of it.
    pub fn positions(&self) -> impl Iterator<Item = GeoPoint> + '_ {
        (1..=self.steps).map(move |i| {
            if i == self.steps {
                return self.to;
            }
            let progress = f64::from(i) / f64::from(self.steps);
            GeoPoint::new(
                self.from.lng + (self.to.lng - self.from.lng) * progress,
                self.from.lat + (self.to.lat - self.from.lat) * progress,
            )
        })
    }
}
