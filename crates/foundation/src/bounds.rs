use crate::math::LatLon;

/// Geographic bounding box in degrees.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GeoBounds {
    pub min: LatLon,
    pub max: LatLon,
}

impl GeoBounds {
    pub fn new(min: LatLon, max: LatLon) -> Self {
        GeoBounds { min, max }
    }

    /// Smallest box containing every point, or `None` for an empty input.
    pub fn from_points(points: impl IntoIterator<Item = LatLon>) -> Option<Self> {
        points.into_iter().fold(None, |acc, p| {
            Some(match acc {
                None => GeoBounds::new(p, p),
                Some(b) => GeoBounds::new(
                    LatLon::new(b.min.lat.min(p.lat), b.min.lon.min(p.lon)),
                    LatLon::new(b.max.lat.max(p.lat), b.max.lon.max(p.lon)),
                ),
            })
        })
    }

    pub fn center(&self) -> LatLon {
        LatLon::new(
            (self.min.lat + self.max.lat) / 2.0,
            (self.min.lon + self.max.lon) / 2.0,
        )
    }
}
