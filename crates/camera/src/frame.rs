use foundation::math::LatLon;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

/// Renderer-facing position, serialized as `[lon, lat]`.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct LngLat {
    pub lon: f64,
    pub lat: f64,
}

impl LngLat {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    pub fn to_lat_lon(self) -> LatLon {
        LatLon::new(self.lat, self.lon)
    }
}

impl From<LatLon> for LngLat {
    fn from(p: LatLon) -> Self {
        LngLat::new(p.lon, p.lat)
    }
}

impl From<[f64; 2]> for LngLat {
    fn from([lon, lat]: [f64; 2]) -> Self {
        LngLat::new(lon, lat)
    }
}

impl From<LngLat> for [f64; 2] {
    fn from(p: LngLat) -> Self {
        [p.lon, p.lat]
    }
}

/// One free-camera rendering instruction.
#[derive(Debug, Copy, Clone, PartialEq, Deserialize)]
pub struct CameraFrame {
    pub position: LngLat,
    /// Meters above sea level.
    pub altitude: f64,
    pub target: LngLat,
    pub progress: f64,
}

impl Serialize for CameraFrame {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("CameraFrame", 5)?;
        s.serialize_field("position", &self.position)?;
        s.serialize_field("altitude", &self.altitude)?;
        s.serialize_field("target", &self.target)?;
        s.serialize_field("progress", &self.progress)?;
        s.serialize_field("free", &true)?;
        s.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn frame_serializes_as_free_camera() {
        let frame = CameraFrame {
            position: LngLat::new(7.5, 46.25),
            altitude: 2400.0,
            target: LngLat::new(7.75, 46.5),
            progress: 0.5,
        };
        let json = serde_json::to_value(frame).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "position": [7.5, 46.25],
                "altitude": 2400.0,
                "target": [7.75, 46.5],
                "progress": 0.5,
                "free": true,
            })
        );

        let back: CameraFrame = serde_json::from_value(json).unwrap();
        assert_eq!(back, frame);
    }
}
