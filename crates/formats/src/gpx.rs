use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use foundation::RoutePoint;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum RouteSourceError {
    #[error("GPX document contains no track or route points")]
    NoPoints,
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("GPX parse error: {0}")]
    Gpx(String),
}

/// A recorded position with its optional RFC 3339 timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackPoint {
    pub point: RoutePoint,
    pub time: Option<String>,
}

/// Reads every track segment point, then every route point. Missing
/// elevations become 0.
pub fn read_gpx(reader: impl Read) -> Result<Vec<TrackPoint>, RouteSourceError> {
    let doc = ::gpx::read(reader).map_err(|e| RouteSourceError::Gpx(e.to_string()))?;

    let track_points = doc
        .tracks
        .iter()
        .flat_map(|track| track.segments.iter())
        .flat_map(|segment| segment.points.iter());
    let route_points = doc.routes.iter().flat_map(|route| route.points.iter());

    let points: Vec<TrackPoint> = track_points
        .chain(route_points)
        .map(|waypoint| {
            let geo = waypoint.point();
            TrackPoint {
                point: RoutePoint::new(geo.y(), geo.x(), waypoint.elevation.unwrap_or(0.0)),
                time: waypoint.time.as_ref().and_then(|t| t.format().ok()),
            }
        })
        .collect();

    if points.is_empty() {
        return Err(RouteSourceError::NoPoints);
    }
    debug!(
        points = points.len(),
        tracks = doc.tracks.len(),
        routes = doc.routes.len(),
        "GPX parsed"
    );
    Ok(points)
}

pub fn read_gpx_file(path: impl AsRef<Path>) -> Result<Vec<TrackPoint>, RouteSourceError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| RouteSourceError::Io {
        path: path.display().to_string(),
        source,
    })?;
    read_gpx(BufReader::new(file))
}

pub fn route_points(points: &[TrackPoint]) -> Vec<RoutePoint> {
    points.iter().map(|p| p.point).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const TRACK: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="trailgen-tests" xmlns="http://www.topografix.com/GPX/1/1">
  <trk>
    <name>Ridge</name>
    <trkseg>
      <trkpt lat="46.5000" lon="7.9000"><ele>1200.5</ele><time>2024-07-01T08:00:00Z</time></trkpt>
      <trkpt lat="46.5010" lon="7.9010"><ele>1250</ele></trkpt>
    </trkseg>
    <trkseg>
      <trkpt lat="46.5020" lon="7.9020"></trkpt>
    </trkseg>
  </trk>
  <rte>
    <rtept lat="46.6000" lon="8.0000"><ele>900</ele></rtept>
  </rte>
</gpx>"#;

    #[test]
    fn reads_tracks_then_routes() {
        let points = read_gpx(TRACK.as_bytes()).unwrap();
        assert_eq!(points.len(), 4);
        assert_eq!(points[0].point, RoutePoint::new(46.5, 7.9, 1200.5));
        assert!(points[0].time.as_deref().is_some_and(|t| t.starts_with("2024-07-01T08:00:00")));
        assert_eq!(points[1].time, None);
        assert_eq!(points[2].point.ele, 0.0);
        assert_eq!(points[3].point, RoutePoint::new(46.6, 8.0, 900.0));
        assert_eq!(route_points(&points).len(), 4);
    }

    #[test]
    fn empty_document_has_no_points() {
        let doc = r#"<?xml version="1.0"?><gpx version="1.1" creator="t" xmlns="http://www.topografix.com/GPX/1/1"></gpx>"#;
        assert!(matches!(read_gpx(doc.as_bytes()), Err(RouteSourceError::NoPoints)));
    }

    #[test]
    fn malformed_xml_is_a_parse_error() {
        assert!(matches!(read_gpx("<gpx".as_bytes()), Err(RouteSourceError::Gpx(_))));
    }

    #[test]
    fn reads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(TRACK.as_bytes()).unwrap();
        assert_eq!(read_gpx_file(file.path()).unwrap().len(), 4);

        let missing = file.path().with_extension("missing");
        assert!(matches!(read_gpx_file(missing), Err(RouteSourceError::Io { .. })));
    }
}
