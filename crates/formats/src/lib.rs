//! Route input and frame output formats.

pub mod frames;
pub mod gpx;

pub use crate::frames::{
    FRAMES_FORMAT_VERSION, FrameDocument, FrameSink, FrameSinkError, NdjsonFrameSink,
    write_frames_json,
};
pub use crate::gpx::{RouteSourceError, TrackPoint, read_gpx, read_gpx_file, route_points};
