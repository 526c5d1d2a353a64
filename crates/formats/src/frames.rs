use std::io::{self, Write};

use camera::CameraFrame;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const FRAMES_FORMAT_VERSION: &str = "1.0";

#[derive(Debug, Error)]
pub enum FrameSinkError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("frame encode error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Consumer of camera frames in render order.
pub trait FrameSink {
    fn push(&mut self, frame: &CameraFrame) -> Result<(), FrameSinkError>;

    fn finish(&mut self) -> Result<(), FrameSinkError> {
        Ok(())
    }

    fn push_all(&mut self, frames: &[CameraFrame]) -> Result<(), FrameSinkError> {
        for frame in frames {
            self.push(frame)?;
        }
        self.finish()
    }
}

/// One JSON object per line.
#[derive(Debug)]
pub struct NdjsonFrameSink<W: Write> {
    writer: W,
    written: usize,
}

impl<W: Write> NdjsonFrameSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, written: 0 }
    }

    pub fn written(&self) -> usize {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> FrameSink for NdjsonFrameSink<W> {
    fn push(&mut self, frame: &CameraFrame) -> Result<(), FrameSinkError> {
        serde_json::to_writer(&mut self.writer, frame)?;
        self.writer.write_all(b"\n")?;
        self.written += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), FrameSinkError> {
        self.writer.flush()?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameDocument {
    pub version: String,
    pub fps: u32,
    pub frames: Vec<CameraFrame>,
}

impl FrameDocument {
    pub fn new(fps: u32, frames: Vec<CameraFrame>) -> Self {
        Self {
            version: FRAMES_FORMAT_VERSION.to_string(),
            fps,
            frames,
        }
    }
}

/// Writes `{ "version", "fps", "frames" }` as pretty-printed JSON.
pub fn write_frames_json(
    writer: impl Write,
    fps: u32,
    frames: &[CameraFrame],
) -> Result<(), FrameSinkError> {
    #[derive(Serialize)]
    struct Borrowed<'a> {
        version: &'a str,
        fps: u32,
        frames: &'a [CameraFrame],
    }
    let mut writer = io::BufWriter::new(writer);
    serde_json::to_writer_pretty(
        &mut writer,
        &Borrowed {
            version: FRAMES_FORMAT_VERSION,
            fps,
            frames,
        },
    )?;
    writer.flush()?;
    Ok(())
}
