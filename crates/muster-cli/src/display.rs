//! Annotated-frame sinks.
//!
//! The session loop hands every processed frame to a `FrameSink`. The
//! default build is headless; `SnapshotSink` periodically writes PNGs as
//! a stand-in for a preview window. Sink failures are cosmetic and only
//! logged.

use muster_hw::Frame;
use std::path::PathBuf;

/// Consumer of annotated frames.
pub trait FrameSink {
    fn present(&mut self, frame: &Frame);
}

/// Discards every frame.
pub struct NullSink;

impl FrameSink for NullSink {
    fn present(&mut self, _frame: &Frame) {}
}

/// Writes every Nth frame to `dir` as `frame_<seq>.png`.
pub struct SnapshotSink {
    dir: PathBuf,
    every: u32,
    seen: u32,
}

impl SnapshotSink {
    pub fn new(dir: PathBuf, every: u32) -> std::io::Result<Self> {
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            every: every.max(1),
            seen: 0,
        })
    }
}

impl FrameSink for SnapshotSink {
    fn present(&mut self, frame: &Frame) {
        self.seen = self.seen.wrapping_add(1);
        if self.seen % self.every != 0 {
            return;
        }

        let Some(img) =
            image::RgbImage::from_raw(frame.width, frame.height, frame.data.clone())
        else {
            tracing::warn!(
                width = frame.width,
                height = frame.height,
                len = frame.data.len(),
                "snapshot skipped: frame buffer has unexpected size"
            );
            return;
        };

        let path = self.dir.join(format!("frame_{:06}.png", self.seen));
        if let Err(err) = img.save(&path) {
            tracing::warn!(path = %path.display(), error = %err, "failed to write snapshot");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn frame(w: u32, h: u32) -> Frame {
        Frame {
            data: vec![128u8; (w * h * 3) as usize],
            width: w,
            height: h,
            timestamp: std::time::Instant::now(),
            sequence: 0,
        }
    }

    #[test]
    fn test_snapshot_every_nth_frame() {
        let dir = TempDir::new().unwrap();
        let mut sink = SnapshotSink::new(dir.path().to_path_buf(), 3).unwrap();

        for _ in 0..7 {
            sink.present(&frame(8, 8));
        }

        let written: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(written.len(), 2); // frames 3 and 6
    }

    #[test]
    fn test_snapshot_bad_buffer_is_skipped() {
        let dir = TempDir::new().unwrap();
        let mut sink = SnapshotSink::new(dir.path().to_path_buf(), 1).unwrap();

        let mut f = frame(8, 8);
        f.data.truncate(10); // wrong size for 8x8 RGB
        sink.present(&f);

        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_null_sink_accepts_frames() {
        NullSink.present(&frame(4, 4));
    }
}
