//! Replay of a recorded detection log.

use std::collections::VecDeque;
use std::path::Path;

use gimbal_common::error::{GimbalError, GimbalResult};
use gimbal_control_model::{parse_detection_log, BoundingBox, FrameGeometry, RecordedFrame};

use crate::{Detector, FrameRead, FrameSource};

/// Serves frames from a detection log in order, then closes.
pub struct ReplaySource {
    geometry: FrameGeometry,
    frames: VecDeque<RecordedFrame>,
    name: String,
}

impl ReplaySource {
    pub fn from_frames(geometry: FrameGeometry, frames: Vec<RecordedFrame>) -> Self {
        Self {
            geometry,
            frames: frames.into(),
            name: "replay".to_string(),
        }
    }

    /// Open a JSONL detection log. The log header's geometry wins over
    /// `default_geometry` when present.
    pub fn open(path: &Path, default_geometry: FrameGeometry) -> GimbalResult<Self> {
        if !path.exists() {
            return Err(GimbalError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        let log = parse_detection_log(&content).map_err(|e| {
            GimbalError::device(format!(
                "Failed to parse detection log {}: {e}",
                path.display()
            ))
        })?;

        let geometry = log
            .header
            .map(|header| header.geometry)
            .unwrap_or(default_geometry);
        if !geometry.is_valid() {
            return Err(GimbalError::device(format!(
                "Detection log {} has invalid geometry {}x{}",
                path.display(),
                geometry.width,
                geometry.height
            )));
        }

        tracing::info!(
            path = %path.display(),
            frames = log.frames.len(),
            "Opened detection log"
        );

        Ok(Self {
            geometry,
            frames: log.frames.into(),
            name: format!("replay:{}", path.display()),
        })
    }

    /// Frames not yet served.
    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl FrameSource for ReplaySource {
    type Frame = RecordedFrame;

    fn read(&mut self) -> GimbalResult<FrameRead<RecordedFrame>> {
        Ok(match self.frames.pop_front() {
            Some(frame) if frame.dropped => FrameRead::Dropped,
            Some(frame) => FrameRead::Frame(frame),
            None => FrameRead::Closed,
        })
    }

    fn geometry(&self) -> FrameGeometry {
        self.geometry
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Detector that reports the boxes stored in a recorded frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordedDetector;

impl Detector<RecordedFrame> for RecordedDetector {
    fn detect(&mut self, frame: &RecordedFrame) -> GimbalResult<Vec<BoundingBox>> {
        Ok(frame.boxes.clone())
    }

    fn name(&self) -> &str {
        "recorded"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gimbal_control_model::{serialize_detection_log, DetectionLogHeader};

    #[test]
    fn test_replay_order_and_close() {
        let mut source = ReplaySource::from_frames(
            FrameGeometry::FULL_HD,
            vec![RecordedFrame::dropped(0), RecordedFrame::detected(1, vec![])],
        );
        assert_eq!(source.read().unwrap(), FrameRead::Dropped);
        assert!(matches!(source.read().unwrap(), FrameRead::Frame(f) if f.frame == 1));
        assert_eq!(source.read().unwrap(), FrameRead::Closed);
        assert_eq!(source.read().unwrap(), FrameRead::Closed);
    }

    #[test]
    fn test_open_uses_header_geometry() {
        let dir = std::env::temp_dir().join("gimbal_test_replay_open");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("detections.jsonl");

        let header = DetectionLogHeader::new(FrameGeometry::new(640.0, 480.0));
        let frames = vec![RecordedFrame::detected(
            0,
            vec![BoundingBox::new(1.0, 2.0, 3.0, 4.0)],
        )];
        std::fs::write(&path, serialize_detection_log(&header, &frames).unwrap()).unwrap();

        let mut source = ReplaySource::open(&path, FrameGeometry::FULL_HD).unwrap();
        assert_eq!(source.geometry(), FrameGeometry::new(640.0, 480.0));
        assert_eq!(source.remaining(), 1);

        let FrameRead::Frame(frame) = source.read().unwrap() else {
            panic!("expected a frame");
        };
        assert_eq!(RecordedDetector.detect(&frame).unwrap().len(), 1);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_open_missing_log_is_a_setup_failure() {
        let path = std::env::temp_dir().join("gimbal_missing_detections.jsonl");
        let err = ReplaySource::open(&path, FrameGeometry::FULL_HD)
            .err()
            .unwrap();
        assert!(err.is_setup_failure());
    }
}
