//! Frame acquisition plus detection, reduced to one centroid per frame.

use gimbal_common::error::GimbalError;
use gimbal_control_model::{Centroid, FrameGeometry, SelectionPolicy, TrackingConfig};
use serde::{Deserialize, Serialize};

use crate::selection::{resolve_centroid, CentroidOrigin};
use crate::{Detector, FrameRead, FrameSource};

/// The centroid resolved for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Sequence number of the frame within this session (dropped frames
    /// consume a number too).
    pub frame: u64,
    pub centroid: Centroid,
    pub origin: CentroidOrigin,
}

/// Outcome of one perception attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Perceived {
    Observed(Observation),
    /// No usable frame this iteration (camera drop or detector failure).
    Skipped,
    /// The source has no more frames.
    Closed,
}

/// Frame counters kept by the perception side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerceptionStats {
    /// Frames requested from the source, including dropped ones.
    pub frames: u64,
    pub dropped_frames: u64,
    pub detection_errors: u64,
    /// Frames where nothing was detected and the frame center was used.
    pub fallback_frames: u64,
}

/// Owns a frame source and a detector and turns each frame into an
/// [`Observation`].
pub struct Perception<S, D> {
    source: S,
    detector: D,
    geometry: FrameGeometry,
    policy: SelectionPolicy,
    vertical_offset: f64,
    stats: PerceptionStats,
}

impl<S, D> Perception<S, D>
where
    S: FrameSource,
    D: Detector<S::Frame>,
{
    pub fn new(source: S, detector: D, config: &TrackingConfig) -> Self {
        let geometry = source.geometry();
        if geometry != config.geometry {
            tracing::info!(
                source = %source.name(),
                width = geometry.width,
                height = geometry.height,
                "Using frame geometry reported by the source"
            );
        }
        Self {
            source,
            detector,
            geometry,
            policy: config.selection,
            vertical_offset: config.vertical_offset_px,
            stats: PerceptionStats::default(),
        }
    }

    pub fn geometry(&self) -> FrameGeometry {
        self.geometry
    }

    pub fn stats(&self) -> PerceptionStats {
        self.stats
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Read one frame, detect, and resolve its centroid.
    ///
    /// Read and detection failures are counted and reported as
    /// [`Perceived::Skipped`]; they never end the session.
    pub fn observe(&mut self) -> Perceived {
        let frame = match self.source.read() {
            Ok(FrameRead::Frame(frame)) => frame,
            Ok(FrameRead::Closed) => return Perceived::Closed,
            Ok(FrameRead::Dropped) => {
                self.record_drop(None);
                return Perceived::Skipped;
            }
            Err(e) => {
                self.record_drop(Some(&e));
                return Perceived::Skipped;
            }
        };

        let index = self.stats.frames;
        self.stats.frames += 1;

        let boxes = match self.detector.detect(&frame) {
            Ok(boxes) => boxes,
            Err(e) => {
                self.stats.detection_errors += 1;
                tracing::warn!(
                    detector = %self.detector.name(),
                    frame = index,
                    error = %e,
                    "Detection failed, skipping frame"
                );
                return Perceived::Skipped;
            }
        };

        let (centroid, origin) =
            resolve_centroid(&boxes, self.policy, &self.geometry, self.vertical_offset);
        if origin == CentroidOrigin::Fallback {
            self.stats.fallback_frames += 1;
        }

        tracing::trace!(frame = index, x = centroid.x, y = centroid.y, ?origin, "Observed");

        Perceived::Observed(Observation {
            frame: index,
            centroid,
            origin,
        })
    }

    fn record_drop(&mut self, error: Option<&GimbalError>) {
        self.stats.frames += 1;
        self.stats.dropped_frames += 1;
        match error {
            Some(e) => tracing::warn!(
                source = %self.source.name(),
                dropped = self.stats.dropped_frames,
                error = %e,
                "Frame unreadable"
            ),
            None => tracing::warn!(
                source = %self.source.name(),
                dropped = self.stats.dropped_frames,
                "Frame dropped"
            ),
        }
    }
}
