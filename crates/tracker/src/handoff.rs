//! Detection on a worker, handed to the loop through a single slot.
//!
//! The worker owns the [`Perception`] and publishes each observation, with
//! its frame counters at that point, into a `tokio::sync::watch` channel,
//! overwriting whatever the loop has not consumed yet. The loop therefore
//! always sees the newest frame and never builds a backlog.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use gimbal_control_model::FrameGeometry;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::perception::{Observation, Perceived, Perception, PerceptionStats};
use crate::{Detector, FrameSource};

/// What the worker publishes per observed frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatestDetection {
    pub observation: Observation,
    /// Worker-side counters, including frames it skipped since the last
    /// publish.
    pub stats: PerceptionStats,
}

/// Latest-value slot the loop reads observations from.
pub type ObservationReceiver = watch::Receiver<Option<LatestDetection>>;

/// Handle onto a running detection worker.
pub struct DetectionWorker {
    pub receiver: ObservationReceiver,
    /// Geometry the worker's centroids are expressed in.
    pub geometry: FrameGeometry,
    /// Resolves to the worker's frame counters once it exits.
    pub handle: JoinHandle<PerceptionStats>,
    /// Setting this makes the worker exit after its current frame.
    pub stop: Arc<AtomicBool>,
}

/// Run `perception` on a blocking task until `stop` is set, the source
/// closes, or every receiver is gone. `pace` is slept between frames; pass
/// zero when the source paces itself.
pub fn spawn_detection_worker<S, D>(
    mut perception: Perception<S, D>,
    stop: Arc<AtomicBool>,
    pace: Duration,
) -> DetectionWorker
where
    S: FrameSource + 'static,
    D: Detector<S::Frame> + 'static,
{
    let geometry = perception.geometry();
    let (sender, receiver) = watch::channel(None);
    let worker_stop = Arc::clone(&stop);

    let handle = tokio::task::spawn_blocking(move || {
        let mut published = 0u64;
        while !worker_stop.load(Ordering::SeqCst) && !sender.is_closed() {
            match perception.observe() {
                Perceived::Observed(observation) => {
                    sender.send_replace(Some(LatestDetection {
                        observation,
                        stats: perception.stats(),
                    }));
                    published += 1;
                }
                Perceived::Skipped => {}
                Perceived::Closed => break,
            }
            if !pace.is_zero() {
                std::thread::sleep(pace);
            }
        }
        tracing::debug!(published, "Detection worker exiting");
        perception.stats()
    });

    DetectionWorker {
        receiver,
        geometry,
        handle,
        stop,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::{RecordedDetector, ReplaySource};
    use gimbal_control_model::{BoundingBox, FrameGeometry, RecordedFrame, TrackingConfig};

    fn perception(count: u64) -> Perception<ReplaySource, RecordedDetector> {
        let frames = (0..count)
            .map(|i| {
                if i % 5 == 2 {
                    RecordedFrame::dropped(i)
                } else {
                    RecordedFrame::detected(i, vec![BoundingBox::new(900.0, 400.0, 120.0, 280.0)])
                }
            })
            .collect();
        let source = ReplaySource::from_frames(FrameGeometry::FULL_HD, frames);
        Perception::new(source, RecordedDetector, &TrackingConfig::default())
    }

    #[tokio::test]
    async fn test_slot_holds_latest_observation() {
        let stop = Arc::new(AtomicBool::new(false));
        let DetectionWorker {
            receiver, handle, ..
        } = spawn_detection_worker(perception(25), stop, Duration::ZERO);

        let stats = handle.await.unwrap();
        assert_eq!(stats.frames, 25);

        let latest = (*receiver.borrow()).unwrap();
        assert_eq!(latest.observation.frame, 24);
        assert_eq!(latest.stats.frames, 25);
        assert_eq!(latest.stats.dropped_frames, 5);
    }

    #[tokio::test]
    async fn test_stop_flag_ends_worker() {
        let stop = Arc::new(AtomicBool::new(true));
        let worker = spawn_detection_worker(perception(25), Arc::clone(&stop), Duration::ZERO);

        let stats = worker.handle.await.unwrap();
        assert_eq!(stats.frames, 0);
        assert!(worker.receiver.borrow().is_none());
    }
}
