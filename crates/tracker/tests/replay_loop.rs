use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use gimbal_common::error::{GimbalError, GimbalResult};
use gimbal_control_model::{AxisId, BoundingBox, FrameGeometry, RecordedFrame, TrackingConfig};
use gimbal_fuzzy_core::Action;
use gimbal_tracker::{
    spawn_detection_worker, ActuatorDriver, Detector, LoopState, MemoryDriver, Perceived,
    Perception, RecordedDetector, ReplaySource, TrackingLoop,
};

fn config() -> TrackingConfig {
    TrackingConfig {
        cadence_ms: 1,
        settle_ms: 0,
        ..TrackingConfig::default()
    }
}

fn subject_at(x: f64, y: f64) -> BoundingBox {
    BoundingBox::new(x - 50.0, y - 100.0, 100.0, 200.0)
}

fn replay(frames: Vec<RecordedFrame>) -> Perception<ReplaySource, RecordedDetector> {
    let source = ReplaySource::from_frames(FrameGeometry::FULL_HD, frames);
    Perception::new(source, RecordedDetector, &config())
}

#[tokio::test]
async fn replayed_log_drives_memory_driver() {
    let mut perception = replay(vec![
        RecordedFrame::detected(0, vec![subject_at(700.0, 540.0)]),
        RecordedFrame::dropped(1),
        RecordedFrame::detected(2, vec![]),
        RecordedFrame::detected(3, vec![subject_at(1300.0, 540.0)]),
    ]);
    let mut tracking = TrackingLoop::new(&config(), MemoryDriver::new()).unwrap();

    let report = tracking.run(&mut perception).await.unwrap();
    assert_eq!(tracking.state(), LoopState::Stopped);

    assert_eq!(report.perception.frames, 4);
    assert_eq!(report.perception.dropped_frames, 1);
    assert_eq!(report.perception.fallback_frames, 1);
    assert_eq!(report.control.decisions, 3);
    assert_eq!(report.control.hard_corrections, 2);
    assert_eq!(report.control.last_frame, Some(3));

    let driver = tracking.driver();
    assert_eq!(driver.history_for(AxisId::Pan), vec![0.0, 0.04, 0.0]);
    assert_eq!(driver.history_for(AxisId::Tilt), vec![0.0]);
    assert_eq!(report.final_pan, 0.0);

    let driver = tracking.shutdown().unwrap();
    assert!(driver.is_released());
}

#[tokio::test]
async fn stop_flag_ends_the_loop() {
    let frames = (0..10_000)
        .map(|i| RecordedFrame::detected(i, vec![subject_at(960.0, 540.0)]))
        .collect();
    let mut perception = replay(frames);
    let mut tracking = TrackingLoop::new(&config(), MemoryDriver::new()).unwrap();
    tracking.stop();

    let report = tracking.run(&mut perception).await.unwrap();
    assert_eq!(report.control.decisions, 0);
    assert_eq!(perception.source().remaining(), 10_000);
}

#[tokio::test]
async fn handoff_never_applies_a_stale_frame() {
    let frames = (0..500)
        .map(|i| RecordedFrame::detected(i, vec![subject_at(100.0 + i as f64, 540.0)]))
        .collect();
    let perception = replay(frames);
    let mut tracking = TrackingLoop::new(&config(), MemoryDriver::new()).unwrap();
    let worker = spawn_detection_worker(perception, tracking.stop_flag(), Duration::ZERO);

    let report = tracking.run_with_handoff(worker).await.unwrap();

    assert_eq!(report.perception.frames, 500);
    assert_eq!(report.control.stale_observations, 0);
    assert_eq!(report.control.last_frame, Some(499));
    assert!(report.control.decisions >= 1);
    assert!(report.control.decisions <= 500);
}

#[tokio::test]
async fn small_log_geometry_drives_the_breakpoints() {
    let vga = FrameGeometry::new(640.0, 480.0);
    let source = ReplaySource::from_frames(
        vga,
        vec![
            RecordedFrame::detected(0, vec![]),
            RecordedFrame::detected(1, vec![subject_at(40.0, 240.0)]),
        ],
    );
    let mut perception = Perception::new(source, RecordedDetector, &config());

    let mut tracking_config = config();
    tracking_config.geometry = perception.geometry();
    let mut tracking = TrackingLoop::new(&tracking_config, MemoryDriver::new()).unwrap();

    let Perceived::Observed(fallback) = perception.observe() else {
        panic!("expected an observation");
    };
    assert_eq!((fallback.centroid.x, fallback.centroid.y), (320.0, 240.0));
    let decision = tracking.apply(&fallback).unwrap().unwrap();
    assert_eq!(decision.pan.action, Action::Hold);
    assert_eq!(decision.tilt.action, Action::Hold);

    let report = tracking.run(&mut perception).await.unwrap();
    assert_eq!(report.control.decisions, 2);
    assert_eq!(report.control.hard_corrections, 1);
    assert_eq!(report.final_pan, 0.04);
}

#[tokio::test]
async fn mismatched_source_geometry_is_rejected() {
    let source = ReplaySource::from_frames(
        FrameGeometry::new(640.0, 480.0),
        vec![RecordedFrame::detected(0, vec![])],
    );
    let mut perception = Perception::new(source, RecordedDetector, &config());
    let mut tracking = TrackingLoop::new(&config(), MemoryDriver::new()).unwrap();

    let err = tracking.run(&mut perception).await.unwrap_err();
    assert!(matches!(err, GimbalError::Config { .. }));
    assert!(tracking.driver().history().is_empty());
    assert_eq!(perception.source().remaining(), 1);
}

#[tokio::test]
async fn handoff_rejects_mismatched_geometry() {
    let source = ReplaySource::from_frames(
        FrameGeometry::new(640.0, 480.0),
        vec![RecordedFrame::detected(0, vec![])],
    );
    let perception = Perception::new(source, RecordedDetector, &config());
    let mut tracking = TrackingLoop::new(&config(), MemoryDriver::new()).unwrap();
    let worker = spawn_detection_worker(perception, tracking.stop_flag(), Duration::ZERO);

    let err = tracking.run_with_handoff(worker).await.unwrap_err();
    assert!(matches!(err, GimbalError::Config { .. }));
    assert!(tracking.driver().history().is_empty());
}

/// Driver that fails once `fails_after` commands have succeeded and
/// records release.
struct FlakyDriver {
    writes: usize,
    fails_after: usize,
    released: Arc<AtomicBool>,
}

impl FlakyDriver {
    fn new(fails_after: usize, released: &Arc<AtomicBool>) -> Self {
        Self {
            writes: 0,
            fails_after,
            released: Arc::clone(released),
        }
    }
}

impl ActuatorDriver for FlakyDriver {
    fn get(&self, _axis: AxisId) -> f64 {
        f64::NAN
    }

    fn set(&mut self, _axis: AxisId, _value: f64) -> GimbalResult<()> {
        self.writes += 1;
        if self.writes > self.fails_after {
            return Err(GimbalError::actuator("servo unplugged"));
        }
        Ok(())
    }

    fn release(&mut self) -> GimbalResult<()> {
        self.released.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn name(&self) -> &str {
        "flaky"
    }
}

#[tokio::test]
async fn driver_is_released_when_the_loop_fails() {
    let released = Arc::new(AtomicBool::new(false));
    let driver = FlakyDriver::new(1, &released);
    let mut perception = replay(vec![RecordedFrame::detected(0, vec![])]);

    {
        let mut tracking = TrackingLoop::new(&config(), driver).unwrap();
        let err = tracking.run(&mut perception).await.unwrap_err();
        assert!(matches!(err, GimbalError::Actuator { .. }));
        assert!(!released.load(Ordering::SeqCst));
    }

    assert!(released.load(Ordering::SeqCst));
}

/// Detector that crashes on the second frame it sees.
struct CrashingDetector;

impl Detector<RecordedFrame> for CrashingDetector {
    fn detect(&mut self, frame: &RecordedFrame) -> GimbalResult<Vec<BoundingBox>> {
        if frame.frame > 0 {
            panic!("detector crashed");
        }
        Ok(frame.boxes.clone())
    }

    fn name(&self) -> &str {
        "crashing"
    }
}

#[tokio::test]
async fn handoff_reports_the_actuator_error_over_a_crashed_worker() {
    let released = Arc::new(AtomicBool::new(false));
    let source = ReplaySource::from_frames(
        FrameGeometry::FULL_HD,
        vec![
            RecordedFrame::detected(0, vec![subject_at(100.0, 540.0)]),
            RecordedFrame::detected(1, vec![subject_at(100.0, 540.0)]),
        ],
    );
    let perception = Perception::new(source, CrashingDetector, &config());
    let mut tracking = TrackingLoop::new(&config(), FlakyDriver::new(2, &released)).unwrap();
    let worker = spawn_detection_worker(perception, tracking.stop_flag(), Duration::ZERO);

    let err = tracking.run_with_handoff(worker).await.unwrap_err();
    assert!(matches!(err, GimbalError::Actuator { .. }));

    drop(tracking);
    assert!(released.load(Ordering::SeqCst));
}
