//! The tracking loop: homing, then one control step per observed frame.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use gimbal_common::clock::{millis, CadenceBudget, SessionClock, Throttle};
use gimbal_common::error::{GimbalError, GimbalResult};
use gimbal_control_model::{AxisId, FrameGeometry, TrackingConfig};
use gimbal_fuzzy_core::{Action, FrameDecision, GimbalController, Tier};
use serde::{Deserialize, Serialize};
use tokio::time::MissedTickBehavior;

use crate::drivers::DriverGuard;
use crate::handoff::{DetectionWorker, LatestDetection};
use crate::perception::{Observation, Perceived, Perception, PerceptionStats};
use crate::{ActuatorDriver, Detector, FrameSource};

/// Interval between status lines while tracking.
const STATUS_PERIOD: Duration = Duration::from_secs(1);

/// Loop lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopState {
    /// Actuators at home, waiting for the settle delay.
    Homing,
    Tracking,
    Stopped,
}

/// Counters for the control side of the loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlStats {
    /// Frames a decision was made for.
    pub decisions: u64,
    /// Per-axis action counts (two per decision).
    pub holds: u64,
    pub soft_corrections: u64,
    pub hard_corrections: u64,
    /// Observations discarded because a newer frame was already applied.
    pub stale_observations: u64,
    /// Index of the most recent frame applied.
    pub last_frame: Option<u64>,
    /// Inline iterations (read, detect, act) slower than the cadence.
    pub cadence_overruns: u64,
}

impl ControlStats {
    fn record(&mut self, frame: u64, decision: &FrameDecision) {
        self.decisions += 1;
        self.last_frame = Some(frame);
        for action in [decision.pan.action, decision.tilt.action] {
            match action {
                Action::Hold => self.holds += 1,
                Action::Correct {
                    tier: Tier::Soft, ..
                } => self.soft_corrections += 1,
                Action::Correct {
                    tier: Tier::Hard, ..
                } => self.hard_corrections += 1,
            }
        }
    }
}

/// Summary of a finished tracking session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingReport {
    /// RFC 3339 wall-clock start.
    pub started_at: String,
    pub duration_secs: f64,
    pub perception: PerceptionStats,
    pub control: ControlStats,
    pub final_pan: f64,
    pub final_tilt: f64,
}

/// Drives the controller from observations and writes positions to the
/// actuator driver.
///
/// Perception runs inline in [`TrackingLoop::run`], so frame reads and
/// detection block the loop for their duration. Use
/// [`TrackingLoop::run_with_handoff`] with a detection worker to decouple
/// them.
pub struct TrackingLoop<A: ActuatorDriver> {
    controller: GimbalController,
    driver: DriverGuard<A>,
    config: TrackingConfig,
    stop: Arc<AtomicBool>,
    state: LoopState,
    stats: ControlStats,
    clock: SessionClock,
}

impl<A: ActuatorDriver> TrackingLoop<A> {
    /// Build the loop. The driver is released when the loop is dropped or
    /// shut down.
    pub fn new(config: &TrackingConfig, driver: A) -> GimbalResult<Self> {
        let controller = GimbalController::new(config)?;
        Ok(Self {
            controller,
            driver: DriverGuard::new(driver),
            config: config.clone(),
            stop: Arc::new(AtomicBool::new(false)),
            state: LoopState::Homing,
            stats: ControlStats::default(),
            clock: SessionClock::start(),
        })
    }

    /// Flag checked at every iteration boundary. Setting it ends the loop.
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    pub fn stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn controller(&self) -> &GimbalController {
        &self.controller
    }

    pub fn driver(&self) -> &A {
        &self.driver
    }

    pub fn stats(&self) -> ControlStats {
        self.stats
    }

    /// Drive both actuators home and wait for the settle delay.
    pub async fn home(&mut self) -> GimbalResult<()> {
        self.state = LoopState::Homing;
        let (pan, tilt) = self.controller.home();
        self.driver.set(AxisId::Pan, pan)?;
        self.driver.set(AxisId::Tilt, tilt)?;
        tracing::info!(
            pan,
            tilt,
            settle_ms = self.config.settle_ms,
            driver = %self.driver.name(),
            "Homing"
        );

        if self.config.settle_ms > 0 {
            tokio::time::sleep(millis(self.config.settle_ms)).await;
        }

        self.state = LoopState::Tracking;
        tracing::info!("Tracking");
        Ok(())
    }

    /// Run one control step for `observation` and write the new positions.
    ///
    /// Returns `None` without touching the actuators when a newer frame has
    /// already been applied.
    pub fn apply(&mut self, observation: &Observation) -> GimbalResult<Option<FrameDecision>> {
        if self
            .stats
            .last_frame
            .is_some_and(|last| observation.frame <= last)
        {
            self.stats.stale_observations += 1;
            tracing::debug!(frame = observation.frame, "Discarding stale observation");
            return Ok(None);
        }

        let decision = self.controller.update(observation.centroid);
        for axis in AxisId::ALL {
            let position = decision.get(axis).position;
            if self.driver.get(axis) != position {
                self.driver.set(axis, position)?;
            }
        }
        self.stats.record(observation.frame, &decision);

        tracing::debug!(
            frame = observation.frame,
            x = observation.centroid.x,
            y = observation.centroid.y,
            pan = %decision.pan.action,
            tilt = %decision.tilt.action,
            pan_position = decision.pan.position,
            tilt_position = decision.tilt.position,
            "Frame decision"
        );

        Ok(Some(decision))
    }

    /// Centroids must be in the coordinate space the controller's
    /// breakpoints were built for.
    fn ensure_geometry(&self, source: FrameGeometry) -> GimbalResult<()> {
        let expected = self.controller.geometry();
        if source != expected {
            return Err(GimbalError::config(format!(
                "Source geometry {}x{} does not match tracking geometry {}x{}",
                source.width, source.height, expected.width, expected.height
            )));
        }
        Ok(())
    }

    /// Home, then track frames from `perception` at the configured cadence
    /// until the stop flag is set or the source closes.
    ///
    /// Fails before homing if the source geometry differs from the
    /// configured one.
    pub async fn run<S, D>(
        &mut self,
        perception: &mut Perception<S, D>,
    ) -> GimbalResult<TrackingReport>
    where
        S: FrameSource,
        D: Detector<S::Frame>,
    {
        self.ensure_geometry(perception.geometry())?;
        if self.state != LoopState::Tracking {
            self.home().await?;
        }

        let cadence = millis(self.config.cadence_ms.max(1));
        let mut ticker = tokio::time::interval(cadence);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut budget = CadenceBudget::new(cadence);
        let mut status = Throttle::new(STATUS_PERIOD);

        loop {
            ticker.tick().await;
            if self.stop_requested() {
                tracing::info!("Stop requested");
                break;
            }

            let began = Instant::now();
            match perception.observe() {
                Perceived::Observed(observation) => {
                    self.apply(&observation)?;
                }
                Perceived::Skipped => {}
                Perceived::Closed => {
                    tracing::info!("Frame source closed");
                    break;
                }
            }

            let spent = began.elapsed();
            if budget.record(spent) {
                self.stats.cadence_overruns = budget.overruns();
                tracing::debug!(
                    spent_ms = spent.as_secs_f64() * 1000.0,
                    cadence_ms = self.config.cadence_ms,
                    "Iteration overran cadence"
                );
            }

            if status.ready(self.clock.elapsed()) {
                self.log_status(&perception.stats());
            }
        }

        Ok(self.finish(perception.stats()))
    }

    /// Home, then apply observations published by a detection worker.
    ///
    /// Only the latest unseen observation is ever applied. Ends when the
    /// stop flag is set or the worker finishes; the worker is stopped and
    /// joined before returning.
    pub async fn run_with_handoff(
        &mut self,
        worker: DetectionWorker,
    ) -> GimbalResult<TrackingReport> {
        let DetectionWorker {
            mut receiver,
            geometry,
            handle,
            stop: worker_stop,
        } = worker;

        let mut result = self.ensure_geometry(geometry);
        if result.is_ok() && self.state != LoopState::Tracking {
            result = self.home().await;
        }

        let poll = millis(self.config.cadence_ms.max(1));
        let mut status = Throttle::new(STATUS_PERIOD);
        let mut worker_stats = PerceptionStats::default();

        while result.is_ok() {
            if self.stop_requested() {
                tracing::info!("Stop requested");
                break;
            }

            match tokio::time::timeout(poll, receiver.changed()).await {
                Ok(Ok(())) => {
                    let latest = *receiver.borrow_and_update();
                    if let Some(LatestDetection { observation, stats }) = latest {
                        worker_stats = stats;
                        if let Err(e) = self.apply(&observation) {
                            result = Err(e);
                            break;
                        }
                    }
                }
                Ok(Err(_)) => {
                    tracing::info!("Detection worker finished");
                    break;
                }
                Err(_) => {}
            }

            if status.ready(self.clock.elapsed()) {
                self.log_status(&worker_stats);
            }
        }

        worker_stop.store(true, Ordering::SeqCst);
        drop(receiver);
        let joined = handle.await;

        if let Err(e) = result {
            if let Err(join) = joined {
                tracing::warn!(error = %join, "Detection worker failed");
            }
            return Err(e);
        }
        let perception = joined
            .map_err(|e| GimbalError::Other(anyhow::anyhow!("detection worker panicked: {e}")))?;
        Ok(self.finish(perception))
    }

    /// Release the driver and hand it back.
    pub fn shutdown(self) -> GimbalResult<A> {
        self.driver.release()
    }

    fn finish(&mut self, perception: PerceptionStats) -> TrackingReport {
        self.state = LoopState::Stopped;
        let report = TrackingReport {
            started_at: self.clock.started_at(),
            duration_secs: self.clock.elapsed_secs(),
            perception,
            control: self.stats,
            final_pan: self.controller.position(AxisId::Pan),
            final_tilt: self.controller.position(AxisId::Tilt),
        };
        tracing::info!(
            frames = report.perception.frames,
            dropped = report.perception.dropped_frames,
            decisions = report.control.decisions,
            holds = report.control.holds,
            soft = report.control.soft_corrections,
            hard = report.control.hard_corrections,
            overruns = report.control.cadence_overruns,
            duration_secs = report.duration_secs,
            "Tracking stopped"
        );
        report
    }

    fn log_status(&self, perception: &PerceptionStats) {
        tracing::info!(
            frames = perception.frames,
            decisions = self.stats.decisions,
            dropped = perception.dropped_frames,
            pan = self.controller.position(AxisId::Pan),
            tilt = self.controller.position(AxisId::Tilt),
            "Tracking status"
        );
    }
}
