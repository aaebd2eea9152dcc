//! Replay a detection log through the tracking loop.

use std::path::PathBuf;

use gimbal_common::clock::millis;
use gimbal_control_model::AppConfig;
use gimbal_tracker::{
    spawn_detection_worker, ActuatorDriver, MemoryDriver, Perception, RecordedDetector,
    ReplaySource, SysfsPwmDriver, TrackingLoop, TrackingReport,
};

use super::{print_report, stop_on_ctrl_c};

pub async fn run(
    config: AppConfig,
    log: PathBuf,
    pwm: bool,
    worker: bool,
    json: bool,
) -> anyhow::Result<()> {
    let source = ReplaySource::open(&log, config.tracking.geometry)
        .map_err(|e| anyhow::anyhow!("Failed to open detection log: {e}"))?;

    if !json {
        println!("Tracking from: {}", log.display());
        println!("  Frames: {}", source.remaining());
        println!("  Driver: {}", if pwm { "sysfs-pwm" } else { "memory" });
        println!("  Worker: {worker}");
        println!();
        println!("Press Ctrl+C to stop...");
        println!();
    }

    let perception = Perception::new(source, RecordedDetector, &config.tracking);

    let report = if pwm {
        let driver = SysfsPwmDriver::open(&config.drivers)
            .map_err(|e| anyhow::anyhow!("Failed to open servos: {e}"))?;
        track(&config, perception, driver, worker).await?
    } else {
        track(&config, perception, MemoryDriver::new(), worker).await?
    };

    print_report(&report, json)
}

async fn track<A: ActuatorDriver>(
    config: &AppConfig,
    mut perception: Perception<ReplaySource, RecordedDetector>,
    driver: A,
    worker: bool,
) -> anyhow::Result<TrackingReport> {
    // Replay logs carry their own geometry; breakpoints follow it.
    let mut tracking_config = config.tracking.clone();
    tracking_config.geometry = perception.geometry();

    let mut tracking = TrackingLoop::new(&tracking_config, driver)?;
    stop_on_ctrl_c(tracking.stop_flag());

    let report = if worker {
        let pace = millis(config.tracking.cadence_ms);
        let worker = spawn_detection_worker(perception, tracking.stop_flag(), pace);
        tracking.run_with_handoff(worker).await?
    } else {
        tracking.run(&mut perception).await?
    };

    tracking.shutdown()?;
    Ok(report)
}
