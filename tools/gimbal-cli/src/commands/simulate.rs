//! Closed-loop simulation against a virtual subject.

use gimbal_control_model::{AppConfig, AxisId};
use gimbal_tracker::sources::SubjectMotion;
use gimbal_tracker::{Perception, SimulatedRig, TrackingLoop};

use super::{print_report, stop_on_ctrl_c};

pub async fn run(
    config: AppConfig,
    pan: f64,
    tilt: f64,
    frames: u64,
    drift: f64,
    drop_every: Option<u64>,
    json: bool,
) -> anyhow::Result<()> {
    let mut rig = SimulatedRig::new(config.tracking.geometry)
        .with_subject(pan, tilt)
        .with_frame_limit(frames)
        .with_motion(SubjectMotion {
            pan_per_frame: drift,
            tilt_per_frame: 0.0,
        });
    if let Some(n) = drop_every {
        rig = rig.with_drop_every(n);
    }

    if !json {
        println!("Simulating {frames} frames");
        println!("  Subject: pan {pan:+.3}, tilt {tilt:+.3}, drift {drift:+.4}/frame");
        println!("  Soft corrections: {:?}", config.tracking.soft_direction);
        println!();
    }

    let mut perception = Perception::new(rig.camera(), rig.detector(), &config.tracking);
    let mut tracking = TrackingLoop::new(&config.tracking, rig.driver())?;
    stop_on_ctrl_c(tracking.stop_flag());

    let report = tracking.run(&mut perception).await?;

    let seen_at = rig.apparent_center();
    let acquired = AxisId::ALL
        .into_iter()
        .all(|axis| tracking.controller().assess(axis, seen_at).1.is_hold());
    tracking.shutdown()?;

    print_report(&report, json)?;
    if !json {
        println!(
            "Subject seen at ({:.1}, {:.1}): {}",
            seen_at.x,
            seen_at.y,
            if acquired { "acquired" } else { "not settled" }
        );
    }
    Ok(())
}
