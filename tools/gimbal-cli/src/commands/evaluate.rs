//! Show what the controller would do for a single centroid.

use gimbal_control_model::{AppConfig, AxisId, Centroid};
use gimbal_fuzzy_core::GimbalController;

pub fn run(config: &AppConfig, x: f64, y: f64) -> anyhow::Result<()> {
    let mut controller = GimbalController::new(&config.tracking)?;
    let geometry = controller.geometry();
    let decision = controller.update(Centroid::new(x, y));

    println!(
        "Centroid ({x:.1}, {y:.1}) in {}x{} frame",
        geometry.width, geometry.height
    );
    for axis in AxisId::ALL {
        let d = decision.get(axis);
        let m = &d.membership;
        println!();
        println!("{axis}:");
        println!("  Coordinate: {:.1}", d.coordinate);
        println!(
            "  Membership: exiting- {:.3}  centered {:.3}  exiting+ {:.3}",
            m.exiting_negative, m.centered, m.exiting_positive
        );
        println!("  Action: {}", d.action);
        println!("  Delta: {:+.4}", d.delta);
    }

    Ok(())
}
