pub mod config;
pub mod evaluate;
pub mod simulate;
pub mod track;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use gimbal_tracker::TrackingReport;

/// Set `stop` when Ctrl+C arrives.
fn stop_on_ctrl_c(stop: Arc<AtomicBool>) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Ctrl+C received, stopping");
            stop.store(true, Ordering::SeqCst);
        }
    });
}

fn print_report(report: &TrackingReport, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    println!("Session started: {}", report.started_at);
    println!("  Duration: {:.2}s", report.duration_secs);
    println!();

    let p = &report.perception;
    println!("Frames:");
    println!("  Total: {}", p.frames);
    println!("  Dropped: {}", p.dropped_frames);
    println!("  Detection errors: {}", p.detection_errors);
    println!("  Center fallback: {}", p.fallback_frames);
    println!();

    let c = &report.control;
    println!("Decisions: {}", c.decisions);
    println!("  Hold: {}", c.holds);
    println!("  Soft: {}", c.soft_corrections);
    println!("  Hard: {}", c.hard_corrections);
    if c.stale_observations > 0 {
        println!("  Stale (discarded): {}", c.stale_observations);
    }
    if c.cadence_overruns > 0 {
        println!("  Cadence overruns: {}", c.cadence_overruns);
    }
    println!();

    println!(
        "Final position: pan {:+.4}, tilt {:+.4}",
        report.final_pan, report.final_tilt
    );
    Ok(())
}
