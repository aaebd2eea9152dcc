//! Hobby servo driver on top of the Linux PWM sysfs interface.
//!
//! Each axis is one PWM channel of a chip under `/sys/class/pwm`. The
//! normalized range `[-1, 1]` maps linearly onto the configured pulse
//! widths, typically 1 ms to 2 ms within a 20 ms period.

use std::fmt::Display;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use gimbal_common::error::{GimbalError, GimbalResult};
use gimbal_control_model::{AxisId, DriverConfig};

use crate::ActuatorDriver;

/// Pulse width for a normalized position. Out-of-range input is clamped.
pub fn pulse_width_ns(value: f64, min_pulse_ns: u64, max_pulse_ns: u64) -> u64 {
    let value = if value.is_nan() { 0.0 } else { value.clamp(-1.0, 1.0) };
    let span = max_pulse_ns.saturating_sub(min_pulse_ns) as f64;
    min_pulse_ns + ((value + 1.0) / 2.0 * span).round() as u64
}

#[derive(Debug)]
struct PwmChannel {
    axis: AxisId,
    channel: u32,
    dir: PathBuf,
    exported_here: bool,
    position: f64,
}

/// Servo driver writing duty cycles to sysfs.
#[derive(Debug)]
pub struct SysfsPwmDriver {
    chip: PathBuf,
    pan: PwmChannel,
    tilt: PwmChannel,
    min_pulse_ns: u64,
    max_pulse_ns: u64,
    released: bool,
}

impl SysfsPwmDriver {
    /// Export and enable both channels, centered.
    pub fn open(config: &DriverConfig) -> GimbalResult<Self> {
        config.validate()?;
        let chip = config.pwm_chip.clone();
        if !chip.is_dir() {
            return Err(GimbalError::device(format!(
                "PWM chip not found at {}",
                chip.display()
            )));
        }

        let pan = open_channel(&chip, AxisId::Pan, config)?;
        let tilt = match open_channel(&chip, AxisId::Tilt, config) {
            Ok(tilt) => tilt,
            Err(e) => {
                if let Err(cleanup) = close_channel(&chip, &pan) {
                    tracing::warn!(error = %cleanup, "Failed to disable pan channel after open error");
                }
                return Err(e);
            }
        };

        tracing::info!(
            chip = %chip.display(),
            pan_channel = pan.channel,
            tilt_channel = tilt.channel,
            period_ns = config.period_ns,
            "PWM servos enabled"
        );

        Ok(Self {
            chip,
            pan,
            tilt,
            min_pulse_ns: config.min_pulse_ns,
            max_pulse_ns: config.max_pulse_ns,
            released: false,
        })
    }

    fn channel(&self, axis: AxisId) -> &PwmChannel {
        match axis {
            AxisId::Pan => &self.pan,
            AxisId::Tilt => &self.tilt,
        }
    }

    fn channel_mut(&mut self, axis: AxisId) -> &mut PwmChannel {
        match axis {
            AxisId::Pan => &mut self.pan,
            AxisId::Tilt => &mut self.tilt,
        }
    }
}

fn open_channel(chip: &Path, axis: AxisId, config: &DriverConfig) -> GimbalResult<PwmChannel> {
    let channel = config.channel(axis);
    let dir = chip.join(format!("pwm{channel}"));
    let mut exported_here = false;

    if !dir.is_dir() {
        setup_attr(&chip.join("export"), channel)?;
        if !dir.is_dir() {
            return Err(GimbalError::device(format!(
                "PWM channel {channel} did not appear under {} after export",
                chip.display()
            )));
        }
        exported_here = true;
    }

    let center = pulse_width_ns(0.0, config.min_pulse_ns, config.max_pulse_ns);
    setup_attr(&dir.join("period"), config.period_ns)?;
    setup_attr(&dir.join("duty_cycle"), center)?;
    setup_attr(&dir.join("enable"), 1)?;

    tracing::debug!(axis = %axis, channel, exported_here, "PWM channel ready");

    Ok(PwmChannel {
        axis,
        channel,
        dir,
        exported_here,
        position: 0.0,
    })
}

/// Disable a channel and unexport it if this driver exported it.
fn close_channel(chip: &Path, channel: &PwmChannel) -> GimbalResult<()> {
    command_attr(&channel.dir.join("enable"), 0)?;
    if channel.exported_here {
        command_attr(&chip.join("unexport"), channel.channel)?;
    }
    Ok(())
}

fn write_attr(path: &Path, value: impl Display) -> io::Result<()> {
    fs::write(path, value.to_string())
}

/// Write during open. Failures mean the servos never came up.
fn setup_attr(path: &Path, value: impl Display) -> GimbalResult<()> {
    write_attr(path, value).map_err(|e| {
        GimbalError::device(format!("Failed to configure {}: {e}", path.display()))
    })
}

fn command_attr(path: &Path, value: impl Display) -> GimbalResult<()> {
    write_attr(path, value).map_err(|e| {
        GimbalError::actuator(format!("Failed to write {}: {e}", path.display()))
    })
}

impl ActuatorDriver for SysfsPwmDriver {
    fn get(&self, axis: AxisId) -> f64 {
        self.channel(axis).position
    }

    fn set(&mut self, axis: AxisId, value: f64) -> GimbalResult<()> {
        if self.released {
            return Err(GimbalError::actuator(format!("{axis} command after release")));
        }
        let duty = pulse_width_ns(value, self.min_pulse_ns, self.max_pulse_ns);
        let channel = self.channel_mut(axis);
        command_attr(&channel.dir.join("duty_cycle"), duty)?;
        channel.position = value;
        Ok(())
    }

    fn release(&mut self) -> GimbalResult<()> {
        if self.released {
            return Ok(());
        }
        self.released = true;

        let mut first_error = None;
        for channel in [&self.pan, &self.tilt] {
            if let Err(e) = close_channel(&self.chip, channel) {
                tracing::warn!(axis = %channel.axis, error = %e, "PWM release failed");
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn name(&self) -> &str {
        "sysfs-pwm"
    }
}
