//! Tracking, driver, and application configuration.
//!
//! Every struct has a `Default` matching the reference rig: a 1920x1080
//! camera, servos driven in the normalized range `[-1, 1]`, and a 20 ms
//! loop cadence.

use std::path::Path;

use gimbal_common::config::{config_file_path, read_json, read_json_or_default, write_json};
use gimbal_common::error::{GimbalError, GimbalResult};
use gimbal_common::LoggingConfig;
use serde::{Deserialize, Serialize};

use crate::geometry::{AxisId, FrameGeometry};

/// Transition band placement as fractions of the frame extent.
///
/// Measured from the near edge: `exiting` membership starts falling at
/// `outer` and `centered` reaches 1 at `inner`. The far side mirrors it
/// at `1 - inner` and `1 - outer`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandFractions {
    pub outer: f64,
    pub inner: f64,
}

impl BandFractions {
    /// 720..960 px on a 1920 px wide frame; the plateau is the center line.
    pub const HORIZONTAL: BandFractions = BandFractions {
        outer: 0.375,
        inner: 0.5,
    };

    /// 270..405 px on a 1080 px tall frame, plateau 405..675 px.
    pub const VERTICAL: BandFractions = BandFractions {
        outer: 0.25,
        inner: 0.375,
    };

    pub fn validate(&self, axis: AxisId) -> GimbalResult<()> {
        let ordered = 0.0 <= self.outer && self.outer <= self.inner && self.inner <= 0.5;
        if !ordered {
            return Err(GimbalError::config(format!(
                "{axis} band must satisfy 0 <= outer <= inner <= 0.5 (got outer={}, inner={})",
                self.outer, self.inner
            )));
        }
        Ok(())
    }
}

/// Correction magnitudes for one axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrengthProfile {
    /// Step applied when the subject is clearly off-center.
    pub hard: f64,
    /// Base step applied when the subject is drifting out of the dead zone.
    pub soft: f64,
    /// Scales `soft` for fine adjustments.
    pub fine_adjustment_multiplier: f64,
}

impl StrengthProfile {
    pub const PAN: StrengthProfile = StrengthProfile {
        hard: 0.04,
        soft: 0.02,
        fine_adjustment_multiplier: 0.5,
    };

    pub const TILT: StrengthProfile = StrengthProfile {
        hard: 0.03,
        soft: 0.015,
        fine_adjustment_multiplier: 0.5,
    };

    pub fn validate(&self, axis: AxisId) -> GimbalResult<()> {
        let values = [self.hard, self.soft, self.fine_adjustment_multiplier];
        if values.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(GimbalError::config(format!(
                "{axis} strengths must be finite and non-negative"
            )));
        }
        Ok(())
    }
}

/// Membership thresholds used by the rule engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RuleThresholds {
    /// `centered` at or above this holds the axis still.
    pub hold: f64,
    /// Boundary between soft and hard corrections.
    pub correct: f64,
}

impl Default for RuleThresholds {
    fn default() -> Self {
        Self {
            hold: 0.8,
            correct: 0.5,
        }
    }
}

impl RuleThresholds {
    pub fn validate(&self) -> GimbalResult<()> {
        let in_unit = |v: f64| (0.0..=1.0).contains(&v);
        if !in_unit(self.hold) || !in_unit(self.correct) || self.correct > self.hold {
            return Err(GimbalError::config(format!(
                "thresholds must satisfy 0 <= correct <= hold <= 1 (got correct={}, hold={})",
                self.correct, self.hold
            )));
        }
        Ok(())
    }
}

/// Which way a soft correction points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SoftDirection {
    /// Toward the edge whose membership dominates: a subject drifting
    /// left yields a negative soft correction.
    #[default]
    TowardDrift,
    /// Opposite the dominant edge, matching the hard corrections.
    TowardCenter,
}

/// Allowed normalized actuator positions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActuatorRange {
    pub min: f64,
    pub max: f64,
}

impl Default for ActuatorRange {
    fn default() -> Self {
        Self {
            min: -1.0,
            max: 1.0,
        }
    }
}

impl ActuatorRange {
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Maps logical correction direction onto the physical actuator sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    #[default]
    Normal,
    /// The mount moves opposite to the logical direction.
    Inverted,
}

impl Polarity {
    pub fn sign(self) -> f64 {
        match self {
            Polarity::Normal => 1.0,
            Polarity::Inverted => -1.0,
        }
    }
}

/// Everything the controller needs to drive one axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisConfig {
    pub band: BandFractions,
    pub profile: StrengthProfile,
    pub range: ActuatorRange,
    /// Position driven to before tracking starts.
    pub home: f64,
    pub polarity: Polarity,
}

impl AxisConfig {
    pub fn pan_default() -> Self {
        Self {
            band: BandFractions::HORIZONTAL,
            profile: StrengthProfile::PAN,
            range: ActuatorRange::default(),
            home: 0.0,
            polarity: Polarity::Normal,
        }
    }

    pub fn tilt_default() -> Self {
        Self {
            band: BandFractions::VERTICAL,
            profile: StrengthProfile::TILT,
            range: ActuatorRange::default(),
            home: 0.0,
            polarity: Polarity::Inverted,
        }
    }

    pub fn validate(&self, axis: AxisId) -> GimbalResult<()> {
        self.band.validate(axis)?;
        self.profile.validate(axis)?;
        if !(self.range.min < self.range.max) {
            return Err(GimbalError::config(format!(
                "{axis} range requires min < max (got [{}, {}])",
                self.range.min, self.range.max
            )));
        }
        if !self.range.contains(self.home) {
            return Err(GimbalError::config(format!(
                "{axis} home {} is outside [{}, {}]",
                self.home, self.range.min, self.range.max
            )));
        }
        Ok(())
    }
}

/// How one detection is chosen when the detector reports several.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SelectionPolicy {
    /// Largest box by area; ties go to the earliest box.
    #[default]
    LargestArea,
    /// The first box the detector reported.
    First,
}

/// Tunables for the tracking loop and controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    pub geometry: FrameGeometry,
    pub thresholds: RuleThresholds,
    pub soft_direction: SoftDirection,
    pub pan: AxisConfig,
    pub tilt: AxisConfig,
    pub selection: SelectionPolicy,
    /// Added to the detection center's y coordinate (pixels).
    pub vertical_offset_px: f64,
    /// Loop period in milliseconds.
    pub cadence_ms: u64,
    /// Time to hold the home position before tracking starts.
    pub settle_ms: u64,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            geometry: FrameGeometry::FULL_HD,
            thresholds: RuleThresholds::default(),
            soft_direction: SoftDirection::default(),
            pan: AxisConfig::pan_default(),
            tilt: AxisConfig::tilt_default(),
            selection: SelectionPolicy::default(),
            vertical_offset_px: 0.0,
            cadence_ms: 20,
            settle_ms: 1000,
        }
    }
}

impl TrackingConfig {
    pub fn axis(&self, axis: AxisId) -> &AxisConfig {
        match axis {
            AxisId::Pan => &self.pan,
            AxisId::Tilt => &self.tilt,
        }
    }

    pub fn validate(&self) -> GimbalResult<()> {
        if !self.geometry.is_valid() {
            return Err(GimbalError::config(format!(
                "frame geometry must be positive (got {}x{})",
                self.geometry.width, self.geometry.height
            )));
        }
        self.thresholds.validate()?;
        self.pan.validate(AxisId::Pan)?;
        self.tilt.validate(AxisId::Tilt)?;
        if !self.vertical_offset_px.is_finite() {
            return Err(GimbalError::config("vertical offset must be finite"));
        }
        if self.cadence_ms == 0 {
            return Err(GimbalError::config("cadence_ms must be at least 1"));
        }
        Ok(())
    }
}

/// Servo PWM settings for the sysfs driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// sysfs directory of the PWM chip, e.g. `/sys/class/pwm/pwmchip0`.
    pub pwm_chip: std::path::PathBuf,
    pub pan_channel: u32,
    pub tilt_channel: u32,
    pub period_ns: u64,
    /// Pulse width at normalized -1.
    pub min_pulse_ns: u64,
    /// Pulse width at normalized +1.
    pub max_pulse_ns: u64,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            pwm_chip: std::path::PathBuf::from("/sys/class/pwm/pwmchip0"),
            pan_channel: 0,
            tilt_channel: 1,
            period_ns: 20_000_000,
            min_pulse_ns: 1_000_000,
            max_pulse_ns: 2_000_000,
        }
    }
}

impl DriverConfig {
    pub fn channel(&self, axis: AxisId) -> u32 {
        match axis {
            AxisId::Pan => self.pan_channel,
            AxisId::Tilt => self.tilt_channel,
        }
    }

    pub fn validate(&self) -> GimbalResult<()> {
        if self.pan_channel == self.tilt_channel {
            return Err(GimbalError::config("pan and tilt must use different PWM channels"));
        }
        if self.min_pulse_ns >= self.max_pulse_ns || self.max_pulse_ns > self.period_ns {
            return Err(GimbalError::config(format!(
                "pulse widths must satisfy min < max <= period (got {} / {} / {})",
                self.min_pulse_ns, self.max_pulse_ns, self.period_ns
            )));
        }
        Ok(())
    }
}

/// Global application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub tracking: TrackingConfig,
    pub drivers: DriverConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        read_json_or_default(&config_file_path())
    }

    /// Load and validate config from an explicit path.
    pub fn load_from(path: &Path) -> GimbalResult<Self> {
        let config: AppConfig = read_json(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Save config to the standard location.
    pub fn save(&self) -> GimbalResult<()> {
        self.save_to(&config_file_path())
    }

    pub fn save_to(&self, path: &Path) -> GimbalResult<()> {
        write_json(path, self)
    }

    pub fn validate(&self) -> GimbalResult<()> {
        self.tracking.validate()?;
        self.drivers.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        AppConfig::default().validate().unwrap();
    }

    #[test]
    fn test_reference_breakpoints_in_pixels() {
        let config = TrackingConfig::default();
        assert_eq!(config.pan.band.outer * config.geometry.width, 720.0);
        assert_eq!(config.pan.band.inner * config.geometry.width, 960.0);
        assert_eq!(config.tilt.band.outer * config.geometry.height, 270.0);
        assert_eq!(config.tilt.band.inner * config.geometry.height, 405.0);
    }

    #[test]
    fn test_rejects_inverted_band() {
        let mut config = TrackingConfig::default();
        config.pan.band = BandFractions {
            outer: 0.4,
            inner: 0.3,
        };
        assert!(matches!(
            config.validate(),
            Err(GimbalError::Config { .. })
        ));
    }

    #[test]
    fn test_rejects_correct_above_hold() {
        let thresholds = RuleThresholds {
            hold: 0.5,
            correct: 0.6,
        };
        assert!(thresholds.validate().is_err());
    }

    #[test]
    fn test_rejects_home_outside_range() {
        let mut axis = AxisConfig::pan_default();
        axis.home = 1.5;
        assert!(axis.validate(AxisId::Pan).is_err());
    }

    #[test]
    fn test_rejects_empty_range() {
        let mut axis = AxisConfig::tilt_default();
        axis.range = ActuatorRange { min: 0.2, max: 0.2 };
        assert!(axis.validate(AxisId::Tilt).is_err());
    }

    #[test]
    fn test_rejects_negative_strength() {
        let mut axis = AxisConfig::pan_default();
        axis.profile.hard = -0.1;
        assert!(axis.validate(AxisId::Pan).is_err());
    }

    #[test]
    fn test_rejects_shared_pwm_channel() {
        let drivers = DriverConfig {
            tilt_channel: 0,
            ..DriverConfig::default()
        };
        assert!(drivers.validate().is_err());
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let raw = r#"{ "tracking": { "cadence_ms": 33, "selection": "first" } }"#;
        let config: AppConfig = serde_json::from_str(raw).unwrap();
        assert_eq!(config.tracking.cadence_ms, 33);
        assert_eq!(config.tracking.selection, SelectionPolicy::First);
        assert_eq!(config.tracking.pan, AxisConfig::pan_default());
        assert_eq!(config.drivers, DriverConfig::default());
    }

    #[test]
    fn test_save_and_load_from_path() {
        let dir = std::env::temp_dir().join("gimbal_test_app_config");
        let _ = std::fs::remove_dir_all(&dir);
        let path = dir.join("config.json");

        let mut config = AppConfig::default();
        config.tracking.vertical_offset_px = -40.0;
        config.save_to(&path).unwrap();

        let loaded = AppConfig::load_from(&path).unwrap();
        assert_eq!(loaded, config);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_load_from_rejects_invalid_values() {
        let dir = std::env::temp_dir().join("gimbal_test_app_config_invalid");
        let _ = std::fs::remove_dir_all(&dir);
        let path = dir.join("config.json");

        let mut config = AppConfig::default();
        config.tracking.cadence_ms = 0;
        config.save_to(&path).unwrap();

        assert!(AppConfig::load_from(&path).is_err());
        std::fs::remove_dir_all(&dir).ok();
    }
}
