//! Interactive servo test harness.
//!
//! Reads an axis selection and then normalized positions line by line,
//! moving the selected servo until `exit` or end of input.

use std::io::{BufRead, Write};
use std::time::Duration;

use gimbal_common::error::GimbalResult;
use gimbal_control_model::AxisId;

use crate::ActuatorDriver;

const AXIS_PROMPT: &str = "Input servo to test. (pan/tilt): ";
const VALUE_PROMPT: &str = "Input value to move servo ('exit' to stop): ";

/// Recoverable input problems; the harness prints them and asks again.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ManualInputError {
    #[error("Invalid selection '{0}'.")]
    UnknownAxis(String),

    #[error("Invalid value '{0}'.")]
    NotANumber(String),

    #[error("Invalid value {0}: must be between -1 and 1.")]
    OutOfRange(f64),

    #[error("Invalid input: not valid text.")]
    NotText,
}

/// One parsed value line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ManualCommand {
    Exit,
    Move(f64),
}

pub fn parse_axis(input: &str) -> Result<AxisId, ManualInputError> {
    input
        .parse()
        .map_err(|_| ManualInputError::UnknownAxis(input.trim().to_string()))
}

/// Parse a value line: `exit` or a number in `[-1, 1]`.
pub fn parse_value(input: &str) -> Result<ManualCommand, ManualInputError> {
    let input = input.trim();
    if input.eq_ignore_ascii_case("exit") {
        return Ok(ManualCommand::Exit);
    }
    let value: f64 = input
        .parse()
        .map_err(|_| ManualInputError::NotANumber(input.to_string()))?;
    if value.is_nan() {
        return Err(ManualInputError::NotANumber(input.to_string()));
    }
    if !(-1.0..=1.0).contains(&value) {
        return Err(ManualInputError::OutOfRange(value));
    }
    Ok(ManualCommand::Move(value))
}

/// What happened in a manual session.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ManualSession {
    pub axis: Option<AxisId>,
    /// Positions sent to the driver, in order.
    pub moves: Vec<f64>,
    pub rejected: usize,
}

pub struct ManualHarness<R, W> {
    input: R,
    output: W,
    settle: Duration,
}

impl<R: BufRead, W: Write> ManualHarness<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self {
            input,
            output,
            settle: Duration::from_secs(1),
        }
    }

    /// Pause after each move so the servo can reach its position.
    pub fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Prompt for a line. `None` at end of input; a line that is not UTF-8
    /// comes back as a recoverable error.
    fn prompt(&mut self, prompt: &str) -> GimbalResult<Option<Result<String, ManualInputError>>> {
        write!(self.output, "{prompt}")?;
        self.output.flush()?;
        let mut line = Vec::new();
        if self.input.read_until(b'\n', &mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(String::from_utf8(line).map_err(|_| ManualInputError::NotText)))
    }

    fn say(&mut self, message: impl std::fmt::Display) -> GimbalResult<()> {
        writeln!(self.output, "{message}")?;
        Ok(())
    }

    /// Ask until a valid axis is entered. `None` at end of input.
    pub fn select_axis(&mut self) -> GimbalResult<Option<AxisId>> {
        while let Some(line) = self.prompt(AXIS_PROMPT)? {
            match line.and_then(|line| parse_axis(&line)) {
                Ok(axis) => return Ok(Some(axis)),
                Err(e) => self.say(e)?,
            }
        }
        Ok(None)
    }

    /// Run a full session against `driver`.
    pub fn run<A: ActuatorDriver>(&mut self, driver: &mut A) -> GimbalResult<ManualSession> {
        let mut session = ManualSession::default();
        let Some(axis) = self.select_axis()? else {
            self.say("Exiting...")?;
            return Ok(session);
        };
        session.axis = Some(axis);
        tracing::debug!(axis = %axis, driver = %driver.name(), "Manual test started");

        while let Some(line) = self.prompt(VALUE_PROMPT)? {
            match line.and_then(|line| parse_value(&line)) {
                Ok(ManualCommand::Exit) => break,
                Ok(ManualCommand::Move(value)) => {
                    driver.set(axis, value)?;
                    session.moves.push(value);
                    if !self.settle.is_zero() {
                        std::thread::sleep(self.settle);
                    }
                }
                Err(e) => {
                    session.rejected += 1;
                    self.say(e)?;
                }
            }
        }

        self.say("Exiting...")?;
        Ok(session)
    }
}

/// Swing `axis` between its extremes `cycles` times, pausing `dwell` at
/// each end, then return it to center.
pub fn sweep<A: ActuatorDriver>(
    driver: &mut A,
    axis: AxisId,
    cycles: u32,
    dwell: Duration,
) -> GimbalResult<()> {
    for cycle in 0..cycles {
        for (label, value) in [("max", 1.0), ("min", -1.0)] {
            tracing::info!(axis = %axis, cycle, "{label}");
            driver.set(axis, value)?;
            std::thread::sleep(dwell);
        }
    }
    driver.set(axis, 0.0)
}
