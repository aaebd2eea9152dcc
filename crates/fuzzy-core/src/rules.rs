//! Rule firing: membership vector to a crisp action.
//!
//! Rules are evaluated in precedence order and the first match wins:
//!
//! 1. `centered >= hold` → hold still (dead zone).
//! 2. `centered >= correct` → soft correction toward whichever edge
//!    membership dominates.
//! 3. `exiting_negative > correct` → hard correction, positive.
//! 4. otherwise → hard correction, negative.
//!
//! The soft rule is inclusive at `correct`, so a coordinate halfway through
//! a transition band (`centered == exiting == 0.5`) resolves to a soft
//! correction rather than falling through to the hard default.
//!
//! By default a soft correction points toward the dominant edge. With
//! [`SoftDirection::TowardCenter`] it points the same way a hard correction
//! would, which lets a closed loop settle inside the dead zone.

use gimbal_control_model::{RuleThresholds, SoftDirection};
use serde::{Deserialize, Serialize};

use crate::membership::MembershipVector;

/// Logical correction direction along an axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Negative,
    Positive,
}

impl Direction {
    pub fn opposite(self) -> Self {
        match self {
            Direction::Negative => Direction::Positive,
            Direction::Positive => Direction::Negative,
        }
    }

    pub fn sign(self) -> f64 {
        match self {
            Direction::Negative => -1.0,
            Direction::Positive => 1.0,
        }
    }
}

/// Correction magnitude class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Hard,
    Soft,
}

/// What an axis should do this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    Hold,
    Correct { direction: Direction, tier: Tier },
}

impl Action {
    pub fn soft(direction: Direction) -> Self {
        Self::Correct {
            direction,
            tier: Tier::Soft,
        }
    }

    pub fn hard(direction: Direction) -> Self {
        Self::Correct {
            direction,
            tier: Tier::Hard,
        }
    }

    pub fn is_hold(&self) -> bool {
        matches!(self, Action::Hold)
    }

    pub fn direction(&self) -> Option<Direction> {
        match self {
            Action::Hold => None,
            Action::Correct { direction, .. } => Some(*direction),
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Hold => f.write_str("hold"),
            Action::Correct { direction, tier } => {
                let tier = match tier {
                    Tier::Hard => "hard",
                    Tier::Soft => "soft",
                };
                let direction = match direction {
                    Direction::Negative => "-",
                    Direction::Positive => "+",
                };
                write!(f, "{tier} {direction}")
            }
        }
    }
}

/// Applies the rule table with a fixed set of thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RuleEngine {
    thresholds: RuleThresholds,
    soft_direction: SoftDirection,
}

impl RuleEngine {
    pub fn new(thresholds: RuleThresholds) -> Self {
        Self {
            thresholds,
            soft_direction: SoftDirection::default(),
        }
    }

    pub fn with_soft_direction(mut self, soft_direction: SoftDirection) -> Self {
        self.soft_direction = soft_direction;
        self
    }

    pub fn thresholds(&self) -> RuleThresholds {
        self.thresholds
    }

    pub fn decide(&self, membership: &MembershipVector) -> Action {
        decide_with(membership, &self.thresholds, self.soft_direction)
    }
}

/// Pick an action for one axis.
pub fn decide(membership: &MembershipVector, thresholds: &RuleThresholds) -> Action {
    decide_with(membership, thresholds, SoftDirection::TowardDrift)
}

/// Pick an action for one axis with an explicit soft correction direction.
pub fn decide_with(
    membership: &MembershipVector,
    thresholds: &RuleThresholds,
    soft_direction: SoftDirection,
) -> Action {
    if membership.centered >= thresholds.hold {
        Action::Hold
    } else if membership.centered >= thresholds.correct {
        let drift = if membership.exiting_negative > membership.exiting_positive {
            Direction::Negative
        } else {
            Direction::Positive
        };
        match soft_direction {
            SoftDirection::TowardDrift => Action::soft(drift),
            SoftDirection::TowardCenter => Action::soft(drift.opposite()),
        }
    } else if membership.exiting_negative > thresholds.correct {
        Action::hard(Direction::Positive)
    } else {
        Action::hard(Direction::Negative)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decide_default(n: f64, c: f64, p: f64) -> Action {
        RuleEngine::default().decide(&MembershipVector::new(n, c, p))
    }

    #[test]
    fn test_hold_at_and_above_threshold() {
        assert_eq!(decide_default(0.0, 1.0, 0.0), Action::Hold);
        assert_eq!(decide_default(0.2, 0.8, 0.0), Action::Hold);
    }

    #[test]
    fn test_soft_follows_dominant_edge() {
        assert_eq!(
            decide_default(0.3, 0.7, 0.0),
            Action::soft(Direction::Negative)
        );
        assert_eq!(
            decide_default(0.0, 0.7, 0.3),
            Action::soft(Direction::Positive)
        );
    }

    #[test]
    fn test_soft_is_inclusive_at_correct_threshold() {
        assert_eq!(
            decide_default(0.5, 0.5, 0.0),
            Action::soft(Direction::Negative)
        );
    }

    #[test]
    fn test_hard_positive_when_exiting_negative() {
        assert_eq!(
            decide_default(1.0, 0.0, 0.0),
            Action::hard(Direction::Positive)
        );
        assert_eq!(
            decide_default(0.6, 0.4, 0.0),
            Action::hard(Direction::Positive)
        );
    }

    #[test]
    fn test_hard_negative_is_the_default() {
        assert_eq!(
            decide_default(0.0, 0.0, 1.0),
            Action::hard(Direction::Negative)
        );
        assert_eq!(
            decide_default(0.0, 0.4, 0.6),
            Action::hard(Direction::Negative)
        );
    }

    #[test]
    fn test_custom_thresholds() {
        let engine = RuleEngine::new(RuleThresholds {
            hold: 0.95,
            correct: 0.3,
        });
        assert_eq!(
            engine.decide(&MembershipVector::new(0.1, 0.9, 0.0)),
            Action::soft(Direction::Negative)
        );
        assert_eq!(
            engine.decide(&MembershipVector::new(0.65, 0.35, 0.0)),
            Action::soft(Direction::Negative)
        );
    }

    #[test]
    fn test_toward_center_flips_only_soft_corrections() {
        let engine = RuleEngine::default().with_soft_direction(SoftDirection::TowardCenter);
        assert_eq!(
            engine.decide(&MembershipVector::new(0.3, 0.7, 0.0)),
            Action::soft(Direction::Positive)
        );
        assert_eq!(
            engine.decide(&MembershipVector::new(1.0, 0.0, 0.0)),
            Action::hard(Direction::Positive)
        );
        assert_eq!(
            engine.decide(&MembershipVector::new(0.0, 0.9, 0.1)),
            Action::Hold
        );
    }

    #[test]
    fn test_action_display() {
        assert_eq!(Action::Hold.to_string(), "hold");
        assert_eq!(Action::hard(Direction::Positive).to_string(), "hard +");
        assert_eq!(Action::soft(Direction::Negative).to_string(), "soft -");
    }

    #[test]
    fn test_action_serializes_tagged() {
        let json = serde_json::to_string(&Action::soft(Direction::Positive)).unwrap();
        assert_eq!(
            json,
            r#"{"action":"correct","direction":"positive","tier":"soft"}"#
        );
    }
}
