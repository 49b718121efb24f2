// THEORY:
// The `evaluator` module is the analytical heart of the engine. It takes one
// `LandmarkFrame` and judges it against the rule set of the active `Mode`,
// producing a fresh, immutable `EvaluationResult`.
//
// Key architectural principles:
// 1.  **Stateless Judgement**: evaluation has no memory. Each frame is scored
//     from scratch; temporal concerns (throttling, history) live elsewhere.
// 2.  **Rule Dispatch by Mode**: each `Mode` owns a static list of `Rule`s.
//     Adding a new activity mode means adding a variant and its rule list,
//     not editing a branching evaluation function.
// 3.  **No Short-Circuit**: every rule of the active mode runs on every frame,
//     so a single violation never masks another.
// 4.  **Degeneracy Tolerance**: a rule whose geometry collapses (coincident
//     landmarks) is skipped for that frame. Bad input can lower the score, but
//     it can never panic the pipeline.

use crate::core_modules::geometry::angle_at;
use crate::core_modules::landmark::{Landmark, LandmarkFrame, PosePoint};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const MAX_SCORE: i32 = 100;

const KNEE_OVER_TOE_MAX_RATIO: f64 = 1.0;
const KNEE_OVER_TOE_PENALTY: i32 = 20;
const SQUAT_BACK_ANGLE_MAX_DEG: f64 = 40.0;
const SQUAT_BACK_ANGLE_PENALTY: i32 = 15;
const DESK_NECK_ANGLE_MAX_DEG: f64 = 40.0;
const DESK_NECK_ANGLE_PENALTY: i32 = 25;
const DESK_BACK_ANGLE_MAX_DEG: f64 = 10.0;
const DESK_BACK_ANGLE_PENALTY: i32 = 20;

/// The activity the user is being monitored for. Persists until changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Desk,
    Squat,
}

impl Mode {
    /// The posture rules checked for this mode, in evaluation order.
    pub fn rules(self) -> &'static [Rule] {
        match self {
            Mode::Squat => &[Rule::KneeOverToe, Rule::SquatBackAngle],
            Mode::Desk => &[Rule::DeskNeckAngle, Rule::DeskBackStraight],
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Desk => write!(f, "desk"),
            Mode::Squat => write!(f, "squat"),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown mode `{0}`, expected `desk` or `squat`")]
pub struct ParseModeError(String);

impl FromStr for Mode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "desk" => Ok(Mode::Desk),
            "squat" => Ok(Mode::Squat),
            other => Err(ParseModeError(other.to_string())),
        }
    }
}

/// A single posture check. Each variant knows which landmarks it reads and
/// what violating them costs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    KneeOverToe,
    SquatBackAngle,
    DeskNeckAngle,
    DeskBackStraight,
}

struct Violation {
    message: String,
    penalty: i32,
}

impl Rule {
    fn check(self, frame: &LandmarkFrame) -> Option<Violation> {
        match self {
            Rule::KneeOverToe => {
                let knee = frame.get(PosePoint::LeftKnee);
                let ankle = frame.get(PosePoint::LeftAnkle);
                let foot = frame.get(PosePoint::LeftFootIndex);
                // IEEE division semantics are intentional here: a foot landmark
                // level with the ankle yields an infinite ratio and still trips
                // the threshold, and a reversed foot flips the sign.
                let ratio = (knee.x - ankle.x) / (foot.x - ankle.x);
                (ratio > KNEE_OVER_TOE_MAX_RATIO).then(|| Violation {
                    message: "Knees are going over toes".to_string(),
                    penalty: KNEE_OVER_TOE_PENALTY,
                })
            }
            Rule::SquatBackAngle => {
                let angle = angle_at(
                    frame.get(PosePoint::LeftShoulder),
                    frame.get(PosePoint::LeftHip),
                    frame.get(PosePoint::LeftKnee),
                )
                .ok()?;
                (angle > SQUAT_BACK_ANGLE_MAX_DEG).then(|| Violation {
                    message: format!("Back angle too small ({}°)", angle.round()),
                    penalty: SQUAT_BACK_ANGLE_PENALTY,
                })
            }
            Rule::DeskNeckAngle => {
                let shoulder = frame.get(PosePoint::LeftShoulder);
                let overhead = Landmark::new(shoulder.x, 0.0);
                let angle = angle_at(frame.get(PosePoint::LeftEar), shoulder, overhead).ok()?;
                (angle > DESK_NECK_ANGLE_MAX_DEG).then(|| Violation {
                    message: format!("Neck bending too far ({}°)", angle.round()),
                    penalty: DESK_NECK_ANGLE_PENALTY,
                })
            }
            Rule::DeskBackStraight => {
                let hip = frame.get(PosePoint::LeftHip);
                let overhead = Landmark::new(hip.x, 0.0);
                let angle = angle_at(frame.get(PosePoint::LeftShoulder), hip, overhead).ok()?;
                (angle > DESK_BACK_ANGLE_MAX_DEG).then(|| Violation {
                    message: format!("Back not straight ({}°)", angle.round()),
                    penalty: DESK_BACK_ANGLE_PENALTY,
                })
            }
        }
    }
}

/// The verdict for a single frame. Produced fresh per frame, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub bad_posture: bool,
    pub messages: Vec<String>,
    pub score: u8,
}

impl EvaluationResult {
    /// The verdict for a frame with no detected person.
    pub fn neutral() -> Self {
        Self {
            bad_posture: false,
            messages: Vec::new(),
            score: MAX_SCORE as u8,
        }
    }
}

/// Scores a frame against the rules of `mode`. An absent frame is neutral:
/// no detection is not bad posture.
pub fn evaluate(frame: Option<&LandmarkFrame>, mode: Mode) -> EvaluationResult {
    match frame {
        Some(frame) => run_rules(frame, mode.rules()),
        None => EvaluationResult::neutral(),
    }
}

fn run_rules(frame: &LandmarkFrame, rules: &[Rule]) -> EvaluationResult {
    let mut messages = Vec::new();
    let mut penalty_total = 0;

    for rule in rules {
        if let Some(violation) = rule.check(frame) {
            messages.push(violation.message);
            penalty_total += violation.penalty;
        }
    }

    EvaluationResult {
        bad_posture: !messages.is_empty(),
        score: (MAX_SCORE - penalty_total).max(0) as u8,
        messages,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::landmark::LANDMARK_COUNT;

    fn frame_with(points: &[(PosePoint, Landmark)]) -> LandmarkFrame {
        let mut landmarks = vec![Landmark::default(); LANDMARK_COUNT];
        for &(point, landmark) in points {
            landmarks[point.index()] = landmark;
        }
        LandmarkFrame::new(landmarks).expect("complete landmark set")
    }

    /// Deep squat with knees past the toes and a folded-forward back.
    fn bad_squat_frame() -> LandmarkFrame {
        frame_with(&[
            (PosePoint::LeftShoulder, Landmark::new(0.8, 0.2)),
            (PosePoint::LeftHip, Landmark::new(0.5, 0.5)),
            (PosePoint::LeftKnee, Landmark::new(0.65, 0.7)),
            (PosePoint::LeftAnkle, Landmark::new(0.5, 0.9)),
            (PosePoint::LeftFootIndex, Landmark::new(0.6, 0.95)),
        ])
    }

    /// Head craned forward and torso leaning at a desk.
    fn bad_desk_frame() -> LandmarkFrame {
        frame_with(&[
            (PosePoint::LeftEar, Landmark::new(0.8, 0.3)),
            (PosePoint::LeftShoulder, Landmark::new(0.6, 0.5)),
            (PosePoint::LeftHip, Landmark::new(0.5, 0.9)),
        ])
    }

    #[test]
    fn absent_frame_is_neutral_in_both_modes() {
        for mode in [Mode::Desk, Mode::Squat] {
            let result = evaluate(None, mode);
            assert!(!result.bad_posture);
            assert!(result.messages.is_empty());
            assert_eq!(result.score, 100);
        }
    }

    #[test]
    fn squat_with_both_violations_scores_sixty_five() {
        let result = evaluate(Some(&bad_squat_frame()), Mode::Squat);

        assert!(result.bad_posture);
        assert_eq!(result.score, 65);
        assert_eq!(
            result.messages,
            vec![
                "Knees are going over toes".to_string(),
                "Back angle too small (98°)".to_string(),
            ]
        );
    }

    #[test]
    fn desk_with_both_violations_scores_fifty_five() {
        let result = evaluate(Some(&bad_desk_frame()), Mode::Desk);

        assert!(result.bad_posture);
        assert_eq!(result.score, 55);
        assert_eq!(
            result.messages,
            vec![
                "Neck bending too far (45°)".to_string(),
                "Back not straight (14°)".to_string(),
            ]
        );
    }

    #[test]
    fn modes_evaluate_different_rules_on_identical_landmarks() {
        let frame = frame_with(&[
            (PosePoint::LeftEar, Landmark::new(0.8, 0.3)),
            (PosePoint::LeftShoulder, Landmark::new(0.8, 0.2)),
            (PosePoint::LeftHip, Landmark::new(0.5, 0.5)),
            (PosePoint::LeftKnee, Landmark::new(0.65, 0.7)),
            (PosePoint::LeftAnkle, Landmark::new(0.5, 0.9)),
            (PosePoint::LeftFootIndex, Landmark::new(0.6, 0.95)),
        ]);

        let squat = evaluate(Some(&frame), Mode::Squat);
        let desk = evaluate(Some(&frame), Mode::Desk);

        assert!(squat.messages.iter().any(|m| m.contains("Knees")));
        assert!(!desk.messages.iter().any(|m| m.contains("Knees")));
        assert_ne!(squat.messages, desk.messages);
    }

    #[test]
    fn reversed_foot_makes_ratio_negative_and_passes() {
        // knee.x = 0.52, ankle.x = 0.50, foot.x = 0.48: the denominator flips
        // sign, the ratio lands at -1.0, and the rule does not fire.
        let frame = frame_with(&[
            (PosePoint::LeftShoulder, Landmark::new(0.6, 0.68)),
            (PosePoint::LeftHip, Landmark::new(0.5, 0.5)),
            (PosePoint::LeftKnee, Landmark::new(0.52, 0.7)),
            (PosePoint::LeftAnkle, Landmark::new(0.5, 0.9)),
            (PosePoint::LeftFootIndex, Landmark::new(0.48, 0.95)),
        ]);

        let result = evaluate(Some(&frame), Mode::Squat);
        assert!(!result.bad_posture);
        assert_eq!(result.score, 100);
    }

    #[test]
    fn degenerate_rule_geometry_is_skipped_not_fatal() {
        // Every landmark coincides at the origin: both squat rules collapse
        // (NaN ratio, zero-length rays) and the frame scores clean.
        let frame = frame_with(&[]);

        let result = evaluate(Some(&frame), Mode::Squat);
        assert!(!result.bad_posture);
        assert_eq!(result.score, 100);
    }

    #[test]
    fn score_clamps_at_zero() {
        let stacked = [
            Rule::DeskNeckAngle,
            Rule::DeskNeckAngle,
            Rule::DeskNeckAngle,
            Rule::DeskNeckAngle,
            Rule::DeskNeckAngle,
        ];
        let result = run_rules(&bad_desk_frame(), &stacked);

        assert!(result.bad_posture);
        assert_eq!(result.score, 0);
    }

    #[test]
    fn mode_parses_and_displays_round_trip() {
        assert_eq!("desk".parse::<Mode>().unwrap(), Mode::Desk);
        assert_eq!("squat".parse::<Mode>().unwrap(), Mode::Squat);
        assert_eq!(Mode::Squat.to_string(), "squat");
        assert!("yoga".parse::<Mode>().is_err());
    }
}
