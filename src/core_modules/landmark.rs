// THEORY:
// The `landmark` module defines the raw input vocabulary for the engine. The
// upstream pose model emits a flat array of normalized body points per video
// frame; everything downstream reasons about those points by anatomical name,
// never by magic index.
//
// Key architectural principles:
// 1.  **Dumb Data Container**: `Landmark` and `LandmarkFrame` hold data and know
//     nothing about posture. Analysis lives in the `evaluator` module.
// 2.  **Named Indices**: `PosePoint` maps each joint the engine cares about to
//     its fixed slot in the upstream model's output, so a renumbering mistake
//     is a compile-time impossibility rather than a silent off-by-one.
// 3.  **Validity by Construction**: a `LandmarkFrame` can only be built from a
//     complete landmark set, which makes every later `get` infallible.

use serde::{Deserialize, Serialize};

/// Number of body points the upstream pose model emits per detection.
pub const LANDMARK_COUNT: usize = 33;

/// A single body point in normalized image coordinates.
///
/// `x` and `y` are in `[0, 1]` relative to the frame. `z` is the model's
/// relative depth estimate; the geometry here is 2-D and ignores it, but it is
/// preserved so recorded traces round-trip losslessly.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: f64,
}

impl Landmark {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y, z: 0.0 }
    }
}

/// The joints the posture rules consume, mapped to their fixed slots in the
/// upstream model's 33-point output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PosePoint {
    LeftEar = 7,
    LeftShoulder = 11,
    LeftHip = 23,
    LeftKnee = 25,
    LeftAnkle = 27,
    LeftFootIndex = 31,
}

impl PosePoint {
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// A complete set of landmarks for one processed video frame.
///
/// Frames with no detection never become a `LandmarkFrame`; callers pass
/// `Option<&LandmarkFrame>` downstream instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandmarkFrame {
    landmarks: Vec<Landmark>,
}

impl LandmarkFrame {
    /// Builds a frame from the model's raw output. Returns `None` when the
    /// set is incomplete, which downstream treats the same as no detection.
    pub fn new(landmarks: Vec<Landmark>) -> Option<Self> {
        if landmarks.len() < LANDMARK_COUNT {
            return None;
        }
        Some(Self { landmarks })
    }

    pub fn get(&self, point: PosePoint) -> Landmark {
        self.landmarks[point.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_landmark_set_is_rejected() {
        let landmarks = vec![Landmark::default(); LANDMARK_COUNT - 1];
        assert!(LandmarkFrame::new(landmarks).is_none());
    }

    #[test]
    fn named_points_read_their_fixed_slots() {
        let mut landmarks = vec![Landmark::default(); LANDMARK_COUNT];
        landmarks[PosePoint::LeftKnee.index()] = Landmark::new(0.25, 0.75);
        let frame = LandmarkFrame::new(landmarks).unwrap();

        assert_eq!(frame.get(PosePoint::LeftKnee), Landmark::new(0.25, 0.75));
        assert_eq!(PosePoint::LeftEar.index(), 7);
        assert_eq!(PosePoint::LeftFootIndex.index(), 31);
    }

    #[test]
    fn z_defaults_when_absent_from_json() {
        let parsed: Landmark = serde_json::from_str(r#"{"x":0.5,"y":0.5}"#).unwrap();
        assert_eq!(parsed.z, 0.0);
    }
}
