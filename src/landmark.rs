//! Hand pose data model: 21 named 3D landmarks per detected hand.

use nalgebra::{Point2, Rotation2, Vector2};

/// Number of landmarks predicted per hand.
pub const LANDMARK_COUNT: usize = 21;

/// One landmark position, `[x, y, z]` in normalized frame coordinates.
pub type Position = [f32; 3];

/// The full ordered set of 21 landmarks for one detected hand.
#[derive(Debug, Clone, PartialEq)]
pub struct HandPose {
    positions: [Position; LANDMARK_COUNT],
    presence: f32,
    raw_handedness: f32,
}

impl Default for HandPose {
    fn default() -> Self {
        Self {
            positions: [[0.0; 3]; LANDMARK_COUNT],
            presence: 0.0,
            raw_handedness: 0.0,
        }
    }
}

impl HandPose {
    pub fn new(positions: [Position; LANDMARK_COUNT], presence: f32, raw_handedness: f32) -> Self {
        Self {
            positions,
            presence,
            raw_handedness,
        }
    }

    /// Returns a landmark's position in normalized frame coordinates.
    #[inline]
    pub fn position(&self, index: LandmarkIdx) -> Position {
        self.positions[index as usize]
    }

    pub fn positions(&self) -> &[Position; LANDMARK_COUNT] {
        &self.positions
    }

    pub fn positions_mut(&mut self) -> &mut [Position; LANDMARK_COUNT] {
        &mut self.positions
    }

    /// Confidence that a hand is actually present in the processed view.
    #[inline]
    pub fn presence(&self) -> f32 {
        self.presence
    }

    /// Returns the estimated handedness of the hand.
    ///
    /// Assumes the camera image was passed in unmirrored; only meaningful
    /// when `presence` is above the detection threshold.
    pub fn handedness(&self) -> Handedness {
        if self.raw_handedness > 0.5 {
            Handedness::Right
        } else {
            Handedness::Left
        }
    }

    /// Computes the center of the palm by averaging the palm landmarks.
    pub fn palm_center(&self) -> Position {
        let mut center = [0.0; 3];
        for lm in PALM_LANDMARKS {
            let pos = self.position(*lm);
            for (acc, c) in center.iter_mut().zip(pos) {
                *acc += c / PALM_LANDMARKS.len() as f32;
            }
        }
        center
    }

    /// Computes the clockwise rotation of the hand compared to an upright
    /// position. A rotation of 0° means the fingers point upwards.
    pub fn rotation_radians(&self) -> f32 {
        let p = self.position(LandmarkIdx::MiddleFingerMcp);
        let finger = Point2::new(p[0], p[1]);
        let p = self.position(LandmarkIdx::Wrist);
        let wrist = Point2::new(p[0], p[1]);

        let rel = wrist - finger;
        Rotation2::rotation_between(&Vector2::y(), &rel).angle()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handedness {
    Left,
    Right,
}

/// Names for the hand pose landmarks, in network output order.
///
/// # Terminology
///
/// - **CMC**: Carpometacarpal joint, the lowest joint of the thumb.
/// - **MCP**: Metacarpophalangeal joint, the knuckle near the palm.
/// - **PIP**: Proximal Interphalangeal joint, between the MCP and DIP.
/// - **DIP**: Distal Interphalangeal joint, the highest joint of a finger.
/// - **Tip**: placed on the tip of the finger, above the DIP.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LandmarkIdx {
    Wrist,
    ThumbCmc,
    ThumbMcp,
    ThumbIp,
    ThumbTip,
    IndexFingerMcp,
    IndexFingerPip,
    IndexFingerDip,
    IndexFingerTip,
    MiddleFingerMcp,
    MiddleFingerPip,
    MiddleFingerDip,
    MiddleFingerTip,
    RingFingerMcp,
    RingFingerPip,
    RingFingerDip,
    RingFingerTip,
    PinkyMcp,
    PinkyPip,
    PinkyDip,
    PinkyTip,
}

pub(crate) const PALM_LANDMARKS: &[LandmarkIdx] = {
    use LandmarkIdx::*;
    &[
        Wrist,
        ThumbCmc,
        IndexFingerMcp,
        MiddleFingerMcp,
        RingFingerMcp,
        PinkyMcp,
    ]
};

/// Skeleton edges connecting the landmarks, used when drawing overlays.
pub const CONNECTIVITY: &[(LandmarkIdx, LandmarkIdx)] = {
    use LandmarkIdx::*;
    &[
        // Surround the palm:
        (Wrist, ThumbCmc),
        (ThumbCmc, IndexFingerMcp),
        (IndexFingerMcp, MiddleFingerMcp),
        (MiddleFingerMcp, RingFingerMcp),
        (RingFingerMcp, PinkyMcp),
        (PinkyMcp, Wrist),
        // Thumb:
        (ThumbCmc, ThumbMcp),
        (ThumbMcp, ThumbIp),
        (ThumbIp, ThumbTip),
        // Index:
        (IndexFingerMcp, IndexFingerPip),
        (IndexFingerPip, IndexFingerDip),
        (IndexFingerDip, IndexFingerTip),
        // Middle:
        (MiddleFingerMcp, MiddleFingerPip),
        (MiddleFingerPip, MiddleFingerDip),
        (MiddleFingerDip, MiddleFingerTip),
        // Ring:
        (RingFingerMcp, RingFingerPip),
        (RingFingerPip, RingFingerDip),
        (RingFingerDip, RingFingerTip),
        // Pinky:
        (PinkyMcp, PinkyPip),
        (PinkyPip, PinkyDip),
        (PinkyDip, PinkyTip),
    ]
};

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn upright_pose() -> HandPose {
        let mut positions = [[0.5, 0.5, 0.0]; LANDMARK_COUNT];
        // Wrist at the bottom, middle finger MCP straight above it.
        positions[LandmarkIdx::Wrist as usize] = [0.5, 0.8, 0.0];
        positions[LandmarkIdx::MiddleFingerMcp as usize] = [0.5, 0.4, 0.0];
        HandPose::new(positions, 0.9, 0.7)
    }

    #[test]
    fn upright_hand_has_zero_rotation() {
        assert_relative_eq!(upright_pose().rotation_radians(), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn handedness_threshold() {
        let pose = upright_pose();
        assert_eq!(pose.handedness(), Handedness::Right);
        let pose = HandPose::new(*pose.positions(), 0.9, 0.2);
        assert_eq!(pose.handedness(), Handedness::Left);
    }

    #[test]
    fn palm_center_averages_palm_landmarks() {
        let mut positions = [[0.0; 3]; LANDMARK_COUNT];
        for lm in PALM_LANDMARKS {
            positions[*lm as usize] = [0.6, 0.3, 0.0];
        }
        let pose = HandPose::new(positions, 1.0, 0.0);
        let center = pose.palm_center();
        assert_relative_eq!(center[0], 0.6, epsilon = 1e-6);
        assert_relative_eq!(center[1], 0.3, epsilon = 1e-6);
    }
}
