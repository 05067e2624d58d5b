//! Flattens one hand pose into the fixed-length feature vector consumed by
//! the classifiers.

use std::fmt;

use crate::landmark::{HandPose, LANDMARK_COUNT};

/// Length of a feature vector: 21 landmarks × (x, y, z).
pub const FEATURE_LEN: usize = LANDMARK_COUNT * 3;

/// Ordered 63-value numeric encoding of one hand pose.
///
/// Layout is landmark-index-major, `(x, y, z)`-minor: element `3 * i + c` is
/// coordinate `c` of landmark `i`.
#[derive(Clone, PartialEq)]
pub struct FeatureVector([f32; FEATURE_LEN]);

impl FeatureVector {
    /// Builds a feature vector from a raw slice.
    ///
    /// Returns [`None`] unless the slice holds exactly [`FEATURE_LEN`]
    /// values. This is the single place where partial landmark data is
    /// rejected before it can reach the dataset or a classifier.
    pub fn from_slice(values: &[f32]) -> Option<Self> {
        let values: [f32; FEATURE_LEN] = values.try_into().ok()?;
        Some(Self(values))
    }

    #[inline]
    pub fn as_slice(&self) -> &[f32; FEATURE_LEN] {
        &self.0
    }
}

impl fmt::Debug for FeatureVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FeatureVector({:?}…)", &self.0[..3])
    }
}

/// Derives the feature vector for one hand pose.
///
/// Deterministic, pure function of the pose; the output length is always
/// [`FEATURE_LEN`].
pub fn vectorize(pose: &HandPose) -> FeatureVector {
    let mut values = [0.0; FEATURE_LEN];
    for (chunk, pos) in values.chunks_exact_mut(3).zip(pose.positions()) {
        chunk.copy_from_slice(pos);
    }
    FeatureVector(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vectorize_is_landmark_major_coordinate_minor() {
        let mut positions = [[0.0; 3]; LANDMARK_COUNT];
        for (i, pos) in positions.iter_mut().enumerate() {
            *pos = [i as f32, i as f32 + 0.25, i as f32 + 0.5];
        }
        let pose = HandPose::new(positions, 1.0, 0.0);

        let vector = vectorize(&pose);
        assert_eq!(vector.as_slice().len(), FEATURE_LEN);
        for i in 0..LANDMARK_COUNT {
            assert_eq!(vector.as_slice()[3 * i], i as f32);
            assert_eq!(vector.as_slice()[3 * i + 1], i as f32 + 0.25);
            assert_eq!(vector.as_slice()[3 * i + 2], i as f32 + 0.5);
        }
    }

    #[test]
    fn all_zero_pose_yields_all_zero_vector() {
        let vector = vectorize(&HandPose::default());
        assert!(vector.as_slice().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn from_slice_rejects_wrong_lengths() {
        assert!(FeatureVector::from_slice(&[0.0; 62]).is_none());
        assert!(FeatureVector::from_slice(&[0.0; 64]).is_none());
        assert!(FeatureVector::from_slice(&[]).is_none());
        assert!(FeatureVector::from_slice(&[0.0; FEATURE_LEN]).is_some());
    }
}
