//! Offline training: dataset → fitted classifiers → persisted artifacts.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{ensure, Context, Result};
use itertools::Itertools;

use crate::classifier::{ClassifierKind, LabelMap, ModelArtifact, TrainedClassifier};
use crate::dataset;
use crate::feature::FeatureVector;

/// Fraction of the dataset held out for accuracy measurement.
pub const TEST_FRACTION: f32 = 0.2;

/// Seed for the train/test shuffle. The split is always seeded so that
/// reported accuracies are reproducible across runs on the same dataset.
pub const SPLIT_SEED: u64 = 42;

/// Result of training one classifier.
#[derive(Debug)]
pub struct TrainOutcome {
    pub kind: ClassifierKind,
    /// Fraction of held-out rows predicted correctly, in `0.0..=1.0`.
    pub accuracy: f32,
    pub train_rows: usize,
    pub test_rows: usize,
    pub artifact: PathBuf,
}

/// Trains one classifier per requested kind on the dataset at
/// `dataset_path` and persists the fitted models under `model_dir`.
///
/// Fails without persisting anything if the dataset is missing, empty,
/// malformed, or contains fewer than two distinct labels. Artifacts are
/// only written after every requested classifier has been fitted and
/// evaluated.
pub fn train(
    dataset_path: &Path,
    kinds: &[ClassifierKind],
    model_dir: &Path,
) -> Result<Vec<TrainOutcome>> {
    ensure!(!kinds.is_empty(), "no classifiers requested");

    let samples = dataset::load(dataset_path)?;
    ensure!(
        !samples.is_empty(),
        "dataset `{}` is empty",
        dataset_path.display(),
    );

    let labels = LabelMap::from_labels(samples.iter().map(|s| s.label.clone()));
    ensure!(
        labels.len() >= 2,
        "dataset has {} distinct label(s); at least 2 are needed to train",
        labels.len(),
    );

    let counts = samples.iter().map(|s| s.label.as_str()).counts();
    log::info!(
        "loaded {} samples with {} labels ({})",
        samples.len(),
        labels.len(),
        labels
            .iter()
            .map(|l| format!("{l}: {}", counts.get(l).copied().unwrap_or(0)))
            .join(", "),
    );

    let classes = samples
        .iter()
        .map(|s| {
            labels
                .class_of(&s.label)
                .with_context(|| format!("label `{}` missing from label map", s.label))
        })
        .collect::<Result<Vec<_>>>()?;

    let (train_idx, test_idx) = split_indices(samples.len(), TEST_FRACTION, SPLIT_SEED);
    ensure!(
        !train_idx.is_empty() && !test_idx.is_empty(),
        "dataset has too few rows ({}) to split into train and test partitions",
        samples.len(),
    );
    log::debug!(
        "split {} rows into {} train / {} test (seed {SPLIT_SEED})",
        samples.len(),
        train_idx.len(),
        test_idx.len(),
    );

    let train_features: Vec<FeatureVector> = train_idx
        .iter()
        .map(|&i| samples[i].features.clone())
        .collect();
    let train_classes: Vec<usize> = train_idx.iter().map(|&i| classes[i]).collect();

    // Fit and evaluate everything before persisting anything, so a failed
    // training run never leaves a half-updated set of artifacts behind.
    let mut fitted = Vec::with_capacity(kinds.len());
    for &kind in kinds {
        let classifier =
            TrainedClassifier::fit(kind, &train_features, &train_classes, labels.len())?;

        let mut correct = 0usize;
        for &i in &test_idx {
            if classifier.predict(&samples[i].features)? == classes[i] {
                correct += 1;
            }
        }
        let accuracy = correct as f32 / test_idx.len() as f32;
        fitted.push((kind, classifier, accuracy, correct));
    }

    fs::create_dir_all(model_dir)
        .with_context(|| format!("failed to create model directory `{}`", model_dir.display()))?;

    let mut outcomes = Vec::with_capacity(fitted.len());
    for (kind, classifier, accuracy, correct) in fitted {
        let artifact = model_dir.join(kind.artifact_name());
        ModelArtifact {
            kind,
            labels: labels.clone(),
            classifier,
        }
        .save(&artifact)?;
        log::info!(
            "{kind}: accuracy {accuracy:.2} ({correct}/{} held-out rows) -> `{}`",
            test_idx.len(),
            artifact.display(),
        );
        outcomes.push(TrainOutcome {
            kind,
            accuracy,
            train_rows: train_idx.len(),
            test_rows: test_idx.len(),
            artifact,
        });
    }
    Ok(outcomes)
}

/// Splits `0..n` into shuffled (train, test) index sets.
///
/// The shuffle is driven entirely by `seed`; the same `n`, fraction, and
/// seed always produce the same partition. The test partition holds
/// `round(n * test_fraction)` rows, clamped so neither side is empty when
/// `n >= 2`.
pub fn split_indices(n: usize, test_fraction: f32, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = fastrand::Rng::with_seed(seed);
    rng.shuffle(&mut indices);

    let test_len = ((n as f32 * test_fraction).round() as usize).clamp(usize::from(n >= 2), n);
    let (test, train) = indices.split_at(test_len);
    (train.to_vec(), test.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_is_80_20_and_deterministic() {
        let (train_a, test_a) = split_indices(100, TEST_FRACTION, SPLIT_SEED);
        let (train_b, test_b) = split_indices(100, TEST_FRACTION, SPLIT_SEED);
        assert_eq!(train_a.len(), 80);
        assert_eq!(test_a.len(), 20);
        assert_eq!(train_a, train_b);
        assert_eq!(test_a, test_b);
    }

    #[test]
    fn split_partitions_are_disjoint_and_exhaustive() {
        let (train, test) = split_indices(53, TEST_FRACTION, SPLIT_SEED);
        let mut all: Vec<usize> = train.iter().chain(test.iter()).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..53).collect::<Vec<_>>());
    }

    #[test]
    fn tiny_datasets_keep_both_partitions_nonempty() {
        let (train, test) = split_indices(2, TEST_FRACTION, SPLIT_SEED);
        assert_eq!(train.len(), 1);
        assert_eq!(test.len(), 1);
    }

    #[test]
    fn different_seeds_differ() {
        let (train_a, _) = split_indices(100, TEST_FRACTION, 1);
        let (train_b, _) = split_indices(100, TEST_FRACTION, 2);
        assert_ne!(train_a, train_b);
    }
}
