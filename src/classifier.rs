//! Classifier training, prediction, and artifact persistence.
//!
//! The classifier algorithms themselves are consumed from `smartcore`; this
//! module only adapts them to the 63-value feature vectors and string labels
//! of the gesture pipeline. Two classifier families are supported: an
//! ensemble of trees and a margin-based classifier with an RBF kernel. The
//! margin classifier is binary, so it is lifted to multi-class by one-vs-one
//! voting over every label pair.

use std::fmt;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use anyhow::{anyhow, bail, ensure, Context, Result};
use serde::{Deserialize, Serialize};
use smartcore::ensemble::random_forest_classifier::{
    RandomForestClassifier, RandomForestClassifierParameters,
};
use smartcore::linalg::naive::dense_matrix::DenseMatrix;
use smartcore::svm::svc::{SVCParameters, SVC};
use smartcore::svm::{Kernels, RBFKernel};

use crate::feature::FeatureVector;

/// Penalty parameter of the margin classifier.
const SVM_C: f32 = 1.0;
/// RBF kernel width of the margin classifier.
const SVM_GAMMA: f32 = 0.5;

/// The classifier families the trainer can fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ClassifierKind {
    /// Ensemble-of-trees classifier.
    Forest,
    /// Margin-based classifier with an RBF kernel, one-vs-one multi-class.
    Svm,
}

impl ClassifierKind {
    /// File name of this classifier's persisted artifact.
    pub fn artifact_name(self) -> &'static str {
        match self {
            Self::Forest => "rf_model.bin",
            Self::Svm => "svm_model.bin",
        }
    }

    /// Short tag used in the prediction overlay.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Forest => "RF",
            Self::Svm => "SVM",
        }
    }
}

impl fmt::Display for ClassifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Forest => f.write_str("forest"),
            Self::Svm => f.write_str("svm"),
        }
    }
}

/// Bidirectional mapping between label tokens and dense class indices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelMap {
    labels: Vec<String>,
}

impl LabelMap {
    /// Builds the map from an unordered stream of label tokens. Labels are
    /// sorted and deduplicated, so class indices are stable across runs.
    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut labels: Vec<String> = labels.into_iter().map(Into::into).collect();
        labels.sort();
        labels.dedup();
        Self { labels }
    }

    pub fn class_of(&self, label: &str) -> Option<usize> {
        self.labels.binary_search_by(|l| l.as_str().cmp(label)).ok()
    }

    pub fn label(&self, class: usize) -> Option<&str> {
        self.labels.get(class).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }
}

/// A fitted classifier, opaque to the rest of the pipeline.
#[derive(Serialize, Deserialize)]
pub enum TrainedClassifier {
    Forest(RandomForestClassifier<f32>),
    Svm(OneVsOneSvm),
}

impl TrainedClassifier {
    /// Fits a classifier of the given kind on `features` / `classes`.
    ///
    /// `classes` holds one class index per feature vector; every index must
    /// be below `num_classes`, and at least two classes must be present.
    pub fn fit(
        kind: ClassifierKind,
        features: &[FeatureVector],
        classes: &[usize],
        num_classes: usize,
    ) -> Result<Self> {
        ensure!(
            features.len() == classes.len(),
            "got {} feature vectors but {} class indices",
            features.len(),
            classes.len(),
        );
        ensure!(!features.is_empty(), "cannot fit on an empty training set");
        ensure!(num_classes >= 2, "need at least 2 classes, got {num_classes}");

        match kind {
            ClassifierKind::Forest => {
                let x = to_matrix(features);
                let y: Vec<f32> = classes.iter().map(|&c| c as f32).collect();
                let forest =
                    RandomForestClassifier::fit(&x, &y, RandomForestClassifierParameters::default())
                        .map_err(|e| anyhow!("forest training failed: {e}"))?;
                Ok(Self::Forest(forest))
            }
            ClassifierKind::Svm => Ok(Self::Svm(OneVsOneSvm::fit(
                features,
                classes,
                num_classes,
            )?)),
        }
    }

    /// Predicts the class index for one feature vector.
    pub fn predict(&self, vector: &FeatureVector) -> Result<usize> {
        match self {
            Self::Forest(forest) => {
                let x = to_matrix(std::slice::from_ref(vector));
                let prediction = forest
                    .predict(&x)
                    .map_err(|e| anyhow!("forest prediction failed: {e}"))?;
                prediction
                    .first()
                    .map(|&c| c.round() as usize)
                    .context("forest produced no prediction")
            }
            Self::Svm(svm) => svm.predict(vector),
        }
    }
}

/// One-vs-one voting ensemble of binary margin classifiers.
///
/// For `k` classes, `k * (k - 1) / 2` machines are trained, one per label
/// pair; prediction tallies one vote per machine and picks the class with
/// the most votes (lowest class index on a tie).
#[derive(Serialize, Deserialize)]
pub struct OneVsOneSvm {
    num_classes: usize,
    machines: Vec<PairwiseSvm>,
}

#[derive(Serialize, Deserialize)]
struct PairwiseSvm {
    class_a: usize,
    class_b: usize,
    svc: SVC<f32, DenseMatrix<f32>, RBFKernel<f32>>,
}

impl OneVsOneSvm {
    fn fit(features: &[FeatureVector], classes: &[usize], num_classes: usize) -> Result<Self> {
        let mut machines = Vec::with_capacity(num_classes * (num_classes - 1) / 2);
        for class_a in 0..num_classes {
            for class_b in class_a + 1..num_classes {
                let mut rows = Vec::new();
                let mut y = Vec::new();
                for (vector, &class) in features.iter().zip(classes) {
                    if class == class_a {
                        rows.push(vector.as_slice().to_vec());
                        y.push(0.0);
                    } else if class == class_b {
                        rows.push(vector.as_slice().to_vec());
                        y.push(1.0);
                    }
                }
                if !y.contains(&0.0) || !y.contains(&1.0) {
                    bail!(
                        "training partition has no samples for one of classes {class_a}/{class_b}"
                    );
                }

                let x = DenseMatrix::from_2d_vec(&rows);
                let svc = SVC::fit(
                    &x,
                    &y,
                    SVCParameters::default()
                        .with_c(SVM_C)
                        .with_kernel(Kernels::rbf(SVM_GAMMA)),
                )
                .map_err(|e| anyhow!("svm training failed for pair {class_a}/{class_b}: {e}"))?;
                machines.push(PairwiseSvm {
                    class_a,
                    class_b,
                    svc,
                });
            }
        }
        Ok(Self {
            num_classes,
            machines,
        })
    }

    fn predict(&self, vector: &FeatureVector) -> Result<usize> {
        let x = to_matrix(std::slice::from_ref(vector));
        let mut votes = vec![0u32; self.num_classes];
        for machine in &self.machines {
            let prediction = machine
                .svc
                .predict(&x)
                .map_err(|e| anyhow!("svm prediction failed: {e}"))?;
            let vote = match prediction.first() {
                Some(p) if *p < 0.5 => machine.class_a,
                Some(_) => machine.class_b,
                None => bail!("svm produced no prediction"),
            };
            votes[vote] += 1;
        }
        votes
            .iter()
            .enumerate()
            .max_by_key(|&(class, &count)| (count, std::cmp::Reverse(class)))
            .map(|(class, _)| class)
            .context("no classes to vote on")
    }
}

/// A persisted trained model: the fitted classifier plus the label map it
/// was trained against. Serialized as one opaque artifact; replaced whole by
/// a later training run, never edited.
#[derive(Serialize, Deserialize)]
pub struct ModelArtifact {
    pub kind: ClassifierKind,
    pub labels: LabelMap,
    pub classifier: TrainedClassifier,
}

impl ModelArtifact {
    /// Writes the artifact to `path`, replacing any previous artifact.
    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path)
            .with_context(|| format!("failed to create model artifact `{}`", path.display()))?;
        bincode::serialize_into(BufWriter::new(file), self)
            .with_context(|| format!("failed to write model artifact `{}`", path.display()))
    }

    /// Loads an artifact from `path`. A missing or incompatible file is an
    /// error; callers treat it as fatal at startup.
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("missing model artifact `{}` (run `train` first?)", path.display()))?;
        bincode::deserialize_from(BufReader::new(file))
            .with_context(|| format!("model artifact `{}` is corrupt or incompatible", path.display()))
    }

    /// Predicts the label token for one feature vector.
    pub fn predict(&self, vector: &FeatureVector) -> Result<&str> {
        let class = self.classifier.predict(vector)?;
        self.labels
            .label(class)
            .with_context(|| format!("predicted class {class} is outside the label map"))
    }
}

fn to_matrix(features: &[FeatureVector]) -> DenseMatrix<f32> {
    let rows: Vec<Vec<f32>> = features.iter().map(|v| v.as_slice().to_vec()).collect();
    DenseMatrix::from_2d_vec(&rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::FEATURE_LEN;

    /// Two well-separated clusters, trivially separable by both classifiers.
    fn clustered_samples(per_class: usize) -> (Vec<FeatureVector>, Vec<usize>) {
        let mut rng = fastrand::Rng::with_seed(7);
        let mut features = Vec::new();
        let mut classes = Vec::new();
        for class in 0..2 {
            for _ in 0..per_class {
                let base = class as f32 * 10.0;
                let values: Vec<f32> =
                    (0..FEATURE_LEN).map(|_| base + rng.f32() * 0.1).collect();
                features.push(FeatureVector::from_slice(&values).unwrap());
                classes.push(class);
            }
        }
        (features, classes)
    }

    #[test]
    fn label_map_is_sorted_and_deduplicated() {
        let map = LabelMap::from_labels(["B", "A", "B", "C"]);
        assert_eq!(map.len(), 3);
        assert_eq!(map.class_of("A"), Some(0));
        assert_eq!(map.class_of("C"), Some(2));
        assert_eq!(map.label(1), Some("B"));
        assert_eq!(map.class_of("Z"), None);
    }

    #[test]
    fn forest_separates_clusters() {
        let (features, classes) = clustered_samples(20);
        let model =
            TrainedClassifier::fit(ClassifierKind::Forest, &features, &classes, 2).unwrap();
        assert_eq!(model.predict(&features[0]).unwrap(), 0);
        assert_eq!(model.predict(&features[25]).unwrap(), 1);
    }

    #[test]
    fn svm_one_vs_one_separates_clusters() {
        let (features, classes) = clustered_samples(20);
        let model = TrainedClassifier::fit(ClassifierKind::Svm, &features, &classes, 2).unwrap();
        assert_eq!(model.predict(&features[0]).unwrap(), 0);
        assert_eq!(model.predict(&features[25]).unwrap(), 1);
    }

    #[test]
    fn fit_rejects_single_class() {
        let (features, _) = clustered_samples(5);
        let classes = vec![0; features.len()];
        assert!(TrainedClassifier::fit(ClassifierKind::Forest, &features, &classes, 1).is_err());
        assert!(TrainedClassifier::fit(ClassifierKind::Svm, &features, &classes, 1).is_err());
    }

    #[test]
    fn artifact_round_trips_through_disk() {
        let (features, classes) = clustered_samples(10);
        let artifact = ModelArtifact {
            kind: ClassifierKind::Forest,
            labels: LabelMap::from_labels(["DOWN", "UP"]),
            classifier: TrainedClassifier::fit(ClassifierKind::Forest, &features, &classes, 2)
                .unwrap(),
        };

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rf_model.bin");
        artifact.save(&path).unwrap();

        let loaded = ModelArtifact::load(&path).unwrap();
        assert_eq!(loaded.labels, artifact.labels);
        assert_eq!(loaded.predict(&features[0]).unwrap(), "DOWN");
        assert_eq!(loaded.predict(&features[15]).unwrap(), "UP");
    }

    #[test]
    fn loading_missing_artifact_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ModelArtifact::load(&dir.path().join("nope.bin")).is_err());
    }
}
