//! Live prediction: camera frames → extracted hand → per-model labels.

use anyhow::{ensure, Result};
use image::imageops;

use crate::camera::{CameraSource, RgbFrame};
use crate::classifier::ModelArtifact;
use crate::config::AppConfig;
use crate::draw;
use crate::extractor::HandExtractor;
use crate::feature::{vectorize, FeatureVector};
use crate::gui::Window;
use crate::landmark::HandPose;
use crate::timer::FpsCounter;

/// Runs the inference loop until the quit key is pressed or the camera
/// fails.
///
/// Every configured model artifact is loaded before the camera is opened; a
/// missing or unreadable artifact aborts the run rather than degrading to a
/// subset of models.
pub fn run(config: &AppConfig) -> Result<()> {
    ensure!(!config.classifiers.is_empty(), "no classifiers configured");

    let models = config
        .classifiers
        .iter()
        .map(|kind| ModelArtifact::load(&config.model_dir.join(kind.artifact_name())))
        .collect::<Result<Vec<_>>>()?;
    for model in &models {
        log::info!("loaded {} model with {} labels", model.kind, model.labels.len());
    }

    let mut camera = CameraSource::open(config.camera.index)?;
    let mut extractor = HandExtractor::from_onnx(
        &config.extractor.model_path,
        config.extractor.detection_confidence,
        config.extractor.tracking_confidence,
    )?;
    let mut window = Window::open(
        "handsign infer - Esc quits",
        camera.width() as usize * models.len(),
        camera.height() as usize,
    )?;

    let mut fps = FpsCounter::new("infer");

    while window.is_open() && !window.quit_requested() {
        let mut frame = match camera.read() {
            Ok(frame) => frame,
            Err(e) => {
                log::error!("{e:#}; stopping inference");
                break;
            }
        };

        let pose = extractor.detect(&frame)?;
        if let Some(pose) = &pose {
            draw::skeleton(&mut frame, pose);
        }
        let labels = predict_labels(&models, pose.as_ref())?;

        let display = compose(&frame, &models, &labels);
        window.show(&display)?;
        fps.tick_with(camera.timers().chain(extractor.timers()));
    }
    Ok(())
}

/// Asks every model for a label, or none of them when no hand is present.
///
/// Returns one entry per model, in the same order. Frames without a hand
/// never reach the classifiers.
pub fn predict_labels(
    models: &[ModelArtifact],
    pose: Option<&HandPose>,
) -> Result<Vec<Option<String>>> {
    match pose {
        Some(pose) => {
            let vector = vectorize(pose);
            models
                .iter()
                .map(|model| predict_one(model, &vector).map(Some))
                .collect()
        }
        None => Ok(vec![None; models.len()]),
    }
}

fn predict_one(model: &ModelArtifact, vector: &FeatureVector) -> Result<String> {
    let label = model.predict(vector)?;
    log::debug!("{}: `{label}`", model.kind);
    Ok(label.to_string())
}

/// Lays out one copy of the frame per model, side by side, each tagged with
/// that model's prediction. Panes without a prediction carry no text; with a
/// single model the output is the frame itself plus its overlay.
pub fn compose(frame: &RgbFrame, models: &[ModelArtifact], labels: &[Option<String>]) -> RgbFrame {
    let (w, h) = frame.dimensions();
    let mut display = RgbFrame::new(w * models.len() as u32, h);
    for (i, (model, label)) in models.iter().zip(labels).enumerate() {
        let x = i as u32 * w;
        imageops::replace(&mut display, frame, i64::from(x), 0);
        if let Some(label) = label {
            let caption = format!("{}: {label}", model.kind.tag());
            draw::text(&mut display, x as i32 + 10, 10, &caption, draw::GREEN, 3);
        }
    }
    display
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{ClassifierKind, LabelMap, TrainedClassifier};
    use crate::feature::FEATURE_LEN;

    fn fitted_model(kind: ClassifierKind) -> ModelArtifact {
        let mut features = Vec::new();
        let mut classes = Vec::new();
        for i in 0..20 {
            let base = if i % 2 == 0 { 0.0 } else { 10.0 };
            let mut values = [base; FEATURE_LEN];
            values[0] += (i as f32) * 0.01;
            features.push(FeatureVector::from_slice(&values).unwrap());
            classes.push(i % 2);
        }
        let labels = LabelMap::from_labels(["A".to_string(), "B".to_string()]);
        let classifier = TrainedClassifier::fit(kind, &features, &classes, labels.len()).unwrap();
        ModelArtifact {
            kind,
            labels,
            classifier,
        }
    }

    #[test]
    fn no_hand_skips_every_model() {
        let models = vec![
            fitted_model(ClassifierKind::Forest),
            fitted_model(ClassifierKind::Svm),
        ];
        let labels = predict_labels(&models, None).unwrap();
        assert_eq!(labels, vec![None, None]);
    }

    #[test]
    fn each_model_labels_a_hand() {
        let models = vec![
            fitted_model(ClassifierKind::Forest),
            fitted_model(ClassifierKind::Svm),
        ];
        let pose = HandPose::default();
        let labels = predict_labels(&models, Some(&pose)).unwrap();
        assert_eq!(labels.len(), 2);
        assert_eq!(labels[0].as_deref(), Some("A"));
        assert_eq!(labels[1].as_deref(), Some("A"));
    }

    #[test]
    fn compose_tiles_one_pane_per_model() {
        let models = vec![
            fitted_model(ClassifierKind::Forest),
            fitted_model(ClassifierKind::Svm),
        ];
        let frame = RgbFrame::new(64, 48);
        let labels = vec![Some("A".to_string()), Some("B".to_string())];
        let display = compose(&frame, &models, &labels);
        assert_eq!(display.dimensions(), (128, 48));
    }

    #[test]
    fn compose_keeps_single_model_frame_size() {
        let models = vec![fitted_model(ClassifierKind::Forest)];
        let frame = RgbFrame::new(64, 48);
        let display = compose(&frame, &models, &[None]);
        assert_eq!(display.dimensions(), (64, 48));
    }
}
