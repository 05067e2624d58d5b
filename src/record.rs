//! Interactive capture of labeled samples from the live camera feed.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Result;
use itertools::Itertools;
use minifb::Key;

use crate::camera::CameraSource;
use crate::config::AppConfig;
use crate::dataset;
use crate::draw;
use crate::extractor::HandExtractor;
use crate::feature::{vectorize, FeatureVector};
use crate::gui::Window;
use crate::keymap::KeyMap;
use crate::timer::FpsCounter;

/// Records one labeled capture event.
///
/// Appends a row to the dataset and returns `true` when a valid feature
/// vector is present; otherwise reports the miss and appends nothing. The
/// dataset file is opened and closed within the call.
pub fn capture_sample(
    dataset_path: &Path,
    vector: Option<&FeatureVector>,
    label: &str,
) -> Result<bool> {
    match vector {
        Some(vector) => {
            dataset::append(dataset_path, vector, label)?;
            Ok(true)
        }
        None => {
            log::warn!("no valid hand data this frame; `{label}` not captured");
            Ok(false)
        }
    }
}

/// Runs the capture loop until the quit key is pressed or the camera fails.
///
/// Every frame goes through the shared front half of the pipeline (capture →
/// extract → vectorize); a key press from `keymap` routes the current
/// vector into the dataset.
pub fn run(config: &AppConfig, keymap: &KeyMap) -> Result<()> {
    let mut camera = CameraSource::open(config.camera.index)?;
    let mut extractor = HandExtractor::from_onnx(
        &config.extractor.model_path,
        config.extractor.detection_confidence,
        config.extractor.tracking_confidence,
    )?;
    let mut window = Window::open(
        "handsign collect - label keys capture, Esc quits",
        camera.width() as usize,
        camera.height() as usize,
    )?;

    log::info!(
        "capturing to `{}`; {} label keys mapped, Esc quits",
        config.dataset_path.display(),
        keymap.len(),
    );

    let mut session_counts: BTreeMap<String, u64> = BTreeMap::new();
    let mut fps = FpsCounter::new("collect");

    while window.is_open() && !window.quit_requested() {
        let mut frame = match camera.read() {
            Ok(frame) => frame,
            Err(e) => {
                log::error!("{e:#}; stopping capture");
                break;
            }
        };

        let pose = extractor.detect(&frame)?;
        let vector = pose.as_ref().map(vectorize);

        for key in window.keys_pressed() {
            if key == Key::Escape {
                continue;
            }
            match keymap.label_for(key) {
                Some(label) => {
                    if capture_sample(&config.dataset_path, vector.as_ref(), label)? {
                        let count = session_counts.entry(label.to_string()).or_default();
                        *count += 1;
                        log::info!("captured `{label}` ({count} this session)");
                    }
                }
                None => log::debug!("ignoring unmapped key {key:?}"),
            }
        }

        if let Some(pose) = &pose {
            draw::skeleton(&mut frame, pose);
            let status = format!(
                "HAND {:.0}% {:.0} DEG",
                pose.presence() * 100.0,
                pose.rotation_radians().to_degrees(),
            );
            draw::text(&mut frame, 10, 10, &status, draw::GREEN, 2);
        } else {
            draw::text(&mut frame, 10, 10, "NO HAND", draw::GRAY, 2);
        }
        session_hud(&mut frame, &session_counts);

        window.show(&frame)?;
        fps.tick_with(camera.timers().chain(extractor.timers()));
    }

    let total: u64 = session_counts.values().sum();
    log::info!("capture finished, {total} samples recorded this session");
    Ok(())
}

fn session_hud(frame: &mut crate::camera::RgbFrame, counts: &BTreeMap<String, u64>) {
    if counts.is_empty() {
        return;
    }
    let line = counts.iter().map(|(label, n)| format!("{label}:{n}")).join(" ");
    let y = frame.height() as i32 - draw::text_height(2) - 4;
    draw::text(frame, 10, y, &line, draw::WHITE, 2);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::FEATURE_LEN;

    #[test]
    fn capture_without_hand_data_appends_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("signs.csv");

        assert!(!capture_sample(&path, None, "A").unwrap());
        assert!(!path.exists());
    }

    #[test]
    fn capture_with_vector_appends_one_row() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("signs.csv");
        let vector = FeatureVector::from_slice(&[0.25; FEATURE_LEN]).unwrap();

        assert!(capture_sample(&path, Some(&vector), "A").unwrap());
        let samples = dataset::load(&path).unwrap();
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].label, "A");
    }
}
