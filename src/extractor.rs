//! Hand pose extraction backed by an external landmark network.
//!
//! The network is a MediaPipe-style hand landmark model loaded from an ONNX
//! file at startup. It expects a square RGB input (NCHW, values in
//! `0.0..=1.0`) and outputs 21 landmark positions in input pixel
//! coordinates, a presence score, and a raw handedness score.
//!
//! At most one hand is tracked. Once a hand has been found in a full-frame
//! pass, subsequent frames only run the network on the padded bounding box
//! of the previous landmarks; when the presence score drops below the
//! tracking threshold, the region of interest is cleared and detection
//! starts over from the full frame.

use std::path::Path;

use anyhow::{ensure, Context, Result};
use tract_onnx::prelude::*;

use crate::camera::RgbFrame;
use crate::landmark::{HandPose, Position, LANDMARK_COUNT};
use crate::timer::Timer;

/// Side length of the network's square input, in pixels.
const INPUT_SIZE: usize = 224;

/// Relative padding added around the landmark bounding box when deriving the
/// next frame's region of interest.
const ROI_PADDING: f32 = 0.3;

type Plan = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// Axis-aligned rectangle in frame pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Rect {
    x: f32,
    y: f32,
    w: f32,
    h: f32,
}

impl Rect {
    /// Smallest rectangle containing all `points`. Returns [`None`] when
    /// `points` is empty.
    fn bounding(points: impl IntoIterator<Item = (f32, f32)>) -> Option<Self> {
        let mut iter = points.into_iter();
        let (mut min_x, mut min_y) = iter.next()?;
        let (mut max_x, mut max_y) = (min_x, min_y);
        for (x, y) in iter {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
        Some(Self {
            x: min_x,
            y: min_y,
            w: max_x - min_x,
            h: max_y - min_y,
        })
    }

    /// Adds `amount * w` to the left and right and `amount * h` to the top
    /// and bottom.
    fn grow_rel(self, amount: f32) -> Self {
        Self {
            x: self.x - self.w * amount,
            y: self.y - self.h * amount,
            w: self.w * (1.0 + 2.0 * amount),
            h: self.h * (1.0 + 2.0 * amount),
        }
    }

    /// Grows the shorter side so the rectangle becomes a centered square.
    fn grow_to_square(self) -> Self {
        let side = self.w.max(self.h);
        Self {
            x: self.x - (side - self.w) / 2.0,
            y: self.y - (side - self.h) / 2.0,
            w: side,
            h: side,
        }
    }

    /// Whether any part of the rectangle overlaps a `width` × `height` frame.
    fn intersects_frame(&self, width: u32, height: u32) -> bool {
        self.w > 0.0
            && self.h > 0.0
            && self.x < width as f32
            && self.y < height as f32
            && self.x + self.w > 0.0
            && self.y + self.h > 0.0
    }
}

/// Extracts a single hand pose per frame using an ONNX landmark network.
pub struct HandExtractor {
    plan: Plan,
    detection_confidence: f32,
    tracking_confidence: f32,
    roi: Option<Rect>,
    t_resample: Timer,
    t_infer: Timer,
}

impl HandExtractor {
    /// Loads the landmark network from `path`.
    ///
    /// `detection_confidence` applies to full-frame passes,
    /// `tracking_confidence` to passes over the tracked region of interest;
    /// both must be in `0.0..=1.0`. Fails if the file is missing or is not a
    /// loadable ONNX graph.
    pub fn from_onnx(
        path: &Path,
        detection_confidence: f32,
        tracking_confidence: f32,
    ) -> Result<Self> {
        ensure!(
            (0.0..=1.0).contains(&detection_confidence)
                && (0.0..=1.0).contains(&tracking_confidence),
            "confidence thresholds must be in 0.0..=1.0 \
             (detection {detection_confidence}, tracking {tracking_confidence})",
        );

        let plan = tract_onnx::onnx()
            .model_for_path(path)
            .with_context(|| {
                format!("failed to load hand landmark network `{}`", path.display())
            })?
            .with_input_fact(
                0,
                InferenceFact::dt_shape(f32::datum_type(), tvec!(1, 3, INPUT_SIZE, INPUT_SIZE)),
            )?
            .into_optimized()?
            .into_runnable()?;

        log::info!("loaded hand landmark network `{}`", path.display());

        Ok(Self {
            plan,
            detection_confidence,
            tracking_confidence,
            roi: None,
            t_resample: Timer::new("resample"),
            t_infer: Timer::new("infer"),
        })
    }

    /// Whether a hand was present in the last processed frame.
    pub fn is_tracking(&self) -> bool {
        self.roi.is_some()
    }

    /// Returns profiling timers for view resampling and inference.
    pub fn timers(&mut self) -> impl Iterator<Item = &mut Timer> {
        [&mut self.t_resample, &mut self.t_infer].into_iter()
    }

    /// Runs the landmark network on `frame`.
    ///
    /// Returns [`None`] when no hand is present with sufficient confidence;
    /// this is not an error. Landmark positions in the returned pose are
    /// normalized to the frame.
    pub fn detect(&mut self, frame: &RgbFrame) -> Result<Option<HandPose>> {
        let (view, threshold) = match self.roi {
            Some(roi) if roi.intersects_frame(frame.width(), frame.height()) => {
                (roi.grow_to_square(), self.tracking_confidence)
            }
            _ => {
                // Full-frame pass: a centered square covering the frame, with
                // the off-frame remainder sampled as black.
                self.roi = None;
                let side = frame.width().max(frame.height()) as f32;
                let view = Rect {
                    x: (frame.width() as f32 - side) / 2.0,
                    y: (frame.height() as f32 - side) / 2.0,
                    w: side,
                    h: side,
                };
                (view, self.detection_confidence)
            }
        };

        let input = self.t_resample.time(|| resample(frame, view));
        let outputs = self
            .t_infer
            .time(|| self.plan.run(tvec!(Tensor::from(input).into())))?;
        ensure!(
            outputs.len() >= 3,
            "landmark network produced {} outputs, expected at least 3",
            outputs.len(),
        );

        let landmarks: Vec<f32> = outputs[0].to_array_view::<f32>()?.iter().copied().collect();
        ensure!(
            landmarks.len() == LANDMARK_COUNT * 3,
            "landmark output has {} values, expected {}",
            landmarks.len(),
            LANDMARK_COUNT * 3,
        );
        let presence = scalar_output(&outputs[1]).context("missing presence output")?;
        let raw_handedness = scalar_output(&outputs[2]).context("missing handedness output")?;

        if presence < threshold {
            if self.roi.take().is_some() {
                log::debug!("tracking lost (presence {presence:.2} < {threshold:.2})");
            }
            return Ok(None);
        }

        // Map landmarks from network input pixels to normalized frame
        // coordinates, and collect their frame-pixel bounding box for the
        // next frame's RoI.
        let scale = view.w / INPUT_SIZE as f32;
        let mut positions: [Position; LANDMARK_COUNT] = [[0.0; 3]; LANDMARK_COUNT];
        let mut frame_points = [(0.0f32, 0.0f32); LANDMARK_COUNT];
        for (i, pos) in positions.iter_mut().enumerate() {
            let px = view.x + landmarks[3 * i] * scale;
            let py = view.y + landmarks[3 * i + 1] * scale;
            let pz = landmarks[3 * i + 2] * scale;
            *pos = [
                px / frame.width() as f32,
                py / frame.height() as f32,
                pz / frame.width() as f32,
            ];
            frame_points[i] = (px, py);
        }

        self.roi = Rect::bounding(frame_points).map(|rect| rect.grow_rel(ROI_PADDING));

        Ok(Some(HandPose::new(positions, presence, raw_handedness)))
    }
}

fn scalar_output(tensor: &TValue) -> Option<f32> {
    tensor
        .to_array_view::<f32>()
        .ok()
        .and_then(|view| view.iter().next().copied())
}

/// Samples the part of `frame` covered by `rect` into the network's input
/// tensor. Pixels outside the frame are black; values are scaled to
/// `0.0..=1.0`.
fn resample(frame: &RgbFrame, rect: Rect) -> tract_ndarray::Array4<f32> {
    tract_ndarray::Array4::from_shape_fn((1, 3, INPUT_SIZE, INPUT_SIZE), |(_, c, y, x)| {
        let sx = rect.x + (x as f32 + 0.5) / INPUT_SIZE as f32 * rect.w;
        let sy = rect.y + (y as f32 + 0.5) / INPUT_SIZE as f32 * rect.h;
        if sx < 0.0 || sy < 0.0 || sx >= frame.width() as f32 || sy >= frame.height() as f32 {
            0.0
        } else {
            frame.get_pixel(sx as u32, sy as u32)[c] as f32 / 255.0
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounding_rect_of_points() {
        let rect = Rect::bounding([(1.0, 2.0), (5.0, 3.0), (2.0, 8.0)]).unwrap();
        assert_eq!((rect.x, rect.y, rect.w, rect.h), (1.0, 2.0, 4.0, 6.0));
        assert!(Rect::bounding([]).is_none());
    }

    #[test]
    fn grow_to_square_centers_the_short_side() {
        let rect = Rect {
            x: 10.0,
            y: 20.0,
            w: 4.0,
            h: 10.0,
        };
        let sq = rect.grow_to_square();
        assert_eq!((sq.w, sq.h), (10.0, 10.0));
        assert_eq!(sq.x, 7.0);
        assert_eq!(sq.y, 20.0);
    }

    #[test]
    fn offscreen_roi_does_not_intersect() {
        let rect = Rect {
            x: -100.0,
            y: -100.0,
            w: 50.0,
            h: 50.0,
        };
        assert!(!rect.intersects_frame(640, 480));
        let rect = Rect {
            x: 600.0,
            y: 400.0,
            w: 80.0,
            h: 80.0,
        };
        assert!(rect.intersects_frame(640, 480));
    }
}
