//! Hand-gesture capture, training, and live classification.
//!
//! The pipeline has three stages sharing one front half (camera → hand
//! landmark extraction → feature vectorization):
//!
//! * **collect** appends labeled 63-value feature vectors to a CSV dataset on
//!   key presses ([`record`]).
//! * **train** fits one or more classifiers on that dataset and persists them
//!   as model artifacts ([`trainer`]).
//! * **infer** runs the persisted classifiers against the live camera feed
//!   and overlays the predicted labels ([`predict`]).
//!
//! All landmark coordinates handed out by the extractor are normalized to the
//! frame: X and Y are in `0.0..=1.0` relative to frame width and height, Z is
//! relative depth on the same scale as X.

use log::LevelFilter;

pub mod camera;
pub mod classifier;
pub mod config;
pub mod dataset;
pub mod draw;
pub mod extractor;
pub mod feature;
pub mod gui;
pub mod keymap;
pub mod landmark;
pub mod predict;
pub mod record;
pub mod timer;
pub mod trainer;

/// Initializes logging to *stderr*.
///
/// The crate logs at *debug* level by default; `RUST_LOG` overrides the
/// filter. If a global logger is already registered, this does nothing.
pub fn init_logger() {
    env_logger::Builder::new()
        .filter(Some(env!("CARGO_PKG_NAME")), LevelFilter::Debug)
        .filter(None, LevelFilter::Warn)
        .parse_default_env()
        .try_init()
        .ok();
}
