//! Camera frame acquisition.

use anyhow::{anyhow, Context, Result};
use image::{ImageBuffer, Rgb};
use nokhwa::{
    pixel_format::RgbFormat,
    utils::{ApiBackend, CameraIndex, RequestedFormat, RequestedFormatType},
    Camera,
};

use crate::timer::Timer;

/// One camera image, RGB8.
pub type RgbFrame = ImageBuffer<Rgb<u8>, Vec<u8>>;

/// Wraps a single camera device and yields a sequence of frames.
///
/// The device is owned exclusively by the holder and released on drop; reads
/// block until a frame is available. A failed read is reported to the caller
/// and is fatal to the surrounding loop (no retry).
pub struct CameraSource {
    camera: Camera,
    t_dequeue: Timer,
    t_decode: Timer,
}

impl CameraSource {
    /// Opens the camera at `index` (0 is the default device) and starts its
    /// stream.
    pub fn open(index: u32) -> Result<Self> {
        let requested =
            RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestFrameRate);
        let mut camera = Camera::new(CameraIndex::Index(index), requested)
            .map_err(|e| anyhow!(e))
            .with_context(|| format!("failed to open camera {index}"))?;
        camera
            .open_stream()
            .map_err(|e| anyhow!(e))
            .context("failed to open camera stream")?;

        log::info!(
            "opened camera {} ({}), {}",
            index,
            camera.info().human_name(),
            camera.camera_format(),
        );

        Ok(Self {
            camera,
            t_dequeue: Timer::new("dequeue"),
            t_decode: Timer::new("decode"),
        })
    }

    /// Reads the next frame, blocking until one is available.
    pub fn read(&mut self) -> Result<RgbFrame> {
        let frame = self
            .t_dequeue
            .time(|| self.camera.frame())
            .map_err(|e| anyhow!(e))
            .context("camera read failed")?;
        self.t_decode
            .time(|| frame.decode_image::<RgbFormat>())
            .map_err(|e| anyhow!(e))
            .context("failed to decode camera frame")
    }

    pub fn width(&self) -> u32 {
        self.camera.resolution().width()
    }

    pub fn height(&self) -> u32 {
        self.camera.resolution().height()
    }

    /// Returns profiling timers for frame dequeueing and decoding.
    pub fn timers(&mut self) -> impl Iterator<Item = &mut Timer> {
        [&mut self.t_dequeue, &mut self.t_decode].into_iter()
    }
}

/// Logs the available capture devices, one line per camera.
pub fn list_cameras() -> Result<()> {
    let cameras = nokhwa::query(ApiBackend::Auto).map_err(|e| anyhow!(e))?;
    if cameras.is_empty() {
        log::warn!("no capture devices found");
        return Ok(());
    }
    for info in cameras {
        log::info!("camera {}: {}", info.index(), info.human_name());
    }
    Ok(())
}
