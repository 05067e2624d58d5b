//! Live preview window and keyboard input.

use anyhow::{anyhow, Result};
use minifb::{Key, KeyRepeat, WindowOptions};

use crate::camera::RgbFrame;

/// A preview window showing the camera feed with overlays.
///
/// The window doubles as the keyboard interface: label keys are polled once
/// per displayed frame, and `Escape` is the reserved quit key. The window is
/// owned by the running loop and closed on drop.
pub struct Window {
    window: minifb::Window,
    buffer: Vec<u32>,
    width: usize,
    height: usize,
}

impl Window {
    pub fn open(title: &str, width: usize, height: usize) -> Result<Self> {
        let mut window = minifb::Window::new(title, width, height, WindowOptions::default())
            .map_err(|e| anyhow!("failed to create window: {e}"))?;

        // Bounded wait per iteration; also caps the preview at ~60 FPS.
        window.limit_update_rate(Some(std::time::Duration::from_micros(16_600)));

        Ok(Self {
            window,
            buffer: vec![0; width * height],
            width,
            height,
        })
    }

    pub fn is_open(&self) -> bool {
        self.window.is_open()
    }

    /// Whether the reserved quit key is held down.
    pub fn quit_requested(&self) -> bool {
        self.window.is_key_down(Key::Escape)
    }

    /// Keys newly pressed since the last displayed frame.
    pub fn keys_pressed(&self) -> Vec<Key> {
        self.window.get_keys_pressed(KeyRepeat::No)
    }

    /// Displays `frame`, resizing the internal buffer if the frame size
    /// changed.
    pub fn show(&mut self, frame: &RgbFrame) -> Result<()> {
        let (w, h) = (frame.width() as usize, frame.height() as usize);
        if (w, h) != (self.width, self.height) {
            self.width = w;
            self.height = h;
            self.buffer.resize(w * h, 0);
        }

        for (dst, pixel) in self.buffer.iter_mut().zip(frame.pixels()) {
            let [r, g, b] = pixel.0;
            *dst = u32::from_be_bytes([0, r, g, b]);
        }

        self.window
            .update_with_buffer(&self.buffer, self.width, self.height)
            .map_err(|e| anyhow!("window update failed: {e}"))
    }
}
