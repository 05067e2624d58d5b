//! Performance measurement tools.

use std::{
    fmt,
    mem,
    time::{Duration, Instant},
};

const EMA_ALPHA: f32 = 0.3;

/// A timer that measures and averages the time an operation takes.
///
/// Collected timings are smoothed with an exponential moving average;
/// [`FpsCounter::tick_with`] resets the timers it logs.
pub struct Timer {
    name: &'static str,
    avg: f32,
    count: usize,
}

impl Timer {
    /// Creates a new timer.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            avg: 0.0,
            count: 0,
        }
    }

    /// Invokes a closure, measuring and recording the time it takes.
    pub fn time<T>(&mut self, timee: impl FnOnce() -> T) -> T {
        let start = Instant::now();
        let result = timee();
        self.stop(start);
        result
    }

    fn stop(&mut self, start: Instant) {
        let secs = start.elapsed().as_secs_f32();
        self.avg = if self.count == 0 {
            secs
        } else {
            self.avg + EMA_ALPHA * (secs - self.avg)
        };
        self.count += 1;
    }

    /// Clears the collected timings.
    pub fn reset(&mut self) {
        self.avg = 0.0;
        self.count = 0;
    }
}

/// Displays the average recorded time.
impl fmt::Display for Timer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let avg_ms = self.avg * 1000.0;
        write!(f, "{}: {}x{avg_ms:.01}ms", self.name, self.count)
    }
}

/// Logs frames per second with optional extra data.
pub struct FpsCounter {
    name: String,
    frames: u32,
    start: Instant,
}

impl FpsCounter {
    pub fn new<N: Into<String>>(name: N) -> Self {
        Self {
            name: name.into(),
            frames: 0,
            start: Instant::now(),
        }
    }

    /// Advances the frame counter by 1 and logs FPS if one second has passed.
    pub fn tick(&mut self) {
        self.frames += 1;
        if self.start.elapsed() > Duration::from_secs(1) {
            log::debug!("{}: {} FPS", self.name, self.frames);
            self.frames = 0;
            self.start = Instant::now();
        }
    }

    /// Advances the frame counter by 1 and logs FPS and per-stage timers if
    /// one second has passed. The logged timers are reset.
    pub fn tick_with<'a, I: IntoIterator<Item = &'a mut Timer>>(&mut self, timers: I) {
        self.frames += 1;
        if self.start.elapsed() <= Duration::from_secs(1) {
            return;
        }

        let parts = timers
            .into_iter()
            .map(|t| {
                let s = t.to_string();
                t.reset();
                s
            })
            .collect::<Vec<_>>();
        let frames = mem::replace(&mut self.frames, 0);
        if parts.is_empty() {
            log::debug!("{}: {} FPS", self.name, frames);
        } else {
            log::debug!("{}: {} FPS ({})", self.name, frames, parts.join(", "));
        }
        self.start = Instant::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timer_records_and_resets() {
        let mut timer = Timer::new("test");
        timer.time(|| std::thread::sleep(Duration::from_millis(1)));
        assert_eq!(timer.count, 1);
        assert!(timer.avg > 0.0);
        timer.reset();
        assert_eq!(timer.count, 0);
    }
}
