use std::time::{Duration, Instant};

/// Source of monotonic time, measured from an arbitrary origin.
pub trait TimeSource {
    fn now(&mut self) -> Duration;
}

impl<T: TimeSource + ?Sized> TimeSource for Box<T> {
    fn now(&mut self) -> Duration {
        (**self).now()
    }
}

/// Real elapsed time.
pub struct WallTime {
    origin: Instant,
}

impl WallTime {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl TimeSource for WallTime {
    fn now(&mut self) -> Duration {
        self.origin.elapsed()
    }
}

/// Virtual time that moves forward by a fixed step on every read.
pub struct SteppedTime {
    step: Duration,
    now: Duration,
}

impl SteppedTime {
    pub fn new(step: Duration) -> Self {
        Self {
            step,
            now: Duration::ZERO,
        }
    }
}

impl TimeSource for SteppedTime {
    fn now(&mut self) -> Duration {
        let now = self.now;
        self.now += self.step;
        now
    }
}

/// Result of one clock tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tick {
    /// Seconds since the previous tick.
    pub dt: f64,
    /// Frames counted during the second that just ended, if one did.
    pub fps: Option<u32>,
}

/// Frame clock with a once-per-second event.
///
/// Frame time is accumulated and the second event fires when the
/// accumulator reaches one second. The event fires at most once per tick
/// and the accumulator keeps only the fractional remainder.
pub struct Clock<T> {
    source: T,
    last: Duration,
    acc: f64,
    frames: u32,
}

impl<T: TimeSource> Clock<T> {
    pub fn new(mut source: T) -> Self {
        let last = source.now();
        Self {
            source,
            last,
            acc: 0.0,
            frames: 0,
        }
    }

    pub fn tick(&mut self) -> Tick {
        let now = self.source.now();
        let dt = now.saturating_sub(self.last).as_secs_f64();
        self.last = self.last.max(now);

        self.frames += 1;
        self.acc += dt;

        let fps = if self.acc >= 1.0 {
            // A long frame fires once; its extra whole seconds are dropped.
            self.acc = (self.acc - 1.0) % 1.0;
            Some(std::mem::take(&mut self.frames))
        } else {
            None
        };

        Tick { dt, fps }
    }
}
