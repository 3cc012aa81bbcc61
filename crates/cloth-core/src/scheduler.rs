use std::collections::VecDeque;

use crate::config::{DEFAULT_MAX_TICKS_PER_FRAME, FIXED_TIME_STEP};
use crate::error::{ClothError, Result};

/// Outcome of one [`FixedStepScheduler::advance`] call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameReport {
    /// Fixed ticks executed this frame.
    pub ticks: u32,
    /// Whether the per-frame cap was hit and missed ticks were dropped.
    pub dropped: bool,
}

/// Decouples physics ticks from render frames.
///
/// A virtual clock advances in fixed increments until it catches up with the
/// wall clock passed to [`advance`](Self::advance). At most
/// `max_ticks_per_frame` ticks run per frame; when that is not enough the
/// virtual clock jumps to the wall clock and the missed ticks are lost
/// rather than replayed.
#[derive(Clone, Debug)]
pub struct FixedStepScheduler {
    tick: f64,
    max_ticks_per_frame: u32,
    virtual_time: f64,
    paused: bool,
}

impl Default for FixedStepScheduler {
    fn default() -> Self {
        Self {
            tick: FIXED_TIME_STEP as f64,
            max_ticks_per_frame: DEFAULT_MAX_TICKS_PER_FRAME,
            virtual_time: 0.0,
            paused: false,
        }
    }
}

impl FixedStepScheduler {
    /// `tick` is in seconds.
    pub fn new(tick: f64, max_ticks_per_frame: u32) -> Result<Self> {
        if !(tick.is_finite() && tick > 0.0) {
            return Err(ClothError::InvalidTick(tick));
        }
        if max_ticks_per_frame == 0 {
            return Err(ClothError::InvalidTickBudget);
        }
        Ok(Self {
            tick,
            max_ticks_per_frame,
            virtual_time: 0.0,
            paused: false,
        })
    }

    /// Begin ticking from wall-clock time `now`.
    pub fn start(&mut self, now: f64) {
        self.virtual_time = now;
        self.paused = false;
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Resume without replaying the time spent paused.
    pub fn resume(&mut self, now: f64) {
        self.sync(now);
        self.paused = false;
    }

    /// Snap the virtual clock to `now`.
    pub fn sync(&mut self, now: f64) {
        self.virtual_time = now;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn virtual_time(&self) -> f64 {
        self.virtual_time
    }

    pub fn tick(&self) -> f64 {
        self.tick
    }

    pub fn max_ticks_per_frame(&self) -> u32 {
        self.max_ticks_per_frame
    }

    /// Run as many fixed ticks as fit before wall-clock time `now`.
    ///
    /// `step` receives the tick duration in seconds.
    pub fn advance<F: FnMut(f32)>(&mut self, now: f64, mut step: F) -> FrameReport {
        let mut report = FrameReport::default();
        if self.paused {
            return report;
        }

        while self.virtual_time + self.tick <= now {
            if report.ticks == self.max_ticks_per_frame {
                log::warn!(
                    "physics fell behind by {:.3}s, dropping ticks",
                    now - self.virtual_time
                );
                self.virtual_time = now;
                report.dropped = true;
                break;
            }
            step(self.tick as f32);
            self.virtual_time += self.tick;
            report.ticks += 1;
        }
        report
    }
}

/// Sliding-window frame rate estimate.
///
/// Keeps the last `window` frame durations and recomputes the rate every
/// `report_every` frames.
#[derive(Clone, Debug)]
pub struct FrameStats {
    window: usize,
    report_every: u32,
    samples: VecDeque<f64>,
    frames_since_report: u32,
    framerate: f64,
}

impl FrameStats {
    pub fn new(window: usize, report_every: u32) -> Self {
        let window = window.max(1);
        Self {
            window,
            report_every: report_every.max(1),
            samples: VecDeque::with_capacity(window),
            frames_since_report: 0,
            framerate: 0.0,
        }
    }

    /// Record one frame duration in seconds.
    pub fn record(&mut self, frame_time: f64) {
        self.samples.push_back(frame_time);
        if self.samples.len() > self.window {
            self.samples.pop_front();
        }

        self.frames_since_report += 1;
        if self.frames_since_report >= self.report_every {
            self.frames_since_report = 0;
            let mean = self.mean_frame_time();
            if mean > 0.0 {
                self.framerate = 1.0 / mean;
                log::debug!("framerate {:.1} fps over {} frames", self.framerate, self.samples.len());
            }
        }
    }

    pub fn mean_frame_time(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.samples.iter().sum::<f64>() / self.samples.len() as f64
    }

    /// Last computed frame rate (0 until the first report).
    pub fn framerate(&self) -> f64 {
        self.framerate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
