//! Frame pacing and the fixed-timestep accumulator
//!
//! The host calls [`LoopDriver::on_frame`] from its animation-frame
//! callback. Frames that arrive before the target frame interval do no work;
//! due frames run as many fixed simulation ticks as the elapsed wall time
//! covers (bounded by [`MAX_SUBSTEPS`]). The loop stops itself when the game
//! is paused and is restarted through [`LoopDriver::resume`].
//!
//! [`MAX_SUBSTEPS`]: crate::consts::MAX_SUBSTEPS

use crate::consts::{FRAME_JITTER_MS, MAX_FRAME_GAP_MS, MAX_SUBSTEPS};
use crate::sim::{GameMode, GameState, TickInput, apply_controls, tick};
use crate::tuning::{DeviceProfile, Tuning};

/// What one animation frame did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStep {
    /// Arrived before the frame interval; nothing happened
    Throttled,
    /// Due, but the game is not in active play
    Idle,
    /// Simulation advanced by `ticks` fixed steps (may be 0)
    Advanced { ticks: u32 },
}

impl FrameStep {
    /// Whether the host should redraw after this frame
    pub fn should_render(self) -> bool {
        !matches!(self, FrameStep::Throttled)
    }
}

/// Wall-clock to simulation-tick converter
#[derive(Debug, Clone)]
pub struct FrameLoop {
    frame_interval_ms: f64,
    tick_ms: f64,
    last_frame_ms: Option<f64>,
    accumulator: f64,
}

impl FrameLoop {
    pub fn new(tuning: &Tuning, profile: DeviceProfile) -> Self {
        Self {
            frame_interval_ms: 1000.0 / tuning.target_fps(profile) as f64,
            tick_ms: tuning.tick_ms(),
            last_frame_ms: None,
            accumulator: 0.0,
        }
    }

    pub fn frame_interval_ms(&self) -> f64 {
        self.frame_interval_ms
    }

    /// Forget the previous timestamp so a long pause is not replayed
    pub fn reset_clock(&mut self) {
        self.last_frame_ms = None;
        self.accumulator = 0.0;
    }

    /// Handle one animation frame at host time `now_ms`
    ///
    /// Mode triggers in `input` are applied on every due frame and then
    /// cleared; held input (axis, fire) is left for the host to manage.
    pub fn frame(&mut self, now_ms: f64, state: &mut GameState, input: &mut TickInput) -> FrameStep {
        let Some(last) = self.last_frame_ms else {
            self.last_frame_ms = Some(now_ms);
            apply_controls(state, input);
            input.clear_triggers();
            return FrameStep::Idle;
        };

        let elapsed = now_ms - last;
        if elapsed < self.frame_interval_ms - FRAME_JITTER_MS {
            return FrameStep::Throttled;
        }
        self.last_frame_ms = Some(now_ms);

        apply_controls(state, input);
        input.clear_triggers();
        if state.mode != GameMode::Playing && !input.autopilot {
            self.accumulator = 0.0;
            return FrameStep::Idle;
        }

        self.accumulator += elapsed.clamp(0.0, MAX_FRAME_GAP_MS);
        let mut ticks = 0;
        while self.accumulator >= self.tick_ms && ticks < MAX_SUBSTEPS {
            tick(state, input);
            input.pointer = None;
            self.accumulator -= self.tick_ms;
            ticks += 1;
            if state.mode != GameMode::Playing && !input.autopilot {
                self.accumulator = 0.0;
                break;
            }
        }
        if ticks == MAX_SUBSTEPS && self.accumulator >= self.tick_ms {
            log::debug!(
                "Frame backlog of {:.1}ms dropped after {} substeps",
                self.accumulator,
                MAX_SUBSTEPS
            );
            self.accumulator = 0.0;
        }
        FrameStep::Advanced { ticks }
    }
}

/// Host facility for requesting and cancelling animation frames
pub trait FrameScheduler {
    type Handle: Copy + std::fmt::Debug;

    /// Request one callback; `None` if the host refused
    fn schedule(&mut self) -> Option<Self::Handle>;

    fn cancel(&mut self, handle: Self::Handle);
}

/// Owns the pending frame request and the frame pacer
pub struct LoopDriver<S: FrameScheduler> {
    scheduler: S,
    pending: Option<S::Handle>,
    pub frame_loop: FrameLoop,
}

impl<S: FrameScheduler> LoopDriver<S> {
    pub fn new(scheduler: S, frame_loop: FrameLoop) -> Self {
        Self {
            scheduler,
            pending: None,
            frame_loop,
        }
    }

    pub fn is_running(&self) -> bool {
        self.pending.is_some()
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    /// Request the next frame unless one is already pending
    pub fn start(&mut self) {
        if self.pending.is_none() {
            self.pending = self.scheduler.schedule();
            if self.pending.is_none() {
                log::warn!("Frame request refused by host");
            }
        }
    }

    /// Cancel the pending frame request
    pub fn stop(&mut self) {
        if let Some(handle) = self.pending.take() {
            self.scheduler.cancel(handle);
            log::debug!("Frame loop stopped (cancelled {:?})", handle);
        }
    }

    /// Restart after a stop without replaying the time spent stopped
    pub fn resume(&mut self) {
        self.frame_loop.reset_clock();
        self.start();
    }

    /// Run one frame callback and reschedule unless the game is paused
    pub fn on_frame(&mut self, now_ms: f64, state: &mut GameState, input: &mut TickInput) -> FrameStep {
        self.pending = None;
        let step = self.frame_loop.frame(now_ms, state, input);
        if state.mode == GameMode::Paused {
            log::debug!("Paused, frame loop idle until resumed");
        } else {
            self.start();
        }
        step
    }
}
