//! Variable-timestep render loop.
//!
//! Each tick measures the frame delta, updates the camera controls once and
//! then draws once. The platform decides when ticks happen (winit redraw
//! requests); the loop only tracks whether it should keep going.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use flyby_render::SurfaceError;

use crate::clock::FrameClock;

/// Per-frame work driven by [`RenderLoop`].
pub trait FrameStep {
    /// Advance the camera controls by `delta` seconds.
    fn update_controls(&mut self, delta: f32);

    /// Render one frame.
    fn draw(&mut self, delta: f32) -> Result<(), SurfaceError>;
}

/// Whether the loop still schedules frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Stopped,
}

/// Shared stop flag. Cloning shares the flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Frame scheduler state.
#[derive(Debug)]
pub struct RenderLoop {
    clock: FrameClock,
    token: CancellationToken,
    frame_limit: Option<u64>,
    frame_count: u64,
    total_time: f64,
}

impl RenderLoop {
    /// `frame_limit` of zero runs until cancelled.
    pub fn new(frame_limit: u64) -> Self {
        Self {
            clock: FrameClock::new(),
            token: CancellationToken::new(),
            frame_limit: (frame_limit > 0).then_some(frame_limit),
            frame_count: 0,
            total_time: 0.0,
        }
    }

    /// A handle that stops the loop from anywhere.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn state(&self) -> LoopState {
        if self.token.is_cancelled() {
            LoopState::Stopped
        } else {
            LoopState::Running
        }
    }

    /// Run one frame with the wall-clock delta.
    pub fn tick(&mut self, step: &mut impl FrameStep) -> Result<LoopState, SurfaceError> {
        if self.token.is_cancelled() {
            return Ok(LoopState::Stopped);
        }
        let delta = self.clock.delta();
        self.tick_with_delta(delta, step)
    }

    /// Run one frame with an explicit delta. Negative deltas count as zero.
    pub fn tick_with_delta(
        &mut self,
        delta: f32,
        step: &mut impl FrameStep,
    ) -> Result<LoopState, SurfaceError> {
        if self.token.is_cancelled() {
            return Ok(LoopState::Stopped);
        }
        let delta = delta.max(0.0);

        step.update_controls(delta);
        let drawn = step.draw(delta);

        self.frame_count += 1;
        self.total_time += f64::from(delta);

        if let Some(limit) = self.frame_limit
            && self.frame_count >= limit
        {
            tracing::info!("Frame limit of {limit} reached");
            self.token.cancel();
        }

        drawn.map(|()| self.state())
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Sum of all deltas ticked so far, in seconds.
    pub fn total_time(&self) -> f64 {
        self.total_time
    }
}
