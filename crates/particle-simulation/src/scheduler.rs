//! Frame pipeline: update → barrier → render → present
//!
//! The update runs in parallel; everything else runs on the caller's thread. The only blocking
//! point is [`UpdateKernel::synchronize`], which hands out the [`FrameSnapshot`] the renderer
//! needs. A snapshot cannot be built any other way, so drawing from a buffer whose update is
//! still in flight does not compile.

use crate::SimulationError;
use thiserror::Error;

/// Read-only view of a particle store whose update pass for `frame` has fully completed.
pub struct FrameSnapshot<'a, B> {
    buffer: &'a B,
    frame: u64,
}

impl<'a, B> FrameSnapshot<'a, B> {
    pub(crate) fn new(buffer: &'a B, frame: u64) -> Self {
        Self { buffer, frame }
    }

    pub fn buffer(&self) -> &'a B {
        self.buffer
    }

    /// Number of update passes the buffer reflects (1 after the first frame).
    pub fn frame(&self) -> u64 {
        self.frame
    }
}

/// Parallel per-particle update over a particle store it owns.
pub trait UpdateKernel {
    type Buffer;

    fn particle_count(&self) -> u32;

    /// Launch one update pass over every particle. Returns without waiting for completion.
    ///
    /// Dispatching again before [`synchronize`](Self::synchronize) is a `Dispatch` error.
    fn dispatch(&mut self) -> Result<(), SimulationError>;

    /// Block until every task of the last dispatch has finished.
    fn synchronize(&mut self) -> Result<FrameSnapshot<'_, Self::Buffer>, SimulationError>;
}

/// Single-threaded consumer of settled frames.
pub trait FrameRenderer<B> {
    type Error: std::error::Error + 'static;

    fn render(&mut self, snapshot: FrameSnapshot<'_, B>) -> Result<(), Self::Error>;

    /// Swap the drawn frame onto the screen.
    fn present(&mut self) -> Result<(), Self::Error>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStage {
    Idle,
    Updating,
    Synchronizing,
    Rendering,
    Presenting,
    /// Shut down or failed; no further frames run.
    Terminated,
}

#[derive(Debug, Error)]
pub enum FrameError<E: std::error::Error + 'static> {
    #[error(transparent)]
    Simulation(#[from] SimulationError),
    #[error("render stage failed")]
    Render(#[source] E),
    #[error("frame scheduler has terminated")]
    Terminated,
}

/// Owns the kernel (and through it the particle store) and drives the frame cycle.
pub struct FrameScheduler<K> {
    kernel: K,
    stage: FrameStage,
    frames_completed: u64,
}

impl<K: UpdateKernel> FrameScheduler<K> {
    pub fn new(kernel: K) -> Self {
        Self {
            kernel,
            stage: FrameStage::Idle,
            frames_completed: 0,
        }
    }

    /// Run one full cycle and return the number of frames completed so far.
    ///
    /// Any failure terminates the scheduler; there is no partial-frame recovery.
    pub fn run_frame<R>(&mut self, renderer: &mut R) -> Result<u64, FrameError<R::Error>>
    where
        R: FrameRenderer<K::Buffer>,
    {
        if self.stage == FrameStage::Terminated {
            return Err(FrameError::Terminated);
        }

        match self.cycle(renderer) {
            Ok(()) => {
                self.frames_completed += 1;
                Ok(self.frames_completed)
            }
            Err(err) => {
                log::error!("Frame {} failed: {err}", self.frames_completed + 1);
                transition(&mut self.stage, FrameStage::Terminated);
                Err(err)
            }
        }
    }

    fn cycle<R>(&mut self, renderer: &mut R) -> Result<(), FrameError<R::Error>>
    where
        R: FrameRenderer<K::Buffer>,
    {
        transition(&mut self.stage, FrameStage::Updating);
        self.kernel.dispatch()?;

        transition(&mut self.stage, FrameStage::Synchronizing);
        let snapshot = self.kernel.synchronize()?;

        transition(&mut self.stage, FrameStage::Rendering);
        renderer.render(snapshot).map_err(FrameError::Render)?;

        transition(&mut self.stage, FrameStage::Presenting);
        renderer.present().map_err(FrameError::Render)?;

        transition(&mut self.stage, FrameStage::Idle);
        Ok(())
    }

    /// Stop the loop. Called on window close.
    pub fn shutdown(&mut self) {
        if self.stage != FrameStage::Terminated {
            log::info!(
                "Shutting down after {} frames",
                self.frames_completed
            );
            transition(&mut self.stage, FrameStage::Terminated);
        }
    }

    pub fn stage(&self) -> FrameStage {
        self.stage
    }

    pub fn frames_completed(&self) -> u64 {
        self.frames_completed
    }

    pub fn is_terminated(&self) -> bool {
        self.stage == FrameStage::Terminated
    }

    pub fn kernel(&self) -> &K {
        &self.kernel
    }
}

fn transition(stage: &mut FrameStage, next: FrameStage) {
    log::trace!("{stage:?} -> {next:?}");
    *stage = next;
}
