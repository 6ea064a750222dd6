use std::sync::Arc;

use crate::exec::executor::execute_frame_with_mode;
use crate::exec::runtime::{FrameStats, RuntimeOpts, RuntimeState};
use crate::exec::swap::swap_program_in_place;
use crate::foundation::error::ReelResult;
use crate::ir::frame::RenderFrameIR;
use crate::ir::program::CompiledProgramIR;
use crate::store::state::MigrationReport;
use crate::time::resolver::TimeMode;

/// Host-facing pairing of a program with the runtime executing it.
///
/// A session owns both halves so the executor's "runtime belongs to this program" contract holds
/// by construction. Hot edits go through [`Session::swap`]; a failed swap keeps the old program
/// running.
#[derive(Debug)]
pub struct Session {
    program: Arc<CompiledProgramIR>,
    runtime: RuntimeState,
}

impl Session {
    /// Build a session with a fresh runtime.
    pub fn new(program: Arc<CompiledProgramIR>, opts: RuntimeOpts) -> ReelResult<Self> {
        let runtime = RuntimeState::new(&program, opts)?;
        Ok(Self { program, runtime })
    }

    /// Parse a program from JSON and build a session with default options.
    pub fn from_json(program_json: &str) -> ReelResult<Self> {
        let program = CompiledProgramIR::from_json(program_json)?;
        Self::new(Arc::new(program), RuntimeOpts::default())
    }

    /// The program currently executing.
    pub fn program(&self) -> &Arc<CompiledProgramIR> {
        &self.program
    }

    /// The runtime state.
    pub fn runtime(&self) -> &RuntimeState {
        &self.runtime
    }

    /// Mutable runtime access (probe installation and the like).
    pub fn runtime_mut(&mut self) -> &mut RuntimeState {
        &mut self.runtime
    }

    /// Render a playback frame at `t_abs_ms`.
    pub fn render(&mut self, t_abs_ms: f64) -> ReelResult<Arc<RenderFrameIR>> {
        execute_frame_with_mode(&self.program, &mut self.runtime, t_abs_ms, TimeMode::Playback)
    }

    /// Render a frame while the user is seeking.
    pub fn scrub(&mut self, t_abs_ms: f64) -> ReelResult<Arc<RenderFrameIR>> {
        execute_frame_with_mode(&self.program, &mut self.runtime, t_abs_ms, TimeMode::Scrub)
    }

    /// Replace the program between frames, carrying state across.
    pub fn swap(&mut self, program: Arc<CompiledProgramIR>) -> ReelResult<MigrationReport> {
        let report = swap_program_in_place(&program, &mut self.runtime)?;
        self.program = program;
        Ok(report)
    }

    /// Statistics of the last completed frame.
    pub fn stats(&self) -> &FrameStats {
        self.runtime.last_stats()
    }
}

#[cfg(test)]
#[path = "../tests/unit/session.rs"]
mod tests;
