//! Run lifecycle
//!
//! `Idle → Collecting → (Generating) → Synthesizing → Assembling → Ready`,
//! with `Failed` reachable from any non-terminal state.

use std::fmt;
use uuid::Uuid;

use super::PipelineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Collecting,
    Generating,
    Synthesizing,
    Assembling,
    Ready,
    Failed,
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Ready | RunState::Failed)
    }

    fn can_advance_to(&self, next: RunState) -> bool {
        use RunState::*;
        match (self, next) {
            (from, Failed) => !from.is_terminal(),
            (Idle, Collecting)
            | (Collecting, Generating)
            | (Collecting, Synthesizing)
            | (Generating, Synthesizing)
            | (Synthesizing, Assembling)
            | (Assembling, Ready) => true,
            _ => false,
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunState::Idle => "idle",
            RunState::Collecting => "collecting",
            RunState::Generating => "generating",
            RunState::Synthesizing => "synthesizing",
            RunState::Assembling => "assembling",
            RunState::Ready => "ready",
            RunState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// State of a single run, identified by a fresh UUID
#[derive(Debug, Clone)]
pub struct RunTracker {
    run_id: Uuid,
    state: RunState,
    history: Vec<RunState>,
}

impl Default for RunTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl RunTracker {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            state: RunState::Idle,
            history: vec![RunState::Idle],
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Every state the run has been in, oldest first
    pub fn history(&self) -> &[RunState] {
        &self.history
    }

    pub fn advance(&mut self, next: RunState) -> Result<(), PipelineError> {
        if !self.state.can_advance_to(next) {
            return Err(PipelineError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        tracing::info!(run_id = %self.run_id, "{} -> {}", self.state, next);
        self.state = next;
        self.history.push(next);
        Ok(())
    }

    /// Move to `Failed` unless the run already finished
    pub fn fail(&mut self, error: &PipelineError) {
        if self.state.is_terminal() {
            return;
        }
        tracing::error!(run_id = %self.run_id, "Run failed while {}: {}", self.state, error);
        self.state = RunState::Failed;
        self.history.push(RunState::Failed);
    }
}
