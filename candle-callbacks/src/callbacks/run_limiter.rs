//! Bounded-run callback for smoke-testing a pipeline.

use super::{Callback, CallbackOrder};
use crate::{Result, RunState};

/// Requests a stop after a fixed number of loader steps or stage epochs,
/// whatever the metrics say.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunLimiter {
    num_loader_steps: usize,
    num_epoch_steps: usize,
}

impl RunLimiter {
    pub fn new(num_loader_steps: usize, num_epoch_steps: usize) -> Self {
        Self {
            num_loader_steps,
            num_epoch_steps,
        }
    }

    pub fn num_loader_steps(&self) -> usize {
        self.num_loader_steps
    }

    pub fn num_epoch_steps(&self) -> usize {
        self.num_epoch_steps
    }

    fn stop(state: &mut RunState, reason: &str) {
        if state.need_early_stop {
            tracing::debug!(reason, "run limit reached, stop already requested");
        } else {
            tracing::info!(
                stage = %state.stage_name,
                epoch = state.stage_epoch,
                step = state.loader_step,
                reason,
                "run limit reached, requesting stop"
            );
        }
        state.request_early_stop();
    }
}

impl Default for RunLimiter {
    fn default() -> Self {
        Self::new(1, 1)
    }
}

impl Callback for RunLimiter {
    fn order(&self) -> CallbackOrder {
        CallbackOrder::External
    }

    fn on_batch_end(&mut self, state: &mut RunState) -> Result<()> {
        if state.loader_step >= self.num_loader_steps {
            Self::stop(state, "loader steps");
        }
        Ok(())
    }

    fn on_epoch_end(&mut self, state: &mut RunState) -> Result<()> {
        if state.stage_epoch >= self.num_epoch_steps {
            Self::stop(state, "epoch steps");
        }
        Ok(())
    }
}
