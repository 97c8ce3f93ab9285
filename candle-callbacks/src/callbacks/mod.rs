//! Callback system for training hooks.

mod early_stopping;
mod run_limiter;

pub use early_stopping::EarlyStopping;
pub use run_limiter::RunLimiter;

use crate::{Result, RunState};

/// Direction in which the monitored metric improves.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Min,
    Max,
}

impl Mode {
    pub fn from_minimize(minimize: bool) -> Self {
        if minimize {
            Mode::Min
        } else {
            Mode::Max
        }
    }

    /// Whether `score` beats `best` by at least `min_delta`.
    ///
    /// Both comparisons are inclusive, so with `min_delta == 0.0` an equal
    /// score counts as an improvement.
    pub fn is_improvement(self, score: f64, best: f64, min_delta: f64) -> bool {
        match self {
            Mode::Min => improves_min(score, best, min_delta),
            Mode::Max => improves_max(score, best, min_delta),
        }
    }
}

fn improves_min(score: f64, best: f64, min_delta: f64) -> bool {
    score <= best - min_delta
}

fn improves_max(score: f64, best: f64, min_delta: f64) -> bool {
    score >= best + min_delta
}

/// Dispatch tier of a callback. Lower ranks run first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CallbackOrder {
    Internal = 0,
    Metric = 20,
    MetricAggregation = 40,
    Optimizer = 60,
    Validation = 80,
    Scheduler = 100,
    Logging = 120,
    External = 200,
}

impl CallbackOrder {
    pub fn rank(self) -> u32 {
        self as u32
    }
}

/// Lifecycle observer driven by the training engine.
pub trait Callback: Send {
    fn order(&self) -> CallbackOrder {
        CallbackOrder::External
    }

    fn on_batch_end(&mut self, _state: &mut RunState) -> Result<()> {
        Ok(())
    }

    fn on_epoch_end(&mut self, _state: &mut RunState) -> Result<()> {
        Ok(())
    }
}

/// Callbacks kept sorted by [`CallbackOrder`], registration order within a tier.
#[derive(Default)]
pub struct CallbackList {
    callbacks: Vec<Box<dyn Callback>>,
}

impl CallbackList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_callback(mut self, callback: impl Callback + 'static) -> Self {
        self.push(Box::new(callback));
        self
    }

    pub fn push(&mut self, callback: Box<dyn Callback>) {
        let order = callback.order();
        let idx = self.callbacks.partition_point(|c| c.order() <= order);
        self.callbacks.insert(idx, callback);
    }

    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }

    pub fn orders(&self) -> Vec<CallbackOrder> {
        self.callbacks.iter().map(|c| c.order()).collect()
    }

    pub fn on_batch_end(&mut self, state: &mut RunState) -> Result<()> {
        for callback in self.callbacks.iter_mut() {
            callback.on_batch_end(state)?;
        }
        Ok(())
    }

    pub fn on_epoch_end(&mut self, state: &mut RunState) -> Result<()> {
        for callback in self.callbacks.iter_mut() {
            callback.on_epoch_end(state)?;
        }
        Ok(())
    }
}
