//! Early stopping callback.

use super::{Callback, CallbackOrder, Mode};
use crate::{Result, RunState};

/// Requests a stop once the monitored validation metric has failed to improve
/// for `patience` consecutive epochs.
///
/// The first evaluated epoch only sets the baseline. After that, an epoch
/// improves when its score beats the best score by at least `min_delta`
/// (see [`Mode::is_improvement`]); an improving epoch resets the count of bad
/// epochs to zero. Inference stages are skipped entirely.
#[derive(Clone, Debug)]
pub struct EarlyStopping {
    monitor: String,
    patience: usize,
    min_delta: f64,
    mode: Mode,
    best_score: Option<f64>,
    bad_epoch_count: usize,
}

impl EarlyStopping {
    pub const DEFAULT_METRIC: &'static str = "loss";
    pub const DEFAULT_MIN_DELTA: f64 = 1e-6;

    /// Values are not checked here; a `patience` of 0 requests a stop on the
    /// baseline epoch. [`EarlyStoppingConfig::build`](crate::EarlyStoppingConfig::build)
    /// validates them.
    pub fn new(patience: usize) -> Self {
        Self {
            monitor: Self::DEFAULT_METRIC.to_string(),
            patience,
            min_delta: Self::DEFAULT_MIN_DELTA,
            mode: Mode::Min,
            best_score: None,
            bad_epoch_count: 0,
        }
    }

    pub fn monitor(mut self, metric: impl Into<String>) -> Self {
        self.monitor = metric.into();
        self
    }

    pub fn min_delta(mut self, delta: f64) -> Self {
        self.min_delta = delta;
        self
    }

    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    pub fn minimize(self, minimize: bool) -> Self {
        self.mode(Mode::from_minimize(minimize))
    }

    pub fn metric(&self) -> &str {
        &self.monitor
    }

    pub fn patience(&self) -> usize {
        self.patience
    }

    pub fn best_score(&self) -> Option<f64> {
        self.best_score
    }

    pub fn bad_epoch_count(&self) -> usize {
        self.bad_epoch_count
    }

    /// Forgets the baseline, as if no epoch had been evaluated yet.
    pub fn reset(&mut self) {
        self.best_score = None;
        self.bad_epoch_count = 0;
    }

    // A NaN baseline is kept: no later score compares as an improvement.
    fn update(&mut self, score: f64) {
        match self.best_score {
            None => {
                self.best_score = Some(score);
            }
            Some(best) => {
                if self.mode.is_improvement(score, best, self.min_delta) {
                    self.best_score = Some(score);
                    self.bad_epoch_count = 0;
                } else {
                    self.bad_epoch_count += 1;
                }
            }
        }
    }
}

impl Callback for EarlyStopping {
    fn order(&self) -> CallbackOrder {
        CallbackOrder::External
    }

    fn on_epoch_end(&mut self, state: &mut RunState) -> Result<()> {
        if state.is_infer_stage() {
            return Ok(());
        }

        let score = state.valid_metric(&self.monitor)?;
        self.update(score);
        tracing::debug!(
            metric = %self.monitor,
            score,
            best = ?self.best_score,
            bad_epochs = self.bad_epoch_count,
            "early stopping evaluated epoch"
        );

        if self.bad_epoch_count >= self.patience {
            tracing::info!(
                epoch = state.stage_epoch_log,
                metric = %self.monitor,
                bad_epochs = self.bad_epoch_count,
                "Early stop at {} epoch",
                state.stage_epoch_log
            );
            state.request_early_stop();
        }

        Ok(())
    }
}
