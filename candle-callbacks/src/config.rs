//! Callback configuration.
//!
//! Callbacks can be built directly or from a config file, e.g.
//!
//! ```toml
//! [[callbacks]]
//! callback = "EarlyStoppingCallback"
//! patience = 3
//! metric = "loss"
//!
//! [[callbacks]]
//! callback = "CheckRunCallback"
//! num_loader_steps = 2
//! ```

use crate::callbacks::{Callback, CallbackList, EarlyStopping, Mode, RunLimiter};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

fn default_metric() -> String {
    EarlyStopping::DEFAULT_METRIC.to_string()
}

fn default_minimize() -> bool {
    true
}

fn default_min_delta() -> f64 {
    EarlyStopping::DEFAULT_MIN_DELTA
}

fn default_steps() -> usize {
    1
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EarlyStoppingConfig {
    pub patience: usize,
    #[serde(default = "default_metric")]
    pub metric: String,
    #[serde(default = "default_minimize")]
    pub minimize: bool,
    #[serde(default = "default_min_delta")]
    pub min_delta: f64,
}

impl EarlyStoppingConfig {
    pub fn new(patience: usize) -> Self {
        Self {
            patience,
            metric: default_metric(),
            minimize: default_minimize(),
            min_delta: default_min_delta(),
        }
    }

    pub fn metric(mut self, metric: impl Into<String>) -> Self {
        self.metric = metric.into();
        self
    }

    pub fn minimize(mut self, minimize: bool) -> Self {
        self.minimize = minimize;
        self
    }

    pub fn min_delta(mut self, delta: f64) -> Self {
        self.min_delta = delta;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.patience == 0 {
            return Err(Error::InvalidConfig("patience must be positive".to_string()));
        }
        if self.metric.is_empty() {
            return Err(Error::InvalidConfig("metric name must not be empty".to_string()));
        }
        if !self.min_delta.is_finite() || self.min_delta < 0.0 {
            return Err(Error::InvalidConfig(format!(
                "min_delta must be a non-negative finite number, got {}",
                self.min_delta
            )));
        }
        Ok(())
    }

    pub fn build(&self) -> Result<EarlyStopping> {
        self.validate()?;
        Ok(EarlyStopping::new(self.patience)
            .monitor(self.metric.clone())
            .mode(Mode::from_minimize(self.minimize))
            .min_delta(self.min_delta))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunLimiterConfig {
    #[serde(default = "default_steps")]
    pub num_loader_steps: usize,
    #[serde(default = "default_steps")]
    pub num_epoch_steps: usize,
}

impl Default for RunLimiterConfig {
    fn default() -> Self {
        Self {
            num_loader_steps: default_steps(),
            num_epoch_steps: default_steps(),
        }
    }
}

impl RunLimiterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn num_loader_steps(mut self, steps: usize) -> Self {
        self.num_loader_steps = steps;
        self
    }

    pub fn num_epoch_steps(mut self, steps: usize) -> Self {
        self.num_epoch_steps = steps;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.num_loader_steps == 0 || self.num_epoch_steps == 0 {
            return Err(Error::InvalidConfig(format!(
                "run limits must be positive, got num_loader_steps={} num_epoch_steps={}",
                self.num_loader_steps, self.num_epoch_steps
            )));
        }
        Ok(())
    }

    pub fn build(&self) -> Result<RunLimiter> {
        self.validate()?;
        Ok(RunLimiter::new(self.num_loader_steps, self.num_epoch_steps))
    }
}

/// One entry of a callbacks config, selected by its `callback` name.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "callback")]
pub enum CallbackConfig {
    #[serde(rename = "EarlyStoppingCallback")]
    EarlyStopping(EarlyStoppingConfig),
    #[serde(rename = "CheckRunCallback")]
    CheckRun(RunLimiterConfig),
}

impl CallbackConfig {
    pub fn build(&self) -> Result<Box<dyn Callback>> {
        Ok(match self {
            CallbackConfig::EarlyStopping(cfg) => Box::new(cfg.build()?),
            CallbackConfig::CheckRun(cfg) => Box::new(cfg.build()?),
        })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CallbacksConfig {
    #[serde(default)]
    pub callbacks: Vec<CallbackConfig>,
}

impl CallbacksConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    pub fn build(&self) -> Result<CallbackList> {
        let mut list = CallbackList::new();
        for cfg in &self.callbacks {
            list.push(cfg.build()?);
        }
        tracing::debug!(callbacks = list.len(), "built callbacks from config");
        Ok(list)
    }
}
