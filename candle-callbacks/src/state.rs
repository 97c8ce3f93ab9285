//! Shared run state read and written by callbacks.

use crate::{Error, Result};
use candle::{DType, Tensor};
use std::collections::HashMap;

/// Stage names starting with this prefix are inference stages.
pub const INFER_STAGE_PREFIX: &str = "infer";

/// Mutable state of a run, owned by the host training engine.
///
/// The engine advances the counters and fills `valid_metrics`; callbacks only
/// read them and may raise `need_early_stop`.
#[derive(Clone, Debug, Default)]
pub struct RunState {
    /// Name of the active stage, e.g. `"train"` or `"infer"`.
    pub stage_name: String,
    /// Epoch index within the active stage.
    pub stage_epoch: usize,
    /// Epoch counter used in log output.
    pub stage_epoch_log: usize,
    /// Step index within the active data loader.
    pub loader_step: usize,
    /// Metrics of the current validation pass.
    pub valid_metrics: HashMap<String, f64>,
    /// Set by callbacks to ask the engine to stop.
    pub need_early_stop: bool,
}

impl RunState {
    pub fn new(stage_name: impl Into<String>) -> Self {
        Self {
            stage_name: stage_name.into(),
            ..Self::default()
        }
    }

    pub fn is_infer_stage(&self) -> bool {
        self.stage_name.starts_with(INFER_STAGE_PREFIX)
    }

    /// Looks up a validation metric, failing if the engine did not record it.
    pub fn valid_metric(&self, name: &str) -> Result<f64> {
        match self.valid_metrics.get(name) {
            Some(value) => Ok(*value),
            None => {
                let mut available: Vec<String> = self.valid_metrics.keys().cloned().collect();
                available.sort();
                Err(Error::MissingMetric {
                    metric: name.to_string(),
                    available,
                })
            }
        }
    }

    pub fn set_valid_metric(&mut self, name: impl Into<String>, value: f64) {
        self.valid_metrics.insert(name.into(), value);
    }

    /// Records a single-element tensor, e.g. a reduced loss, as a validation metric.
    pub fn set_valid_metric_tensor(
        &mut self,
        name: impl Into<String>,
        value: &Tensor,
    ) -> Result<()> {
        let name = name.into();
        let elements = value.elem_count();
        if elements != 1 {
            return Err(Error::NonScalarMetric {
                metric: name,
                elements,
            });
        }
        let values = value.flatten_all()?.to_dtype(DType::F64)?.to_vec1::<f64>()?;
        self.valid_metrics.insert(name, values[0]);
        Ok(())
    }

    pub fn request_early_stop(&mut self) {
        self.need_early_stop = true;
    }

    /// Clears a pending stop request. Callbacks never call this; it is up to
    /// the engine to decide whether a stop carries over into the next stage.
    pub fn clear_early_stop(&mut self) {
        self.need_early_stop = false;
    }

    /// Switches to a new stage and resets the per-stage counters and metrics.
    ///
    /// `need_early_stop` is left untouched.
    pub fn begin_stage(&mut self, stage_name: impl Into<String>) {
        self.stage_name = stage_name.into();
        self.stage_epoch = 0;
        self.stage_epoch_log = 0;
        self.loader_step = 0;
        self.valid_metrics.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle::Device;

    #[test]
    fn infer_prefix() {
        assert!(RunState::new("infer").is_infer_stage());
        assert!(RunState::new("infer_holdout").is_infer_stage());
        assert!(!RunState::new("train").is_infer_stage());
        assert!(!RunState::new("stage_infer").is_infer_stage());
    }

    #[test]
    fn missing_metric_lists_available() {
        let mut state = RunState::new("train");
        state.set_valid_metric("loss", 0.5);
        state.set_valid_metric("accuracy", 0.9);

        match state.valid_metric("f1") {
            Err(Error::MissingMetric { metric, available }) => {
                assert_eq!(metric, "f1");
                assert_eq!(available, vec!["accuracy".to_string(), "loss".to_string()]);
            }
            other => panic!("expected MissingMetric, got {other:?}"),
        }
    }

    #[test]
    fn metric_from_tensor() -> Result<()> {
        let mut state = RunState::new("train");
        state.set_valid_metric_tensor("loss", &Tensor::new(0.25f32, &Device::Cpu)?)?;
        state.set_valid_metric_tensor("acc", &Tensor::new(&[0.75f32], &Device::Cpu)?)?;
        assert_eq!(state.valid_metric("loss")?, 0.25);
        assert_eq!(state.valid_metric("acc")?, 0.75);

        let err = state
            .set_valid_metric_tensor("bad", &Tensor::new(&[1f32, 2.], &Device::Cpu)?)
            .unwrap_err();
        assert!(matches!(err, Error::NonScalarMetric { elements: 2, .. }));
        Ok(())
    }

    #[test]
    fn begin_stage_keeps_stop_flag() {
        let mut state = RunState::new("train");
        state.stage_epoch = 4;
        state.stage_epoch_log = 5;
        state.loader_step = 10;
        state.set_valid_metric("loss", 1.0);
        state.request_early_stop();

        state.begin_stage("valid");
        assert_eq!(state.stage_name, "valid");
        assert_eq!(state.stage_epoch, 0);
        assert_eq!(state.loader_step, 0);
        assert!(state.valid_metrics.is_empty());
        assert!(state.need_early_stop);

        state.clear_early_stop();
        assert!(!state.need_early_stop);
    }
}
