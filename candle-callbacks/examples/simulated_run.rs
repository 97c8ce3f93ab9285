// Drives the callbacks from a toy host loop. The validation loss stops
// improving after a few epochs, so early stopping ends the run.
//
//     RUST_LOG=debug cargo run --example simulated_run

use anyhow::Result;
use candle::{Device, Tensor};
use candle_callbacks::{CallbacksConfig, RunState};
use tracing_subscriber::EnvFilter;

const CONFIG: &str = r#"
[[callbacks]]
callback = "EarlyStoppingCallback"
patience = 3
metric = "loss"
min_delta = 1e-3

[[callbacks]]
callback = "CheckRunCallback"
num_loader_steps = 1000
num_epoch_steps = 50
"#;

const BATCHES_PER_EPOCH: usize = 8;

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let dev = Device::Cpu;
    let mut callbacks = CallbacksConfig::from_toml_str(CONFIG)?.build()?;
    let mut state = RunState::new("train");

    let targets = Tensor::new(&[1f32, -2., 0.5, 3.], &dev)?;
    'epochs: for epoch in 0..100 {
        state.stage_epoch = epoch + 1;
        state.stage_epoch_log = epoch + 1;

        for step in 1..=BATCHES_PER_EPOCH {
            state.loader_step = step;
            callbacks.on_batch_end(&mut state)?;
            if state.need_early_stop {
                break 'epochs;
            }
        }

        // Predictions approach the targets, then drift away again.
        let t = epoch as f64;
        let offset = 2.0 * (-0.5 * t).exp() + 0.01 * (t - 6.0).max(0.0);
        let preds = (&targets + offset)?;
        let loss = preds.sub(&targets)?.sqr()?.mean_all()?;
        state.set_valid_metric_tensor("loss", &loss)?;
        println!(
            "epoch {:>3} | valid loss {:.5}",
            state.stage_epoch_log,
            state.valid_metric("loss")?
        );

        callbacks.on_epoch_end(&mut state)?;
        if state.need_early_stop {
            break;
        }
    }

    println!("stopped after epoch {}", state.stage_epoch_log);
    Ok(())
}
