//! Run-limiting and early-stopping callbacks for candle training loops.
//!
//! The training engine owns a [`RunState`] and calls [`Callback`] hooks at the
//! end of every batch and epoch. Callbacks never halt the run themselves; they
//! raise [`RunState::need_early_stop`] and the engine decides when to stop.

pub mod callbacks;
pub mod config;
pub mod error;
pub mod state;

pub use callbacks::{Callback, CallbackList, CallbackOrder, EarlyStopping, Mode, RunLimiter};
pub use config::{CallbackConfig, CallbacksConfig, EarlyStoppingConfig, RunLimiterConfig};
pub use error::{Error, Result};
pub use state::RunState;
