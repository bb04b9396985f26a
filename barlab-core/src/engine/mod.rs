//! Engine: the bar loop, signal sizing, and the run result.

pub mod event_loop;
pub mod sizing;
pub mod state;

pub use event_loop::{run_backtest, Engine};
pub use sizing::{default_quantity, resolve_quantity, SizingInputs};
pub use state::{EngineError, RunResult};
