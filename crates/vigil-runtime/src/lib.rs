//! Process-level wiring for the alert engine: configuration, logging, rule
//! seeding and the periodic evaluation loop.

pub mod config;
pub mod logging;
pub mod rule_seed;
pub mod runtime;
pub mod scheduler;

pub use config::RuntimeConfig;
pub use runtime::AlertRuntime;
pub use scheduler::{EvaluationScheduler, TickSummary};
