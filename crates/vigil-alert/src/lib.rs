//! Alert rule engine: evaluates metric samples against configured rules.
//!
//! Each rule walks a small state machine (quiet, breaching, firing) driven
//! by the [`evaluator::Evaluator`]. A breach has to hold for the rule's
//! duration before an alert opens, at most one alert per rule is open at a
//! time, and a cooldown after each resolution keeps a recovering metric from
//! re-firing straight away. [`manager::AlertManager`] is the thread-safe
//! façade the rest of a process talks to.

pub mod alert_store;
pub mod defaults;
pub mod error;
pub mod evaluator;
pub mod manager;
pub mod rule_store;
pub mod source;


pub use error::{AlertError, Result};
pub use evaluator::{AlertOutput, RulePhase};
pub use manager::AlertManager;
pub use source::{LatestValues, MetricSource};
