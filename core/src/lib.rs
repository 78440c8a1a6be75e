//! Seeded two-cohort A/B experiment simulator.
//!
//! A population is split into control and treatment, walked through a
//! daily click → purchase → order-value funnel from a single seeded RNG,
//! reduced into per-cohort rates and compared with significance tests.

pub mod aggregate;
pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod rng;
pub mod significance;
pub mod simulator;
pub mod stats;
pub mod subject;
pub mod types;

pub use aggregate::{aggregate, AggregatedResult};
pub use config::{CohortParams, ExperimentConfig, MeanTest};
pub use engine::{run_experiment, ExperimentEngine, ExperimentOutcome};
pub use error::{ExperimentError, ExperimentResult};
pub use significance::{compare, Metric, MetricComparison};
pub use types::Cohort;
