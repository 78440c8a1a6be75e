//! The experiment engine — owns the population, the clock and the one RNG.
//!
//! RULES:
//!   - The config is validated before anything is built.
//!   - One simulated day per clock tick; the clock decides when to stop.
//!   - Aggregation and comparison only read the population.

use crate::{
    aggregate::{aggregate, AggregatedResult},
    clock::DayClock,
    config::ExperimentConfig,
    error::ExperimentResult,
    rng::ExperimentRng,
    significance::{compare_with, Metric, MetricComparison},
    simulator::{DayActivity, ExperimentSimulator},
    subject::{generate_population, Subject},
    types::{Cohort, Day},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Everything a reporter needs from a finished (or partial) run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentOutcome {
    pub seed:        u64,
    pub start_date:  NaiveDate,
    /// Last simulated date; None if no day has run.
    pub end_date:    Option<NaiveDate>,
    pub days_run:    Day,
    pub results:     BTreeMap<Cohort, AggregatedResult>,
    pub comparisons: BTreeMap<Metric, MetricComparison>,
}

pub struct ExperimentEngine {
    pub config:     ExperimentConfig,
    pub clock:      DayClock,
    pub population: Vec<Subject>,
    simulator:      ExperimentSimulator,
    rng:            ExperimentRng,
}

impl ExperimentEngine {
    /// Validate the config and build population, clock and RNG.
    pub fn build(config: ExperimentConfig) -> ExperimentResult<Self> {
        config.validate()?;
        let population = generate_population(&config);
        log::info!(
            "experiment built: seed={} subjects={} days={} from {}",
            config.seed,
            population.len(),
            config.horizon_days,
            config.start_date
        );
        Ok(Self {
            clock:      DayClock::new(config.start_date, config.horizon_days),
            simulator:  ExperimentSimulator::from_config(&config),
            rng:        ExperimentRng::new(config.seed),
            population,
            config,
        })
    }

    /// Small deterministic engine for tests.
    pub fn build_test(seed: u64) -> ExperimentResult<Self> {
        Self::build(ExperimentConfig { seed, ..ExperimentConfig::default_test() })
    }

    /// Simulate the next calendar day. Returns None once the horizon is
    /// exhausted.
    pub fn tick(&mut self) -> Option<DayActivity> {
        let (day, date) = self.clock.advance()?;
        let activity = self.simulator.simulate_day(&mut self.population, &mut self.rng);
        log::debug!(
            "day={day} date={date} active={} clicks={} purchases={} revenue={:.2}",
            activity.active,
            activity.clicks,
            activity.purchases,
            activity.revenue
        );
        Some(activity)
    }

    /// Run up to n days. Stops early at the end of the horizon and
    /// returns the number of days actually simulated.
    pub fn run_days(&mut self, n: Day) -> Day {
        let mut ran = 0;
        while ran < n && self.tick().is_some() {
            ran += 1;
        }
        ran
    }

    pub fn run_to_completion(&mut self) -> Day {
        let remaining = self.clock.remaining();
        let ran = self.run_days(remaining);
        log::info!("experiment finished after {} days", self.clock.days_elapsed);
        ran
    }

    pub fn results(&self) -> BTreeMap<Cohort, AggregatedResult> {
        aggregate(&self.population)
    }

    pub fn outcome(&self) -> ExperimentResult<ExperimentOutcome> {
        let results = self.results();
        let comparisons = compare_with(&results, self.config.mean_test)?;
        Ok(ExperimentOutcome {
            seed:       self.config.seed,
            start_date: self.clock.start_date,
            end_date:   self.clock.current_date(),
            days_run:   self.clock.days_elapsed,
            results,
            comparisons,
        })
    }
}

/// Build, run the full horizon and report.
pub fn run_experiment(config: ExperimentConfig) -> ExperimentResult<ExperimentOutcome> {
    let mut engine = ExperimentEngine::build(config)?;
    engine.run_to_completion();
    engine.outcome()
}
