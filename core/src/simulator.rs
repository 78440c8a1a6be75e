//! The per-subject, per-day user journey.
//!
//! DRAW ORDER (fixed, never reordered):
//!   for each day, for each subject in population order:
//!     1. activity roll
//!     2. click roll            (active subjects only)
//!     3. purchase roll         (after a click only)
//!     4. order value, 2 draws  (after a purchase only)
//!
//! Changing this order changes every seeded result.

use crate::{
    config::{CohortParams, ExperimentConfig},
    error::ExperimentResult,
    rng::ExperimentRng,
    subject::Subject,
    types::{Cohort, Day},
};
use serde::{Deserialize, Serialize};

/// What happened across the whole population on one day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DayActivity {
    pub active:    u64,
    pub clicks:    u64,
    pub purchases: u64,
    pub revenue:   f64,
}

/// Validated journey parameters. Construction is the only place a bad
/// probability can be rejected; simulation itself never fails.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExperimentSimulator {
    activity_probability: f64,
    control:              CohortParams,
    treatment:            CohortParams,
}

impl ExperimentSimulator {
    pub fn new(
        activity_probability: f64,
        control: CohortParams,
        treatment: CohortParams,
    ) -> ExperimentResult<Self> {
        let config = ExperimentConfig {
            activity_probability,
            control,
            treatment,
            ..ExperimentConfig::default()
        };
        config.validate()?;
        Ok(Self::from_config(&config))
    }

    /// Build from an already validated config.
    pub fn from_config(config: &ExperimentConfig) -> Self {
        Self {
            activity_probability: config.activity_probability,
            control:              config.control,
            treatment:            config.treatment,
        }
    }

    fn params(&self, cohort: Cohort) -> &CohortParams {
        match cohort {
            Cohort::Control   => &self.control,
            Cohort::Treatment => &self.treatment,
        }
    }

    /// Simulate `num_days` consecutive days over the population.
    /// Returns the summed activity. Per-day logging belongs to the caller
    /// that owns the calendar.
    pub fn run(&self, population: &mut [Subject], num_days: Day, rng: &mut ExperimentRng) -> DayActivity {
        let mut total = DayActivity::default();
        for _ in 0..num_days {
            let activity = self.simulate_day(population, rng);
            total.active += activity.active;
            total.clicks += activity.clicks;
            total.purchases += activity.purchases;
            total.revenue += activity.revenue;
        }
        total
    }

    /// Simulate one day for every subject, in population order.
    pub fn simulate_day(&self, population: &mut [Subject], rng: &mut ExperimentRng) -> DayActivity {
        let mut activity = DayActivity::default();
        for subject in population.iter_mut() {
            if !rng.chance(self.activity_probability) {
                continue;
            }
            activity.active += 1;
            self.simulate_journey(subject, rng, &mut activity);
        }
        activity
    }

    fn simulate_journey(&self, subject: &mut Subject, rng: &mut ExperimentRng, activity: &mut DayActivity) {
        let params = *self.params(subject.cohort);

        if !rng.chance(params.click_probability) {
            return;
        }
        subject.record_click();
        activity.clicks += 1;

        if !rng.chance(params.purchase_probability) {
            return;
        }
        let order_value = rng
            .normal(params.order_value_mean, params.order_value_std)
            .max(0.0);
        subject.record_purchase(order_value);
        activity.purchases += 1;
        activity.revenue += order_value;
    }
}
