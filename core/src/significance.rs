//! Cohort comparison: relative lift and a significance test per metric.
//!
//! CTR and CR are tested with a 2×2 chi-square test of independence.
//! AOV is tested with a two-sample t-test built from the true sample
//! standard deviation of order values.

use crate::{
    aggregate::AggregatedResult,
    config::MeanTest,
    error::{ExperimentError, ExperimentResult},
    stats::{chi_square_2x2, safe_ratio, t_test_from_stats, SampleSummary, TestOutcome},
    types::Cohort,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Ctr,
    Cr,
    Aov,
}

impl Metric {
    pub const ALL: [Metric; 3] = [Metric::Ctr, Metric::Cr, Metric::Aov];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Ctr => "ctr",
            Self::Cr  => "cr",
            Self::Aov => "aov",
        }
    }

    pub fn value(&self, result: &AggregatedResult) -> f64 {
        match self {
            Self::Ctr => result.ctr,
            Self::Cr  => result.cr,
            Self::Aov => result.aov,
        }
    }

    /// (successes, trials) behind a rate metric. None for AOV.
    fn counts(&self, result: &AggregatedResult) -> Option<(u64, u64)> {
        match self {
            Self::Ctr => Some((result.clicks, result.subjects)),
            Self::Cr  => Some((result.purchases, result.clicks)),
            Self::Aov => None,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricComparison {
    pub metric:          Metric,
    pub control_value:   f64,
    pub treatment_value: f64,
    /// (treatment - control) / control. None when control is 0.
    pub relative_lift:   Option<f64>,
    /// None when the test is undefined for these aggregates.
    pub test:            Option<TestOutcome>,
}

pub fn relative_lift(control: f64, treatment: f64) -> Option<f64> {
    safe_ratio(treatment - control, control)
}

/// Compare the cohorts with the default (pooled) mean test.
pub fn compare(
    results: &BTreeMap<Cohort, AggregatedResult>,
) -> ExperimentResult<BTreeMap<Metric, MetricComparison>> {
    compare_with(results, MeanTest::Pooled)
}

pub fn compare_with(
    results: &BTreeMap<Cohort, AggregatedResult>,
    mean_test: MeanTest,
) -> ExperimentResult<BTreeMap<Metric, MetricComparison>> {
    let control = cohort(results, Cohort::Control)?;
    let treatment = cohort(results, Cohort::Treatment)?;

    let comparisons = Metric::ALL
        .iter()
        .map(|&metric| {
            let control_value = metric.value(control);
            let treatment_value = metric.value(treatment);
            let test = match (metric.counts(control), metric.counts(treatment)) {
                (Some(c), Some(t)) => rate_test(metric, c, t),
                _ => mean_test_of_orders(control, treatment, mean_test),
            };
            if test.is_none() {
                log::warn!("{metric}: significance test undefined for these aggregates");
            }
            let comparison = MetricComparison {
                metric,
                control_value,
                treatment_value,
                relative_lift: relative_lift(control_value, treatment_value),
                test,
            };
            (metric, comparison)
        })
        .collect();

    Ok(comparisons)
}

fn cohort(
    results: &BTreeMap<Cohort, AggregatedResult>,
    cohort: Cohort,
) -> ExperimentResult<&AggregatedResult> {
    results
        .get(&cohort)
        .ok_or(ExperimentError::MissingCohort { cohort })
}

/// A success/failure table only exists while successes <= trials. CTR
/// counts repeat clicks against subjects, so long horizons with high
/// activity can push clicks past the subject count.
fn rate_test(metric: Metric, (cs, ct): (u64, u64), (ts, tt): (u64, u64)) -> Option<TestOutcome> {
    for (cohort, successes, trials) in [(Cohort::Control, cs, ct), (Cohort::Treatment, ts, tt)] {
        if successes > trials {
            log::warn!(
                "{metric}: {cohort} has {successes} successes over {trials} trials, no 2x2 table"
            );
            return None;
        }
    }
    chi_square_2x2([
        [cs as f64, (ct - cs) as f64],
        [ts as f64, (tt - ts) as f64],
    ])
}

fn mean_test_of_orders(
    control: &AggregatedResult,
    treatment: &AggregatedResult,
    mean_test: MeanTest,
) -> Option<TestOutcome> {
    let summary = |r: &AggregatedResult| -> Option<SampleSummary> {
        Some(SampleSummary {
            mean: r.aov,
            std:  r.order_value_std?,
            n:    r.purchases as f64,
        })
    };
    t_test_from_stats(summary(control)?, summary(treatment)?, mean_test == MeanTest::Pooled)
}
