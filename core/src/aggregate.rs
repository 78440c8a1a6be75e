use crate::{
    stats::{safe_ratio, SampleMoments},
    subject::Subject,
    types::Cohort,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-cohort totals and derived rates.
///
/// Rates with a zero denominator are reported as 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedResult {
    pub subjects:        u64,
    pub clicks:          u64,
    pub purchases:       u64,
    pub revenue:         f64,
    /// clicks / subjects
    pub ctr:             f64,
    /// purchases / clicks
    pub cr:              f64,
    /// revenue / purchases
    pub aov:             f64,
    /// Sample standard deviation of individual order values.
    /// None with fewer than two orders.
    pub order_value_std: Option<f64>,
}

impl AggregatedResult {
    fn from_totals(subjects: u64, clicks: u64, orders: SampleMoments) -> Self {
        Self {
            subjects,
            clicks,
            purchases:       orders.count,
            revenue:         orders.sum,
            ctr:             safe_ratio(clicks as f64, subjects as f64).unwrap_or(0.0),
            cr:              safe_ratio(orders.count as f64, clicks as f64).unwrap_or(0.0),
            aov:             orders.mean().unwrap_or(0.0),
            order_value_std: orders.sample_std(),
        }
    }
}

/// Reduce the population into one record per cohort.
///
/// Both cohorts are always present; an empty population yields all-zero
/// records.
pub fn aggregate(population: &[Subject]) -> BTreeMap<Cohort, AggregatedResult> {
    #[derive(Default)]
    struct Totals {
        subjects: u64,
        clicks:   u64,
        orders:   SampleMoments,
    }

    let mut totals: BTreeMap<Cohort, Totals> =
        Cohort::ALL.iter().map(|&c| (c, Totals::default())).collect();

    for subject in population {
        let t = totals.entry(subject.cohort).or_default();
        t.subjects += 1;
        t.clicks += subject.clicks;
        t.orders.merge(subject.purchases, subject.total_spent, subject.spent_sq);
    }

    totals
        .into_iter()
        .map(|(cohort, t)| (cohort, AggregatedResult::from_totals(t.subjects, t.clicks, t.orders)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subject(i: usize, cohort: Cohort, clicks: u64, orders: &[f64]) -> Subject {
        let mut s = Subject::new(format!("u-{i:06}"), cohort);
        s.clicks = clicks;
        for &v in orders {
            s.record_purchase(v);
        }
        s
    }

    #[test]
    fn sums_counters_and_derives_rates() {
        let pop = vec![
            subject(0, Cohort::Control, 2, &[10.0]),
            subject(1, Cohort::Control, 2, &[30.0]),
            subject(2, Cohort::Control, 0, &[]),
            subject(3, Cohort::Control, 0, &[]),
            subject(4, Cohort::Treatment, 1, &[]),
        ];
        let results = aggregate(&pop);

        let c = &results[&Cohort::Control];
        assert_eq!((c.subjects, c.clicks, c.purchases), (4, 4, 2));
        assert_eq!(c.revenue, 40.0);
        assert_eq!(c.ctr, 1.0);
        assert_eq!(c.cr, 0.5);
        assert_eq!(c.aov, 20.0);
        // Orders 10 and 30: variance 200
        assert!((c.order_value_std.unwrap() - 200f64.sqrt()).abs() < 1e-9);

        let t = &results[&Cohort::Treatment];
        assert_eq!((t.subjects, t.clicks, t.purchases), (1, 1, 0));
        assert_eq!(t.cr, 0.0);
        assert_eq!(t.aov, 0.0);
        assert_eq!(t.order_value_std, None);
    }

    #[test]
    fn empty_population_yields_zero_records_for_both_cohorts() {
        let results = aggregate(&[]);
        assert_eq!(results.len(), 2);
        for r in results.values() {
            assert_eq!((r.subjects, r.clicks, r.purchases), (0, 0, 0));
            assert_eq!((r.revenue, r.ctr, r.cr, r.aov), (0.0, 0.0, 0.0, 0.0));
            assert_eq!(r.order_value_std, None);
        }
    }
}
