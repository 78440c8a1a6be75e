use crate::{
    config::ExperimentConfig,
    types::{Cohort, SubjectId},
};
use serde::{Deserialize, Serialize};

/// One experiment participant and its running counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    pub subject_id:  SubjectId,
    pub cohort:      Cohort,
    pub clicks:      u64,
    pub purchases:   u64,
    pub total_spent: f64,
    /// Sum of squared order values, kept for the order-value variance.
    pub spent_sq:    f64,
}

impl Subject {
    pub fn new(subject_id: SubjectId, cohort: Cohort) -> Self {
        Self {
            subject_id,
            cohort,
            clicks: 0,
            purchases: 0,
            total_spent: 0.0,
            spent_sq: 0.0,
        }
    }

    pub fn record_click(&mut self) {
        self.clicks += 1;
    }

    pub fn record_purchase(&mut self, order_value: f64) {
        self.purchases += 1;
        self.total_spent += order_value;
        self.spent_sq += order_value * order_value;
    }
}

/// Build the population: control subjects first, then treatment,
/// with ids assigned from the population index.
pub fn generate_population(config: &ExperimentConfig) -> Vec<Subject> {
    let (control, treatment) = config.cohort_sizes();
    let cohorts = std::iter::repeat(Cohort::Control)
        .take(control)
        .chain(std::iter::repeat(Cohort::Treatment).take(treatment));

    let population: Vec<Subject> = cohorts
        .enumerate()
        .map(|(i, cohort)| Subject::new(format!("u-{i:06}"), cohort))
        .collect();

    log::info!(
        "population generated: {} subjects ({control} control / {treatment} treatment)",
        population.len()
    );
    population
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn population_is_partitioned_without_overlap() {
        let cfg = ExperimentConfig { population: 11, ..ExperimentConfig::default() };
        let pop = generate_population(&cfg);
        assert_eq!(pop.len(), 11);

        let ids: HashSet<_> = pop.iter().map(|s| s.subject_id.as_str()).collect();
        assert_eq!(ids.len(), 11, "subject ids must be unique");

        let (control, treatment) = cfg.cohort_sizes();
        assert_eq!(pop.iter().filter(|s| s.cohort == Cohort::Control).count(), control);
        assert_eq!(pop.iter().filter(|s| s.cohort == Cohort::Treatment).count(), treatment);
    }

    #[test]
    fn new_subjects_start_at_zero() {
        let pop = generate_population(&ExperimentConfig::default_test());
        assert!(pop.iter().all(|s| s.clicks == 0 && s.purchases == 0 && s.total_spent == 0.0));
    }

    #[test]
    fn purchase_tracks_square_of_order_value() {
        let mut s = Subject::new("u-000000".into(), Cohort::Control);
        s.record_click();
        s.record_purchase(3.0);
        s.record_purchase(4.0);
        assert_eq!(s.purchases, 2);
        assert_eq!(s.total_spent, 7.0);
        assert_eq!(s.spent_sq, 25.0);
    }
}
