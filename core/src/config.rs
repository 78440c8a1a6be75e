use crate::{
    clock::DayClock,
    error::{ExperimentError, ExperimentResult},
    types::{Cohort, Day},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Behavioural parameters of one experiment arm.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CohortParams {
    /// P(click | active day).
    pub click_probability:    f64,
    /// P(purchase | click).
    pub purchase_probability: f64,
    pub order_value_mean:     f64,
    pub order_value_std:      f64,
}

impl CohortParams {
    pub fn validate(&self, cohort: Cohort) -> ExperimentResult<()> {
        check_probability(&format!("{cohort}.click_probability"), self.click_probability)?;
        check_probability(&format!("{cohort}.purchase_probability"), self.purchase_probability)?;
        if !self.order_value_mean.is_finite() {
            return Err(ExperimentError::config(
                format!("{cohort}.order_value_mean"),
                format!("must be finite, got {}", self.order_value_mean),
            ));
        }
        if !(self.order_value_std.is_finite() && self.order_value_std >= 0.0) {
            return Err(ExperimentError::config(
                format!("{cohort}.order_value_std"),
                format!("must be finite and >= 0, got {}", self.order_value_std),
            ));
        }
        Ok(())
    }
}

/// Which two-sample mean test the order-value comparison runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeanTest {
    /// Student's t-test with pooled variance.
    #[default]
    Pooled,
    /// Welch's unequal-variance t-test.
    Welch,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    pub seed:                 u64,
    pub population:           usize,
    /// Fraction of the population assigned to treatment.
    pub treatment_share:      f64,
    pub horizon_days:         Day,
    pub start_date:           NaiveDate,
    /// P(active) per subject per day, shared by both cohorts.
    pub activity_probability: f64,
    pub control:              CohortParams,
    pub treatment:            CohortParams,
    pub mean_test:            MeanTest,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            seed:                 42,
            population:           10_000,
            treatment_share:      0.5,
            horizon_days:         30,
            start_date:           NaiveDate::from_ymd_opt(2023, 1, 1).unwrap_or(NaiveDate::MIN),
            activity_probability: 0.1,
            control: CohortParams {
                click_probability:    0.05,
                purchase_probability: 0.02,
                order_value_mean:     50.0,
                order_value_std:      20.0,
            },
            treatment: CohortParams {
                click_probability:    0.06,
                purchase_probability: 0.025,
                order_value_mean:     55.0,
                order_value_std:      22.0,
            },
            mean_test: MeanTest::Pooled,
        }
    }
}

impl ExperimentConfig {
    /// Load from a JSON file. Missing fields fall back to Default.
    /// The result is validated before it is returned.
    pub fn load(path: &str) -> ExperimentResult<Self> {
        let content = std::fs::read_to_string(path)?;
        log::debug!("config loaded from {path}");
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> ExperimentResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Small, fast scenario for tests: 1 000 subjects, 30 days.
    pub fn default_test() -> Self {
        Self {
            population: 1_000,
            ..Self::default()
        }
    }

    pub fn params(&self, cohort: Cohort) -> &CohortParams {
        match cohort {
            Cohort::Control   => &self.control,
            Cohort::Treatment => &self.treatment,
        }
    }

    /// Subjects per cohort as (control, treatment).
    pub fn cohort_sizes(&self) -> (usize, usize) {
        let treatment = (self.population as f64 * self.treatment_share).round() as usize;
        let treatment = treatment.min(self.population);
        (self.population - treatment, treatment)
    }

    /// Fail fast on anything the simulator cannot run with.
    pub fn validate(&self) -> ExperimentResult<()> {
        if self.population == 0 {
            return Err(ExperimentError::config("population", "must be > 0"));
        }
        if self.horizon_days == 0 {
            return Err(ExperimentError::config("horizon_days", "must be > 0"));
        }
        if !(self.treatment_share > 0.0 && self.treatment_share < 1.0) {
            return Err(ExperimentError::config(
                "treatment_share",
                format!("must be in (0, 1), got {}", self.treatment_share),
            ));
        }
        let (control, treatment) = self.cohort_sizes();
        if control == 0 || treatment == 0 {
            return Err(ExperimentError::config(
                "population",
                format!("{} subjects leave a cohort empty at share {}", self.population, self.treatment_share),
            ));
        }
        check_probability("activity_probability", self.activity_probability)?;
        for cohort in Cohort::ALL {
            self.params(cohort).validate(cohort)?;
        }
        if DayClock::new(self.start_date, self.horizon_days).end_date().is_none() {
            return Err(ExperimentError::config(
                "horizon_days",
                format!("{} days from {} overflows the calendar", self.horizon_days, self.start_date),
            ));
        }
        Ok(())
    }
}

fn check_probability(field: &str, p: f64) -> ExperimentResult<()> {
    if (0.0..=1.0).contains(&p) {
        Ok(())
    } else {
        Err(ExperimentError::config(field, format!("must be in [0, 1], got {p}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_of(err: ExperimentError) -> String {
        match err {
            ExperimentError::Config { field, .. } => field,
            other => panic!("expected config error, got {other:?}"),
        }
    }

    #[test]
    fn default_config_is_valid() {
        ExperimentConfig::default().validate().unwrap();
        ExperimentConfig::default_test().validate().unwrap();
    }

    #[test]
    fn even_split_by_default() {
        assert_eq!(ExperimentConfig::default_test().cohort_sizes(), (500, 500));
    }

    #[test]
    fn uneven_share_rounds_treatment() {
        let cfg = ExperimentConfig { population: 10, treatment_share: 0.25, ..ExperimentConfig::default() };
        assert_eq!(cfg.cohort_sizes(), (7, 3));
    }

    #[test]
    fn rejects_zero_population_and_horizon() {
        let cfg = ExperimentConfig { population: 0, ..ExperimentConfig::default() };
        assert_eq!(field_of(cfg.validate().unwrap_err()), "population");

        let cfg = ExperimentConfig { horizon_days: 0, ..ExperimentConfig::default() };
        assert_eq!(field_of(cfg.validate().unwrap_err()), "horizon_days");
    }

    #[test]
    fn rejects_out_of_range_probabilities() {
        let mut cfg = ExperimentConfig::default();
        cfg.treatment.click_probability = 1.2;
        assert_eq!(field_of(cfg.validate().unwrap_err()), "treatment.click_probability");

        let mut cfg = ExperimentConfig::default();
        cfg.control.purchase_probability = -0.1;
        assert_eq!(field_of(cfg.validate().unwrap_err()), "control.purchase_probability");

        let mut cfg = ExperimentConfig::default();
        cfg.activity_probability = f64::NAN;
        assert_eq!(field_of(cfg.validate().unwrap_err()), "activity_probability");
    }

    #[test]
    fn rejects_negative_std() {
        let mut cfg = ExperimentConfig::default();
        cfg.control.order_value_std = -1.0;
        assert_eq!(field_of(cfg.validate().unwrap_err()), "control.order_value_std");
    }

    #[test]
    fn rejects_share_that_empties_a_cohort() {
        let cfg = ExperimentConfig { population: 1, ..ExperimentConfig::default() };
        assert_eq!(field_of(cfg.validate().unwrap_err()), "population");

        let cfg = ExperimentConfig { treatment_share: 1.0, ..ExperimentConfig::default() };
        assert_eq!(field_of(cfg.validate().unwrap_err()), "treatment_share");
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let cfg = ExperimentConfig::from_json(
            r#"{ "seed": 7, "population": 200, "start_date": "2024-03-01", "mean_test": "welch" }"#,
        )
        .unwrap();
        assert_eq!(cfg.seed, 7);
        assert_eq!(cfg.population, 200);
        assert_eq!(cfg.horizon_days, 30);
        assert_eq!(cfg.mean_test, MeanTest::Welch);
        assert_eq!(cfg.start_date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(cfg.control, ExperimentConfig::default().control);
    }

    #[test]
    fn missing_config_file_is_an_io_error() {
        let err = ExperimentConfig::load("/nonexistent/abtest/experiment.json").unwrap_err();
        assert!(matches!(err, ExperimentError::Io(_)), "got {err:?}");
    }

    #[test]
    fn invalid_json_config_is_rejected_at_load() {
        let err = ExperimentConfig::from_json(r#"{ "activity_probability": 2.0 }"#).unwrap_err();
        assert_eq!(field_of(err), "activity_probability");
    }
}
