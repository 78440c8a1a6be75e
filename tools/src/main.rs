//! ab-runner: headless A/B experiment runner.
//!
//! Usage:
//!   ab-runner --seed 42 --users 10000 --days 30
//!   ab-runner --config experiment.json --json

use abtest_core::{
    engine::{ExperimentEngine, ExperimentOutcome},
    stats::TestKind,
    Cohort, ExperimentConfig, Metric,
};
use anyhow::Result;
use chrono::NaiveDate;
use std::env;

#[derive(serde::Serialize)]
struct RunReport<'a> {
    run_id:  String,
    version: &'static str,
    config:  &'a ExperimentConfig,
    outcome: &'a ExperimentOutcome,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let json_mode = args.iter().any(|a| a == "--json");

    let mut config = match flag_value(&args, "--config") {
        Some(path) => ExperimentConfig::load(path)?,
        None => ExperimentConfig::default(),
    };
    config.seed = parse_arg(&args, "--seed", config.seed)?;
    config.population = parse_arg(&args, "--users", config.population)?;
    config.horizon_days = parse_arg(&args, "--days", config.horizon_days)?;
    if let Some(date) = flag_value(&args, "--start-date") {
        config.start_date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map_err(|e| anyhow::anyhow!("Invalid --start-date {date}: {e}"))?;
    }

    if !json_mode {
        println!("A/B experiment — ab-runner");
        println!("  seed:      {}", config.seed);
        println!("  users:     {}", config.population);
        println!("  days:      {}", config.horizon_days);
        println!("  start:     {}", config.start_date);
        println!();
    }

    let mut engine = ExperimentEngine::build(config)?;
    engine.run_to_completion();
    let outcome = engine.outcome()?;

    if json_mode {
        let report = RunReport {
            run_id:  uuid::Uuid::new_v4().to_string(),
            version: env!("CARGO_PKG_VERSION"),
            config:  &engine.config,
            outcome: &outcome,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&outcome);
    }
    Ok(())
}

fn print_summary(outcome: &ExperimentOutcome) {
    println!("=== RUN SUMMARY ===");
    println!("  days run:  {}", outcome.days_run);
    if let Some(end) = outcome.end_date {
        println!("  dates:     {} .. {end}", outcome.start_date);
    }
    for cohort in Cohort::ALL {
        if let Some(r) = outcome.results.get(&cohort) {
            println!(
                "  {cohort:<10} users={} clicks={} purchases={} revenue={:.2}",
                r.subjects, r.clicks, r.purchases, r.revenue
            );
        }
    }

    for metric in Metric::ALL {
        let Some(cmp) = outcome.comparisons.get(&metric) else {
            continue;
        };
        println!();
        println!("{} Analysis:", metric.name().to_uppercase());
        println!("  Control:   {:.4}", cmp.control_value);
        println!("  Treatment: {:.4}", cmp.treatment_value);
        match cmp.relative_lift {
            Some(lift) => println!("  Relative Improvement: {:.2}%", lift * 100.0),
            None => println!("  Relative Improvement: undefined (control is zero)"),
        }
        match cmp.test {
            Some(test) => {
                let label = match test.kind {
                    TestKind::ChiSquare => "Chi-square statistic",
                    TestKind::StudentT | TestKind::WelchT => "t-statistic",
                };
                println!("  {label}: {:.4}", test.statistic);
                println!("  p-value: {:.4}", test.p_value);
            }
            None => println!("  test: undefined for these counts"),
        }
    }
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

/// Absent flags take the default; a present but unparseable value is an
/// error rather than a silent fallback.
fn parse_arg<T>(args: &[String], flag: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match flag_value(args, flag) {
        Some(raw) => raw
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid {flag} value {raw:?}: {e}")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn absent_flag_uses_default() {
        let a = args(&["ab-runner", "--json"]);
        assert_eq!(parse_arg(&a, "--users", 10_000usize).unwrap(), 10_000);
    }

    #[test]
    fn well_formed_flag_is_parsed() {
        let a = args(&["ab-runner", "--users", "250", "--seed", "7"]);
        assert_eq!(parse_arg(&a, "--users", 10_000usize).unwrap(), 250);
        assert_eq!(parse_arg(&a, "--seed", 42u64).unwrap(), 7);
    }

    #[test]
    fn malformed_flag_is_rejected_not_defaulted() {
        let a = args(&["ab-runner", "--users", "1e4"]);
        let err = parse_arg(&a, "--users", 10_000usize).unwrap_err();
        assert!(err.to_string().contains("--users"), "{err}");
    }
}
