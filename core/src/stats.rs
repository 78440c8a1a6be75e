//! Numeric helpers shared by the aggregator and the significance tester.
//!
//! RULE: every ratio in the crate goes through safe_ratio so a zero
//! denominator means the same thing everywhere.

use serde::{Deserialize, Serialize};
use statrs::distribution::{ChiSquared, ContinuousCDF, StudentsT};

/// `num / den`, or None when the denominator is zero or the result is
/// not a finite number.
pub fn safe_ratio(num: f64, den: f64) -> Option<f64> {
    if den == 0.0 {
        return None;
    }
    let r = num / den;
    r.is_finite().then_some(r)
}

/// Running sufficient statistics (n, Σx, Σx²) of a sample.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SampleMoments {
    pub count:  u64,
    pub sum:    f64,
    pub sum_sq: f64,
}

impl SampleMoments {
    pub fn push(&mut self, x: f64) {
        self.count += 1;
        self.sum += x;
        self.sum_sq += x * x;
    }

    /// Fold in pre-summed moments, e.g. one subject's orders.
    pub fn merge(&mut self, count: u64, sum: f64, sum_sq: f64) {
        self.count += count;
        self.sum += sum;
        self.sum_sq += sum_sq;
    }

    pub fn mean(&self) -> Option<f64> {
        safe_ratio(self.sum, self.count as f64)
    }

    /// Unbiased sample variance; None below two observations.
    pub fn sample_variance(&self) -> Option<f64> {
        if self.count < 2 {
            return None;
        }
        let n = self.count as f64;
        let centered = self.sum_sq - self.sum * self.sum / n;
        // Cancellation can leave a tiny negative residue for constant samples.
        safe_ratio(centered.max(0.0), n - 1.0)
    }

    pub fn sample_std(&self) -> Option<f64> {
        self.sample_variance().map(f64::sqrt)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestKind {
    ChiSquare,
    StudentT,
    WelchT,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TestOutcome {
    pub kind:               TestKind,
    pub statistic:          f64,
    pub p_value:            f64,
    pub degrees_of_freedom: f64,
}

/// Pearson chi-square test of independence on a 2×2 table with Yates'
/// continuity correction. Rows are groups, columns are (success, failure).
///
/// Returns None when any cell is negative or not finite, or when any
/// expected frequency is zero, i.e. a whole row or column is empty.
pub fn chi_square_2x2(table: [[f64; 2]; 2]) -> Option<TestOutcome> {
    if table.iter().flatten().any(|&cell| !(cell.is_finite() && cell >= 0.0)) {
        return None;
    }
    let rows = [table[0][0] + table[0][1], table[1][0] + table[1][1]];
    let cols = [table[0][0] + table[1][0], table[0][1] + table[1][1]];
    let total = rows[0] + rows[1];

    let mut statistic = 0.0;
    for (i, row) in table.iter().enumerate() {
        for (j, &observed) in row.iter().enumerate() {
            let expected = safe_ratio(rows[i] * cols[j], total)?;
            if expected <= 0.0 {
                return None;
            }
            // Shift each observation half a unit toward its expectation,
            // never past it.
            let deviation = ((observed - expected).abs() - 0.5).max(0.0);
            statistic += deviation * deviation / expected;
        }
    }

    let dist = ChiSquared::new(1.0).ok()?;
    Some(TestOutcome {
        kind: TestKind::ChiSquare,
        statistic,
        p_value: dist.sf(statistic).clamp(0.0, 1.0),
        degrees_of_freedom: 1.0,
    })
}

/// Summary of one sample for a two-sample mean test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleSummary {
    pub mean: f64,
    pub std:  f64,
    pub n:    f64,
}

/// Two-sided two-sample t-test from summary statistics.
/// The statistic is `(a.mean - b.mean) / se`.
///
/// `pooled` selects Student's equal-variance test, otherwise Welch's.
/// Returns None when either sample has fewer than two observations or the
/// standard error degenerates.
pub fn t_test_from_stats(a: SampleSummary, b: SampleSummary, pooled: bool) -> Option<TestOutcome> {
    if a.n < 2.0 || b.n < 2.0 {
        return None;
    }
    let (va, vb) = (a.std * a.std, b.std * b.std);

    let (kind, se, df) = if pooled {
        let df = a.n + b.n - 2.0;
        let pooled_var = ((a.n - 1.0) * va + (b.n - 1.0) * vb) / df;
        (TestKind::StudentT, (pooled_var * (1.0 / a.n + 1.0 / b.n)).sqrt(), df)
    } else {
        let (vna, vnb) = (va / a.n, vb / b.n);
        let df = safe_ratio(
            (vna + vnb).powi(2),
            vna * vna / (a.n - 1.0) + vnb * vnb / (b.n - 1.0),
        )?;
        (TestKind::WelchT, (vna + vnb).sqrt(), df)
    };

    let statistic = safe_ratio(a.mean - b.mean, se)?;
    if !(df.is_finite() && df > 0.0) {
        return None;
    }
    let dist = StudentsT::new(0.0, 1.0, df).ok()?;
    Some(TestOutcome {
        kind,
        statistic,
        p_value: (2.0 * dist.sf(statistic.abs())).clamp(0.0, 1.0),
        degrees_of_freedom: df,
    })
}
