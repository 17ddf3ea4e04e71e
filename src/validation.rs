// SPDX-License-Identifier: AGPL-3.0-only

//! Validation harness for the validation binaries.
//!
//! Each binary computes observables, records explicit pass/fail checks
//! against tolerances from [`crate::tolerances`], prints a summary and exits
//! with code 0 (all passed) or 1 (any failed). NaN never passes a numeric
//! check.

use std::fmt::Write;
use std::process;

/// A single recorded check.
#[derive(Debug, Clone)]
pub struct Check {
    pub label: String,
    pub passed: bool,
    /// Observed value, or the worst error for series checks
    pub observed: f64,
    pub expected: f64,
    pub tolerance: f64,
    pub mode: ToleranceMode,
}

/// How a check compares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToleranceMode {
    /// |observed − expected| < tolerance
    Absolute,
    /// |observed − expected| / |expected| < tolerance
    Relative,
    /// Bitwise equality
    Exact,
    /// observed < threshold
    UpperBound,
    /// Worst elementwise relative error of two series, atol = 0
    SeriesRelative,
    /// Pass/fail only
    Flag,
}

impl std::fmt::Display for ToleranceMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Absolute => write!(f, "abs"),
            Self::Relative => write!(f, "rel"),
            Self::Exact => write!(f, "exact"),
            Self::UpperBound => write!(f, "<"),
            Self::SeriesRelative => write!(f, "series rel"),
            Self::Flag => write!(f, "flag"),
        }
    }
}

/// Largest |a − b| / |b| over two equally long series.
///
/// Elements with `b == 0` count as zero error only when `a == 0`. Any NaN
/// or a length mismatch gives NaN.
#[must_use]
pub fn max_relative_error(observed: &[f64], expected: &[f64]) -> f64 {
    if observed.len() != expected.len() {
        return f64::NAN;
    }
    let mut worst: f64 = 0.0;
    for (&a, &b) in observed.iter().zip(expected) {
        let err = if b == 0.0 {
            if a == 0.0 {
                0.0
            } else {
                f64::INFINITY
            }
        } else {
            (a - b).abs() / b.abs()
        };
        if err.is_nan() {
            return f64::NAN;
        }
        worst = worst.max(err);
    }
    worst
}

/// Accumulates checks and produces the summary and exit code.
#[derive(Debug, Default)]
#[must_use]
pub struct ValidationHarness {
    pub name: String,
    pub checks: Vec<Check>,
}

impl ValidationHarness {
    #[must_use = "validation harness must be used to run checks"]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            checks: Vec::new(),
        }
    }

    fn push(
        &mut self,
        label: &str,
        passed: bool,
        observed: f64,
        expected: f64,
        tolerance: f64,
        mode: ToleranceMode,
    ) {
        self.checks.push(Check {
            label: label.to_string(),
            passed,
            observed,
            expected,
            tolerance,
            mode,
        });
    }

    pub fn check_abs(&mut self, label: &str, observed: f64, expected: f64, tolerance: f64) {
        let passed = (observed - expected).abs() < tolerance;
        self.push(label, passed, observed, expected, tolerance, ToleranceMode::Absolute);
    }

    /// Relative check; falls back to absolute when `expected` is zero.
    pub fn check_rel(&mut self, label: &str, observed: f64, expected: f64, tolerance: f64) {
        let passed = if expected.abs() > f64::EPSILON {
            ((observed - expected) / expected).abs() < tolerance
        } else {
            observed.abs() < tolerance
        };
        self.push(label, passed, observed, expected, tolerance, ToleranceMode::Relative);
    }

    /// Bitwise equality.
    pub fn check_exact(&mut self, label: &str, observed: f64, expected: f64) {
        let passed = observed.to_bits() == expected.to_bits();
        self.push(label, passed, observed, expected, 0.0, ToleranceMode::Exact);
    }

    pub fn check_upper(&mut self, label: &str, observed: f64, threshold: f64) {
        let passed = observed < threshold;
        self.push(label, passed, observed, threshold, threshold, ToleranceMode::UpperBound);
    }

    /// Elementwise relative agreement of two series with zero absolute slack.
    pub fn check_series_rel(
        &mut self,
        label: &str,
        observed: &[f64],
        expected: &[f64],
        tolerance: f64,
    ) {
        let worst = max_relative_error(observed, expected);
        self.push(label, worst <= tolerance, worst, 0.0, tolerance, ToleranceMode::SeriesRelative);
    }

    pub fn check_bool(&mut self, label: &str, passed: bool) {
        self.push(label, passed, f64::from(u8::from(passed)), 1.0, 0.0, ToleranceMode::Flag);
    }

    #[must_use]
    pub fn passed_count(&self) -> usize {
        self.checks.iter().filter(|c| c.passed).count()
    }

    #[must_use]
    pub const fn total_count(&self) -> usize {
        self.checks.len()
    }

    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.checks.iter().all(|c| c.passed)
    }

    /// Summary table as printed by [`ValidationHarness::finish`].
    #[must_use]
    pub fn summary(&self) -> String {
        let mut s = String::new();
        let _ = writeln!(
            s,
            "═══ {} validation: {}/{} checks passed ═══",
            self.name,
            self.passed_count(),
            self.total_count()
        );
        for check in &self.checks {
            let icon = if check.passed { "✓" } else { "✗" };
            let _ = writeln!(
                s,
                "  {icon} {}: observed={:.6e}, expected={:.6e}, tol={:.2e} ({})",
                check.label, check.observed, check.expected, check.tolerance, check.mode
            );
        }
        s
    }

    /// Print the summary and exit: 0 if every check passed, 1 otherwise.
    pub fn finish(&self) -> ! {
        println!();
        print!("{}", self.summary());
        if self.all_passed() {
            println!("ALL CHECKS PASSED");
            process::exit(0);
        }
        let failed: Vec<&str> = self
            .checks
            .iter()
            .filter(|c| !c.passed)
            .map(|c| c.label.as_str())
            .collect();
        println!("FAILED CHECKS: {}", failed.join(", "));
        process::exit(1);
    }
}
