//! Human-readable reporting of cycle results.
//!
//! A series of cycle means (in nanoseconds) is scaled to a single display unit
//! picked from [`MAGNITUDES`], then printed as average, deviation, minimum and
//! maximum.

use std::fmt;
use std::io::{self, Write};

/// Divisor and unit label, ascending by divisor.
pub const MAGNITUDES: [(f64, &str); 4] = [
    (1.0, "ns"),
    (1_000.0, "μs"),
    (1_000_000.0, "ms"),
    (1_000_000_000.0, "s"),
];

/// Decimal digits in the integer part of a non-negative value.
/// Anything below 1 counts as the single digit `0`.
fn digit_count(value: f64) -> usize {
    let integer = value.trunc().max(0.0) as u128;
    integer.to_string().len()
}

/// Index into [`MAGNITUDES`] for a series spanning `min..=max`.
///
/// Averages the digit counts of both ends, then takes one unit per three
/// digits. Fewer than three average digits would give `-1`; that is clamped
/// to nanoseconds instead of wrapping around to seconds.
pub fn magnitude_index(min: f64, max: f64) -> usize {
    let average_digits = (digit_count(max) + digit_count(min)) / 2;
    let index = (average_digits / 3) as isize - 1;
    index.clamp(0, MAGNITUDES.len() as isize - 1) as usize
}

/// Round to five decimals.
///
/// Rounds the exact decimal value of the double through the standard
/// formatter rather than scaling by 1e5, so `0.000155` (stored just below
/// the half) rounds down to `0.00015`. Exact binary ties follow the formatter's
/// round-half-to-even.
fn round5(value: f64) -> f64 {
    format!("{:.5}", value).parse().unwrap_or(value)
}

/// Statistics of a series, already scaled to `unit`.
#[derive(Clone, Debug, PartialEq)]
pub struct ResultSummary {
    pub average: f64,
    /// Half of the min..max spread, not a standard deviation.
    pub deviation: f64,
    pub minimum: f64,
    pub maximum: f64,
    pub unit: &'static str,
}

impl ResultSummary {
    /// Summarize a series of nanosecond values; `None` for an empty series.
    pub fn from_nanos(series: &[f64]) -> Option<Self> {
        if series.is_empty() {
            return None;
        }

        let min = series.iter().copied().fold(f64::INFINITY, f64::min);
        let max = series.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mean = series.iter().sum::<f64>() / series.len() as f64;

        let (divisor, unit) = MAGNITUDES[magnitude_index(min, max)];

        let average = round5(mean / divisor);
        let minimum = round5(min / divisor);
        let maximum = round5(max / divisor);
        let deviation = round5(((average - minimum) + (maximum - average)) / 2.0);

        Some(Self {
            average,
            deviation,
            minimum,
            maximum,
            unit,
        })
    }
}

/// Format with at most five decimals and no trailing zeros.
fn trim(value: f64) -> String {
    let text = format!("{:.5}", value);
    let text = text.trim_end_matches('0').trim_end_matches('.');
    if text == "-0" {
        "0".to_string()
    } else {
        text.to_string()
    }
}

impl fmt::Display for ResultSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Average: {} {}", trim(self.average), self.unit)?;
        writeln!(f, "Deviation: +/-{} {}", trim(self.deviation), self.unit)?;
        writeln!(f, "Minimum: {} {}", trim(self.minimum), self.unit)?;
        write!(f, "Maximum: {} {}", trim(self.maximum), self.unit)
    }
}

/// Write the four-line report for `series` to `out`. Writes nothing for an
/// empty series.
pub fn write_results<W: Write>(out: &mut W, series: &[f64]) -> io::Result<()> {
    match ResultSummary::from_nanos(series) {
        Some(summary) => writeln!(out, "{}", summary),
        None => Ok(()),
    }
}

/// Print the report for `series` to stdout.
pub fn print_results(series: &[f64]) {
    let stdout = io::stdout();
    if let Err(e) = write_results(&mut stdout.lock(), series) {
        log::error!("could not print results: {}", e);
    }
}
