//! Demo workload used by the `perf-check` binary.
//!
//! `scramble` is a small arithmetic kernel mixing squaring, addition and floor
//! division; `floor_div_table` builds a random correctness table for
//! [`floor_div`].

use rand::Rng;

use crate::correctness::TestCase;
use crate::error::OperationError;

/// Division rounding towards negative infinity.
pub fn floor_div(a: i64, b: i64) -> Result<i64, OperationError> {
    let q = a
        .checked_div(b)
        .ok_or_else(|| OperationError::failed(format!("cannot divide {} by {}", a, b)))?;
    if a % b != 0 && ((a < 0) != (b < 0)) {
        Ok(q - 1)
    } else {
        Ok(q)
    }
}

/// Three rounds of square, add, floor-divide and negate, with wrapping
/// arithmetic. Fails when a round hits a zero divisor.
pub fn scramble(x: i64, y: i64) -> Result<i64, OperationError> {
    let (mut x, mut y) = (x, y);
    for _ in 0..3 {
        x = x.wrapping_mul(x).wrapping_add(y);
        y = floor_div(x, y)?;
        y = y.wrapping_mul(y);
        x = y.wrapping_sub(x);
        y = y.wrapping_neg();
    }
    Ok(x.wrapping_sub(y))
}

/// `cases` random `floor_div` cases with operands in `-1000..=1000`, checked
/// against a floating point floor, plus one zero-divisor case that cannot
/// succeed.
pub fn floor_div_table<R: Rng>(rng: &mut R, cases: usize) -> Vec<TestCase<(i64, i64), i64>> {
    let mut table: Vec<_> = (0..cases)
        .map(|_| {
            let a = rng.random_range(-1000..=1000i64);
            let mut b = rng.random_range(1..=1000i64);
            if rng.random_bool(0.5) {
                b = -b;
            }
            let expected = (a as f64 / b as f64).floor() as i64;
            TestCase::new(format!("{} // {}", a, b), (a, b), expected)
        })
        .collect();
    table.push(TestCase::new("zero divisor", (1, 0), 0));
    table
}
