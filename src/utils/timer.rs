//! Cycle-based timing harness.
//!
//! An operation is invoked over and over, one timed call at a time, and the
//! samples of each cycle are averaged into a single value. Two budgets decide
//! when a cycle ends:
//! - count-bounded: a fixed number of iterations (the default)
//! - time-bounded: a wall-clock budget in seconds
//!
//! Failed invocations never escape the harness. They are logged and handled
//! differently per mode: a time-bounded cycle skips the failed sample and keeps
//! going, a count-bounded cycle stops at the first failure.

use std::fmt::Display;
use std::io::{self, Write};
use std::time::Duration;

use super::bench::{measure_once, now, CycleAccumulator, QuietPanics};
use super::cpu_affinity::{CorePin, PinStrategy};
use super::report::{print_results, write_results};

// ============================================================================
// Configuration
// ============================================================================

/// Configuration for a benchmark run
#[derive(Clone, Debug, PartialEq)]
pub struct TimingConfig {
    /// Invocations per count-bounded cycle (default: 100000)
    pub iterations_per_cycle: usize,
    /// Wall-clock budget per cycle; when set (and non-zero) it replaces
    /// `iterations_per_cycle` (default: unset)
    pub seconds_per_cycle: Option<f64>,
    /// Number of cycles (default: 7)
    pub number_of_cycles: usize,
    /// Print the report before returning (default: true)
    pub print_output: bool,
    /// Thread pinning during measurement (default: Off)
    pub pin_strategy: PinStrategy,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            iterations_per_cycle: 100_000,
            seconds_per_cycle: None,
            number_of_cycles: 7,
            print_output: true,
            pin_strategy: PinStrategy::default(),
        }
    }
}

/// How a single cycle is bounded
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CycleBudget {
    Iterations(usize),
    Seconds(f64),
}

impl TimingConfig {
    /// The active budget. A zero second budget counts as unset.
    pub fn budget(&self) -> CycleBudget {
        match self.seconds_per_cycle {
            Some(seconds) if seconds != 0.0 => CycleBudget::Seconds(seconds),
            _ => CycleBudget::Iterations(self.iterations_per_cycle),
        }
    }
}

// ============================================================================
// Harness
// ============================================================================

/// Benchmark `operation` called with `args` and return the mean duration of
/// every cycle that produced at least one sample, in nanoseconds.
///
/// The returned series is never longer than `config.number_of_cycles` and is
/// empty when no cycle produced a sample (including zero cycles or a zero
/// iteration count, which are not rejected).
///
/// A panicking operation is caught like an `Err`. While the harness runs, the
/// panic hook is silenced on the calling thread; the panic message shows up in
/// the `Failed on cycle ..` warning instead.
pub fn run<A, R, E, F>(operation: F, args: &A, config: &TimingConfig) -> Vec<f64>
where
    F: FnMut(&A) -> Result<R, E>,
    E: Display,
{
    let overall_results = measure_series(operation, args, config);
    if config.print_output {
        print_results(&overall_results);
    }
    overall_results
}

/// Same as [`run`], writing the report to `out` instead of stdout.
pub fn run_to<W, A, R, E, F>(
    out: &mut W,
    operation: F,
    args: &A,
    config: &TimingConfig,
) -> io::Result<Vec<f64>>
where
    W: Write,
    F: FnMut(&A) -> Result<R, E>,
    E: Display,
{
    let overall_results = measure_series(operation, args, config);
    if config.print_output {
        write_results(out, &overall_results)?;
    }
    Ok(overall_results)
}

fn measure_series<A, R, E, F>(mut operation: F, args: &A, config: &TimingConfig) -> Vec<f64>
where
    F: FnMut(&A) -> Result<R, E>,
    E: Display,
{
    let budget = config.budget();
    let _quiet = QuietPanics::new();
    let _run_pin = (config.pin_strategy == PinStrategy::WholeRun).then(CorePin::current);

    let mut overall_results = Vec::with_capacity(config.number_of_cycles);
    for cycle in 0..config.number_of_cycles {
        let _cycle_pin = (config.pin_strategy == PinStrategy::PerCycle).then(CorePin::current);
        let samples = match budget {
            CycleBudget::Seconds(seconds) => time_bounded_cycle(&mut operation, args, cycle, seconds),
            CycleBudget::Iterations(iterations) => {
                count_bounded_cycle(&mut operation, args, cycle, iterations)
            }
        };
        if let Some(cycle_mean) = samples.mean() {
            overall_results.push(cycle_mean);
        }
    }

    log::debug!(
        "{} of {} cycles produced samples",
        overall_results.len(),
        config.number_of_cycles
    );
    overall_results
}

/// Wall-clock budget of one cycle.
///
/// Positive budgets too large for a `Duration` (including infinity) run
/// unbounded; negative or NaN ones give a deadline that has already passed.
fn cycle_duration(seconds: f64) -> Duration {
    Duration::try_from_secs_f64(seconds).unwrap_or(if seconds > 0.0 {
        Duration::MAX
    } else {
        Duration::ZERO
    })
}

/// Measure until the budget runs out; failed calls are skipped.
fn time_bounded_cycle<A, R, E, F>(
    operation: &mut F,
    args: &A,
    cycle: usize,
    seconds: f64,
) -> CycleAccumulator
where
    F: FnMut(&A) -> Result<R, E>,
    E: Display,
{
    let budget = cycle_duration(seconds);
    let start = now();
    let mut samples = CycleAccumulator::new();
    while start.elapsed() < budget {
        match measure_once(operation, args) {
            Ok(ns) => samples.push(ns),
            Err(e) => log::warn!("Failed on cycle {}: {}", cycle, e),
        }
    }
    samples
}

/// Measure up to `iterations` calls; the first failure ends the cycle.
fn count_bounded_cycle<A, R, E, F>(
    operation: &mut F,
    args: &A,
    cycle: usize,
    iterations: usize,
) -> CycleAccumulator
where
    F: FnMut(&A) -> Result<R, E>,
    E: Display,
{
    let mut samples = CycleAccumulator::new();
    for iteration in 0..iterations {
        match measure_once(operation, args) {
            Ok(ns) => samples.push(ns),
            Err(e) => {
                log::warn!("Failed on cycle {}, iteration {}: {}", cycle, iteration, e);
                break;
            }
        }
    }
    samples
}

// ============================================================================
// Builder
// ============================================================================

/// Builder around [`run`].
///
/// ```ignore
/// let series = Bench::new(|&(x, y): &(i64, i64)| x.checked_add(y).ok_or("overflow"))
///     .args((55, 2))
///     .cycles(3)
///     .iterations_per_cycle(1_000)
///     .run();
/// ```
pub struct Bench<A, F> {
    operation: F,
    args: Option<A>,
    config: TimingConfig,
}

impl<A, F> Bench<A, F> {
    pub fn new(operation: F) -> Self {
        Self {
            operation,
            args: None,
            config: TimingConfig::default(),
        }
    }

    /// Arguments passed to every invocation. Defaults to `A::default()`.
    pub fn args(mut self, args: A) -> Self {
        self.args = Some(args);
        self
    }

    pub fn config(mut self, config: TimingConfig) -> Self {
        self.config = config;
        self
    }

    pub fn iterations_per_cycle(mut self, iterations: usize) -> Self {
        self.config.iterations_per_cycle = iterations;
        self
    }

    /// Switch to time-bounded cycles.
    pub fn seconds_per_cycle(mut self, seconds: f64) -> Self {
        self.config.seconds_per_cycle = Some(seconds);
        self
    }

    pub fn cycles(mut self, cycles: usize) -> Self {
        self.config.number_of_cycles = cycles;
        self
    }

    pub fn print_output(mut self, print: bool) -> Self {
        self.config.print_output = print;
        self
    }

    pub fn pin_strategy(mut self, strategy: PinStrategy) -> Self {
        self.config.pin_strategy = strategy;
        self
    }

    /// Run the benchmark and return the cycle means in nanoseconds.
    pub fn run<R, E>(self) -> Vec<f64>
    where
        A: Default,
        F: FnMut(&A) -> Result<R, E>,
        E: Display,
    {
        let args = self.args.unwrap_or_default();
        run(self.operation, &args, &self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::time::Instant;

    fn quiet(cycles: usize, iterations: usize) -> TimingConfig {
        TimingConfig {
            iterations_per_cycle: iterations,
            number_of_cycles: cycles,
            print_output: false,
            ..TimingConfig::default()
        }
    }

    fn quiet_printing(cycles: usize, iterations: usize) -> TimingConfig {
        TimingConfig {
            print_output: true,
            ..quiet(cycles, iterations)
        }
    }

    fn timed(cycles: usize, seconds: f64) -> TimingConfig {
        TimingConfig {
            seconds_per_cycle: Some(seconds),
            ..quiet(cycles, 100_000)
        }
    }

    #[test]
    fn test_defaults() {
        let config = TimingConfig::default();
        assert_eq!(config.iterations_per_cycle, 100_000);
        assert_eq!(config.seconds_per_cycle, None);
        assert_eq!(config.number_of_cycles, 7);
        assert!(config.print_output);
        assert_eq!(config.budget(), CycleBudget::Iterations(100_000));
    }

    #[test]
    fn test_budget_selection() {
        assert_eq!(timed(1, 0.5).budget(), CycleBudget::Seconds(0.5));
        assert_eq!(timed(1, 0.0).budget(), CycleBudget::Iterations(100_000));
    }

    #[test]
    fn test_count_bounded_series_length() {
        let calls = Cell::new(0usize);
        let series = run(
            |&(x, y): &(i64, i64)| {
                calls.set(calls.get() + 1);
                Ok::<_, String>(x + y)
            },
            &(55, 2),
            &quiet(4, 250),
        );
        assert_eq!(series.len(), 4);
        assert_eq!(calls.get(), 1_000);
        assert!(series.iter().all(|v| v.is_finite() && *v >= 0.0));
    }

    #[test]
    fn test_cycle_mean_bounded_by_self_timed_calls() {
        // Each call records its own duration; the harness brackets the call
        // from outside, so its mean can only be at least the inner mean.
        let inner = RefCell::new(Vec::new());
        let series = run(
            |d: &Duration| {
                let start = Instant::now();
                std::thread::sleep(*d);
                inner.borrow_mut().push(start.elapsed().as_nanos() as f64);
                Ok::<_, String>(())
            },
            &Duration::from_micros(200),
            &quiet(1, 10),
        );
        let inner = inner.into_inner();
        assert_eq!(series.len(), 1);
        assert_eq!(inner.len(), 10);
        let inner_mean = inner.iter().sum::<f64>() / inner.len() as f64;
        assert!(series[0] >= inner_mean);
        assert!(series[0] >= 200_000.0);
    }

    #[test]
    fn test_always_failing_count_bounded_is_empty() {
        let calls = Cell::new(0usize);
        let series = run(
            |_: &()| {
                calls.set(calls.get() + 1);
                Err::<(), _>("always fails")
            },
            &(),
            &quiet(5, 1_000),
        );
        assert!(series.is_empty());
        // Every cycle aborts on its first iteration
        assert_eq!(calls.get(), 5);
    }

    #[test]
    fn test_always_failing_time_bounded_is_empty() {
        let calls = Cell::new(0usize);
        let series = run(
            |_: &()| {
                calls.set(calls.get() + 1);
                Err::<(), _>("always fails")
            },
            &(),
            &timed(2, 0.005),
        );
        assert!(series.is_empty());
        // Failures keep the loop going until the deadline
        assert!(calls.get() > 2);
    }

    #[test]
    fn test_count_bounded_failure_aborts_cycle() {
        // Fails on the third call of the first cycle only
        let calls = Cell::new(0usize);
        let series = run(
            |_: &()| {
                calls.set(calls.get() + 1);
                if calls.get() == 3 {
                    Err("third call")
                } else {
                    Ok(())
                }
            },
            &(),
            &quiet(2, 10),
        );
        // 3 calls in cycle 0 (two samples), 10 in cycle 1
        assert_eq!(calls.get(), 13);
        assert_eq!(series.len(), 2);
    }

    #[test]
    fn test_count_bounded_failure_on_first_call_drops_cycle() {
        let calls = Cell::new(0usize);
        let series = run(
            |_: &()| {
                calls.set(calls.get() + 1);
                if calls.get() == 1 {
                    Err("first call")
                } else {
                    Ok(())
                }
            },
            &(),
            &quiet(3, 5),
        );
        assert_eq!(calls.get(), 11);
        assert_eq!(series.len(), 2);
    }

    #[test]
    fn test_time_bounded_skips_failures_and_continues() {
        let calls = Cell::new(0usize);
        let series = run(
            |_: &()| {
                calls.set(calls.get() + 1);
                if calls.get() % 2 == 0 {
                    Err("even call")
                } else {
                    Ok(())
                }
            },
            &(),
            &timed(3, 0.005),
        );
        assert_eq!(series.len(), 3);
        assert!(calls.get() > 6);
    }

    #[test]
    fn test_time_bounded_respects_budget() {
        let start = Instant::now();
        let series = run(|_: &()| Ok::<_, String>(()), &(), &timed(3, 0.01));
        let elapsed = start.elapsed();
        assert_eq!(series.len(), 3);
        assert!(elapsed >= Duration::from_millis(30));
    }

    #[test]
    fn test_time_bounded_ignores_iteration_count() {
        let calls = Cell::new(0usize);
        let config = TimingConfig {
            iterations_per_cycle: 1,
            ..timed(1, 0.005)
        };
        run(
            |_: &()| {
                calls.set(calls.get() + 1);
                Ok::<_, String>(())
            },
            &(),
            &config,
        );
        assert!(calls.get() > 1);
    }

    #[test]
    fn test_panics_are_contained() {
        let series = run(
            |_: &()| -> Result<(), String> { panic!("operation exploded") },
            &(),
            &quiet(2, 10),
        );
        assert!(series.is_empty());
    }

    #[test]
    fn test_malformed_config_yields_empty_series() {
        let op = |_: &()| Ok::<_, String>(());
        assert!(run(op, &(), &quiet(0, 100)).is_empty());
        assert!(run(op, &(), &quiet(3, 0)).is_empty());
        assert!(run(op, &(), &timed(3, -1.0)).is_empty());
        assert!(run(op, &(), &timed(3, f64::NAN)).is_empty());
    }

    #[test]
    fn test_builder_defaults_args_per_call() {
        let seen = RefCell::new(Vec::new());
        let series = Bench::new(|v: &Vec<i32>| {
            seen.borrow_mut().push(v.len());
            Ok::<_, String>(())
        })
        .cycles(2)
        .iterations_per_cycle(3)
        .print_output(false)
        .run();
        assert_eq!(series.len(), 2);
        assert_eq!(*seen.borrow(), vec![0; 6]);
    }

    #[test]
    fn test_builder_with_args_and_pinning() {
        let series = Bench::new(|&(x, y): &(u64, u64)| x.checked_mul(y).ok_or("overflow"))
            .args((55, 2))
            .cycles(2)
            .iterations_per_cycle(100)
            .pin_strategy(PinStrategy::PerCycle)
            .print_output(false)
            .run();
        assert_eq!(series.len(), 2);

        let series = Bench::new(|&(x, y): &(u64, u64)| x.checked_mul(y).ok_or("overflow"))
            .args((u64::MAX, 2))
            .cycles(2)
            .iterations_per_cycle(100)
            .pin_strategy(PinStrategy::WholeRun)
            .print_output(false)
            .run();
        assert!(series.is_empty());
    }

    #[test]
    fn test_printing_does_not_change_result() {
        let series = Bench::new(|_: &()| Ok::<_, String>(()))
            .cycles(2)
            .iterations_per_cycle(10)
            .run();
        assert_eq!(series.len(), 2);
    }

    #[test]
    fn test_report_matches_returned_series() {
        let mut out = Vec::new();
        let series =
            run_to(&mut out, |_: &()| Ok::<_, String>(()), &(), &quiet_printing(3, 50)).unwrap();
        assert_eq!(series.len(), 3);

        let mut expected = Vec::new();
        write_results(&mut expected, &series).unwrap();
        assert!(!out.is_empty());
        assert_eq!(out, expected);
        assert!(String::from_utf8(out).unwrap().starts_with("Average: "));
    }

    #[test]
    fn test_report_skipped_when_printing_disabled() {
        let mut out = Vec::new();
        let series = run_to(&mut out, |_: &()| Ok::<_, String>(()), &(), &quiet(2, 10)).unwrap();
        assert_eq!(series.len(), 2);
        assert!(out.is_empty());
    }

    #[test]
    fn test_report_empty_for_failing_operation() {
        let mut out = Vec::new();
        let series =
            run_to(&mut out, |_: &()| Err::<(), _>("nope"), &(), &quiet_printing(2, 10)).unwrap();
        assert!(series.is_empty());
        assert!(out.is_empty());
    }

    #[test]
    fn test_oversized_budgets_run_unbounded() {
        assert_eq!(cycle_duration(f64::INFINITY), Duration::MAX);
        assert_eq!(cycle_duration(1e20), Duration::MAX);
        assert_eq!(cycle_duration(0.25), Duration::from_millis(250));
        assert_eq!(cycle_duration(-1.0), Duration::ZERO);
        assert_eq!(cycle_duration(f64::NEG_INFINITY), Duration::ZERO);
        assert_eq!(cycle_duration(f64::NAN), Duration::ZERO);
    }

    #[test]
    fn test_infinite_budget_still_calls_operation() {
        // The cycle never ends, so it runs on its own thread; once enough
        // calls were seen the operation parks that thread for good.
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;

        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        std::thread::spawn(move || {
            run(
                move |_: &()| {
                    if seen.fetch_add(1, Ordering::Relaxed) >= 1_000 {
                        loop {
                            std::thread::park();
                        }
                    }
                    Ok::<_, String>(())
                },
                &(),
                &timed(1, f64::INFINITY),
            )
        });

        let start = Instant::now();
        while calls.load(Ordering::Relaxed) < 1_000 {
            assert!(start.elapsed() < Duration::from_secs(10), "operation was never called");
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn test_zero_sample_cycles_produce_no_mean() {
        let mut refuse = |_: &()| Err::<(), _>("nope");
        assert_eq!(count_bounded_cycle(&mut refuse, &(), 0, 10).mean(), None);
        assert_eq!(time_bounded_cycle(&mut refuse, &(), 0, 0.002).mean(), None);

        let mut fine = |_: &()| Ok::<_, String>(());
        let acc = count_bounded_cycle(&mut fine, &(), 0, 10);
        assert_eq!(acc.count(), 10);
        assert!(acc.mean().is_some());
    }
}
