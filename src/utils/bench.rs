//! Shared measurement utilities.
//!
//! All durations are wall-clock nanoseconds taken from [`std::time::Instant`],
//! which is monotonic and never goes backwards.

use std::cell::Cell;
use std::fmt::Display;
use std::hint::black_box;
use std::panic::{self, catch_unwind, AssertUnwindSafe};
use std::sync::Once;
use std::time::Instant;

use crate::error::OperationError;

/// One duration sample in nanoseconds.
pub type Measurement = u64;

/// Read the monotonic clock
#[inline(always)]
pub fn now() -> Instant {
    Instant::now()
}

/// Nanoseconds elapsed since `start`
#[inline(always)]
pub fn elapsed_nanos(start: Instant) -> Measurement {
    start.elapsed().as_nanos() as Measurement
}

/// Call `operation` once, turning both an `Err` and a panic into an
/// [`OperationError`].
pub fn invoke<A, R, E, F>(operation: &mut F, args: &A) -> Result<R, OperationError>
where
    F: FnMut(&A) -> Result<R, E>,
    E: Display,
{
    match catch_unwind(AssertUnwindSafe(|| operation(args))) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(OperationError::failed(e)),
        Err(payload) => Err(OperationError::from_panic(payload)),
    }
}

/// Time a single invocation.
///
/// The start timestamp is taken right before the call and the end timestamp
/// right after it returns; nothing is amortized across calls.
#[inline(always)]
pub fn measure_once<A, R, E, F>(operation: &mut F, args: &A) -> Result<Measurement, OperationError>
where
    F: FnMut(&A) -> Result<R, E>,
    E: Display,
{
    let start = now();
    let outcome = invoke(operation, args);
    let elapsed = elapsed_nanos(start);
    outcome.map(|value| {
        black_box(value);
        elapsed
    })
}

/// Running count and sum of one cycle's samples.
///
/// Samples are folded in as they arrive; nothing is kept per call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CycleAccumulator {
    count: u64,
    sum: u128,
}

impl CycleAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline(always)]
    pub fn push(&mut self, sample: Measurement) {
        self.count += 1;
        self.sum += sample as u128;
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    /// Arithmetic mean of the cycle, `None` when it has no sample.
    pub fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum as f64 / self.count as f64)
    }
}

// ============================================================================
// Panic output
// ============================================================================

thread_local! {
    static QUIET_PANICS: Cell<bool> = const { Cell::new(false) };
}

static INSTALL_HOOK: Once = Once::new();

/// Silences the panic hook on the current thread while alive.
///
/// Panics of the operation are caught and logged with their message, so the
/// default hook would only repeat them on stderr once per failed call. Other
/// threads keep the previous hook's output.
pub struct QuietPanics {
    was_quiet: bool,
}

impl QuietPanics {
    pub fn new() -> Self {
        INSTALL_HOOK.call_once(|| {
            let previous = panic::take_hook();
            panic::set_hook(Box::new(move |info| {
                if !QUIET_PANICS.with(Cell::get) {
                    previous(info);
                }
            }));
        });
        Self {
            was_quiet: QUIET_PANICS.with(|q| q.replace(true)),
        }
    }

    /// Whether panics on this thread are currently silenced.
    pub fn active() -> bool {
        QUIET_PANICS.with(Cell::get)
    }
}

impl Default for QuietPanics {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for QuietPanics {
    fn drop(&mut self) {
        QUIET_PANICS.with(|q| q.set(self.was_quiet));
    }
}
