//! Utility modules for timing and reporting.

pub mod bench;
pub mod cpu_affinity;
pub mod report;
pub mod timer;
pub mod tui;

// Re-export commonly used items
pub use bench::{elapsed_nanos, measure_once, now, CycleAccumulator, Measurement, QuietPanics};
pub use cpu_affinity::{CorePin, PinStrategy};
pub use report::{print_results, write_results, ResultSummary, MAGNITUDES};
pub use timer::{run, run_to, Bench, CycleBudget, TimingConfig};
