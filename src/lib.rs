//! # Micro-Perf-Check
//!
//! A small cycle-based micro-benchmark harness and a table-driven correctness
//! checker.
//!
//! ```ignore
//! use micro_perf_check::prelude::*;
//!
//! let series = Bench::new(|&(x, y): &(i64, i64)| micro_perf_check::demo::scramble(x, y))
//!     .args((55, 2))
//!     .run();
//!
//! let failed = check_correctness(
//!     |&(a, b): &(i64, i64)| Ok::<_, OperationError>(a + b),
//!     &[TestCase::new("add ok", (2, 3), 5)],
//! );
//! ```

pub mod correctness;
pub mod demo;
pub mod error;
pub mod utils;

/// Re-export tui from utils for the binary
pub use utils::tui;

pub use correctness::{check_correctness, check_correctness_to, TestCase};
pub use error::OperationError;
pub use utils::report::{print_results, write_results};
pub use utils::timer::{run, run_to, Bench, TimingConfig};

/// Re-export commonly used items
pub mod prelude {
    pub use crate::correctness::{check_correctness, TestCase};
    pub use crate::error::OperationError;
    pub use crate::utils::{print_results, run, Bench, PinStrategy, TimingConfig};
}
