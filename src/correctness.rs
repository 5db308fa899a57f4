//! Table-driven correctness checking.

use std::any::type_name;
use std::fmt::{Debug, Display};
use std::io::{self, Write};

use crate::utils::bench::{invoke, QuietPanics};

/// One row of a correctness table.
#[derive(Clone, Debug, PartialEq)]
pub struct TestCase<A, T> {
    pub name: String,
    pub args: A,
    pub expected: T,
}

impl<A, T> TestCase<A, T> {
    pub fn new(name: impl Into<String>, args: A, expected: T) -> Self {
        Self {
            name: name.into(),
            args,
            expected,
        }
    }
}

/// Run `operation` against every case of `table`, print a pass count and
/// return the names of the failing cases in table order.
///
/// A case fails when the operation errors (or panics) or when its result
/// differs from the expected value. A failing case never stops the remaining
/// ones from running.
pub fn check_correctness<A, T, E, F>(operation: F, table: &[TestCase<A, T>]) -> Vec<String>
where
    F: FnMut(&A) -> Result<T, E>,
    T: PartialEq + Debug,
    E: Display,
{
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut sink = SummaryWriter::new(&mut out);
    let failed = run_table(operation, table, &mut sink);
    if let Some(e) = sink.error {
        log::error!("could not print correctness summary: {}", e);
    }
    failed
}

/// Same as [`check_correctness`], writing the summary line to `out`.
pub fn check_correctness_to<W, A, T, E, F>(
    out: &mut W,
    operation: F,
    table: &[TestCase<A, T>],
) -> io::Result<Vec<String>>
where
    W: Write,
    F: FnMut(&A) -> Result<T, E>,
    T: PartialEq + Debug,
    E: Display,
{
    let mut sink = SummaryWriter::new(out);
    let failed = run_table(operation, table, &mut sink);
    match sink.error {
        Some(e) => Err(e),
        None => Ok(failed),
    }
}

/// Remembers the first write error instead of aborting the table.
struct SummaryWriter<'w, W: Write> {
    out: &'w mut W,
    error: Option<io::Error>,
}

impl<'w, W: Write> SummaryWriter<'w, W> {
    fn new(out: &'w mut W) -> Self {
        Self { out, error: None }
    }

    fn line(&mut self, text: std::fmt::Arguments<'_>) {
        if self.error.is_none() {
            if let Err(e) = writeln!(self.out, "{}", text) {
                self.error = Some(e);
            }
        }
    }
}

fn run_table<W, A, T, E, F>(
    mut operation: F,
    table: &[TestCase<A, T>],
    sink: &mut SummaryWriter<'_, W>,
) -> Vec<String>
where
    W: Write,
    F: FnMut(&A) -> Result<T, E>,
    T: PartialEq + Debug,
    E: Display,
{
    let _quiet = QuietPanics::new();
    let mut failed = Vec::new();
    let mut passed = 0usize;

    for case in table {
        let actual = match invoke(&mut operation, &case.args) {
            Ok(actual) => actual,
            Err(e) => {
                log::warn!("Test {} failed to execute! - {}", case.name, e);
                failed.push(case.name.clone());
                continue;
            }
        };

        if actual == case.expected {
            passed += 1;
        } else {
            log::warn!(
                "Test {} failed, expected {:?} of type {}, got {:?} of type {}!",
                case.name,
                case.expected,
                type_name::<T>(),
                actual,
                type_name::<T>()
            );
            failed.push(case.name.clone());
        }
    }

    sink.line(format_args!("Passed {}/{} tests!", passed, table.len()));
    failed
}
