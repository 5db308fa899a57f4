//! Text output for the CLI.

use terminal_size::{terminal_size, Width};

use super::timer::{CycleBudget, TimingConfig};

/// Get the current terminal width, constrained to a reasonable range
fn get_term_width() -> usize {
    if let Some((Width(w), _)) = terminal_size() {
        (w as usize).clamp(40, 120)
    } else {
        80
    }
}

/// Truncate string with ellipsis if it exceeds width (character-wise)
fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut result: String = s.chars().take(width.saturating_sub(3)).collect();
        result.push_str("...");
        result
    }
}

/// One-line description of how cycles are bounded.
pub fn describe_config(config: &TimingConfig) -> String {
    let budget = match config.budget() {
        CycleBudget::Iterations(n) => format!("{} iterations", n),
        CycleBudget::Seconds(s) => format!("{} s", s),
    };
    format!("{} cycles x {}", config.number_of_cycles, budget)
}

/// Boxed title lines, as wide as the longest line (bounded by the terminal).
fn boxed(lines: &[String], term_width: usize) -> String {
    let max_content = term_width.saturating_sub(4).max(20);
    let content_width = lines
        .iter()
        .map(|l| l.chars().count())
        .max()
        .unwrap_or(0)
        .min(max_content);
    let border = "─".repeat(content_width + 2);

    let mut out = format!("┌{}┐\n", border);
    for line in lines {
        out.push_str(&format!(
            "│ {:<width$} │\n",
            truncate(line, content_width),
            width = content_width
        ));
    }
    out.push_str(&format!("└{}┘", border));
    out
}

/// Print the banner shown before a benchmark
pub fn print_header(target: &str, config: &TimingConfig) {
    let lines = [
        format!("Benchmark: {}", target),
        describe_config(config),
    ];
    println!("{}", boxed(&lines, get_term_width()));
}

/// Print a section title underlined to the terminal width
pub fn print_section(title: &str) {
    let width = get_term_width().min(60);
    println!();
    println!("{}", title);
    println!("{}", "═".repeat(width));
}

pub fn print_help() {
    println!("perf-check - cycle-based micro-benchmark demo");
    println!();
    println!("Usage: perf-check [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --iter N       Iterations per cycle (default: 100000)");
    println!("  --seconds S    Seconds per cycle, overrides --iter");
    println!("  --cycles N     Number of cycles (default: 7)");
    println!("  --quiet        Do not print the timing report");
    println!("  --pin          Pin the thread to its current core during the run");
    println!("  --check        Also run the floor division correctness table");
    println!("  --cases N      Random cases in the correctness table (default: 20)");
    println!("  --seed N       Seed for the correctness table");
    println!("  -h, --help     Show this help");
    println!();
    println!("Set RUST_LOG=warn (or debug) to see failed invocations.");
}
