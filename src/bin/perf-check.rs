//! Demo driver for the benchmark harness.
//!
//! Usage:
//!   perf-check                      # 7 cycles x 100000 calls of scramble(55, 2)
//!   perf-check --seconds 0.5        # time-bounded cycles
//!   perf-check --check --seed 42    # also run the floor division table
//!   perf-check --help               # Show help

use micro_perf_check::demo::{floor_div, floor_div_table, scramble};
use micro_perf_check::tui;
use micro_perf_check::utils::PinStrategy;
use micro_perf_check::{check_correctness, run, TimingConfig};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::env;

fn parse_or_exit<T: std::str::FromStr>(flag: &str, value: Option<&String>) -> T {
    match value.and_then(|v| v.parse().ok()) {
        Some(parsed) => parsed,
        None => {
            eprintln!("Invalid or missing value for {}", flag);
            std::process::exit(1);
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = env::args().collect();

    // Parse arguments
    let mut config = TimingConfig::default();
    let mut show_help = false;
    let mut run_check = false;
    let mut cases: usize = 20;
    let mut seed: Option<u64> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => show_help = true,
            "--quiet" | "-q" => config.print_output = false,
            "--pin" => config.pin_strategy = PinStrategy::WholeRun,
            "--check" => run_check = true,
            "--iter" => {
                i += 1;
                config.iterations_per_cycle = parse_or_exit("--iter", args.get(i));
            }
            "--seconds" => {
                i += 1;
                config.seconds_per_cycle = Some(parse_or_exit("--seconds", args.get(i)));
            }
            "--cycles" => {
                i += 1;
                config.number_of_cycles = parse_or_exit("--cycles", args.get(i));
            }
            "--cases" => {
                i += 1;
                cases = parse_or_exit("--cases", args.get(i));
            }
            "--seed" => {
                i += 1;
                seed = Some(parse_or_exit("--seed", args.get(i)));
            }
            _ => {
                eprintln!("Unknown option: {}", args[i]);
                std::process::exit(1);
            }
        }
        i += 1;
    }

    if show_help {
        tui::print_help();
        return;
    }

    tui::print_header("scramble(55, 2)", &config);
    let series = run(|&(x, y): &(i64, i64)| scramble(x, y), &(55, 2), &config);
    if series.is_empty() {
        println!("No cycle produced a sample.");
    }

    if run_check {
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let table = floor_div_table(&mut rng, cases);

        tui::print_section("Correctness: floor division");
        let failed = check_correctness(|&(a, b): &(i64, i64)| floor_div(a, b), &table);
        if !failed.is_empty() {
            println!("Failed: {}", failed.join(", "));
        }
    }
}
