//! RT scheduling-invariant harness CLI.
//!
//! Runs one game and reports the verdict through the exit code, so CI and
//! test rigs cannot mistake a violation for a soft log line.
//!
//! # Exit Codes
//!
//! - `0`: run completed and the invariant held (final ball_pos == 0)
//! - `1`: invariant violated, or the run aborted (spawn/check-in failure)
//! - `2`: invalid arguments

use sched_football::{run_game, FairHost, FifoHost, GameConfig, Host, LockKind};
use std::env;
use std::process;
use std::sync::Arc;
use std::time::Duration;

fn print_usage(exe: &std::ffi::OsStr) {
    eprintln!(
        "usage: {} [OPTIONS]

OPTIONS:
    --seconds=<N>       Game window length in seconds (default: 10)
    --team-size=<N>     Players per role (default: one per CPU)
    --plain-locks       Use non-boosting locks (expected to FAIL: detection demo)
    --fair              Ignore FIFO ranks; run on the fair scheduler (no privileges
                        needed, expected to FAIL for the same reason)
    --help, -h          Show this help message",
        exe.to_string_lossy()
    );
}

fn main() {
    let mut args = env::args_os();
    let exe = args.next().unwrap_or_else(|| "sched-football".into());

    let mut config = GameConfig::default();
    let mut fair = false;

    for arg in args {
        let Some(flag) = arg.to_str() else {
            eprintln!("invalid argument: {}", arg.to_string_lossy());
            process::exit(2);
        };
        if let Some(value) = flag.strip_prefix("--seconds=") {
            let secs: u64 = value.parse().unwrap_or_else(|_| {
                eprintln!("invalid --seconds value: {value}");
                process::exit(2);
            });
            if secs == 0 {
                eprintln!("--seconds must be > 0");
                process::exit(2);
            }
            config.game_time = Duration::from_secs(secs);
        } else if let Some(value) = flag.strip_prefix("--team-size=") {
            let n: usize = value.parse().unwrap_or_else(|_| {
                eprintln!("invalid --team-size value: {value}");
                process::exit(2);
            });
            if n == 0 {
                eprintln!("--team-size must be > 0");
                process::exit(2);
            }
            config.team_size = Some(n);
        } else if flag == "--plain-locks" {
            config.lock_kind = LockKind::Plain;
        } else if flag == "--fair" {
            fair = true;
        } else if flag == "--help" || flag == "-h" {
            print_usage(&exe);
            process::exit(0);
        } else {
            eprintln!("unknown option: {flag}");
            print_usage(&exe);
            process::exit(2);
        }
    }

    let host: Arc<dyn Host> = if fair {
        Arc::new(FairHost)
    } else {
        Arc::new(FifoHost)
    };

    match run_game(host, config) {
        Ok(report) => {
            println!(
                "PASS team_size={} final_ball_pos={} elapsed_ms={}",
                report.team_size,
                report.final_ball_pos,
                report.elapsed.as_millis()
            );
        }
        Err(err) => {
            eprintln!("FAIL: {err}");
            process::exit(1);
        }
    }
}
