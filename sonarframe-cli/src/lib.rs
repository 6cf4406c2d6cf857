//! Shared CLI flag groups and small runtime helpers for the driver binaries under `src/bin/`
//! (spec §6 "Driver tooling interfaces"). Each binary flattens the subset of these groups it
//! actually uses into its own `clap::Parser` struct, rather than accepting flags it ignores.
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use clap::Args;
use log::info;

/// `--host`/`--port`: where to listen (`emu7k`) or connect (`subtest`, `em710pub`'s UDP target).
#[derive(Args, Debug, Clone)]
pub struct NetworkArgs {
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,
    #[arg(long, default_value_t = 7_000)]
    pub port: u16,
}

impl NetworkArgs {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// `--cycles`/`--min-delay`/`--max-delay`/`--restart`: replay pacing (spec §4.5/§8 scenario 6).
#[derive(Args, Debug, Clone)]
pub struct PacingArgs {
    #[arg(long = "min-delay", default_value_t = 0.0)]
    pub min_delay_secs: f64,
    #[arg(long = "max-delay", default_value_t = 5.0)]
    pub max_delay_secs: f64,
    /// `0` replays forever.
    #[arg(long, default_value_t = 1)]
    pub cycles: u32,
    /// Restart from the beginning of the capture instead of exiting after the last cycle.
    #[arg(long)]
    pub restart: bool,
}

impl PacingArgs {
    pub fn min_delay(&self) -> Duration {
        Duration::from_secs_f64(self.min_delay_secs.max(0.0))
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_secs_f64(self.max_delay_secs.max(0.0))
    }

    pub fn effective_cycles(&self) -> u32 {
        if self.restart {
            0
        } else {
            self.cycles
        }
    }
}

/// `--verbose`/`--hbeat`: logging and periodic status reporting.
#[derive(Args, Debug, Clone)]
pub struct LoggingArgs {
    #[arg(long, short = 'v')]
    pub verbose: bool,
    /// Emit a status line every `N` seconds; omitted disables the heartbeat.
    #[arg(long)]
    pub hbeat: Option<u64>,
}

/// Initializes `env_logger` at `debug` (if `--verbose`) or `info`.
pub fn init_logging(args: &LoggingArgs) {
    let level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

/// Installs a SIGINT handler that flips a cooperative stop flag, checked each turn by every
/// long-running loop in this crate (spec §5 cancellation model) so shutdown exits `0`.
pub fn install_stop_flag() -> Arc<AtomicBool> {
    let stop = Arc::new(AtomicBool::new(false));
    let handler_flag = stop.clone();
    let _ = ctrlc::set_handler(move || {
        handler_flag.store(true, Ordering::SeqCst);
    });
    stop
}

/// Spawns a background thread that logs `status()` every `interval_secs`, if set.
pub fn spawn_heartbeat(
    interval_secs: Option<u64>,
    stop: Arc<AtomicBool>,
    status: impl Fn() -> String + Send + 'static,
) -> Option<thread::JoinHandle<()>> {
    let interval_secs = interval_secs?;
    Some(thread::spawn(move || {
        while !stop.load(Ordering::SeqCst) {
            thread::sleep(Duration::from_secs(interval_secs));
            if stop.load(Ordering::SeqCst) {
                break;
            }
            info!("{}", status());
        }
    }))
}

/// Maps a `Result` to the exit code convention of spec §6: `0` on success, non-zero otherwise.
pub fn exit_code<T>(result: &Result<T, sonarframe_core::errors::SonarframeError>) -> i32 {
    match result {
        Ok(_) => 0,
        Err(_) => 1,
    }
}
