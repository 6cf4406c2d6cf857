//! Replays a `.s7k`/NF+DRF capture over TCP, accepting REMCON subscribe/config requests from
//! connecting clients (grounded on `emu7k.c`).
use std::net::TcpListener;
use std::process::ExitCode;

use clap::Parser;
use log::{error, info};

use sonarframe_cli::{init_logging, install_stop_flag, spawn_heartbeat, LoggingArgs, NetworkArgs, PacingArgs};
use sonarframe_core::enums::FrameMode;
use sonarframe_replay::{ReplayConfig, ReplayEngine};

#[derive(Parser, Debug)]
#[command(about = "Replay a 7K capture over TCP to any number of subscribing clients")]
struct Cli {
    #[command(flatten)]
    network: NetworkArgs,
    #[command(flatten)]
    pacing: PacingArgs,
    #[command(flatten)]
    logging: LoggingArgs,
    /// Capture file to replay.
    #[arg(long)]
    file: String,
    /// The capture is a bare DRF stream; without this flag, frames are expected wrapped in NF.
    #[arg(long)]
    nf: bool,
    /// Parser buffer size in bytes.
    #[arg(long, default_value_t = sonarframe_core::MAX_FRAME_BYTES)]
    bsize: u32,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli.logging);
    let stop = install_stop_flag();

    let listener = match TcpListener::bind(cli.network.addr()) {
        Ok(l) => l,
        Err(e) => {
            error!("could not bind {}: {}", cli.network.addr(), e);
            return ExitCode::FAILURE;
        }
    };
    info!("emu7k listening on {}, serving {}", cli.network.addr(), cli.file);

    let frame_mode = if cli.nf { FrameMode::NetStream } else { FrameMode::DrfStream };
    let config = ReplayConfig {
        min_delay: cli.pacing.min_delay(),
        max_delay: cli.pacing.max_delay(),
        cycles: cli.pacing.effective_cycles(),
        frame_mode,
        buffer_capacity: cli.bsize as usize,
    };
    let engine = ReplayEngine::new(config, stop.clone());
    let _listener_handle = engine.spawn_listener(listener);

    let clients = engine.clients_handle();
    let _heartbeat = spawn_heartbeat(cli.logging.hbeat, stop.clone(), move || {
        format!("emu7k: {} client(s) connected", clients.len())
    });

    let result = engine.run_producer(&cli.file);
    if let Err(e) = &result {
        error!("replay failed: {}", e);
    }
    ExitCode::from(sonarframe_cli::exit_code(&result) as u8)
}
