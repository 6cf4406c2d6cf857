//! Stub serial-port analogue of `em710pub`: replays a capture and logs the same ping summaries
//! that would otherwise go out a serial line, over a mock transport (grounded on `emserpub.c`).
//! Geophysical interpretation of the published values is explicitly out of scope (spec §1).
use std::process::ExitCode;
use std::sync::atomic::Ordering;

use clap::Parser;
use log::{error, info};

use sonarframe_cli::{init_logging, install_stop_flag, spawn_heartbeat, LoggingArgs, PacingArgs};
use sonarframe_core::bitconverter::seven_k_time_to_seconds_of_day;
use sonarframe_core::enums::{FrameMode, RecordTypeId};
use sonarframe_core::settings::ParserSettings;
use sonarframe_in::transport::FileTransport;
use sonarframe_in::{ParseStatus, StreamParser};

#[derive(Parser, Debug)]
#[command(about = "Replay a capture's pings over a mock serial transport")]
struct Cli {
    #[command(flatten)]
    pacing: PacingArgs,
    #[command(flatten)]
    logging: LoggingArgs,
    /// Capture file to replay.
    #[arg(long)]
    file: String,
    /// Station identifier included in each published line.
    #[arg(long, default_value = "0")]
    statn: String,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli.logging);
    let stop = install_stop_flag();
    info!("serialpub publishing pings from {} as station {}", cli.file, cli.statn);

    let _heartbeat = spawn_heartbeat(cli.logging.hbeat, stop.clone(), || "serialpub: running".to_string());

    let result = run(&cli, &stop);
    if let Err(e) = &result {
        error!("publish failed: {}", e);
    }
    ExitCode::from(sonarframe_cli::exit_code(&result) as u8)
}

fn run(cli: &Cli, stop: &std::sync::Arc<std::sync::atomic::AtomicBool>) -> Result<(), sonarframe_core::errors::SonarframeError> {
    let mut cycle = 0u32;
    loop {
        if stop.load(Ordering::SeqCst) {
            return Ok(());
        }
        replay_once(cli, stop)?;
        cycle += 1;
        let cycles = cli.pacing.effective_cycles();
        if cycles != 0 && cycle >= cycles {
            return Ok(());
        }
    }
}

fn replay_once(cli: &Cli, stop: &std::sync::Arc<std::sync::atomic::AtomicBool>) -> Result<(), sonarframe_core::errors::SonarframeError> {
    let mut transport = FileTransport::open(&cli.file)?;
    let settings = ParserSettings::new(FrameMode::DrfStream, sonarframe_core::MAX_FRAME_BYTES as usize);
    let mut parser = StreamParser::new(settings);
    let mut last_seconds: Option<f64> = None;

    loop {
        if stop.load(Ordering::SeqCst) {
            return Ok(());
        }
        match parser.poll(&mut transport, 0)? {
            ParseStatus::Frame(frame) => {
                if frame.drf.record_type_id != RecordTypeId::SwathBathyPing as u32 {
                    continue;
                }
                let seconds = seven_k_time_to_seconds_of_day(&frame.drf.seven_k_time);
                if let Some(prev) = last_seconds {
                    let delay = sonarframe_replay::pacing::clamp_delay(
                        seconds - prev,
                        cli.pacing.min_delay(),
                        cli.pacing.max_delay(),
                    );
                    std::thread::sleep(delay);
                }
                last_seconds = Some(seconds);
                println!("station {} ping at {:.3}s, {} payload bytes", cli.statn, seconds, frame.payload_range.len());
            }
            ParseStatus::NeedMore => return Ok(()),
            ParseStatus::Resyncing | ParseStatus::Stale(_) => continue,
        }
    }
}
