//! Replays an EM710-flavored capture and fans out its swath-bathymetry pings over UDP as
//! plain-text summaries (grounded on `em710pub.c`).
use std::net::UdpSocket;
use std::process::ExitCode;
use std::sync::atomic::Ordering;

use clap::Parser;
use log::{debug, error, info};

use sonarframe_cli::{init_logging, install_stop_flag, spawn_heartbeat, LoggingArgs, NetworkArgs, PacingArgs};
use sonarframe_core::bitconverter::seven_k_time_to_seconds_of_day;
use sonarframe_core::enums::{FrameMode, RecordTypeId};
use sonarframe_core::settings::ParserSettings;
use sonarframe_in::transport::FileTransport;
use sonarframe_in::{ParseStatus, StreamParser};

#[derive(Parser, Debug)]
#[command(about = "Replay a capture and publish its swath-bathymetry pings over UDP")]
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
    /// Output line format: `text` (default) or `csv`.
    #[arg(long, default_value = "text")]
    ofmt: String,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli.logging);
    let stop = install_stop_flag();

    let socket = match UdpSocket::bind("0.0.0.0:0") {
        Ok(s) => s,
        Err(e) => {
            error!("could not open UDP socket: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let dest = cli.network.addr();
    info!("em710pub publishing pings from {} to {}", cli.file, dest);

    let _heartbeat = spawn_heartbeat(cli.logging.hbeat, stop.clone(), || "em710pub: running".to_string());

    let result = run(&cli, &socket, &dest, &stop);
    if let Err(e) = &result {
        error!("publish failed: {}", e);
    }
    ExitCode::from(sonarframe_cli::exit_code(&result) as u8)
}

fn run(
    cli: &Cli,
    socket: &UdpSocket,
    dest: &str,
    stop: &std::sync::Arc<std::sync::atomic::AtomicBool>,
) -> Result<(), sonarframe_core::errors::SonarframeError> {
    let mut cycle = 0u32;
    loop {
        if stop.load(Ordering::SeqCst) {
            return Ok(());
        }
        replay_once(cli, socket, dest, stop)?;
        cycle += 1;
        let cycles = cli.pacing.effective_cycles();
        if cycles != 0 && cycle >= cycles {
            return Ok(());
        }
    }
}

fn replay_once(
    cli: &Cli,
    socket: &UdpSocket,
    dest: &str,
    stop: &std::sync::Arc<std::sync::atomic::AtomicBool>,
) -> Result<(), sonarframe_core::errors::SonarframeError> {
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

                let line = format_ping(&cli.ofmt, &frame);
                debug!("{}", line);
                if let Err(e) = socket.send_to(line.as_bytes(), dest) {
                    error!("udp send failed: {}", e);
                }
            }
            ParseStatus::NeedMore => return Ok(()),
            ParseStatus::Resyncing | ParseStatus::Stale(_) => continue,
        }
    }
}

fn format_ping(ofmt: &str, frame: &sonarframe_in::ParsedFrame) -> String {
    let payload_len = frame.payload_range.len();
    match ofmt {
        "csv" => format!(
            "{},{},{},{}",
            frame.drf.seven_k_time.year, frame.drf.seven_k_time.day, frame.drf.seven_k_time.seconds, payload_len
        ),
        _ => format!(
            "ping at {}-{} {:.3}s, {} payload bytes",
            frame.drf.seven_k_time.year, frame.drf.seven_k_time.day, frame.drf.seven_k_time.seconds, payload_len
        ),
    }
}
