//! Subscribes to a live 7K device (or `emu7k` instance) and prints a summary line for each
//! received DRF, for manual or CI smoke testing (grounded on `mbtnav_cli.c`'s subscribe-and-print
//! mode).
use std::process::ExitCode;
use std::sync::atomic::Ordering;

use clap::Parser;
use log::{error, info};

use sonarframe_cli::{init_logging, install_stop_flag, LoggingArgs, NetworkArgs};
use sonarframe_core::enums::{DeviceMnemonic, FrameMode};
use sonarframe_core::settings::ParserSettings;
use sonarframe_in::transport::TcpTransport;
use sonarframe_in::{ParseStatus, StreamParser, SubscriptionClient};

#[derive(Parser, Debug)]
#[command(about = "Subscribe to a 7K stream and print each received record's summary")]
struct Cli {
    #[command(flatten)]
    network: NetworkArgs,
    #[command(flatten)]
    logging: LoggingArgs,
    /// Device mnemonic to identify as (`T50`, `7125_200`, or `7125_400`).
    #[arg(long, default_value = "7125_200")]
    dev: String,
    /// 7K record_type_ids to subscribe to, comma-separated.
    #[arg(long, value_delimiter = ',', default_value = "7027")]
    ids: Vec<u32>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli.logging);
    let stop = install_stop_flag();

    let device = match DeviceMnemonic::from_cli_name(&cli.dev) {
        Some(d) => d,
        None => {
            error!("unrecognized device mnemonic: {}", cli.dev);
            return ExitCode::FAILURE;
        }
    };

    let result = run(&cli, device, &stop);
    if let Err(e) = &result {
        error!("subscribe failed: {}", e);
    }
    ExitCode::from(sonarframe_cli::exit_code(&result) as u8)
}

fn run(
    cli: &Cli,
    device: DeviceMnemonic,
    stop: &std::sync::Arc<std::sync::atomic::AtomicBool>,
) -> Result<(), sonarframe_core::errors::SonarframeError> {
    let addr = cli.network.addr();
    let mut transport = TcpTransport::connect(&addr)?;
    info!("connected to {}, subscribing to {:?}", addr, cli.ids);

    let client = SubscriptionClient::new(device);
    let ticket = client.subscribe(&mut transport, &cli.ids)?;
    info!("subscribe request sent, ticket {}", ticket);

    let settings = ParserSettings::new(FrameMode::DrfStream, sonarframe_core::MAX_FRAME_BYTES as usize);
    let mut parser = StreamParser::new(settings);

    loop {
        if stop.load(Ordering::SeqCst) {
            return Ok(());
        }
        match parser.poll(&mut transport, 1_000)? {
            ParseStatus::Frame(frame) => {
                let payload = &frame.raw[frame.payload_range.clone()];
                if let Some(reply) = SubscriptionClient::classify_reply(&frame.drf, payload) {
                    println!("reply: {:?}", reply);
                    continue;
                }
                println!(
                    "record_type_id {} at {}-{} {:.3}s, {} payload bytes",
                    frame.drf.record_type_id,
                    frame.drf.seven_k_time.year,
                    frame.drf.seven_k_time.day,
                    frame.drf.seven_k_time.seconds,
                    payload.len()
                );
            }
            ParseStatus::NeedMore | ParseStatus::Resyncing | ParseStatus::Stale(_) => continue,
        }
    }
}
