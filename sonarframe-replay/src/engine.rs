//! Listener + producer replay engine (spec §4.5, §5).
//!
//! Grounded on `stream7k.c` (file-driven frame server loop) and `frames7k.c` (timestamp pacing).
//! One `TcpListener::incoming()` thread accepts clients and spawns a writer thread per connection;
//! one producer thread drives a [`sonarframe_in::StreamParser`] over the capture and paces
//! delivery against the embedded 7K timestamps. Both observe a shared "stop requested" flag at
//! every loop turn (spec §5 cancellation model).
use std::io::Write;
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::channel;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{debug, info, warn};

use sonarframe_core::bitconverter::seven_k_time_to_seconds_of_day;
use sonarframe_core::enums::{FrameMode, RecordTypeId, RemconId};
use sonarframe_core::errors::SonarframeError;
use sonarframe_core::header_structs::{Remcon7500Rth, SubscribeBody};
use sonarframe_core::settings::ParserSettings;
use sonarframe_in::transport::{FileTransport, TcpTransport};
use sonarframe_in::{ParseStatus, StreamParser};

use crate::fanout::{ClientHandle, FanoutList};
use crate::pacing::clamp_delay;

/// Tunables for one replay session, mirroring the CLI flag surface of spec §6.
#[derive(Debug, Clone)]
pub struct ReplayConfig {
    pub min_delay: Duration,
    pub max_delay: Duration,
    /// `0` replays the capture forever (until the stop flag is set); `N > 0` stops after `N`
    /// passes.
    pub cycles: u32,
    pub frame_mode: FrameMode,
    pub buffer_capacity: usize,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        ReplayConfig {
            min_delay: Duration::ZERO,
            max_delay: Duration::from_secs(5),
            cycles: 1,
            frame_mode: FrameMode::DrfStream,
            buffer_capacity: sonarframe_core::MAX_FRAME_BYTES as usize,
        }
    }
}

/// Owns the fan-out list and the process-wide stop flag shared by the listener and producer
/// threads.
pub struct ReplayEngine {
    config: ReplayConfig,
    clients: Arc<FanoutList>,
    stop: Arc<AtomicBool>,
    next_client_id: Arc<AtomicU64>,
}

impl ReplayEngine {
    /// `stop` is the process-wide cancellation flag (spec §5): pass in a flag a SIGINT handler
    /// also holds so an external shutdown request and this engine's own loops observe the same
    /// state.
    pub fn new(config: ReplayConfig, stop: Arc<AtomicBool>) -> Self {
        ReplayEngine {
            config,
            clients: Arc::new(FanoutList::new()),
            stop,
            next_client_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// The flag this engine observes for cooperative shutdown.
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        self.stop.clone()
    }

    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    /// A shared handle to the fan-out list, for callers (e.g. a heartbeat thread) that want to
    /// report on the engine's state from outside this struct's lifetime.
    pub fn clients_handle(&self) -> Arc<FanoutList> {
        self.clients.clone()
    }

    /// Spawns the listener thread: accepts connections on `listener`, gives each one a writer
    /// thread draining its fan-out channel, and a reader thread that applies any REMCON subscribe
    /// request the client sends (grounded on `emu7k.c`'s accept-then-subscribe handshake).
    pub fn spawn_listener(&self, listener: TcpListener) -> JoinHandle<()> {
        listener.set_nonblocking(true).ok();
        let clients = self.clients.clone();
        let stop = self.stop.clone();
        let next_id = self.next_client_id.clone();

        thread::spawn(move || loop {
            if stop.load(Ordering::SeqCst) {
                return;
            }
            match listener.accept() {
                Ok((stream, addr)) => {
                    let id = next_id.fetch_add(1, Ordering::SeqCst);
                    info!("replay client {} connected from {}", id, addr);
                    spawn_client(id, stream, &clients, &stop);
                }
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    thread::sleep(Duration::from_millis(50));
                }
                Err(e) => {
                    warn!("listener accept failed: {}", e);
                    thread::sleep(Duration::from_millis(50));
                }
            }
        })
    }

    /// Runs the producer loop on the calling thread: replays `path` through `config.cycles`
    /// passes (or forever, if `cycles == 0`), pacing dispatch to the fan-out list against each
    /// frame's embedded 7K timestamp.
    pub fn run_producer(&self, path: &str) -> Result<(), SonarframeError> {
        let mut pass = 0u32;
        loop {
            if self.stop.load(Ordering::SeqCst) {
                return Ok(());
            }
            self.replay_once(path)?;
            pass += 1;
            if self.config.cycles != 0 && pass >= self.config.cycles {
                return Ok(());
            }
        }
    }

    fn replay_once(&self, path: &str) -> Result<(), SonarframeError> {
        let mut transport = FileTransport::open(path)?;
        let settings = ParserSettings::new(self.config.frame_mode, self.config.buffer_capacity);
        let mut parser = StreamParser::new(settings);
        let mut last_seconds: Option<f64> = None;

        loop {
            if self.stop.load(Ordering::SeqCst) {
                return Ok(());
            }
            match parser.poll(&mut transport, 0)? {
                ParseStatus::Frame(frame) => {
                    let seconds = seven_k_time_to_seconds_of_day(&frame.drf.seven_k_time);
                    if let Some(prev) = last_seconds {
                        let delay = clamp_delay(seconds - prev, self.config.min_delay, self.config.max_delay);
                        thread::sleep(delay);
                    }
                    last_seconds = Some(seconds);
                    debug!("dispatching record_type_id {} ({} bytes)", frame.drf.record_type_id, frame.raw.len());
                    self.clients.dispatch(frame.drf.record_type_id, &frame.raw);
                }
                ParseStatus::NeedMore => return Ok(()),
                ParseStatus::Resyncing | ParseStatus::Stale(_) => continue,
            }
        }
    }
}

fn spawn_client(id: u64, stream: TcpStream, clients: &Arc<FanoutList>, stop: &Arc<AtomicBool>) {
    let writer_stream = match stream.try_clone() {
        Ok(s) => s,
        Err(e) => {
            warn!("client {}: could not clone socket: {}", id, e);
            return;
        }
    };
    let (tx, rx) = channel::<Vec<u8>>();
    clients.add(ClientHandle::new(id, tx));

    thread::spawn(move || {
        let mut writer = writer_stream;
        for frame in rx {
            if writer.write_all(&frame).is_err() {
                return;
            }
        }
    });

    let clients = clients.clone();
    let stop = stop.clone();
    thread::spawn(move || read_subscribe_requests(id, stream, &clients, &stop));
}

/// Reads REMCON subscribe requests from `stream` and narrows `id`'s fan-out subscription
/// accordingly, until the connection closes or the stop flag is set.
fn read_subscribe_requests(id: u64, stream: TcpStream, clients: &Arc<FanoutList>, stop: &Arc<AtomicBool>) {
    let mut transport = TcpTransport::from_stream(stream);
    let settings = ParserSettings::new(FrameMode::DrfStream, sonarframe_core::MAX_FRAME_BYTES as usize);
    let mut parser = StreamParser::new(settings);

    loop {
        if stop.load(Ordering::SeqCst) {
            return;
        }
        match parser.poll(&mut transport, 200) {
            Ok(ParseStatus::Frame(frame)) => {
                if frame.drf.record_type_id != RecordTypeId::Remcon as u32 {
                    continue;
                }
                let payload = &frame.raw[frame.payload_range.clone()];
                if payload.len() < Remcon7500Rth::ENCODED_LEN {
                    continue;
                }
                let rth = match Remcon7500Rth::decode(payload) {
                    Ok(rth) => rth,
                    Err(_) => continue,
                };
                if rth.remcon_id != RemconId::Sub {
                    continue;
                }
                let body = SubscribeBody::decode(&payload[Remcon7500Rth::ENCODED_LEN..]);
                debug!("client {} subscribed to {:?}", id, body.ids);
                clients.set_subscription(id, body.ids.into_iter().collect());
            }
            Ok(ParseStatus::NeedMore) | Ok(ParseStatus::Resyncing) | Ok(ParseStatus::Stale(_)) => continue,
            Err(_) => return,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use std::net::TcpStream as StdTcpStream;

    fn write_capture(path: &str, frames: &[(u32, sonarframe_core::header_structs::SevenKTime, &[u8])]) {
        use std::fs::File;
        let mut f = File::create(path).unwrap();
        for (record_type_id, ts, payload) in frames {
            let header = sonarframe_core::header_structs::DataRecordFrame {
                protocol_version: sonarframe_core::DRF_PROTO,
                offset: sonarframe_core::DRF_SIZE as u16,
                sync_pattern: sonarframe_core::DRF_SYNC,
                size: 0,
                optional_data_offset: 0,
                optional_data_id: 0,
                seven_k_time: *ts,
                record_version: 1,
                record_type_id: *record_type_id,
                device_id: 7_125,
                system_enumerator: 200,
                flags: 0,
                fragment_total: 1,
                fragment_index: 0,
            };
            let bytes = sonarframe_out::encode_drf(&header, payload, false);
            f.write_all(&bytes).unwrap();
        }
    }

    #[test]
    fn replayed_frames_reach_a_connected_client() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let path = tmp.path().to_str().unwrap().to_string();
        let ts = sonarframe_core::header_structs::SevenKTime { year: 2024, day: 1, seconds: 0.0, hours: 0, minutes: 0 };
        write_capture(&path, &[(7027, ts, &[1, 2, 3, 4])]);

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let stop = Arc::new(AtomicBool::new(false));
        let engine = ReplayEngine::new(ReplayConfig { cycles: 1, ..ReplayConfig::default() }, stop);
        let _listener_handle = engine.spawn_listener(listener);

        let mut client = StdTcpStream::connect(addr).unwrap();
        client.set_read_timeout(Some(Duration::from_secs(2))).unwrap();

        while engine.client_count() == 0 {
            thread::sleep(Duration::from_millis(10));
        }

        engine.run_producer(&path).unwrap();

        let mut buf = [0u8; 4096];
        let n = client.read(&mut buf).unwrap();
        assert!(n >= sonarframe_core::DRF_SIZE as usize);
        let decoded = sonarframe_core::header_structs::DataRecordFrame::decode(&buf[..sonarframe_core::DRF_SIZE as usize]);
        assert_eq!(decoded.record_type_id, 7027);

        engine.stop_flag().store(true, Ordering::SeqCst);
    }
}
