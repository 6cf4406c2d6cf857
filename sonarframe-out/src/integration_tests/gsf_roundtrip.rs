//! Cross-crate round trips spanning spec §8's literal scenarios: encoding a frame/reply with
//! `sonarframe-out` and decoding it back with `sonarframe-in`.
use sonarframe_core::enums::{DeviceMnemonic, GsfOpenMode, RecordTypeId, RemconId};
use sonarframe_core::header_structs::DataRecordFrame;
use sonarframe_core::settings::ParserSettings;
use sonarframe_core::{FrameMode, DRF_PROTO, DRF_SIZE, DRF_SYNC};
use sonarframe_in::{ByteTransport, GsfReader, ParseStatus, RemconReply, StreamParser, SubscriptionClient};
use sonarframe_in::transport::TransportError;

use crate::gsf_writer::GsfWriter;
use crate::settings::GsfWriteSettings;
use crate::write_data::ArrayWrite;
use crate::write_headers::{encode_drf, encode_remcon_reply};

struct LoopbackTransport {
    to_read: Vec<u8>,
    pos: usize,
    written: Vec<u8>,
}

impl ByteTransport for LoopbackTransport {
    fn read_timeout(&mut self, buf: &mut [u8], _timeout_ms: u32) -> Result<usize, TransportError> {
        if self.pos >= self.to_read.len() {
            return Err(TransportError::Timeout);
        }
        let n = (self.to_read.len() - self.pos).min(buf.len());
        buf[..n].copy_from_slice(&self.to_read[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }

    fn write_all(&mut self, buf: &[u8]) -> Result<(), TransportError> {
        self.written.extend_from_slice(buf);
        Ok(())
    }
}

fn sample_header(record_type_id: u32, size: u32) -> DataRecordFrame {
    use sonarframe_core::header_structs::SevenKTime;
    DataRecordFrame {
        protocol_version: DRF_PROTO,
        offset: DRF_SIZE as u16,
        sync_pattern: DRF_SYNC,
        size,
        optional_data_offset: 0,
        optional_data_id: 0,
        seven_k_time: SevenKTime { year: 2024, day: 50, seconds: 12.5, hours: 3, minutes: 4 },
        record_version: 1,
        record_type_id,
        device_id: 7_125,
        system_enumerator: 200,
        flags: 0,
        fragment_total: 1,
        fragment_index: 0,
    }
}

/// A DRF encoded by `sonarframe-out` parses back cleanly through `sonarframe-in`'s stream parser
/// -- the "clean subscribe" shape of spec §8's literal scenarios.
#[test]
fn encoded_drf_parses_back_through_the_stream_parser() {
    let payload = vec![1u8, 2, 3, 4, 5, 6, 7, 8];
    let bytes = encode_drf(&sample_header(7027, 0), &payload, true);

    let settings = ParserSettings::new(FrameMode::DrfStream, 4096);
    let mut parser = StreamParser::new(settings);
    let mut transport = LoopbackTransport { to_read: bytes, pos: 0, written: Vec::new() };

    loop {
        match parser.poll(&mut transport, 0).unwrap() {
            ParseStatus::Frame(f) => {
                assert_eq!(f.drf.record_type_id, 7027);
                assert_eq!(&f.raw[f.payload_range.clone()], payload.as_slice());
                break;
            }
            ParseStatus::NeedMore | ParseStatus::Resyncing | ParseStatus::Stale(_) => continue,
        }
    }
    assert_eq!(parser.stats().frames_accepted, 1);
}

/// A subscribe request built by `sonarframe-in`'s `SubscriptionClient` gets a REMCON_ACK reply
/// encoded by `sonarframe-out`, which the client's own `classify_reply` then recognizes.
#[test]
fn subscribe_then_server_side_ack_roundtrips() {
    let client = SubscriptionClient::new(DeviceMnemonic::Reson7125_200);
    let mut transport = LoopbackTransport { to_read: Vec::new(), pos: 0, written: Vec::new() };
    let ticket = client.subscribe(&mut transport, &[7027, 1012]).unwrap();

    let mut tracking_number = [0u8; 16];
    tracking_number[0..4].copy_from_slice(&ticket.to_le_bytes());
    let reply_payload = encode_remcon_reply(RemconId::Sub, ticket, tracking_number);
    let reply_drf = sample_header(RecordTypeId::RemconAck as u32, 0);

    let reply = SubscriptionClient::classify_reply(&reply_drf, &reply_payload);
    assert_eq!(reply, Some(RemconReply::Ack { ticket }));
}

/// A GSF file written with `GsfWriter` (changing the depth scale factor across pings via the
/// auto-offset heuristic) reads back through `GsfReader`'s sequential and indexed paths.
#[test]
fn gsf_writer_output_reads_back_with_resolved_scale_factors() {
    let tmp = tempfile::NamedTempFile::new().unwrap();
    let path = tmp.path().to_str().unwrap().to_string();

    let mut settings = GsfWriteSettings::default();
    settings.maintain_index = true;
    let mut writer = GsfWriter::create(&path, settings).unwrap();

    let pings = [(100, vec![12.0, 13.0]), (101, vec![212.0, 213.0]), (102, vec![214.0, 215.0])];
    for (i, (sec, depths)) in pings.iter().enumerate() {
        writer.load_scale_factor_auto_offset(1, 0.01, 2, depths, i == 0).unwrap();
        let arrays = [ArrayWrite { subrecord_id: 1, values: depths }];
        writer.write_ping(*sec, 0, depths.len() as u32, &arrays).unwrap();
    }
    writer.finish().unwrap();

    let mut reader = GsfReader::open(&path, GsfOpenMode::ReadOnlyIndex).unwrap();
    let first = reader.read_ping().unwrap();
    assert_eq!(first.sec, 100);
    for (got, want) in first.arrays[0].values.iter().zip([12.0, 13.0]) {
        assert!((got - want).abs() < 0.02);
    }

    let mut reader = GsfReader::open(&path, GsfOpenMode::ReadOnlyIndex).unwrap();
    let jumped = reader.read_ping_at_or_before(101, 500_000_000).unwrap();
    assert_eq!(jumped.sec, 101);
}
