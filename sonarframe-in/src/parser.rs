//! The 7K stream parser: reassembles Network Frames (or bare Data Record Frames) out of a byte
//! stream that may be corrupted, truncated mid-frame, or interleaved with garbage, and
//! resynchronizes byte-wise when it is.
//!
//! Built around a fixed-capacity buffer with explicit offset bookkeeping; the resync state
//! machine itself exists because this wire format, unlike a well-formed on-disk file, can be
//! corrupted or interleaved with garbage in transit.
use sonarframe_core::enums::FrameMode;
use sonarframe_core::errors::SonarframeError;
use sonarframe_core::header_structs::{DataRecordFrame, NetworkFrame};
use sonarframe_core::settings::ParserSettings;
use sonarframe_core::{DRF_CHECKSUM_BYTES, DRF_SIZE, NF_SIZE};

use crate::transport::{ByteTransport, TransportError};

/// Running counters exposed for diagnostics and for the six literal scenarios of spec §8.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ParserStats {
    pub frames_accepted: u64,
    pub resync_bytes_skipped: u64,
    pub resync_events: u64,
    pub checksum_failures: u64,
    pub stale_rejected: u64,
}

/// A frame handed back by [`StreamParser::poll`]: the outer NF bytes (if [`FrameMode::NetStream`])
/// are stripped, leaving only the DRF header, payload and optional checksum.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedFrame {
    pub drf: DataRecordFrame,
    /// Header + payload + optional checksum, exactly as it appeared on the wire.
    pub raw: Vec<u8>,
    /// `raw[DataRecordFrame::ENCODED_LEN..]` with the trailing checksum (if any) removed.
    pub payload_range: std::ops::Range<usize>,
}

/// Non-fatal outcomes of a single [`StreamParser::poll`] call. `NeedMore` and `Resyncing` are
/// routine; the caller loops back to `poll` again. `Stale` is spec §7's "fatal for this
/// frame/record" kind: the frame is fully decoded and dropped, but unlike `Resyncing` (an
/// internal, counter-only recovery) it is surfaced to the caller -- the transport stays usable
/// for the next call.
#[derive(Debug)]
pub enum ParseStatus {
    /// A complete, valid frame was assembled.
    Frame(ParsedFrame),
    /// The buffer does not yet hold a full frame; call `poll` again after more bytes arrive.
    NeedMore,
    /// A byte was rejected and skipped while searching for the next plausible header.
    Resyncing,
    /// A structurally valid frame was dropped because its timestamp did not clear the
    /// caller-supplied `newer_than` floor.
    Stale(DataRecordFrame),
}

/// Drives the stream-parser FSM over a [`ByteTransport`], reassembling frames into a fixed
/// internal buffer that is never grown past `settings.buffer_capacity()` (§5 resource policy).
pub struct StreamParser {
    settings: ParserSettings,
    buf: Vec<u8>,
    len: usize,
    stats: ParserStats,
}

impl StreamParser {
    pub fn new(settings: ParserSettings) -> Self {
        let capacity = settings.buffer_capacity();
        StreamParser {
            settings,
            buf: vec![0u8; capacity],
            len: 0,
            stats: ParserStats::default(),
        }
    }

    pub fn stats(&self) -> ParserStats {
        self.stats
    }

    /// Reads whatever is available from `transport` and attempts to produce one frame.
    ///
    /// A single call performs at most one read; callers wanting a blocking "give me the next
    /// frame" loop should call this repeatedly, treating `NeedMore`/`Resyncing` as "try again".
    pub fn poll(
        &mut self,
        transport: &mut dyn ByteTransport,
        timeout_ms: u32,
    ) -> Result<ParseStatus, SonarframeError> {
        if let Some(status) = self.try_parse_one()? {
            return Ok(status);
        }
        if self.len == self.buf.len() {
            return Err(SonarframeError::BufferFull);
        }
        match transport.read_timeout(&mut self.buf[self.len..], timeout_ms) {
            Ok(n) => {
                self.len += n;
                Ok(ParseStatus::NeedMore)
            }
            Err(TransportError::Timeout) => Ok(ParseStatus::NeedMore),
            Err(e) => Err(e.into()),
        }
    }

    /// Minimum header length for the configured frame mode: NF+DRF header, or bare DRF header.
    fn min_header_len(&self) -> usize {
        match self.settings.frame_mode() {
            FrameMode::NetStream => NF_SIZE as usize + DataRecordFrame::ENCODED_LEN,
            FrameMode::DrfStream => DataRecordFrame::ENCODED_LEN,
        }
    }

    /// Tries to assemble one frame from the bytes already buffered. Returns `None` if the buffer
    /// doesn't yet hold enough bytes to decide; `Some(Resyncing)`/`Some(Frame(..))` otherwise.
    fn try_parse_one(&mut self) -> Result<Option<ParseStatus>, SonarframeError> {
        if self.len < self.min_header_len() {
            return Ok(None);
        }

        let (drf_header_start, nf): (usize, Option<NetworkFrame>) = match self.settings.frame_mode() {
            FrameMode::NetStream => {
                let nf = NetworkFrame::decode(&self.buf[0..NF_SIZE as usize]);
                if nf.validate().is_err() {
                    self.resync(1);
                    return Ok(Some(ParseStatus::Resyncing));
                }
                (NF_SIZE as usize, Some(nf))
            }
            FrameMode::DrfStream => (0, None),
        };

        if self.len < drf_header_start + DataRecordFrame::ENCODED_LEN {
            return Ok(None);
        }

        let drf_bytes = &self.buf[drf_header_start..drf_header_start + DataRecordFrame::ENCODED_LEN];
        let drf = DataRecordFrame::decode(drf_bytes);
        if drf.validate().is_err() {
            self.resync(1);
            return Ok(Some(ParseStatus::Resyncing));
        }

        let checksum_len = if drf.checksum_present() { DRF_CHECKSUM_BYTES as usize } else { 0 };
        // `drf.size` already includes the trailing checksum (the encoder sets it to
        // ENCODED_LEN + payload + checksum); don't add `checksum_len` again.
        let frame_total = drf_header_start + drf.size as usize;

        if frame_total > self.buf.len() {
            return Err(SonarframeError::BufferFull);
        }
        if self.len < frame_total {
            return Ok(None);
        }

        let raw = self.buf[drf_header_start..frame_total].to_vec();

        if drf.checksum_present() {
            if DataRecordFrame::verify_checksum(&raw).is_err() {
                self.stats.checksum_failures += 1;
                self.resync(1);
                return Ok(Some(ParseStatus::Resyncing));
            }
        }

        if self.settings.newer_than() > 0.0 {
            let seconds = sonarframe_core::bitconverter::seven_k_time_to_seconds_of_day(&drf.seven_k_time);
            if seconds <= self.settings.newer_than() {
                self.stats.stale_rejected += 1;
                self.consume(frame_total);
                return Ok(Some(ParseStatus::Stale(drf)));
            }
        }

        let payload_range = DataRecordFrame::ENCODED_LEN..(raw.len() - checksum_len);
        self.consume(frame_total);
        self.stats.frames_accepted += 1;
        Ok(Some(ParseStatus::Frame(ParsedFrame { drf, raw, payload_range })))
    }

    /// Drops `n` bytes off the front of the buffer as rejected, memmoving the remainder down.
    fn resync(&mut self, n: usize) {
        if !self.settings.resync_enabled() {
            return;
        }
        self.stats.resync_events += 1;
        self.stats.resync_bytes_skipped += n as u64;
        self.consume(n);
    }

    /// Removes `n` bytes from the front of the buffer, memmoving whatever remains to offset 0.
    fn consume(&mut self, n: usize) {
        self.buf.copy_within(n..self.len, 0);
        self.len -= n;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sonarframe_core::bitconverter::byte_sum_checksum;
    use sonarframe_core::header_structs::SevenKTime;
    use sonarframe_core::{DRF_PROTO, DRF_SYNC};

    struct StubTransport {
        data: Vec<u8>,
        pos: usize,
    }

    impl ByteTransport for StubTransport {
        fn read_timeout(&mut self, buf: &mut [u8], _timeout_ms: u32) -> Result<usize, TransportError> {
            if self.pos >= self.data.len() {
                return Err(TransportError::Timeout);
            }
            let n = (self.data.len() - self.pos).min(buf.len());
            buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }

        fn write_all(&mut self, _buf: &[u8]) -> Result<(), TransportError> {
            Ok(())
        }
    }

    fn encode_bare_drf(record_type_id: u32, payload: &[u8], with_checksum: bool) -> Vec<u8> {
        let checksum_len = if with_checksum { 4 } else { 0 };
        let drf = DataRecordFrame {
            protocol_version: DRF_PROTO,
            offset: DRF_SIZE as u16,
            sync_pattern: DRF_SYNC,
            size: DRF_SIZE + payload.len() as u32 + checksum_len as u32,
            optional_data_offset: 0,
            optional_data_id: 0,
            seven_k_time: SevenKTime { year: 2024, day: 1, seconds: 0.0, hours: 0, minutes: 0 },
            record_version: 1,
            record_type_id,
            device_id: 7125,
            system_enumerator: 400,
            flags: if with_checksum { sonarframe_core::header_structs::DRF_FLAG_CHECKSUM_PRESENT } else { 0 },
            fragment_total: 1,
            fragment_index: 0,
        };
        let mut out = vec![0u8; DataRecordFrame::ENCODED_LEN];
        drf.encode(&mut out);
        out.extend_from_slice(payload);
        if with_checksum {
            let sum = byte_sum_checksum(&out);
            out.extend_from_slice(&sum.to_le_bytes());
        }
        out
    }

    fn parser_for(buf: Vec<u8>) -> (StreamParser, StubTransport) {
        let settings = ParserSettings::new(FrameMode::DrfStream, 4096);
        (StreamParser::new(settings), StubTransport { data: buf, pos: 0 })
    }

    #[test]
    fn parses_clean_frame() {
        let frame = encode_bare_drf(7027, &[1, 2, 3, 4], true);
        let (mut parser, mut t) = parser_for(frame);
        loop {
            match parser.poll(&mut t, 0).unwrap() {
                ParseStatus::Frame(f) => {
                    assert_eq!(f.drf.record_type_id, 7027);
                    break;
                }
                _ => continue,
            }
        }
        assert_eq!(parser.stats().frames_accepted, 1);
    }

    #[test]
    fn resyncs_past_leading_garbage() {
        let mut bytes = vec![0xDEu8, 0xAD, 0xBE, 0xEF];
        bytes.extend(encode_bare_drf(7027, &[9, 9], true));
        let (mut parser, mut t) = parser_for(bytes);
        let mut saw_resync = false;
        loop {
            match parser.poll(&mut t, 0).unwrap() {
                ParseStatus::Frame(_) => break,
                ParseStatus::Resyncing => saw_resync = true,
                ParseStatus::NeedMore | ParseStatus::Stale(_) => continue,
            }
        }
        assert!(saw_resync);
        assert!(parser.stats().resync_bytes_skipped >= 4);
    }

    #[test]
    fn bad_checksum_is_rejected_and_skipped() {
        let mut frame = encode_bare_drf(7027, &[1, 2, 3, 4], true);
        let last = frame.len() - 1;
        frame[last] ^= 0xFF;
        let (mut parser, mut t) = parser_for(frame);
        let mut saw_checksum_failure = false;
        for _ in 0..64 {
            match parser.poll(&mut t, 0).unwrap() {
                ParseStatus::Frame(_) => panic!("corrupted frame should not validate"),
                ParseStatus::Resyncing => saw_checksum_failure = true,
                ParseStatus::Stale(_) => continue,
                ParseStatus::NeedMore => {
                    if t.pos >= t.data.len() {
                        break;
                    }
                }
            }
        }
        assert!(saw_checksum_failure);
        assert!(parser.stats().checksum_failures >= 1);
    }

    #[test]
    fn stale_frame_is_surfaced_not_swallowed() {
        let frame = encode_bare_drf(7027, &[1, 2, 3, 4], true);
        let settings = ParserSettings::new(FrameMode::DrfStream, 4096).with_newer_than(1_000_000.0);
        let mut parser = StreamParser::new(settings);
        let mut t = StubTransport { data: frame, pos: 0 };
        let mut saw_stale = false;
        loop {
            match parser.poll(&mut t, 0).unwrap() {
                ParseStatus::Stale(drf) => {
                    assert_eq!(drf.record_type_id, 7027);
                    saw_stale = true;
                    break;
                }
                ParseStatus::Frame(_) => panic!("stale frame should not be returned as Frame"),
                ParseStatus::NeedMore | ParseStatus::Resyncing => continue,
            }
        }
        assert!(saw_stale);
        assert_eq!(parser.stats().stale_rejected, 1);
    }
}
