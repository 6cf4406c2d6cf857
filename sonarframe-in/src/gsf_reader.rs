//! Sequential and indexed reading of the GSF record store (§4.4).
//!
//! Grounded on `original_source/src/gsf/gsf.c`'s `gsfOpen`/`gsfRead` pair: the first record of a
//! file must decode to a `"GSF-vM.m"` header before anything else is trusted, each subsequent
//! record is `[u32 data_size][u32 packed_id][data][optional 4-byte checksum]`, and pre-1.3 files
//! carry a padding bug this reader reproduces rather than silently fixes (spec §9).
use std::convert::TryInto;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};

use sonarframe_core::bitconverter::{ascii_bytes_to_string, byte_sum_checksum};
use sonarframe_core::enums::{GsfOpenMode, GsfRecordType};
use sonarframe_core::errors::SonarframeError;
use sonarframe_core::header_structs::{GsfIndexEntry, GsfRecordId, ScaleFactorEntry, ScaleFactorTable};
use sonarframe_core::{GSF_HEADER_PREFIX, MAX_RECORD_SIZE};

use crate::gsf_index::GsfIndex;

/// Parsed `"GSF-vM.m"` version string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct GsfVersion {
    pub major: u32,
    pub minor: u32,
}

impl GsfVersion {
    /// Files older than this carry the 4-byte record-padding bug (spec §9, `original_source`'s
    /// `gsf.c` header comment on the format's pre-1.3 history).
    const PADDING_BUG_THRESHOLD: GsfVersion = GsfVersion { major: 1, minor: 3 };

    fn has_padding_bug(self) -> bool {
        self < Self::PADDING_BUG_THRESHOLD
    }

    fn parse(header_text: &str) -> Option<Self> {
        let rest = header_text.strip_prefix(GSF_HEADER_PREFIX)?;
        let (major_s, minor_s) = rest.split_once('.')?;
        Some(GsfVersion { major: major_s.parse().ok()?, minor: minor_s.parse().ok()? })
    }
}

/// One decoded GSF record: its type, and the data bytes between the envelope and any checksum.
#[derive(Debug, Clone, PartialEq)]
pub struct GsfRecord {
    pub record_type: GsfRecordType,
    pub data: Vec<u8>,
    /// Byte offset of this record's envelope within the file, for index building.
    pub offset: u64,
}

/// A single beam-array subrecord decoded against the ping's current [`ScaleFactorTable`] entry.
#[derive(Debug, Clone, PartialEq)]
pub struct PingArray {
    pub subrecord_id: u32,
    pub values: Vec<f64>,
}

/// A decoded swath-bathymetry (or single-beam) ping: timestamp plus every beam-array subrecord
/// present, each already dequantized through the scale factor in effect at the time.
#[derive(Debug, Clone, PartialEq)]
pub struct GsfPingRecord {
    pub sec: i32,
    pub nsec: i32,
    pub number_beams: u32,
    pub arrays: Vec<PingArray>,
}

/// Sequential and (optionally) indexed reader over one GSF file.
///
/// `scale_factors` persists across calls to [`GsfReader::read_ping`]: GSF pings only repeat a
/// beam-array's scale factor when it changes, so a subrecord's entry from an earlier ping remains
/// in effect until explicitly replaced (spec §4.4 "per-ping scale-factor dependency resolution").
pub struct GsfReader {
    file: File,
    mode: GsfOpenMode,
    version: GsfVersion,
    scale_factors: ScaleFactorTable,
    index: Option<GsfIndex>,
}

impl GsfReader {
    /// Opens `path` in `mode`, which must not be one of the write-capable modes (those belong to
    /// `sonarframe-out`); reads and validates the file's header record.
    pub fn open(path: &str, mode: GsfOpenMode) -> Result<Self, SonarframeError> {
        if mode.is_writable() {
            return Err(SonarframeError::BadAccessMode);
        }
        let mut file = File::open(path).map_err(SonarframeError::FOpenError)?;
        file.seek(SeekFrom::Start(0)).map_err(SonarframeError::FileSeekError)?;

        let mut reader = GsfReader {
            file,
            mode,
            version: GsfVersion { major: 0, minor: 0 },
            scale_factors: ScaleFactorTable::default(),
            index: None,
        };

        let header = reader.read_envelope()?;
        if header.record_type != GsfRecordType::Header {
            return Err(SonarframeError::UnrecognizedFile);
        }
        let text = ascii_bytes_to_string(&header.data);
        reader.version = GsfVersion::parse(&text).ok_or(SonarframeError::UnrecognizedFile)?;

        if mode.is_indexed() {
            let data_file_size = reader.file.metadata()?.len();
            let index_path = format!("{}.gidx", path);
            reader.index = Some(GsfIndex::open(&index_path, data_file_size)?);
        }
        Ok(reader)
    }

    pub fn version(&self) -> GsfVersion {
        self.version
    }

    /// Reads the next record's envelope and data bytes, advancing the file position past any
    /// checksum and (for pre-1.3 files) past the padding bug's extra bytes.
    fn read_envelope(&mut self) -> Result<GsfRecord, SonarframeError> {
        let offset = self.file.stream_position().map_err(SonarframeError::FileSeekError)?;

        let mut prologue = [0u8; 8];
        if let Err(e) = self.file.read_exact(&mut prologue) {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                self.file.seek(SeekFrom::Start(offset)).map_err(SonarframeError::FileSeekError)?;
                return Err(SonarframeError::ReadToEndOfFile);
            }
            return Err(e.into());
        }

        let data_size = u32::from_be_bytes([prologue[0], prologue[1], prologue[2], prologue[3]]);
        let packed_id = u32::from_be_bytes([prologue[4], prologue[5], prologue[6], prologue[7]]);
        let record_id = GsfRecordId::decode(packed_id);

        if data_size <= 8 || data_size > MAX_RECORD_SIZE {
            return Err(SonarframeError::RecordSizeError { size: data_size });
        }

        let mut raw = vec![0u8; data_size as usize];
        if let Err(e) = self.file.read_exact(&mut raw) {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                self.file.seek(SeekFrom::Start(offset)).map_err(SonarframeError::FileSeekError)?;
                return Err(SonarframeError::ReadToEndOfFile);
            }
            return Err(e.into());
        }

        // `data_size` already covers the trailing checksum when present (matching what
        // `write_data::encode_record` writes), so the checksum is the last 4 bytes of `raw`, not
        // a separate read past it.
        let data = if record_id.checksum_flag {
            if raw.len() < 4 {
                return Err(SonarframeError::RecordSizeError { size: data_size });
            }
            let split = raw.len() - 4;
            let expected = u32::from_be_bytes(raw[split..].try_into()?);
            let computed = byte_sum_checksum(&raw[..split]);
            if expected != computed {
                return Err(SonarframeError::ChecksumMismatch { expected, computed });
            }
            raw.truncate(split);
            raw
        } else {
            raw
        };

        // Version-dependent padding (spec §3, §9 "Version-dependent padding"): files tagged
        // <=1.2 pad by `data_size % 4` (the historical bug, preserved for compatibility); 1.3+
        // files pad by `(4 - data_size % 4) % 4`.
        let pad = if self.version.has_padding_bug() {
            data_size % 4
        } else {
            (4 - (data_size % 4)) % 4
        };
        if pad > 0 {
            self.file.seek(SeekFrom::Current(pad as i64)).map_err(SonarframeError::FileSeekError)?;
        }

        let record_type = GsfRecordType::from_wire(record_id.record_type_id)?;
        Ok(GsfRecord { record_type, data, offset })
    }

    /// Reads the next record of any type, sequentially.
    pub fn read_next(&mut self) -> Result<GsfRecord, SonarframeError> {
        self.read_envelope()
    }

    /// Reads the next record, requiring it to be a ping (swath-bathymetry or single-beam), and
    /// decodes its scale-factor section and beam arrays, updating `self.scale_factors` in place.
    pub fn read_ping(&mut self) -> Result<GsfPingRecord, SonarframeError> {
        let record = self.read_envelope()?;
        match record.record_type {
            GsfRecordType::SwathBathymetryPing | GsfRecordType::SingleBeamPing => {
                self.decode_ping_body(&record.data)
            }
            other => Err(SonarframeError::UnrecognizedGsfRecordId { id: other as u32 }),
        }
    }

    /// Random-access read of the ping at or before `(sec, nsec)`, using the sidecar index. Only
    /// valid when this reader was opened in an indexed mode.
    pub fn read_ping_at_or_before(&mut self, sec: i32, nsec: i32) -> Result<GsfPingRecord, SonarframeError> {
        let index = self.index.as_ref().ok_or(SonarframeError::BadAccessMode)?;
        let entry: GsfIndexEntry = index
            .entry(index.find_at_or_before(sec, nsec).ok_or(SonarframeError::IndexStale)?)
            .ok_or(SonarframeError::IndexStale)?;
        self.file.seek(SeekFrom::Start(entry.addr as u64)).map_err(SonarframeError::FileSeekError)?;
        self.read_ping()
    }

    /// Direct (indexed) access by ping number (spec §4.4 "Direct (indexed) access"): `n` is
    /// 1-based, counting pings in file order. Resolves `n`'s governing scale-factor record (the
    /// last scale-factor-bearing ping record at or before it) and replays it into
    /// `self.scale_factors` before seeking to and decoding ping `n` itself, so beam arrays
    /// dequantize correctly regardless of how far `n` is from the last sequential read.
    pub fn read_ping_by_number(&mut self, n: usize) -> Result<GsfPingRecord, SonarframeError> {
        if n == 0 {
            return Err(SonarframeError::BadAccessMode);
        }
        let index = self.index.as_ref().ok_or(SonarframeError::BadAccessMode)?;
        let entry: GsfIndexEntry = index.entry(n - 1).ok_or(SonarframeError::IndexStale)?;
        let governing_addr = index
            .governing_scale_factor_addr(entry.addr)
            .ok_or(SonarframeError::NoGoverningScaleFactors { ping_number: n })?;

        self.scale_factors = ScaleFactorTable::default();
        if governing_addr != entry.addr {
            self.file.seek(SeekFrom::Start(governing_addr as u64)).map_err(SonarframeError::FileSeekError)?;
            self.read_ping()?;
        }

        self.file.seek(SeekFrom::Start(entry.addr as u64)).map_err(SonarframeError::FileSeekError)?;
        self.read_ping()
    }

    fn decode_ping_body(&mut self, body: &[u8]) -> Result<GsfPingRecord, SonarframeError> {
        let mut cursor = 0usize;
        let need = |cursor: usize, n: usize| -> Result<(), SonarframeError> {
            if cursor + n > body.len() {
                Err(SonarframeError::ReadToEndOfFile)
            } else {
                Ok(())
            }
        };

        need(cursor, 12)?;
        let sec = i32::from_be_bytes(body[cursor..cursor + 4].try_into()?);
        cursor += 4;
        let nsec = i32::from_be_bytes(body[cursor..cursor + 4].try_into()?);
        cursor += 4;
        let number_beams = u32::from_be_bytes(body[cursor..cursor + 4].try_into()?);
        cursor += 4;

        need(cursor, 2)?;
        let num_scale_factors = u16::from_be_bytes(body[cursor..cursor + 2].try_into()?) as usize;
        cursor += 2;
        for _ in 0..num_scale_factors {
            need(cursor, 2 + 1 + 8 + 8)?;
            let subrecord_id = u16::from_be_bytes(body[cursor..cursor + 2].try_into()?) as usize;
            cursor += 2;
            let compression_flag = body[cursor];
            cursor += 1;
            let multiplier = f64::from_be_bytes(body[cursor..cursor + 8].try_into()?);
            cursor += 8;
            let offset = f64::from_be_bytes(body[cursor..cursor + 8].try_into()?);
            cursor += 8;
            self.scale_factors.set(subrecord_id, ScaleFactorEntry { compression_flag, multiplier, offset })?;
        }

        need(cursor, 2)?;
        let num_array_subrecords = u16::from_be_bytes(body[cursor..cursor + 2].try_into()?) as usize;
        cursor += 2;

        let mut arrays = Vec::with_capacity(num_array_subrecords);
        for _ in 0..num_array_subrecords {
            need(cursor, 2)?;
            let subrecord_id = u16::from_be_bytes(body[cursor..cursor + 2].try_into()?) as u32;
            cursor += 2;
            let entry = self
                .scale_factors
                .get(subrecord_id as usize)
                .copied()
                .ok_or(SonarframeError::UnrecognizedArraySubrecordId { id: subrecord_id })?;
            let width = entry.field_width_bytes() as usize;
            need(cursor, width * number_beams as usize)?;
            let mut values = Vec::with_capacity(number_beams as usize);
            for i in 0..number_beams as usize {
                let start = cursor + i * width;
                let q = match width {
                    1 => body[start] as i64,
                    2 => i16::from_be_bytes(body[start..start + 2].try_into()?) as i64,
                    _ => i32::from_be_bytes(body[start..start + 4].try_into()?) as i64,
                };
                let (min, max) = match width {
                    1 => (u8::MIN as i64, u8::MAX as i64),
                    2 => (i16::MIN as i64, i16::MAX as i64),
                    _ => (i32::MIN as i64, i32::MAX as i64),
                };
                values.push(entry.dequantize(q, min, max));
            }
            cursor += width * number_beams as usize;
            arrays.push(PingArray { subrecord_id, values });
        }

        Ok(GsfPingRecord { sec, nsec, number_beams, arrays })
    }

    /// Scans the whole file sequentially from the start, building a [`GsfIndex`] of every
    /// sounding ping's `(sec, nsec, offset)` plus the parallel array of offsets of ping records
    /// that carry a (changed) scale-factor section, and writes both to `{path}.gidx`.
    ///
    /// A ping is only assigned a ping number (and so is reachable through
    /// [`GsfReader::read_ping_by_number`]) when it carries at least one beam; a zero-beam ping
    /// record exists solely to (re)establish scale factors and is tracked only in the
    /// scale-factor-offsets array, matching spec §6's "GSF index" design note.
    ///
    /// Grounded on `gsfBuildIndex` (`original_source/src/gsf/gsf.c`).
    pub fn build_index(path: &str) -> Result<(), SonarframeError> {
        let mut reader = GsfReader::open(path, GsfOpenMode::ReadOnly)?;
        let mut entries = Vec::new();
        let mut scale_factor_addrs = Vec::new();
        loop {
            let before = reader.file.stream_position().map_err(SonarframeError::FileSeekError)?;
            match reader.read_envelope() {
                Ok(record) => {
                    if matches!(
                        record.record_type,
                        GsfRecordType::SwathBathymetryPing | GsfRecordType::SingleBeamPing
                    ) && record.data.len() >= 14
                    {
                        let sec = i32::from_be_bytes(record.data[0..4].try_into()?);
                        let nsec = i32::from_be_bytes(record.data[4..8].try_into()?);
                        let number_beams = u32::from_be_bytes(record.data[8..12].try_into()?);
                        let num_scale_factors = u16::from_be_bytes(record.data[12..14].try_into()?);
                        if number_beams > 0 {
                            entries.push(GsfIndexEntry { sec, nsec, addr: before as i64 });
                        }
                        if num_scale_factors > 0 {
                            scale_factor_addrs.push(before as i64);
                        }
                    }
                }
                Err(SonarframeError::ReadToEndOfFile) => break,
                Err(e) => return Err(e),
            }
        }
        let data_file_size = std::fs::metadata(path)?.len();
        GsfIndex::from_entries(entries, scale_factor_addrs).write(&format!("{}.gidx", path), data_file_size)
    }

    pub fn mode(&self) -> GsfOpenMode {
        self.mode
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_gsf_header(f: &mut File, version: &str) {
        let mut text = [0u8; 16];
        sonarframe_core::bitconverter::string_to_ascii_bytes(version, &mut text);
        let record_id = GsfRecordId { checksum_flag: false, reserved: 0, record_type_id: GsfRecordType::Header as u32 };
        f.write_all(&(text.len() as u32).to_be_bytes()).unwrap();
        f.write_all(&record_id.encode().to_be_bytes()).unwrap();
        f.write_all(&text).unwrap();
    }

    fn write_ping_ex(f: &mut File, sec: i32, nsec: i32, depths: &[f64], with_scale_factors: bool, multiplier: f64) {
        let mut body = Vec::new();
        body.extend_from_slice(&sec.to_be_bytes());
        body.extend_from_slice(&nsec.to_be_bytes());
        body.extend_from_slice(&(depths.len() as u32).to_be_bytes());
        if with_scale_factors {
            // one scale factor, subrecord id 1 ("depth").
            body.extend_from_slice(&1u16.to_be_bytes());
            body.extend_from_slice(&1u16.to_be_bytes());
            body.push(0x20); // 2-byte field width tag
            body.extend_from_slice(&multiplier.to_be_bytes());
            body.extend_from_slice(&0.0f64.to_be_bytes());
        } else {
            body.extend_from_slice(&0u16.to_be_bytes());
        }
        if depths.is_empty() {
            body.extend_from_slice(&0u16.to_be_bytes());
        } else {
            body.extend_from_slice(&1u16.to_be_bytes());
            body.extend_from_slice(&1u16.to_be_bytes());
            for d in depths {
                let q = (d * multiplier).round() as i16;
                body.extend_from_slice(&q.to_be_bytes());
            }
        }

        let record_id = GsfRecordId {
            checksum_flag: false,
            reserved: 0,
            record_type_id: GsfRecordType::SwathBathymetryPing as u32,
        };
        f.write_all(&(body.len() as u32).to_be_bytes()).unwrap();
        f.write_all(&record_id.encode().to_be_bytes()).unwrap();
        f.write_all(&body).unwrap();
    }

    fn write_ping(f: &mut File, sec: i32, nsec: i32, depths: &[f64]) {
        write_ping_ex(f, sec, nsec, depths, true, 100.0);
    }

    /// A zero-beam ping record whose only purpose is to (re)establish scale factors, per spec
    /// §6's "ping records containing scale factors" design note.
    fn write_scale_factors_only(f: &mut File, multiplier: f64) {
        write_ping_ex(f, 0, 0, &[], true, multiplier);
    }

    #[test]
    fn reads_header_and_one_ping() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let path = tmp.path().to_str().unwrap();
        {
            let mut f = File::create(path).unwrap();
            write_gsf_header(&mut f, "GSF-v2.10");
            write_ping(&mut f, 1_700_000_000, 0, &[12.34, 56.78]);
        }
        let mut reader = GsfReader::open(path, GsfOpenMode::ReadOnly).unwrap();
        assert_eq!(reader.version(), GsfVersion { major: 2, minor: 10 });
        let ping = reader.read_ping().unwrap();
        assert_eq!(ping.sec, 1_700_000_000);
        assert_eq!(ping.arrays.len(), 1);
        for (got, want) in ping.arrays[0].values.iter().zip([12.34, 56.78]) {
            assert!((got - want).abs() < 0.01);
        }
    }

    #[test]
    fn rejects_a_file_without_a_header() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let path = tmp.path().to_str().unwrap();
        {
            let mut f = File::create(path).unwrap();
            write_ping(&mut f, 1, 0, &[1.0]);
        }
        assert!(matches!(
            GsfReader::open(path, GsfOpenMode::ReadOnly),
            Err(SonarframeError::UnrecognizedFile)
        ));
    }

    #[test]
    fn build_index_then_random_access_by_time() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let path = tmp.path().to_str().unwrap();
        {
            let mut f = File::create(path).unwrap();
            write_gsf_header(&mut f, "GSF-v2.10");
            write_ping(&mut f, 100, 0, &[1.0]);
            write_ping(&mut f, 101, 0, &[2.0]);
            write_ping(&mut f, 102, 0, &[3.0]);
        }
        GsfReader::build_index(path).unwrap();
        let mut reader = GsfReader::open(path, GsfOpenMode::ReadOnlyIndex).unwrap();
        let ping = reader.read_ping_at_or_before(101, 500).unwrap();
        assert_eq!(ping.sec, 101);
    }

    #[test]
    fn read_ping_by_number_resolves_its_governing_scale_factors() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let path = tmp.path().to_str().unwrap();
        {
            let mut f = File::create(path).unwrap();
            write_gsf_header(&mut f, "GSF-v2.10");
            write_scale_factors_only(&mut f, 100.0); // SF_A
            write_ping_ex(&mut f, 1, 0, &[1.0], false, 100.0); // ping_1, governed by SF_A
            write_ping_ex(&mut f, 2, 0, &[2.0], false, 100.0); // ping_2, governed by SF_A
            write_scale_factors_only(&mut f, 10.0); // SF_B
            write_ping_ex(&mut f, 3, 0, &[3.0], false, 10.0); // ping_3, governed by SF_B
        }
        GsfReader::build_index(path).unwrap();
        let mut reader = GsfReader::open(path, GsfOpenMode::ReadOnlyIndex).unwrap();

        let ping2 = reader.read_ping_by_number(2).unwrap();
        assert!((ping2.arrays[0].values[0] - 2.0).abs() < 0.01); // decoded against SF_A's x100 multiplier

        let ping3 = reader.read_ping_by_number(3).unwrap();
        assert!((ping3.arrays[0].values[0] - 3.0).abs() < 0.1); // decoded against SF_B's x10 multiplier

        let ping2_again = reader.read_ping_by_number(2).unwrap();
        assert!((ping2_again.arrays[0].values[0] - 2.0).abs() < 0.01); // SF_A reloaded
    }
}
