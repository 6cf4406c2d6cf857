//! Binary layouts for the Network Frame, Data Record Frame, subscription RTH, and GSF record
//! envelope. These structures are pure data -- the stream parser (`sonarframe-in`) and the frame
//! encoder (`sonarframe-out`) drive the state machines that produce and consume them.
use crate::bitconverter::byte_sum_checksum;
use crate::enums::RemconId;
use crate::errors::SonarframeError;
use crate::{DRF_CHECKSUM_BYTES, DRF_PROTO, DRF_SIZE, DRF_SYNC, GSF_MAX_PING_ARRAY_SUBRECORDS, NF_PROTO, NF_SIZE};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 7K-epoch timestamp carried in every [`DataRecordFrame`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SevenKTime {
    pub year: u16,
    pub day: u16,
    pub seconds: f32,
    pub hours: u8,
    pub minutes: u8,
}

impl SevenKTime {
    const ENCODED_LEN: usize = 10;

    fn decode(b: &[u8]) -> Self {
        SevenKTime {
            year: u16::from_le_bytes([b[0], b[1]]),
            day: u16::from_le_bytes([b[2], b[3]]),
            seconds: f32::from_le_bytes([b[4], b[5], b[6], b[7]]),
            hours: b[8],
            minutes: b[9],
        }
    }

    fn encode(&self, out: &mut [u8]) {
        out[0..2].copy_from_slice(&self.year.to_le_bytes());
        out[2..4].copy_from_slice(&self.day.to_le_bytes());
        out[4..8].copy_from_slice(&self.seconds.to_le_bytes());
        out[8] = self.hours;
        out[9] = self.minutes;
    }
}

/// Outer envelope used when the 7K transport is present (§3 "Network Frame").
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NetworkFrame {
    pub protocol_version: u16,
    pub offset_to_data: u16,
    pub total_packets: u32,
    pub total_records: u16,
    pub transmission_id: u16,
    pub packet_size: u32,
    pub total_size: u32,
    pub sequence_number: u32,
    pub dest_device_id: u32,
    pub dest_enumerator: u16,
    pub source_enumerator: u16,
    pub source_device_id: u32,
}

impl NetworkFrame {
    pub const ENCODED_LEN: usize = NF_SIZE as usize;

    /// Decodes an NF header from exactly [`NetworkFrame::ENCODED_LEN`] bytes without validating
    /// field relationships; use [`NetworkFrame::validate`] to check invariants.
    pub fn decode(b: &[u8]) -> Self {
        NetworkFrame {
            protocol_version: u16::from_le_bytes([b[0], b[1]]),
            offset_to_data: u16::from_le_bytes([b[2], b[3]]),
            total_packets: u32::from_le_bytes([b[4], b[5], b[6], b[7]]),
            total_records: u16::from_le_bytes([b[8], b[9]]),
            transmission_id: u16::from_le_bytes([b[10], b[11]]),
            packet_size: u32::from_le_bytes([b[12], b[13], b[14], b[15]]),
            total_size: u32::from_le_bytes([b[16], b[17], b[18], b[19]]),
            sequence_number: u32::from_le_bytes([b[20], b[21], b[22], b[23]]),
            dest_device_id: u32::from_le_bytes([b[24], b[25], b[26], b[27]]),
            dest_enumerator: u16::from_le_bytes([b[28], b[29]]),
            source_enumerator: u16::from_le_bytes([b[30], b[31]]),
            source_device_id: u32::from_le_bytes([b[32], b[33], b[34], b[35]]),
        }
    }

    pub fn encode(&self, out: &mut [u8]) {
        out[0..2].copy_from_slice(&self.protocol_version.to_le_bytes());
        out[2..4].copy_from_slice(&self.offset_to_data.to_le_bytes());
        out[4..8].copy_from_slice(&self.total_packets.to_le_bytes());
        out[8..10].copy_from_slice(&self.total_records.to_le_bytes());
        out[10..12].copy_from_slice(&self.transmission_id.to_le_bytes());
        out[12..16].copy_from_slice(&self.packet_size.to_le_bytes());
        out[16..20].copy_from_slice(&self.total_size.to_le_bytes());
        out[20..24].copy_from_slice(&self.sequence_number.to_le_bytes());
        out[24..28].copy_from_slice(&self.dest_device_id.to_le_bytes());
        out[28..30].copy_from_slice(&self.dest_enumerator.to_le_bytes());
        out[30..32].copy_from_slice(&self.source_enumerator.to_le_bytes());
        out[32..36].copy_from_slice(&self.source_device_id.to_le_bytes());
    }

    /// Checks the acceptance rules from spec §4.1 "HEADER_OK -> VALIDATE_HEADER" for NF.
    pub fn validate(&self) -> Result<(), SonarframeError> {
        if self.protocol_version != NF_PROTO {
            return Err(SonarframeError::ProtocolVersion {
                expected: NF_PROTO,
                found: self.protocol_version,
            });
        }
        if self.total_packets < 1
            || self.total_size < DRF_SIZE
            || (self.offset_to_data as u32) < NF_SIZE as u32
            || self.packet_size != self.total_size + NF_SIZE as u32
            || self.total_records != 1
        {
            return Err(SonarframeError::SizeOutOfRange { size: self.total_size });
        }
        Ok(())
    }
}

/// `flags` bit 0 on a [`DataRecordFrame`]: checksum present and valid.
pub const DRF_FLAG_CHECKSUM_PRESENT: u16 = 0x0001;

/// The payload unit carried inside an NF, or read bare from a `.s7k` capture (§3 "Data Record
/// Frame").
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DataRecordFrame {
    pub protocol_version: u16,
    pub offset: u16,
    pub sync_pattern: u32,
    pub size: u32,
    pub optional_data_offset: u32,
    pub optional_data_id: u32,
    pub seven_k_time: SevenKTime,
    pub record_version: u16,
    pub record_type_id: u32,
    pub device_id: u32,
    pub system_enumerator: u16,
    pub flags: u16,
    pub fragment_total: u32,
    pub fragment_index: u32,
}

impl DataRecordFrame {
    pub const ENCODED_LEN: usize = DRF_SIZE as usize;

    pub fn decode(b: &[u8]) -> Self {
        DataRecordFrame {
            protocol_version: u16::from_le_bytes([b[0], b[1]]),
            offset: u16::from_le_bytes([b[2], b[3]]),
            sync_pattern: u32::from_le_bytes([b[4], b[5], b[6], b[7]]),
            size: u32::from_le_bytes([b[8], b[9], b[10], b[11]]),
            optional_data_offset: u32::from_le_bytes([b[12], b[13], b[14], b[15]]),
            optional_data_id: u32::from_le_bytes([b[16], b[17], b[18], b[19]]),
            seven_k_time: SevenKTime::decode(&b[20..20 + SevenKTime::ENCODED_LEN]),
            record_version: u16::from_le_bytes([b[30], b[31]]),
            record_type_id: u32::from_le_bytes([b[32], b[33], b[34], b[35]]),
            device_id: u32::from_le_bytes([b[36], b[37], b[38], b[39]]),
            system_enumerator: u16::from_le_bytes([b[40], b[41]]),
            flags: u16::from_le_bytes([b[42], b[43]]),
            fragment_total: u32::from_le_bytes([b[48], b[49], b[50], b[51]]),
            fragment_index: u32::from_le_bytes([b[52], b[53], b[54], b[55]]),
            // bytes 44..48 and 56..64 are reserved padding to DRF_SIZE.
        }
    }

    pub fn encode(&self, out: &mut [u8]) {
        out[0..2].copy_from_slice(&self.protocol_version.to_le_bytes());
        out[2..4].copy_from_slice(&self.offset.to_le_bytes());
        out[4..8].copy_from_slice(&self.sync_pattern.to_le_bytes());
        out[8..12].copy_from_slice(&self.size.to_le_bytes());
        out[12..16].copy_from_slice(&self.optional_data_offset.to_le_bytes());
        out[16..20].copy_from_slice(&self.optional_data_id.to_le_bytes());
        self.seven_k_time.encode(&mut out[20..30]);
        out[30..32].copy_from_slice(&self.record_version.to_le_bytes());
        out[32..36].copy_from_slice(&self.record_type_id.to_le_bytes());
        out[36..40].copy_from_slice(&self.device_id.to_le_bytes());
        out[40..42].copy_from_slice(&self.system_enumerator.to_le_bytes());
        out[42..44].copy_from_slice(&self.flags.to_le_bytes());
        out[44..48].fill(0);
        out[48..52].copy_from_slice(&self.fragment_total.to_le_bytes());
        out[52..56].copy_from_slice(&self.fragment_index.to_le_bytes());
        out[56..64].fill(0);
    }

    pub fn checksum_present(&self) -> bool {
        self.flags & DRF_FLAG_CHECKSUM_PRESENT != 0
    }

    /// Acceptance rules from spec §4.1 for the bare-DRF path.
    pub fn validate(&self) -> Result<(), SonarframeError> {
        if self.protocol_version != DRF_PROTO {
            return Err(SonarframeError::ProtocolVersion {
                expected: DRF_PROTO,
                found: self.protocol_version,
            });
        }
        if self.sync_pattern != DRF_SYNC {
            return Err(SonarframeError::SyncPattern { found: self.sync_pattern });
        }
        if self.size <= DRF_SIZE || self.size > crate::MAX_FRAME_BYTES {
            return Err(SonarframeError::SizeOutOfRange { size: self.size });
        }
        Ok(())
    }

    /// Computes the trailing byte-sum checksum over `frame_bytes[..frame_bytes.len() - 4]`,
    /// where `frame_bytes` is the full header + payload (checksum bytes excluded by the caller).
    pub fn compute_checksum(frame_bytes_without_checksum: &[u8]) -> u32 {
        byte_sum_checksum(frame_bytes_without_checksum)
    }

    /// Validates the trailing checksum of a fully-assembled frame (header + payload + 4 checksum
    /// bytes), per spec §4.1 "VALIDATE_CHECKSUM".
    pub fn verify_checksum(full_frame: &[u8]) -> Result<(), SonarframeError> {
        let n = full_frame.len();
        let body = &full_frame[..n - DRF_CHECKSUM_BYTES as usize];
        let tail = &full_frame[n - DRF_CHECKSUM_BYTES as usize..];
        let expected = u32::from_le_bytes([tail[0], tail[1], tail[2], tail[3]]);
        let computed = Self::compute_checksum(body);
        if expected != computed {
            return Err(SonarframeError::ChecksumMismatch { expected, computed });
        }
        Ok(())
    }
}

/// RTH carried by a REMCON ([`crate::enums::RecordTypeId::Remcon`]) data record (§4.3).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Remcon7500Rth {
    pub remcon_id: RemconId,
    pub ticket: u32,
    pub tracking_number: [u8; 16],
}

impl Remcon7500Rth {
    pub const ENCODED_LEN: usize = 24;

    pub fn encode(&self, out: &mut [u8]) {
        out[0..4].copy_from_slice(&(self.remcon_id as u32).to_le_bytes());
        out[4..8].copy_from_slice(&self.ticket.to_le_bytes());
        out[8..24].copy_from_slice(&self.tracking_number);
    }

    pub fn decode(b: &[u8]) -> Result<Self, SonarframeError> {
        use num::FromPrimitive;
        let raw = u32::from_le_bytes([b[0], b[1], b[2], b[3]]);
        let remcon_id = RemconId::from_u32(raw).ok_or(SonarframeError::UnrecognizedRecordId { id: raw })?;
        let ticket = u32::from_le_bytes([b[4], b[5], b[6], b[7]]);
        let mut tracking_number = [0u8; 16];
        tracking_number.copy_from_slice(&b[8..24]);
        Ok(Remcon7500Rth { remcon_id, ticket, tracking_number })
    }
}

/// Record-data body of a subscribe request: `{record_count, ids[0..record_count]}`.
#[derive(Debug, Clone, PartialEq)]
pub struct SubscribeBody {
    pub ids: Vec<u32>,
}

impl SubscribeBody {
    pub fn encoded_len(&self) -> usize {
        4 + 4 * self.ids.len()
    }

    pub fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&(self.ids.len() as u32).to_le_bytes());
        for id in &self.ids {
            out.extend_from_slice(&id.to_le_bytes());
        }
    }

    pub fn decode(b: &[u8]) -> Self {
        let count = u32::from_le_bytes([b[0], b[1], b[2], b[3]]) as usize;
        let ids = b[4..4 + count * 4]
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        SubscribeBody { ids }
    }
}

/// Record-data body of a device-configuration request: `{record_type}`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfigRequestBody {
    pub record_type: u32,
}

impl ConfigRequestBody {
    pub const ENCODED_LEN: usize = 4;

    pub fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.record_type.to_le_bytes());
    }

    pub fn decode(b: &[u8]) -> Self {
        ConfigRequestBody {
            record_type: u32::from_le_bytes([b[0], b[1], b[2], b[3]]),
        }
    }
}

/// The decoded `[u32 data_size][u32 packed_id]` prologue of a GSF record envelope (§3 "GSF record
/// envelope").
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GsfRecordId {
    pub checksum_flag: bool,
    pub reserved: u16,
    pub record_type_id: u32,
}

impl GsfRecordId {
    const RECORD_TYPE_MASK: u32 = 0x003F_FFFF;
    const RESERVED_SHIFT: u32 = 22;
    const RESERVED_MASK: u32 = 0x1FF;
    const CHECKSUM_BIT: u32 = 0x8000_0000;

    pub fn encode(self) -> u32 {
        let mut packed = self.record_type_id & Self::RECORD_TYPE_MASK;
        packed |= (self.reserved as u32 & Self::RESERVED_MASK) << Self::RESERVED_SHIFT;
        if self.checksum_flag {
            packed |= Self::CHECKSUM_BIT;
        }
        packed
    }

    pub fn decode(packed: u32) -> Self {
        GsfRecordId {
            checksum_flag: packed & Self::CHECKSUM_BIT != 0,
            reserved: ((packed >> Self::RESERVED_SHIFT) & Self::RESERVED_MASK) as u16,
            record_type_id: packed & Self::RECORD_TYPE_MASK,
        }
    }
}

/// One `{compression_flag, multiplier, offset}` entry governing the quantization of a single
/// beam-array subrecord (§3 "Scale factor semantics").
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleFactorEntry {
    pub compression_flag: u8,
    pub multiplier: f64,
    pub offset: f64,
}

impl ScaleFactorEntry {
    /// Low nibble: type tag. High nibble: field-width tag (1, 2, or 4 bytes; default 2).
    pub fn field_width_bytes(&self) -> u8 {
        match self.compression_flag >> 4 {
            1 => 1,
            4 => 4,
            _ => 2,
        }
    }

    /// `q = round((v + offset) * multiplier)`.
    pub fn quantize(&self, v: f64) -> i64 {
        ((v + self.offset) * self.multiplier).round() as i64
    }

    /// Inverse of [`ScaleFactorEntry::quantize`], clamped to the field's representable range.
    pub fn dequantize(&self, q: i64, min: i64, max: i64) -> f64 {
        let q = q.clamp(min, max);
        (q as f64) / self.multiplier - self.offset
    }
}

/// Per-beam-array-subrecord scale factor table, indexed by `subrecord_id - 1`.
#[derive(Debug, Clone)]
pub struct ScaleFactorTable {
    entries: [Option<ScaleFactorEntry>; GSF_MAX_PING_ARRAY_SUBRECORDS],
}

impl Default for ScaleFactorTable {
    fn default() -> Self {
        ScaleFactorTable {
            entries: [None; GSF_MAX_PING_ARRAY_SUBRECORDS],
        }
    }
}

impl ScaleFactorTable {
    pub fn get(&self, subrecord_id: usize) -> Option<&ScaleFactorEntry> {
        self.entries.get(subrecord_id.wrapping_sub(1)).and_then(|e| e.as_ref())
    }

    pub fn set(&mut self, subrecord_id: usize, entry: ScaleFactorEntry) -> Result<(), SonarframeError> {
        let idx = subrecord_id
            .checked_sub(1)
            .filter(|&i| i < GSF_MAX_PING_ARRAY_SUBRECORDS)
            .ok_or(SonarframeError::TooManyArraySubrecords)?;
        if self.entries[idx].is_none() && self.num_array_subrecords() + 1 > GSF_MAX_PING_ARRAY_SUBRECORDS {
            return Err(SonarframeError::TooManyArraySubrecords);
        }
        self.entries[idx] = Some(entry);
        Ok(())
    }

    pub fn num_array_subrecords(&self) -> usize {
        self.entries.iter().filter(|e| e.is_some()).count()
    }
}

/// One `{sec, nsec, addr}` entry of a GSF sidecar index (§3 "GSF index").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GsfIndexEntry {
    pub sec: i32,
    pub nsec: i32,
    pub addr: i64,
}

impl GsfIndexEntry {
    pub const ENCODED_LEN: usize = 16;

    /// Byte-swaps each field independently -- the per-field approach mandated by the resolved
    /// Open Question in spec §9 on `gsfIndexTime`'s endianness handling.
    pub fn encode(&self, out: &mut [u8]) {
        out[0..4].copy_from_slice(&self.sec.to_be_bytes());
        out[4..8].copy_from_slice(&self.nsec.to_be_bytes());
        out[8..16].copy_from_slice(&self.addr.to_be_bytes());
    }

    pub fn decode(b: &[u8]) -> Self {
        GsfIndexEntry {
            sec: i32::from_be_bytes([b[0], b[1], b[2], b[3]]),
            nsec: i32::from_be_bytes([b[4], b[5], b[6], b[7]]),
            addr: i64::from_be_bytes([b[8], b[9], b[10], b[11], b[12], b[13], b[14], b[15]]),
        }
    }
}
