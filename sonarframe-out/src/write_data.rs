//! Stateless encoders for the GSF record envelope and the swath-bathymetry ping body.
//!
//! A pure function from typed sample data to wire bytes, parameterized by a format descriptor,
//! pointed here at GSF's `[u32 data_size][u32 packed_id]` record envelope and its
//! scale-factor-quantized beam arrays.
use sonarframe_core::bitconverter::byte_sum_checksum;
use sonarframe_core::enums::GsfRecordType;
use sonarframe_core::header_structs::{GsfRecordId, ScaleFactorEntry};

/// Encodes one GSF record: `[u32 data_size][u32 packed_id][body][optional 4-byte checksum]`,
/// padded to a 4-byte boundary. `data_size` covers `body` plus the checksum, matching what
/// `sonarframe_in::gsf_reader::GsfReader::read_envelope` expects to read back.
///
/// This writer always stamps the current (>=1.3) format (see
/// [`crate::settings::GsfWriterVersion`]), so padding always uses the post-1.3 rule
/// `(4 - data_size % 4) % 4` -- the pre-1.3 historical bug (`data_size % 4`) is only ever
/// reproduced on the read side for old files, never produced here.
pub fn encode_record(record_type: GsfRecordType, body: &[u8], with_checksum: bool) -> Vec<u8> {
    let data_size = body.len() + if with_checksum { 4 } else { 0 };
    let record_id = GsfRecordId { checksum_flag: with_checksum, reserved: 0, record_type_id: record_type as u32 };
    let pad = (4 - (data_size % 4)) % 4;

    let mut out = Vec::with_capacity(8 + data_size + pad);
    out.extend_from_slice(&(data_size as u32).to_be_bytes());
    out.extend_from_slice(&record_id.encode().to_be_bytes());
    out.extend_from_slice(body);
    if with_checksum {
        out.extend_from_slice(&byte_sum_checksum(body).to_be_bytes());
    }
    out.extend(std::iter::repeat(0u8).take(pad));
    out
}

/// Encodes the `"GSF-vM.m"` header record body, NUL-padded to `len` bytes.
pub fn encode_header_body(major: u32, minor: u32, len: usize) -> Vec<u8> {
    let text = format!("{}{}.{}", sonarframe_core::GSF_HEADER_PREFIX, major, minor);
    let mut body = vec![0u8; len.max(text.len())];
    sonarframe_core::bitconverter::string_to_ascii_bytes(&text, &mut body);
    body
}

/// One beam-array subrecord ready to be quantized and written.
pub struct ArrayWrite<'a> {
    pub subrecord_id: u32,
    pub values: &'a [f64],
}

/// Encodes a swath-bathymetry (or single-beam) ping body: `{sec, nsec, number_beams}`, a
/// scale-factor section for every entry in `changed_scale_factors` (the subset that changed since
/// the last ping -- GSF only repeats an entry when it changes, matching the read side's
/// `ScaleFactorTable` persistence), then the array subrecords, quantized against
/// `resolve_entry`.
///
/// Returns `EncodeOverflow` if an array's value count does not match `number_beams`, or
/// `UnrecognizedArraySubrecordId` if an array's subrecord id has no resolvable scale-factor entry.
pub fn encode_ping_body(
    sec: i32,
    nsec: i32,
    number_beams: u32,
    changed_scale_factors: &[(u32, ScaleFactorEntry)],
    arrays: &[ArrayWrite],
    resolve_entry: impl Fn(u32) -> Option<ScaleFactorEntry>,
) -> Result<Vec<u8>, sonarframe_core::errors::SonarframeError> {
    use sonarframe_core::enums::RecordTypeId;
    use sonarframe_core::errors::SonarframeError;

    let mut body = Vec::new();
    body.extend_from_slice(&sec.to_be_bytes());
    body.extend_from_slice(&nsec.to_be_bytes());
    body.extend_from_slice(&number_beams.to_be_bytes());

    body.extend_from_slice(&(changed_scale_factors.len() as u16).to_be_bytes());
    for (subrecord_id, entry) in changed_scale_factors {
        body.extend_from_slice(&(*subrecord_id as u16).to_be_bytes());
        body.push(entry.compression_flag);
        body.extend_from_slice(&entry.multiplier.to_be_bytes());
        body.extend_from_slice(&entry.offset.to_be_bytes());
    }

    body.extend_from_slice(&(arrays.len() as u16).to_be_bytes());
    for array in arrays {
        if array.values.len() != number_beams as usize {
            return Err(SonarframeError::EncodeOverflow { kind: RecordTypeId::SwathBathyPing });
        }
        let entry = resolve_entry(array.subrecord_id)
            .ok_or(SonarframeError::UnrecognizedArraySubrecordId { id: array.subrecord_id })?;
        body.extend_from_slice(&(array.subrecord_id as u16).to_be_bytes());

        let width = entry.field_width_bytes();
        let (min, max): (i64, i64) = match width {
            1 => (u8::MIN as i64, u8::MAX as i64),
            2 => (i16::MIN as i64, i16::MAX as i64),
            _ => (i32::MIN as i64, i32::MAX as i64),
        };
        for &v in array.values {
            let q = entry.quantize(v).clamp(min, max);
            match width {
                1 => body.push(q as u8),
                2 => body.extend_from_slice(&(q as i16).to_be_bytes()),
                _ => body.extend_from_slice(&(q as i32).to_be_bytes()),
            }
        }
    }

    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_record_reports_data_size_including_checksum() {
        let body = vec![1u8, 2, 3, 4];
        let bytes = encode_record(GsfRecordType::Comment, &body, true);
        let data_size = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        assert_eq!(data_size as usize, body.len() + 4);
        assert_eq!(bytes.len(), 8 + body.len() + 4);
    }

    #[test]
    fn encode_record_pads_a_non_aligned_body_to_a_4_byte_boundary() {
        let body = vec![1u8, 2, 3];
        let bytes = encode_record(GsfRecordType::Comment, &body, false);
        let data_size = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize;
        assert_eq!(data_size, 3);
        assert_eq!(bytes.len(), 8 + 3 + 1);
        assert_eq!(*bytes.last().unwrap(), 0);
    }

    #[test]
    fn encode_ping_body_rejects_unknown_subrecord() {
        let arrays = [ArrayWrite { subrecord_id: 1, values: &[1.0, 2.0] }];
        let err = encode_ping_body(0, 0, 2, &[], &arrays, |_| None);
        assert!(err.is_err());
    }

    #[test]
    fn encode_ping_body_quantizes_against_resolved_entry() {
        let entry = ScaleFactorEntry { compression_flag: 0x20, multiplier: 100.0, offset: 0.0 };
        let arrays = [ArrayWrite { subrecord_id: 1, values: &[12.34, 56.78] }];
        let body = encode_ping_body(10, 0, 2, &[(1, entry)], &arrays, move |id| (id == 1).then_some(entry))
            .expect("encodes");
        assert!(body.len() > 12);
    }
}
