//! Encoders for the 7K wire headers: Network Frame, Data Record Frame, and the REMCON
//! acknowledgement/negative-acknowledgement reply a server sends back to a subscription request.
//!
//! The manual byte-offset struct-to-bytes logic lives on
//! [`sonarframe_core::header_structs`]'s `encode` methods; this module's job is to assemble
//! whole frames (header + payload + checksum) from those pieces.
use sonarframe_core::enums::RemconId;
use sonarframe_core::errors::SonarframeError;
use sonarframe_core::header_structs::{DataRecordFrame, NetworkFrame, Remcon7500Rth};
use sonarframe_core::{DRF_CHECKSUM_BYTES, NF_SIZE};

/// Encodes a Network Frame header followed immediately by a fully-encoded DRF (header + payload
/// + optional checksum), matching `NetworkFrame::validate`'s invariants by construction.
pub fn encode_net_frame(drf_header: &DataRecordFrame, payload: &[u8], with_checksum: bool) -> Vec<u8> {
    let drf_bytes = encode_drf(drf_header, payload, with_checksum);

    let nf = NetworkFrame {
        protocol_version: sonarframe_core::NF_PROTO,
        offset_to_data: NF_SIZE,
        total_packets: 1,
        total_records: 1,
        transmission_id: 0,
        packet_size: drf_bytes.len() as u32 + NF_SIZE as u32,
        total_size: drf_bytes.len() as u32,
        sequence_number: 0,
        dest_device_id: 0,
        dest_enumerator: 0,
        source_enumerator: 0,
        source_device_id: 0,
    };

    let mut out = vec![0u8; NF_SIZE as usize];
    nf.encode(&mut out);
    out.extend_from_slice(&drf_bytes);
    out
}

/// Encodes a bare DRF: header, then payload, then (optionally) a trailing byte-sum checksum.
/// `drf_header.size` and `drf_header.flags`' checksum bit are overwritten here to stay consistent
/// with `payload.len()` and `with_checksum`, so the caller need not compute them by hand.
pub fn encode_drf(drf_header: &DataRecordFrame, payload: &[u8], with_checksum: bool) -> Vec<u8> {
    use sonarframe_core::header_structs::DRF_FLAG_CHECKSUM_PRESENT;

    let mut header = *drf_header;
    let total_len = DataRecordFrame::ENCODED_LEN
        + payload.len()
        + if with_checksum { DRF_CHECKSUM_BYTES as usize } else { 0 };
    header.size = total_len as u32;
    header.flags = if with_checksum {
        header.flags | DRF_FLAG_CHECKSUM_PRESENT
    } else {
        header.flags & !DRF_FLAG_CHECKSUM_PRESENT
    };

    let mut out = vec![0u8; DataRecordFrame::ENCODED_LEN];
    header.encode(&mut out);
    out.extend_from_slice(payload);

    if with_checksum {
        let checksum = DataRecordFrame::compute_checksum(&out);
        out.extend_from_slice(&checksum.to_le_bytes());
    }
    out
}

/// Encodes a REMCON reply RTH, echoing the request's `remcon_id`/`ticket`/`tracking_number` back
/// to the client as required by spec §4.3's request/reply ticket-matching rule. Whether this is
/// an acknowledgement or a negative-acknowledgement is carried by the enclosing DRF's
/// `record_type_id` (`RecordTypeId::RemconAck` vs `RemconNack`), not by this RTH.
pub fn encode_remcon_reply(remcon_id: RemconId, ticket: u32, tracking_number: [u8; 16]) -> Vec<u8> {
    let rth = Remcon7500Rth { remcon_id, ticket, tracking_number };
    let mut out = vec![0u8; Remcon7500Rth::ENCODED_LEN];
    rth.encode(&mut out);
    out
}

/// Re-decodes a freshly-encoded bare DRF, as a self-check used by callers that want to assert
/// their own output validates before sending it rather than trusting the encoder blindly.
pub fn decode_and_validate_drf(frame_bytes: &[u8]) -> Result<DataRecordFrame, SonarframeError> {
    let header = DataRecordFrame::decode(&frame_bytes[..DataRecordFrame::ENCODED_LEN]);
    header.validate()?;
    if header.checksum_present() {
        DataRecordFrame::verify_checksum(&frame_bytes[..header.size as usize])?;
    }
    Ok(header)
}
