//! Client side of the 7K subscription/control protocol (§4.3): builds REMCON subscribe and
//! config-request frames, sends them over a [`crate::transport::ByteTransport`], and classifies
//! the device's ACK/NACK reply.
//!
//! Grounded on `r7kc.c`'s `r7k_subscribe`/config-request pair: a REMCON record's RTH carries a
//! `remcon_id`, a monotone `ticket`, and a 16-byte `tracking_number` the device echoes back in its
//! reply so the client can match requests to responses.
use std::sync::atomic::{AtomicU32, Ordering};

use sonarframe_core::enums::{DeviceMnemonic, RecordTypeId, RemconId};
use sonarframe_core::errors::SonarframeError;
use sonarframe_core::header_structs::{
    ConfigRequestBody, DataRecordFrame, Remcon7500Rth, SevenKTime, SubscribeBody,
};
use sonarframe_core::{DRF_PROTO, DRF_SIZE, DRF_SYNC};

use crate::transport::ByteTransport;

/// Outcome of a request, decoded from the device's REMCON_ACK/REMCON_NACK reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemconReply {
    Ack { ticket: u32 },
    Nack { ticket: u32 },
}

/// Issues subscribe and device-configuration requests against one 7K device connection.
///
/// `ticket` and `tracking_number` are process-local monotone counters (§4.3): each request gets a
/// fresh ticket, and the `tracking_number` is the ticket's little-endian bytes zero-padded to 16,
/// which is sufficient for this client to recognize its own replies without a shared clock.
pub struct SubscriptionClient {
    device: DeviceMnemonic,
    next_ticket: AtomicU32,
}

impl SubscriptionClient {
    pub fn new(device: DeviceMnemonic) -> Self {
        SubscriptionClient { device, next_ticket: AtomicU32::new(1) }
    }

    fn next_rth(&self) -> (Remcon7500Rth, u32) {
        let ticket = self.next_ticket.fetch_add(1, Ordering::SeqCst);
        let mut tracking_number = [0u8; 16];
        tracking_number[0..4].copy_from_slice(&ticket.to_le_bytes());
        (
            Remcon7500Rth { remcon_id: RemconId::Sub, ticket, tracking_number },
            ticket,
        )
    }

    /// Sends a subscribe request for the given 7K `record_type_id`s.
    pub fn subscribe(
        &self,
        transport: &mut dyn ByteTransport,
        record_type_ids: &[u32],
    ) -> Result<u32, SonarframeError> {
        let (mut rth, ticket) = self.next_rth();
        rth.remcon_id = RemconId::Sub;
        let body = SubscribeBody { ids: record_type_ids.to_vec() };
        let mut payload = Vec::with_capacity(Remcon7500Rth::ENCODED_LEN + body.encoded_len());
        let mut rth_bytes = [0u8; Remcon7500Rth::ENCODED_LEN];
        rth.encode(&mut rth_bytes);
        payload.extend_from_slice(&rth_bytes);
        body.encode(&mut payload);
        self.send_remcon(transport, &payload)?;
        Ok(ticket)
    }

    /// Sends a device-configuration request for one 7K `record_type_id`.
    pub fn request_config(
        &self,
        transport: &mut dyn ByteTransport,
        record_type: u32,
    ) -> Result<u32, SonarframeError> {
        let (mut rth, ticket) = self.next_rth();
        rth.remcon_id = RemconId::ReqRec;
        let body = ConfigRequestBody { record_type };
        let mut payload = Vec::with_capacity(Remcon7500Rth::ENCODED_LEN + ConfigRequestBody::ENCODED_LEN);
        let mut rth_bytes = [0u8; Remcon7500Rth::ENCODED_LEN];
        rth.encode(&mut rth_bytes);
        payload.extend_from_slice(&rth_bytes);
        body.encode(&mut payload);
        self.send_remcon(transport, &payload)?;
        Ok(ticket)
    }

    /// The `(device_id, system_enumerator)` this client identifies itself as.
    pub fn device(&self) -> DeviceMnemonic {
        self.device
    }

    fn send_remcon(&self, transport: &mut dyn ByteTransport, payload: &[u8]) -> Result<(), SonarframeError> {
        let (device_id, system_enumerator) = self.device.device_and_enumerator();
        let drf = DataRecordFrame {
            protocol_version: DRF_PROTO,
            offset: DRF_SIZE as u16,
            sync_pattern: DRF_SYNC,
            size: DRF_SIZE + payload.len() as u32,
            optional_data_offset: 0,
            optional_data_id: 0,
            seven_k_time: SevenKTime { year: 0, day: 0, seconds: 0.0, hours: 0, minutes: 0 },
            record_version: 1,
            record_type_id: RecordTypeId::Remcon as u32,
            device_id,
            system_enumerator,
            flags: 0,
            fragment_total: 1,
            fragment_index: 0,
        };
        let mut out = vec![0u8; DataRecordFrame::ENCODED_LEN];
        drf.encode(&mut out);
        out.extend_from_slice(payload);
        transport.write_all(&out).map_err(SonarframeError::from)
    }

    /// Interprets a frame already pulled off the stream parser as a REMCON ACK/NACK reply, if it
    /// is one. Returns `None` for frames belonging to a different record type.
    pub fn classify_reply(drf: &DataRecordFrame, payload: &[u8]) -> Option<RemconReply> {
        if payload.len() < Remcon7500Rth::ENCODED_LEN {
            return None;
        }
        let rth = Remcon7500Rth::decode(payload).ok()?;
        if drf.record_type_id == RecordTypeId::RemconAck as u32 {
            Some(RemconReply::Ack { ticket: rth.ticket })
        } else if drf.record_type_id == RecordTypeId::RemconNack as u32 {
            Some(RemconReply::Nack { ticket: rth.ticket })
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::TransportError;

    struct RecordingTransport {
        written: Vec<u8>,
    }

    impl ByteTransport for RecordingTransport {
        fn read_timeout(&mut self, _buf: &mut [u8], _timeout_ms: u32) -> Result<usize, TransportError> {
            Err(TransportError::Timeout)
        }

        fn write_all(&mut self, buf: &[u8]) -> Result<(), TransportError> {
            self.written.extend_from_slice(buf);
            Ok(())
        }
    }

    #[test]
    fn subscribe_issues_increasing_tickets() {
        let client = SubscriptionClient::new(DeviceMnemonic::Reson7125_200);
        let mut t = RecordingTransport { written: Vec::new() };
        let t1 = client.subscribe(&mut t, &[7027, 1012]).unwrap();
        let t2 = client.request_config(&mut t, 7001).unwrap();
        assert!(t2 > t1);
    }

    #[test]
    fn classify_reply_recognizes_ack_and_nack() {
        let rth = Remcon7500Rth { remcon_id: RemconId::Sub, ticket: 5, tracking_number: [0u8; 16] };
        let mut payload = [0u8; Remcon7500Rth::ENCODED_LEN];
        rth.encode(&mut payload);

        let ack_drf = DataRecordFrame {
            protocol_version: DRF_PROTO,
            offset: DRF_SIZE as u16,
            sync_pattern: DRF_SYNC,
            size: DRF_SIZE,
            optional_data_offset: 0,
            optional_data_id: 0,
            seven_k_time: SevenKTime { year: 0, day: 0, seconds: 0.0, hours: 0, minutes: 0 },
            record_version: 1,
            record_type_id: RecordTypeId::RemconAck as u32,
            device_id: 7125,
            system_enumerator: 200,
            flags: 0,
            fragment_total: 1,
            fragment_index: 0,
        };
        assert_eq!(
            SubscriptionClient::classify_reply(&ack_drf, &payload),
            Some(RemconReply::Ack { ticket: 5 })
        );
    }
}
