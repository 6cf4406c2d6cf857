//! A growable, offset-indexed store of raw DRF frames accepted by the [`crate::parser`].
//!
//! An owned byte buffer plus a parallel offset table gives O(1) random access to each record;
//! unlike a read-only mmap over an existing file, this store is append-only and also backs the
//! subscription client's incoming-record queue.
use sonarframe_core::errors::SonarframeError;
use sonarframe_core::header_structs::DataRecordFrame;

/// One accepted frame's position within [`DrfContainer`]'s backing buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Entry {
    start: usize,
    end: usize,
}

/// Sequential, append-only collection of DRF frames (header + payload + optional checksum),
/// indexed by insertion order.
///
/// The backing buffer is pre-allocated to `capacity` and never grows past it (§5 resource
/// policy); `add` returns [`SonarframeError::NoSpace`] once exhausted rather than reallocating.
pub struct DrfContainer {
    data: Vec<u8>,
    capacity: usize,
    entries: Vec<Entry>,
}

impl DrfContainer {
    pub fn with_capacity(capacity: usize) -> Self {
        DrfContainer {
            data: Vec::with_capacity(capacity),
            capacity,
            entries: Vec::new(),
        }
    }

    /// Appends one frame's raw bytes (as produced by [`crate::parser::ParsedFrame::raw`]),
    /// returning its index.
    pub fn add(&mut self, raw: &[u8]) -> Result<usize, SonarframeError> {
        if self.data.len() + raw.len() > self.capacity {
            return Err(SonarframeError::NoSpace);
        }
        let start = self.data.len();
        self.data.extend_from_slice(raw);
        let end = self.data.len();
        self.entries.push(Entry { start, end });
        Ok(self.entries.len() - 1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the raw bytes of the frame at `index`.
    pub fn get_raw(&self, index: usize) -> Option<&[u8]> {
        self.entries.get(index).map(|e| &self.data[e.start..e.end])
    }

    /// Decodes just the DRF header at `index`, without re-validating it (the parser already did).
    pub fn get_header(&self, index: usize) -> Option<DataRecordFrame> {
        self.get_raw(index)
            .map(|raw| DataRecordFrame::decode(&raw[..DataRecordFrame::ENCODED_LEN]))
    }

    pub fn iter(&self) -> impl Iterator<Item = &[u8]> {
        self.entries.iter().map(move |e| &self.data[e.start..e.end])
    }

    /// Finds the index of the first frame whose `record_type_id` matches `id`, if any.
    pub fn find_by_record_type(&self, id: u32) -> Option<usize> {
        (0..self.entries.len()).find(|&i| self.get_header(i).map(|h| h.record_type_id) == Some(id))
    }

    /// Bytes used of `capacity`.
    pub fn bytes_used(&self) -> usize {
        self.data.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sonarframe_core::header_structs::SevenKTime;
    use sonarframe_core::{DRF_PROTO, DRF_SIZE, DRF_SYNC};

    fn sample(record_type_id: u32) -> Vec<u8> {
        let drf = DataRecordFrame {
            protocol_version: DRF_PROTO,
            offset: DRF_SIZE as u16,
            sync_pattern: DRF_SYNC,
            size: DRF_SIZE,
            optional_data_offset: 0,
            optional_data_id: 0,
            seven_k_time: SevenKTime { year: 2024, day: 1, seconds: 0.0, hours: 0, minutes: 0 },
            record_version: 1,
            record_type_id,
            device_id: 7125,
            system_enumerator: 400,
            flags: 0,
            fragment_total: 1,
            fragment_index: 0,
        };
        let mut out = vec![0u8; DataRecordFrame::ENCODED_LEN];
        drf.encode(&mut out);
        out
    }

    #[test]
    fn add_and_retrieve_roundtrips() {
        let mut c = DrfContainer::with_capacity(4096);
        let idx = c.add(&sample(7027)).unwrap();
        assert_eq!(c.len(), 1);
        assert_eq!(c.get_header(idx).unwrap().record_type_id, 7027);
        assert_eq!(c.find_by_record_type(7027), Some(0));
        assert_eq!(c.find_by_record_type(9999), None);
    }

    #[test]
    fn add_past_capacity_fails_without_growing() {
        let mut c = DrfContainer::with_capacity(DataRecordFrame::ENCODED_LEN);
        c.add(&sample(7027)).unwrap();
        assert!(matches!(c.add(&sample(7027)), Err(SonarframeError::NoSpace)));
    }
}
