//! The GSF sidecar index: a fixed-width table of `{sec, nsec, addr}` entries giving random access
//! to ping records by time, plus a small header used to detect a stale index (one that no longer
//! matches the data file it was built from).
//!
//! Grounded on `gsf.c`'s `gsfBuildIndex`/`gsfOpenIndex` pair; [`sonarframe_core::header_structs::GsfIndexEntry`]
//! already resolves the `gsfIndexTime` byte-swap ambiguity (see DESIGN.md).
use std::convert::TryInto;
use std::fs::File;
use std::io::{Read, Write};

use sonarframe_core::errors::SonarframeError;
use sonarframe_core::header_structs::GsfIndexEntry;

const INDEX_MAGIC: &[u8; 4] = b"GIDX";

/// Sidecar index header: `data_file_size` lets [`GsfIndex::open`] detect that the indexed file
/// has since been appended to or truncated, which is staleness per spec §4.4.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct IndexHeader {
    record_count: u32,
    scale_factor_count: u32,
    data_file_size: u64,
}

impl IndexHeader {
    const ENCODED_LEN: usize = 4 + 4 + 4 + 8;

    fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(INDEX_MAGIC);
        out.extend_from_slice(&self.record_count.to_be_bytes());
        out.extend_from_slice(&self.scale_factor_count.to_be_bytes());
        out.extend_from_slice(&self.data_file_size.to_be_bytes());
    }

    fn decode(b: &[u8]) -> Result<Self, SonarframeError> {
        if &b[0..4] != INDEX_MAGIC {
            return Err(SonarframeError::IndexStale);
        }
        Ok(IndexHeader {
            record_count: u32::from_be_bytes([b[4], b[5], b[6], b[7]]),
            scale_factor_count: u32::from_be_bytes([b[8], b[9], b[10], b[11]]),
            data_file_size: u64::from_be_bytes([
                b[12], b[13], b[14], b[15], b[16], b[17], b[18], b[19],
            ]),
        })
    }
}

/// An in-memory, time-ordered GSF ping index, plus the parallel array of offsets of ping records
/// that carry a (changed) scale-factor section -- used to resolve the governing scale-factor
/// record for direct (by ping number) access (spec §4.4, §6 "GSF index").
pub struct GsfIndex {
    entries: Vec<GsfIndexEntry>,
    scale_factor_addrs: Vec<i64>,
}

impl GsfIndex {
    pub fn from_entries(entries: Vec<GsfIndexEntry>, scale_factor_addrs: Vec<i64>) -> Self {
        GsfIndex { entries, scale_factor_addrs }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entry(&self, i: usize) -> Option<GsfIndexEntry> {
        self.entries.get(i).copied()
    }

    /// Finds the index of the last entry whose time is `<= (sec, nsec)`, for "nearest ping at or
    /// before this time" lookups. `entries` is assumed sorted ascending by `(sec, nsec)`, which
    /// [`GsfIndex::write`]'s caller is responsible for guaranteeing (pings are appended in
    /// recording order in practice).
    pub fn find_at_or_before(&self, sec: i32, nsec: i32) -> Option<usize> {
        let key = (sec, nsec);
        match self.entries.binary_search_by_key(&key, |e| (e.sec, e.nsec)) {
            Ok(i) => Some(i),
            Err(0) => None,
            Err(i) => Some(i - 1),
        }
    }

    /// Finds the file offset of the scale-factor-bearing record governing a ping at `ping_addr`
    /// -- the last entry in `scale_factor_addrs` (assumed ascending by file order) at or before
    /// `ping_addr`.
    pub fn governing_scale_factor_addr(&self, ping_addr: i64) -> Option<i64> {
        match self.scale_factor_addrs.binary_search(&ping_addr) {
            Ok(i) => Some(self.scale_factor_addrs[i]),
            Err(0) => None,
            Err(i) => Some(self.scale_factor_addrs[i - 1]),
        }
    }

    /// Writes the index to `path`, stamping it with `data_file_size` so [`GsfIndex::open`] can
    /// detect staleness against the indexed file.
    pub fn write(&self, path: &str, data_file_size: u64) -> Result<(), SonarframeError> {
        let header = IndexHeader {
            record_count: self.entries.len() as u32,
            scale_factor_count: self.scale_factor_addrs.len() as u32,
            data_file_size,
        };
        let mut out = Vec::with_capacity(
            IndexHeader::ENCODED_LEN + self.entries.len() * GsfIndexEntry::ENCODED_LEN + self.scale_factor_addrs.len() * 8,
        );
        header.encode(&mut out);
        for e in &self.entries {
            let mut buf = [0u8; GsfIndexEntry::ENCODED_LEN];
            e.encode(&mut buf);
            out.extend_from_slice(&buf);
        }
        for addr in &self.scale_factor_addrs {
            out.extend_from_slice(&addr.to_be_bytes());
        }
        let mut f = File::create(path).map_err(SonarframeError::FOpenError)?;
        f.write_all(&out)?;
        Ok(())
    }

    /// Reads an index from `path`, rejecting it with [`SonarframeError::IndexStale`] if its stamped
    /// `data_file_size` does not match `expected_data_file_size`.
    pub fn open(path: &str, expected_data_file_size: u64) -> Result<Self, SonarframeError> {
        let mut f = File::open(path).map_err(SonarframeError::FOpenError)?;
        let mut bytes = Vec::new();
        f.read_to_end(&mut bytes)?;
        if bytes.len() < IndexHeader::ENCODED_LEN {
            return Err(SonarframeError::IndexStale);
        }
        let header = IndexHeader::decode(&bytes[..IndexHeader::ENCODED_LEN])?;
        if header.data_file_size != expected_data_file_size {
            return Err(SonarframeError::IndexStale);
        }
        let rest = &bytes[IndexHeader::ENCODED_LEN..];
        let entries_len = header.record_count as usize * GsfIndexEntry::ENCODED_LEN;
        let scale_factors_len = header.scale_factor_count as usize * 8;
        if rest.len() != entries_len + scale_factors_len {
            return Err(SonarframeError::IndexStale);
        }
        let entries = rest[..entries_len]
            .chunks_exact(GsfIndexEntry::ENCODED_LEN)
            .map(GsfIndexEntry::decode)
            .collect();
        let scale_factor_addrs = rest[entries_len..]
            .chunks_exact(8)
            .map(|b| i64::from_be_bytes(b.try_into().unwrap()))
            .collect();
        Ok(GsfIndex { entries, scale_factor_addrs })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(sec: i32, nsec: i32, addr: i64) -> GsfIndexEntry {
        GsfIndexEntry { sec, nsec, addr }
    }

    #[test]
    fn round_trips_through_a_file() {
        let idx = GsfIndex::from_entries(vec![entry(100, 0, 64), entry(101, 0, 128), entry(102, 0, 192)], vec![64]);
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let path = tmp.path().to_str().unwrap();
        idx.write(path, 4096).unwrap();
        let reopened = GsfIndex::open(path, 4096).unwrap();
        assert_eq!(reopened.len(), 3);
        assert_eq!(reopened.entry(1), Some(entry(101, 0, 128)));
        assert_eq!(reopened.governing_scale_factor_addr(128), Some(64));
    }

    #[test]
    fn stale_size_is_rejected() {
        let idx = GsfIndex::from_entries(vec![entry(100, 0, 64)], vec![]);
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let path = tmp.path().to_str().unwrap();
        idx.write(path, 4096).unwrap();
        assert!(matches!(GsfIndex::open(path, 9999), Err(SonarframeError::IndexStale)));
    }

    #[test]
    fn find_at_or_before_picks_the_nearest_earlier_entry() {
        let idx = GsfIndex::from_entries(vec![entry(100, 0, 0), entry(110, 0, 1), entry(120, 0, 2)], vec![]);
        assert_eq!(idx.find_at_or_before(115, 0), Some(1));
        assert_eq!(idx.find_at_or_before(99, 0), None);
        assert_eq!(idx.find_at_or_before(120, 0), Some(2));
    }

    #[test]
    fn governing_scale_factor_addr_picks_the_last_one_at_or_before() {
        let idx = GsfIndex::from_entries(vec![], vec![10, 40]);
        assert_eq!(idx.governing_scale_factor_addr(5), None);
        assert_eq!(idx.governing_scale_factor_addr(10), Some(10));
        assert_eq!(idx.governing_scale_factor_addr(25), Some(10));
        assert_eq!(idx.governing_scale_factor_addr(40), Some(40));
        assert_eq!(idx.governing_scale_factor_addr(100), Some(40));
    }
}
