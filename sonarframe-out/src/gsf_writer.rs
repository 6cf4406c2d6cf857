//! Stateful GSF file writer: owns the open file handle, the running
//! [`ScaleFactorTable`](sonarframe_core::header_structs::ScaleFactorTable), and (optionally) the
//! sidecar index, and drives [`crate::write_data`]'s stateless encoders.
//!
//! An owned file handle plus accumulated header state, with `write_ping`/
//! `write_processing_parameters` as the per-unit write entry points.
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::Write;

use sonarframe_core::enums::GsfRecordType;
use sonarframe_core::errors::SonarframeError;
use sonarframe_core::header_structs::{GsfIndexEntry, ScaleFactorEntry, ScaleFactorTable};
use sonarframe_core::ProcessingParameterSet;

use crate::settings::GsfWriteSettings;
use crate::utils::{scale_factor_for_precision, AutoOffsetState};
use crate::write_data::{encode_header_body, encode_ping_body, encode_record, ArrayWrite};

/// Sequential GSF writer. One ping's scale-factor changes are tracked via `dirty` and flushed
/// into the next `write_ping` call's scale-factor section, matching the read side's rule that a
/// scale factor is only repeated on the wire when it changes.
pub struct GsfWriter {
    file: File,
    path: String,
    settings: GsfWriteSettings,
    scale_factors: ScaleFactorTable,
    auto_offset: HashMap<u32, AutoOffsetState>,
    dirty: Vec<u32>,
    index_entries: Vec<GsfIndexEntry>,
    /// Offsets of ping records that carried a (changed) scale-factor section, mirroring
    /// `sonarframe_in::gsf_index::GsfIndex`'s parallel array for direct-access resolution.
    scale_factor_addrs: Vec<i64>,
    bytes_written: u64,
}

impl GsfWriter {
    /// Creates `path`, truncating any existing file, and writes the `"GSF-vM.m"` header record.
    pub fn create(path: &str, settings: GsfWriteSettings) -> Result<Self, SonarframeError> {
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .map_err(SonarframeError::FOpenError)?;

        let header_body = encode_header_body(settings.version.major, settings.version.minor, 16);
        let header_record = encode_record(GsfRecordType::Header, &header_body, false);
        file.write_all(&header_record)?;

        Ok(GsfWriter {
            bytes_written: header_record.len() as u64,
            file,
            path: path.to_string(),
            settings,
            scale_factors: ScaleFactorTable::default(),
            auto_offset: HashMap::new(),
            dirty: Vec::new(),
            index_entries: Vec::new(),
            scale_factor_addrs: Vec::new(),
        })
    }

    /// Sets a subrecord's scale factor directly (the non-auto-offset path), marking it dirty so
    /// it is included in the next ping's scale-factor section.
    pub fn load_scale_factor(
        &mut self,
        subrecord_id: u32,
        entry: ScaleFactorEntry,
    ) -> Result<(), SonarframeError> {
        self.scale_factors.set(subrecord_id as usize, entry)?;
        if !self.dirty.contains(&subrecord_id) {
            self.dirty.push(subrecord_id);
        }
        Ok(())
    }

    /// Computes and loads a scale factor via the depth-layer DC-offset heuristic (§4.4
    /// supplement), from the depth values about to be written for `subrecord_id`.
    pub fn load_scale_factor_auto_offset(
        &mut self,
        subrecord_id: u32,
        precision: f64,
        field_width_bytes: u8,
        depths: &[f64],
        reset: bool,
    ) -> Result<(), SonarframeError> {
        let (min_depth, max_depth) =
            crate::utils::get_array_min_max(depths).ok_or(SonarframeError::CannotRepresentPrecision { precision })?;
        let state = self.auto_offset.entry(subrecord_id).or_insert_with(AutoOffsetState::new);
        let offset = state.update(precision, min_depth, max_depth, reset);
        let entry = scale_factor_for_precision(precision, offset, field_width_bytes)?;
        self.load_scale_factor(subrecord_id, entry)
    }

    /// Encodes and writes one swath-bathymetry ping, flushing any scale factors loaded since the
    /// previous ping and clearing the dirty set afterwards.
    pub fn write_ping(
        &mut self,
        sec: i32,
        nsec: i32,
        number_beams: u32,
        arrays: &[ArrayWrite],
    ) -> Result<(), SonarframeError> {
        let offset = self.bytes_written;

        let changed: Vec<(u32, ScaleFactorEntry)> = self
            .dirty
            .iter()
            .filter_map(|&id| self.scale_factors.get(id as usize).map(|e| (id, *e)))
            .collect();

        let scale_factors = &self.scale_factors;
        let body = encode_ping_body(sec, nsec, number_beams, &changed, arrays, |id| {
            scale_factors.get(id as usize).copied()
        })?;
        let record = encode_record(GsfRecordType::SwathBathymetryPing, &body, self.settings.write_checksums);

        self.file.write_all(&record)?;
        self.bytes_written += record.len() as u64;
        let carried_scale_factors = !changed.is_empty();
        self.dirty.clear();

        if self.settings.maintain_index {
            if number_beams > 0 {
                self.index_entries.push(GsfIndexEntry { sec, nsec, addr: offset as i64 });
            }
            if carried_scale_factors {
                self.scale_factor_addrs.push(offset as i64);
            }
        }
        Ok(())
    }

    /// Encodes and writes a `ProcessingParameters` record.
    pub fn write_processing_parameters(&mut self, params: &ProcessingParameterSet) -> Result<(), SonarframeError> {
        let body = params.encode().into_bytes();
        let record = encode_record(GsfRecordType::ProcessingParameters, &body, self.settings.write_checksums);
        self.file.write_all(&record)?;
        self.bytes_written += record.len() as u64;
        Ok(())
    }

    /// Flushes the underlying file and, if `settings.maintain_index` is set, writes the sidecar
    /// `{path}.gidx` index accumulated over this session's `write_ping` calls.
    pub fn finish(self) -> Result<(), SonarframeError> {
        if self.settings.maintain_index {
            self.write_index_file()?;
        }
        let mut file = self.file;
        file.flush().map_err(SonarframeError::FlushError)?;
        Ok(())
    }

    /// Writes `{path}.gidx` in the same layout `sonarframe_in::gsf_index::GsfIndex` reads:
    /// `GIDX` magic, `record_count`, `scale_factor_count`, `data_file_size`, then the ping entries
    /// and the parallel scale-factor-offset array.
    fn write_index_file(&self) -> Result<(), SonarframeError> {
        let index_path = format!("{}.gidx", self.path);
        let mut out = Vec::with_capacity(
            20 + self.index_entries.len() * GsfIndexEntry::ENCODED_LEN + self.scale_factor_addrs.len() * 8,
        );
        out.extend_from_slice(b"GIDX");
        out.extend_from_slice(&(self.index_entries.len() as u32).to_be_bytes());
        out.extend_from_slice(&(self.scale_factor_addrs.len() as u32).to_be_bytes());
        out.extend_from_slice(&self.bytes_written.to_be_bytes());
        for e in &self.index_entries {
            let mut buf = [0u8; GsfIndexEntry::ENCODED_LEN];
            e.encode(&mut buf);
            out.extend_from_slice(&buf);
        }
        for addr in &self.scale_factor_addrs {
            out.extend_from_slice(&addr.to_be_bytes());
        }
        let mut f = File::create(&index_path).map_err(SonarframeError::FOpenError)?;
        f.write_all(&out)?;
        Ok(())
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_and_write_one_ping_roundtrips() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let path = tmp.path().to_str().unwrap().to_string();
        let mut writer = GsfWriter::create(&path, GsfWriteSettings::default()).unwrap();

        writer.load_scale_factor_auto_offset(1, 0.01, 2, &[12.34, 56.78], true).unwrap();
        let arrays = [ArrayWrite { subrecord_id: 1, values: &[12.34, 56.78] }];
        writer.write_ping(1_700_000_000, 0, 2, &arrays).unwrap();
        writer.finish().unwrap();

        let mut reader = sonarframe_in::GsfReader::open(&path, sonarframe_core::enums::GsfOpenMode::ReadOnly).unwrap();
        let ping = reader.read_ping().unwrap();
        assert_eq!(ping.sec, 1_700_000_000);
        for (got, want) in ping.arrays[0].values.iter().zip([12.34, 56.78]) {
            assert!((got - want).abs() < 0.02, "got {} want {}", got, want);
        }
    }

    #[test]
    fn maintained_index_supports_random_access_after_writing() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let path = tmp.path().to_str().unwrap().to_string();
        let mut settings = GsfWriteSettings::default();
        settings.maintain_index = true;
        let mut writer = GsfWriter::create(&path, settings).unwrap();

        for (i, depth) in [10.0, 11.0, 12.0].iter().enumerate() {
            writer.load_scale_factor_auto_offset(1, 0.1, 2, &[*depth], i == 0).unwrap();
            let arrays = [ArrayWrite { subrecord_id: 1, values: &[*depth] }];
            writer.write_ping(100 + i as i32, 0, 1, &arrays).unwrap();
        }
        writer.finish().unwrap();

        let mut reader =
            sonarframe_in::GsfReader::open(&path, sonarframe_core::enums::GsfOpenMode::ReadOnlyIndex).unwrap();
        let ping = reader.read_ping_at_or_before(101, 500).unwrap();
        assert_eq!(ping.sec, 101);
    }
}
