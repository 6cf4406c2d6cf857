//! Write-side configuration: a small bag of knobs consulted by the encoders rather than threaded
//! through every call.
use sonarframe_core::enums::GsfOpenMode;

/// GSF library version this writer stamps into the header record. Kept independent from
/// [`sonarframe_in::gsf_reader::GsfVersion`] -- the writer always produces the current format, it
/// has no reason to reproduce the pre-1.3 padding bug.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GsfWriterVersion {
    pub major: u32,
    pub minor: u32,
}

impl Default for GsfWriterVersion {
    fn default() -> Self {
        GsfWriterVersion { major: 2, minor: 10 }
    }
}

/// Settings consulted by [`crate::gsf_writer::GsfWriter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GsfWriteSettings {
    pub version: GsfWriterVersion,
    /// Whether encoded records carry the optional trailing byte-sum checksum.
    pub write_checksums: bool,
    /// Whether `create`/`append` additionally maintain the `{path}.gidx` sidecar index as pings
    /// are written, rather than requiring a separate `build_index` pass afterwards.
    pub maintain_index: bool,
}

impl Default for GsfWriteSettings {
    fn default() -> Self {
        GsfWriteSettings {
            version: GsfWriterVersion::default(),
            write_checksums: true,
            maintain_index: false,
        }
    }
}

impl GsfWriteSettings {
    pub fn open_mode(&self) -> GsfOpenMode {
        if self.maintain_index {
            GsfOpenMode::UpdateIndex
        } else {
            GsfOpenMode::Create
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_write_checksums_without_index() {
        let s = GsfWriteSettings::default();
        assert!(s.write_checksums);
        assert!(!s.maintain_index);
        assert_eq!(s.open_mode(), GsfOpenMode::Create);
    }
}
