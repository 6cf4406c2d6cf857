//! Closed catalogs used across the 7K and GSF wire formats.
//!
//! As a general rule these are record-type and flag catalogs with fixed numerical values: an
//! unrecognized numeric value is always an error (triggering resync in the stream parser, or
//! `UnrecognizedGsfRecordId` in the GSF reader) rather than a silently-accepted "unknown" variant.
use num::FromPrimitive;
#[cfg(any(feature = "to_json", feature = "serde"))]
use serde::{Deserialize, Serialize};

use crate::errors::*;

/// The closed set of 7K `record_type_id` values this parser recognizes.
///
/// An id outside this set is a parse error (`UnrecognizedRecordId`) that triggers resync; it is
/// never silently passed through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive, ToPrimitive)]
#[repr(u32)]
#[cfg_attr(any(feature = "to_json", feature = "serde"), derive(Serialize, Deserialize))]
pub enum RecordTypeId {
    /// 7K file/session header.
    Header = 7200,
    /// Swath-bathy summary.
    SwathBathySummary = 7002,
    /// Swath-bathy ping (the primary bathymetry payload).
    SwathBathyPing = 7027,
    /// Sound-velocity profile.
    SoundVelocityProfile = 1009,
    /// Processing parameters.
    ProcessingParameters = 7017,
    /// Sensor parameters.
    SensorParameters = 7006,
    /// Free-text comment.
    Comment = 7906,
    /// Processing history entry.
    History = 7905,
    /// Navigation error estimate.
    NavigationError = 1015,
    /// Single-beam ping.
    SingleBeamPing = 7038,
    /// Horizontal/vertical navigation error estimate.
    HorizontalVerticalNavError = 1016,
    /// Attitude (roll/pitch/heave/heading).
    Attitude = 1012,
    /// Remote-control request (subscribe or config request).
    Remcon = 7500,
    /// Positive acknowledgement of a REMCON request.
    RemconAck = 7501,
    /// Negative acknowledgement of a REMCON request.
    RemconNack = 7502,
    /// Device configuration reply.
    ConfigData = 7001,
}

impl RecordTypeId {
    /// Parses a raw `record_type_id` from the wire, returning `UnrecognizedRecordId` for any
    /// value outside the closed catalog.
    pub fn from_wire(id: u32) -> Result<Self, SonarframeError> {
        Self::from_u32(id).ok_or(SonarframeError::UnrecognizedRecordId { id })
    }
}

/// Device mnemonics and the `(device_id, system_enumerator)` pairs they resolve to, per the
/// subscription protocol's device table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceMnemonic {
    /// T50 echosounder, default enumerator.
    T50,
    /// 7125 multibeam at 200 kHz.
    Reson7125_200,
    /// 7125 multibeam at 400 kHz.
    Reson7125_400,
}

/// Well-known device id constants used by [`DeviceMnemonic::device_and_enumerator`].
pub mod device_ids {
    pub const T50: u32 = 50;
    pub const SEVEN_K_CENTER: u32 = 7_125;
    pub const DEFAULT_ENUMERATOR: u16 = 0;
    pub const TWO_HUNDRED_KHZ: u16 = 200;
    pub const FOUR_HUNDRED_KHZ: u16 = 400;
}

impl DeviceMnemonic {
    /// Resolves this mnemonic to its `(device_id, system_enumerator)` pair.
    pub fn device_and_enumerator(self) -> (u32, u16) {
        use device_ids::*;
        match self {
            DeviceMnemonic::T50 => (T50, DEFAULT_ENUMERATOR),
            DeviceMnemonic::Reson7125_200 => (SEVEN_K_CENTER, TWO_HUNDRED_KHZ),
            DeviceMnemonic::Reson7125_400 => (SEVEN_K_CENTER, FOUR_HUNDRED_KHZ),
        }
    }

    /// Parses the CLI spelling of a device mnemonic (`--dev`).
    pub fn from_cli_name(name: &str) -> Option<Self> {
        match name {
            "T50" => Some(DeviceMnemonic::T50),
            "7125_200" => Some(DeviceMnemonic::Reson7125_200),
            "7125_400" => Some(DeviceMnemonic::Reson7125_400),
            _ => None,
        }
    }
}

/// Which of the two 7K stream shapes the parser should expect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameMode {
    /// Expect a Network Frame immediately followed by a Data Record Frame.
    NetStream,
    /// Expect a bare Data Record Frame (e.g. reading a `.s7k` capture).
    DrfStream,
}

/// `remcon_id` values carried in a subscription/control record's RTH.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive, ToPrimitive)]
#[repr(u32)]
pub enum RemconId {
    /// Subscribe to a list of record-type ids.
    Sub = 1,
    /// Request a device-configuration record.
    ReqRec = 2,
}

/// The closed set of GSF `record_type_id` values the record store recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive, ToPrimitive)]
#[repr(u32)]
#[cfg_attr(any(feature = "to_json", feature = "serde"), derive(Serialize, Deserialize))]
pub enum GsfRecordType {
    Header = 1,
    SwathBathymetrySummary = 2,
    SwathBathymetryPing = 3,
    SoundVelocityProfile = 4,
    ProcessingParameters = 5,
    SensorParameters = 6,
    Comment = 7,
    History = 8,
    NavigationError = 9,
    SingleBeamPing = 10,
    HvNavigationError = 11,
    Attitude = 12,
}

impl GsfRecordType {
    pub fn from_wire(id: u32) -> Result<Self, SonarframeError> {
        Self::from_u32(id).ok_or(SonarframeError::UnrecognizedGsfRecordId { id })
    }
}

/// File-open modes for the GSF record store. `_INDEX` variants additionally build or consume a
/// sidecar index for random access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GsfOpenMode {
    ReadOnly,
    Update,
    Create,
    Append,
    ReadOnlyIndex,
    UpdateIndex,
}

impl GsfOpenMode {
    /// True for modes that require a read/write-direction flush, per spec §4.4.
    pub fn requires_flush_on_direction_change(self) -> bool {
        matches!(self, GsfOpenMode::Update | GsfOpenMode::Create | GsfOpenMode::UpdateIndex)
    }

    /// True for modes that build or consume the sidecar index.
    pub fn is_indexed(self) -> bool {
        matches!(self, GsfOpenMode::ReadOnlyIndex | GsfOpenMode::UpdateIndex)
    }

    /// True for modes that permit writing.
    pub fn is_writable(self) -> bool {
        matches!(self, GsfOpenMode::Update | GsfOpenMode::Create | GsfOpenMode::Append | GsfOpenMode::UpdateIndex)
    }
}

/// The last buffered operation performed on a GSF file handle, used to decide whether a flush
/// is required before the next operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LastOp {
    Read,
    Write,
    Flush,
}

/// Yes/No value used by several processing-parameter keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YesNo {
    Yes,
    No,
}

impl YesNo {
    pub fn as_str(self) -> &'static str {
        match self {
            YesNo::Yes => "YES",
            YesNo::No => "NO",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "YES" => Some(YesNo::Yes),
            "NO" => Some(YesNo::No),
            _ => None,
        }
    }
}

/// `DEPTH_CALCULATION` processing-parameter value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepthCalculation {
    Corrected,
    RelativeTo1500Ms,
    Unknown,
}

impl DepthCalculation {
    pub fn as_str(self) -> &'static str {
        match self {
            DepthCalculation::Corrected => "CORRECTED",
            DepthCalculation::RelativeTo1500Ms => "RELATIVE_TO_1500_MS",
            DepthCalculation::Unknown => "UNKNOWN",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "CORRECTED" => Some(DepthCalculation::Corrected),
            "RELATIVE_TO_1500_MS" => Some(DepthCalculation::RelativeTo1500Ms),
            "UNKNOWN" => Some(DepthCalculation::Unknown),
            _ => None,
        }
    }
}

/// `GEOID` processing-parameter value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeoidDatum {
    Wgs84,
    Unknown,
}

impl GeoidDatum {
    pub fn as_str(self) -> &'static str {
        match self {
            GeoidDatum::Wgs84 => "WGS-84",
            GeoidDatum::Unknown => "UNKNWN",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "WGS-84" => Some(GeoidDatum::Wgs84),
            "UNKNWN" => Some(GeoidDatum::Unknown),
            _ => None,
        }
    }
}

/// `TIDAL_DATUM` processing-parameter value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TidalDatum {
    Mllw,
    Mlw,
    Alat,
    Eslw,
    Islw,
    Lat,
    Llw,
    Lnlw,
    Lwd,
    Mlhw,
    Mllws,
    Mlwn,
    Unknown,
}

impl TidalDatum {
    pub fn as_str(self) -> &'static str {
        match self {
            TidalDatum::Mllw => "MLLW",
            TidalDatum::Mlw => "MLW",
            TidalDatum::Alat => "ALAT",
            TidalDatum::Eslw => "ESLW",
            TidalDatum::Islw => "ISLW",
            TidalDatum::Lat => "LAT",
            TidalDatum::Llw => "LLW",
            TidalDatum::Lnlw => "LNLW",
            TidalDatum::Lwd => "LWD",
            TidalDatum::Mlhw => "MLHW",
            TidalDatum::Mllws => "MLLWS",
            TidalDatum::Mlwn => "MLWN",
            TidalDatum::Unknown => "UNKNOWN",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "MLLW" => TidalDatum::Mllw,
            "MLW" => TidalDatum::Mlw,
            "ALAT" => TidalDatum::Alat,
            "ESLW" => TidalDatum::Eslw,
            "ISLW" => TidalDatum::Islw,
            "LAT" => TidalDatum::Lat,
            "LLW" => TidalDatum::Llw,
            "LNLW" => TidalDatum::Lnlw,
            "LWD" => TidalDatum::Lwd,
            "MLHW" => TidalDatum::Mlhw,
            "MLLWS" => TidalDatum::Mllws,
            "MLWN" => TidalDatum::Mlwn,
            "UNKNOWN" => TidalDatum::Unknown,
            _ => return None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_mnemonics_resolve() {
        assert_eq!(DeviceMnemonic::T50.device_and_enumerator(), (device_ids::T50, 0));
        assert_eq!(
            DeviceMnemonic::Reson7125_400.device_and_enumerator(),
            (device_ids::SEVEN_K_CENTER, 400)
        );
    }

    #[test]
    fn record_type_rejects_unknown_ids() {
        assert!(RecordTypeId::from_wire(7200).is_ok());
        assert!(RecordTypeId::from_wire(9999).is_err());
    }

    #[test]
    fn tidal_datum_roundtrips() {
        for s in ["MLLW", "ALAT", "LNLW", "UNKNOWN"] {
            let parsed = TidalDatum::parse(s).unwrap();
            assert_eq!(parsed.as_str(), s);
        }
    }
}
