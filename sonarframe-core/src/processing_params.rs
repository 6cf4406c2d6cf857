//! The closed processing-parameter vocabulary carried in a GSF `ProcessingParameters` record
//! (§4.4 supplement, §6): a fixed set of `KEYWORD=VALUE` lines, one parameter per line.
//!
//! Grounded on `original_source/src/gsf/gsf.c`'s `gsfPutMBParams`/`gsfGetMBParams` pair, which
//! read and write exactly this line-oriented format; re-expressed here as a closed Rust enum
//! rather than the original's array of string buffers.
use crate::enums::{DepthCalculation, GeoidDatum, TidalDatum, YesNo};

/// One or two signed fixed-point numbers: dual-head systems repeat the value, one per head.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HeadValue {
    Single(f64),
    Dual(f64, f64),
}

impl HeadValue {
    fn encode(&self) -> String {
        match self {
            HeadValue::Single(v) => format!("{:.2}", v),
            HeadValue::Dual(a, b) => format!("{:.2},{:.2}", a, b),
        }
    }

    fn parse(value: &str) -> Option<Self> {
        let mut parts = value.split(',');
        let a: f64 = parts.next()?.parse().ok()?;
        match parts.next() {
            None => Some(HeadValue::Single(a)),
            Some(b) => {
                if parts.next().is_some() {
                    return None;
                }
                Some(HeadValue::Dual(a, b.parse().ok()?))
            }
        }
    }
}

/// A position/transducer offset: a triple `(x, y, z)` for single-head systems, a stacked
/// six-tuple (two triples) for dual-head.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OffsetValue {
    Triple([f64; 3]),
    Six([f64; 6]),
}

impl OffsetValue {
    fn encode(&self) -> String {
        match self {
            OffsetValue::Triple(v) => format!("{:.2},{:.2},{:.2}", v[0], v[1], v[2]),
            OffsetValue::Six(v) => {
                format!("{:.2},{:.2},{:.2},{:.2},{:.2},{:.2}", v[0], v[1], v[2], v[3], v[4], v[5])
            }
        }
    }

    fn parse(value: &str) -> Option<Self> {
        let parts: Option<Vec<f64>> = value.split(',').map(|p| p.parse().ok()).collect();
        let parts = parts?;
        match parts.len() {
            3 => Some(OffsetValue::Triple([parts[0], parts[1], parts[2]])),
            6 => Some(OffsetValue::Six([parts[0], parts[1], parts[2], parts[3], parts[4], parts[5]])),
            _ => None,
        }
    }
}

fn encode_triple(v: &[f64; 3]) -> String {
    format!("{:.2},{:.2},{:.2}", v[0], v[1], v[2])
}

fn parse_triple(value: &str) -> Option<[f64; 3]> {
    let mut parts = value.split(',');
    let a = parts.next()?.parse().ok()?;
    let b = parts.next()?.parse().ok()?;
    let c = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some([a, b, c])
}

/// One decoded `KEYWORD=VALUE` processing-parameter line, covering the exhaustive §6 keyword
/// catalog: compensation flags, depth/ray-tracing mode, the `*_TO_APPLY` correction values and
/// their `APPLIED_*` counterparts, and the geoid/tidal-datum references.
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessingParameter {
    /// `REFERENCE TIME`: free-form reference timestamp string, stored verbatim.
    ReferenceTime(String),
    RollCompensated(YesNo),
    PitchCompensated(YesNo),
    HeaveCompensated(YesNo),
    TideCompensated(YesNo),
    DepthCalculation(DepthCalculation),
    RayTracing(YesNo),
    DraftToApply(HeadValue),
    PitchToApply(HeadValue),
    RollToApply(HeadValue),
    GyroToApply(HeadValue),
    PositionOffsetToApply(OffsetValue),
    TransducerOffsetToApply(OffsetValue),
    MruPitchToApply(f64),
    MruRollToApply(f64),
    MruHeadingToApply(f64),
    MruOffsetToApply([f64; 3]),
    CenterOfRotationOffsetToApply([f64; 3]),
    AppliedDraft(HeadValue),
    AppliedPitch(HeadValue),
    AppliedRoll(HeadValue),
    AppliedGyro(HeadValue),
    AppliedPositionOffset(OffsetValue),
    AppliedTransducerOffset(OffsetValue),
    AppliedMruPitch(f64),
    AppliedMruRoll(f64),
    AppliedMruHeading(f64),
    AppliedMruOffset([f64; 3]),
    AppliedCenterOfRotationOffset([f64; 3]),
    Geoid(GeoidDatum),
    TidalDatum(TidalDatum),
}

impl ProcessingParameter {
    fn keyword(&self) -> &'static str {
        match self {
            ProcessingParameter::ReferenceTime(_) => "REFERENCE TIME",
            ProcessingParameter::RollCompensated(_) => "ROLL_COMPENSATED",
            ProcessingParameter::PitchCompensated(_) => "PITCH_COMPENSATED",
            ProcessingParameter::HeaveCompensated(_) => "HEAVE_COMPENSATED",
            ProcessingParameter::TideCompensated(_) => "TIDE_COMPENSATED",
            ProcessingParameter::DepthCalculation(_) => "DEPTH_CALCULATION",
            ProcessingParameter::RayTracing(_) => "RAY_TRACING",
            ProcessingParameter::DraftToApply(_) => "DRAFT_TO_APPLY",
            ProcessingParameter::PitchToApply(_) => "PITCH_TO_APPLY",
            ProcessingParameter::RollToApply(_) => "ROLL_TO_APPLY",
            ProcessingParameter::GyroToApply(_) => "GYRO_TO_APPLY",
            ProcessingParameter::PositionOffsetToApply(_) => "POSITION_OFFSET_TO_APPLY",
            ProcessingParameter::TransducerOffsetToApply(_) => "TRANSDUCER_OFFSET_TO_APPLY",
            ProcessingParameter::MruPitchToApply(_) => "MRU_PITCH_TO_APPLY",
            ProcessingParameter::MruRollToApply(_) => "MRU_ROLL_TO_APPLY",
            ProcessingParameter::MruHeadingToApply(_) => "MRU_HEADING_TO_APPLY",
            ProcessingParameter::MruOffsetToApply(_) => "MRU_OFFSET_TO_APPLY",
            ProcessingParameter::CenterOfRotationOffsetToApply(_) => "CENTER_OF_ROTATION_OFFSET_TO_APPLY",
            ProcessingParameter::AppliedDraft(_) => "APPLIED_DRAFT",
            ProcessingParameter::AppliedPitch(_) => "APPLIED_PITCH",
            ProcessingParameter::AppliedRoll(_) => "APPLIED_ROLL",
            ProcessingParameter::AppliedGyro(_) => "APPLIED_GYRO",
            ProcessingParameter::AppliedPositionOffset(_) => "APPLIED_POSITION_OFFSET",
            ProcessingParameter::AppliedTransducerOffset(_) => "APPLIED_TRANSDUCER_OFFSET",
            ProcessingParameter::AppliedMruPitch(_) => "APPLIED_MRU_PITCH",
            ProcessingParameter::AppliedMruRoll(_) => "APPLIED_MRU_ROLL",
            ProcessingParameter::AppliedMruHeading(_) => "APPLIED_MRU_HEADING",
            ProcessingParameter::AppliedMruOffset(_) => "APPLIED_MRU_OFFSET",
            ProcessingParameter::AppliedCenterOfRotationOffset(_) => "APPLIED_CENTER_OF_ROTATION_OFFSET",
            ProcessingParameter::Geoid(_) => "GEOID",
            ProcessingParameter::TidalDatum(_) => "TIDAL_DATUM",
        }
    }

    /// Encodes this parameter as one `KEYWORD=VALUE` line, with no trailing newline.
    pub fn encode_line(&self) -> String {
        let value = match self {
            ProcessingParameter::ReferenceTime(v) => v.clone(),
            ProcessingParameter::RollCompensated(v)
            | ProcessingParameter::PitchCompensated(v)
            | ProcessingParameter::HeaveCompensated(v)
            | ProcessingParameter::TideCompensated(v)
            | ProcessingParameter::RayTracing(v) => v.as_str().to_string(),
            ProcessingParameter::DepthCalculation(v) => v.as_str().to_string(),
            ProcessingParameter::Geoid(v) => v.as_str().to_string(),
            ProcessingParameter::TidalDatum(v) => v.as_str().to_string(),
            ProcessingParameter::DraftToApply(v)
            | ProcessingParameter::PitchToApply(v)
            | ProcessingParameter::RollToApply(v)
            | ProcessingParameter::GyroToApply(v)
            | ProcessingParameter::AppliedDraft(v)
            | ProcessingParameter::AppliedPitch(v)
            | ProcessingParameter::AppliedRoll(v)
            | ProcessingParameter::AppliedGyro(v) => v.encode(),
            ProcessingParameter::PositionOffsetToApply(v)
            | ProcessingParameter::TransducerOffsetToApply(v)
            | ProcessingParameter::AppliedPositionOffset(v)
            | ProcessingParameter::AppliedTransducerOffset(v) => v.encode(),
            ProcessingParameter::MruPitchToApply(v)
            | ProcessingParameter::MruRollToApply(v)
            | ProcessingParameter::MruHeadingToApply(v)
            | ProcessingParameter::AppliedMruPitch(v)
            | ProcessingParameter::AppliedMruRoll(v)
            | ProcessingParameter::AppliedMruHeading(v) => format!("{:.2}", v),
            ProcessingParameter::MruOffsetToApply(v)
            | ProcessingParameter::CenterOfRotationOffsetToApply(v)
            | ProcessingParameter::AppliedMruOffset(v)
            | ProcessingParameter::AppliedCenterOfRotationOffset(v) => encode_triple(v),
        };
        format!("{}={}", self.keyword(), value)
    }

    /// Decodes one `KEYWORD=VALUE` line. Returns `None` for a keyword this catalog does not
    /// recognize or a value that does not match its keyword's expected shape; the absent-value
    /// sentinel `UNKNWN` is handled by the caller (`gsfGetMBParams`'s style: a missing parameter
    /// is "unknown", not an error).
    pub fn decode_line(line: &str) -> Option<Self> {
        let (keyword, value) = line.split_once('=')?;
        Some(match keyword {
            "REFERENCE TIME" => ProcessingParameter::ReferenceTime(value.to_string()),
            "ROLL_COMPENSATED" => ProcessingParameter::RollCompensated(YesNo::parse(value)?),
            "PITCH_COMPENSATED" => ProcessingParameter::PitchCompensated(YesNo::parse(value)?),
            "HEAVE_COMPENSATED" => ProcessingParameter::HeaveCompensated(YesNo::parse(value)?),
            "TIDE_COMPENSATED" => ProcessingParameter::TideCompensated(YesNo::parse(value)?),
            "DEPTH_CALCULATION" => ProcessingParameter::DepthCalculation(DepthCalculation::parse(value)?),
            "RAY_TRACING" => ProcessingParameter::RayTracing(YesNo::parse(value)?),
            "DRAFT_TO_APPLY" => ProcessingParameter::DraftToApply(HeadValue::parse(value)?),
            "PITCH_TO_APPLY" => ProcessingParameter::PitchToApply(HeadValue::parse(value)?),
            "ROLL_TO_APPLY" => ProcessingParameter::RollToApply(HeadValue::parse(value)?),
            "GYRO_TO_APPLY" => ProcessingParameter::GyroToApply(HeadValue::parse(value)?),
            "POSITION_OFFSET_TO_APPLY" => ProcessingParameter::PositionOffsetToApply(OffsetValue::parse(value)?),
            "TRANSDUCER_OFFSET_TO_APPLY" => {
                ProcessingParameter::TransducerOffsetToApply(OffsetValue::parse(value)?)
            }
            "MRU_PITCH_TO_APPLY" => ProcessingParameter::MruPitchToApply(value.parse().ok()?),
            "MRU_ROLL_TO_APPLY" => ProcessingParameter::MruRollToApply(value.parse().ok()?),
            "MRU_HEADING_TO_APPLY" => ProcessingParameter::MruHeadingToApply(value.parse().ok()?),
            "MRU_OFFSET_TO_APPLY" => ProcessingParameter::MruOffsetToApply(parse_triple(value)?),
            "CENTER_OF_ROTATION_OFFSET_TO_APPLY" => {
                ProcessingParameter::CenterOfRotationOffsetToApply(parse_triple(value)?)
            }
            "APPLIED_DRAFT" => ProcessingParameter::AppliedDraft(HeadValue::parse(value)?),
            "APPLIED_PITCH" => ProcessingParameter::AppliedPitch(HeadValue::parse(value)?),
            "APPLIED_ROLL" => ProcessingParameter::AppliedRoll(HeadValue::parse(value)?),
            "APPLIED_GYRO" => ProcessingParameter::AppliedGyro(HeadValue::parse(value)?),
            "APPLIED_POSITION_OFFSET" => ProcessingParameter::AppliedPositionOffset(OffsetValue::parse(value)?),
            "APPLIED_TRANSDUCER_OFFSET" => {
                ProcessingParameter::AppliedTransducerOffset(OffsetValue::parse(value)?)
            }
            "APPLIED_MRU_PITCH" => ProcessingParameter::AppliedMruPitch(value.parse().ok()?),
            "APPLIED_MRU_ROLL" => ProcessingParameter::AppliedMruRoll(value.parse().ok()?),
            "APPLIED_MRU_HEADING" => ProcessingParameter::AppliedMruHeading(value.parse().ok()?),
            "APPLIED_MRU_OFFSET" => ProcessingParameter::AppliedMruOffset(parse_triple(value)?),
            "APPLIED_CENTER_OF_ROTATION_OFFSET" => {
                ProcessingParameter::AppliedCenterOfRotationOffset(parse_triple(value)?)
            }
            "GEOID" => ProcessingParameter::Geoid(GeoidDatum::parse(value)?),
            "TIDAL_DATUM" => ProcessingParameter::TidalDatum(TidalDatum::parse(value)?),
            _ => return None,
        })
    }
}

/// An ordered set of processing-parameter lines, as carried in one GSF `ProcessingParameters`
/// record body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessingParameterSet {
    pub params: Vec<ProcessingParameter>,
}

impl ProcessingParameterSet {
    pub fn encode(&self) -> String {
        self.params
            .iter()
            .map(ProcessingParameter::encode_line)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Decodes a newline-separated block of `KEYWORD=VALUE` lines, skipping any unrecognized
    /// lines rather than failing the whole record -- mirroring `gsfGetMBParams`'s forward
    /// compatibility with parameter keywords it doesn't know.
    pub fn decode(text: &str) -> Self {
        ProcessingParameterSet {
            params: text.lines().filter_map(ProcessingParameter::decode_line).collect(),
        }
    }
}
