//! This library is the foundation for the `sonarframe-in` and `sonarframe-out` crates. It can be
//! built either with serialization support, or in a slightly more lightweight manner without it
//! (see features).
#![allow(clippy::derive_partial_eq_without_eq)]
extern crate num;
#[macro_use]
extern crate num_derive;

#[cfg(any(feature = "to_json", feature = "serde"))]
extern crate serde;
#[cfg(feature = "to_json")]
extern crate serde_json;

pub mod bitconverter;
pub mod enums;
pub mod errors;
pub mod header_structs;
pub mod processing_params;
pub mod settings;
#[cfg(test)]
mod tests;

pub use enums::*;
pub use errors::SonarframeError;
pub use header_structs::*;
pub use processing_params::{ProcessingParameter, ProcessingParameterSet};
pub use settings::ParserSettings;

/// Network Frame protocol version, constant on the wire.
pub const NF_PROTO: u16 = 0x0010;
/// Size in bytes of a Network Frame header.
pub const NF_SIZE: u16 = 36;
/// Data Record Frame protocol version, constant on the wire.
pub const DRF_PROTO: u16 = 0x0005;
/// Size in bytes of a Data Record Frame header.
pub const DRF_SIZE: u32 = 64;
/// Data Record Frame sync pattern, constant on the wire.
pub const DRF_SYNC: u32 = 0x0000_FFFF;
/// Trailing checksum width, in bytes, on a DRF.
pub const DRF_CHECKSUM_BYTES: u32 = 4;
/// Hard ceiling on a single accepted frame, a resync-triggering bound rather than a protocol
/// constant: frames larger than this cannot be real telemetry and are treated as corrupt.
pub const MAX_FRAME_BYTES: u32 = 4 * 1024 * 1024;
/// Hard ceiling on a single GSF record; records claiming to be larger are a framing error.
pub const MAX_RECORD_SIZE: u32 = 8 * 1024 * 1024;

/// The NUL-padded ASCII string that opens every GSF file, `"GSF-vM.m"` with `M.m` substituted
/// for the library's major/minor version.
pub const GSF_HEADER_PREFIX: &str = "GSF-v";

/// Maximum number of beam-array subrecord ids a [`ScaleFactorTable`](header_structs::ScaleFactorTable)
/// can track, mirroring the original library's `GSF_MAX_PING_ARRAY_SUBRECORDS`.
pub const GSF_MAX_PING_ARRAY_SUBRECORDS: usize = 28;

/// Smallest scale-factor multiplier the wire format can represent (`MIN_GSF_SF_MULT_VALUE`).
pub const MIN_SF_MULT: u32 = 1;
/// Largest scale-factor multiplier the wire format can represent (`MAX_GSF_SF_MULT_VALUE`).
pub const MAX_SF_MULT: u32 = 2_000_000;
