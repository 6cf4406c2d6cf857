//! Write side of the sonar telemetry framing toolkit: NF/DRF and REMCON-reply frame encoders, and
//! a sequential GSF writer with depth-layer auto-offset scale-factor management.
//!
//! Given typed record data, produces the exact wire bytes
//! [`sonarframe_in`](https://docs.rs/sonarframe_in) knows how to read back.
extern crate log;

pub mod gsf_writer;
pub mod settings;
pub mod utils;
pub mod write_data;
pub mod write_headers;

#[cfg(test)]
mod integration_tests;

pub use gsf_writer::GsfWriter;
pub use settings::{GsfWriteSettings, GsfWriterVersion};
pub use write_data::{encode_header_body, encode_ping_body, encode_record, ArrayWrite};
pub use write_headers::{decode_and_validate_drf, encode_drf, encode_net_frame, encode_remcon_reply};
