//! Read side of the sonar telemetry framing toolkit: the 7K stream parser and resynchronizer, the
//! DRF container, the subscription client, and sequential/indexed GSF reading.
//!
//! A thin library over [`sonarframe_core`]'s wire types that knows how to pull them off a live
//! byte stream or an on-disk capture.
extern crate log;

pub mod drf_container;
pub mod gsf_index;
pub mod gsf_reader;
pub mod parser;
pub mod subscription;
pub mod transport;

pub use sonarframe_core::enums;
pub use sonarframe_core::errors::*;
pub use sonarframe_core::header_structs::*;
pub use sonarframe_core::settings::ParserSettings;

pub use drf_container::DrfContainer;
pub use gsf_index::GsfIndex;
pub use gsf_reader::{GsfPingRecord, GsfReader, GsfRecord, GsfVersion, PingArray};
pub use parser::{ParseStatus, ParsedFrame, ParserStats, StreamParser};
pub use subscription::{RemconReply, SubscriptionClient};
pub use transport::{ByteTransport, FileTransport, TcpTransport, TransportError};
