//! File-driven replay and TCP fan-out engine (spec §4.5/§5), playing the role a live 7K device
//! plays for `sonarframe-in`'s stream parser: reads a capture, paces it against its own embedded
//! timestamps, and serves it to however many subscribed clients connect.
extern crate log;

pub mod engine;
pub mod fanout;
pub mod pacing;

pub use engine::{ReplayConfig, ReplayEngine};
pub use fanout::{ClientHandle, FanoutList};
