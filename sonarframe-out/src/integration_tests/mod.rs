//! Cross-crate round-trip tests exercising `sonarframe-out`'s encoders against
//! `sonarframe-in`'s decoders, checking the two crates agree on the wire format.
mod gsf_roundtrip;
