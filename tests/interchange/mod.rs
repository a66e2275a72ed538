//! Interchange layer tests
//!
//! - Randomized round trips through both codecs
//! - Decoder behaviour on defaulted, unknown and malformed input
//! - Capture and reconstruction against an in-memory document

mod tests_codecs;
mod tests_roundtrip_properties;
