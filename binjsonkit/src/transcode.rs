//! Conversions between JSON values and other data formats.
//!
//! Each submodule exposes `decode` and `encode`; errors are plain strings
//! for the command line to print.

pub mod cbor;
pub mod toml;
pub mod yaml;
