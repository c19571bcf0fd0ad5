//! Utility modules: developer tracing, fs helpers, JSON conversion, numeric helpers.
pub mod devlog;
pub mod fsutil;
pub mod json;
pub mod num;
