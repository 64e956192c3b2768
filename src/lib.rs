//! doto-log - Console-first logging for the doto command line tools
//!
//! This library provides level-aware console output, dated rotating debug logs
//! and optional syslog mirroring behind a small named-logger API.

pub mod config;
pub mod logging;
pub mod setup;
