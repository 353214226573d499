//! Keygate Core
//!
//! Configuration and the structured error taxonomy shared by the keygate
//! crates. Every failure surfaced by verification or validation is one
//! [`Error`] variant, and every variant can travel as a JSON envelope.

pub mod config;
pub mod envelope;
pub mod error;

pub use config::{ConfigStore, KeygenConfig, get_config, reset_config, set_config};
pub use error::{Error, Result};
