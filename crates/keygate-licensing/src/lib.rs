//! Keygen license verification and validation.
//!
//! Two paths prove a license is genuine:
//!
//! - [`verify`] checks a signed license key offline against the account's
//!   Ed25519 public key and returns the embedded payload.
//! - [`validate`] asks the licensing service and returns a [`License`] whose
//!   methods reach the machines and entitlements bound to it.

pub mod client;
pub mod component;
pub mod entitlement;
pub mod fingerprint;
pub mod license;
pub mod machine;
pub mod verify;

mod codes;
mod document;

pub use client::{KeygenClient, validate};
pub use component::Component;
pub use entitlement::Entitlement;
pub use fingerprint::{MachineFingerprint, machine_fingerprint};
pub use keygate_core::{Error, KeygenConfig, Result};
pub use license::License;
pub use machine::Machine;
pub use verify::{SchemeCode, Verifier, verify};
