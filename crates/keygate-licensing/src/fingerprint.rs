//! Machine fingerprint for node-locked licenses.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;

/// Files holding a stable per-install machine ID, checked in order.
const MACHINE_ID_PATHS: &[&str] = &["/etc/machine-id", "/var/lib/dbus/machine-id"];

/// Identity of the current host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineFingerprint {
    /// Hex SHA-256 fingerprint.
    pub id: String,
    pub hostname: String,
    /// `<os>-<arch>`, e.g. `linux-x86_64`.
    pub platform: String,
    pub cores: u32,
}

impl MachineFingerprint {
    /// Fingerprint the current machine.
    pub fn current() -> Self {
        let hostname = hostname::get()
            .map(|h| h.to_string_lossy().to_string())
            .unwrap_or_else(|_| "unknown".to_string());
        let platform = format!("{}-{}", std::env::consts::OS, std::env::consts::ARCH);

        Self {
            id: fingerprint(machine_id().as_deref(), &hostname, &platform),
            hostname,
            platform,
            cores: num_cpus::get() as u32,
        }
    }
}

/// Stable SHA-256 identifier of the current host.
pub fn machine_fingerprint() -> String {
    MachineFingerprint::current().id
}

fn machine_id() -> Option<String> {
    MACHINE_ID_PATHS
        .iter()
        .filter_map(|path| fs::read_to_string(path).ok())
        .map(|id| id.trim().to_string())
        .find(|id| !id.is_empty())
}

fn fingerprint(machine_id: Option<&str>, hostname: &str, platform: &str) -> String {
    let mut hasher = Sha256::new();
    match machine_id {
        Some(id) => hasher.update(id.as_bytes()),
        None => {
            hasher.update(hostname.as_bytes());
            hasher.update(b"\0");
            hasher.update(platform.as_bytes());
        }
    }
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_is_stable() {
        let first = MachineFingerprint::current();
        let second = MachineFingerprint::current();
        assert_eq!(first, second);
        assert_eq!(first.id.len(), 64);
        assert!(first.cores >= 1);
        assert_eq!(machine_fingerprint(), first.id);
    }

    #[test]
    fn test_machine_id_takes_precedence() {
        let a = fingerprint(Some("abc"), "host-a", "linux-x86_64");
        let b = fingerprint(Some("abc"), "host-b", "macos-aarch64");
        assert_eq!(a, b);

        let c = fingerprint(None, "host-a", "linux-x86_64");
        let d = fingerprint(None, "host-b", "linux-x86_64");
        assert_ne!(c, d);
    }
}
