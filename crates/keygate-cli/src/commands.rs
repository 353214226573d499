//! CLI command definitions.

use clap::Subcommand;

#[derive(Subcommand)]
pub enum Commands {
    /// Verify a signed license key offline
    Verify {
        /// Signed license key, `key/<payload>.<signature>`
        signed_key: String,

        /// Signing scheme of the key
        #[arg(long, default_value = "ED25519_SIGN")]
        scheme: String,
    },

    /// Validate the configured license key online
    Validate {
        /// Scope the validation to a machine fingerprint
        #[arg(short, long = "fingerprint")]
        fingerprints: Vec<String>,

        /// Require an entitlement code
        #[arg(short, long = "entitlement")]
        entitlements: Vec<String>,

        /// Also scope to this machine's fingerprint
        #[arg(short, long)]
        machine: bool,
    },

    /// List machines activated for the configured license
    Machines,
}
