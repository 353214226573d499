//! Test fixtures for licensing service documents and signed keys.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use ed25519_dalek::{Signer, SigningKey};
use rand::rngs::OsRng;
use serde_json::{Value, json};

pub const ACCOUNT: &str = "acct-test";
pub const PRODUCT: &str = "prod-test";
pub const LICENSE_ID: &str = "lic-test";
pub const LICENSE_KEY: &str = "C1B6DE-39A6E3-DE1529-8559A0-4AF593-V3";
pub const TIMESTAMP: &str = "2024-01-01T00:00:00.000Z";

/// Factory for license resources.
pub struct LicenseFixture;

impl LicenseFixture {
    /// An active, unsigned license with the default ID and key.
    pub fn active() -> Value {
        Self::with_status(LICENSE_ID, LICENSE_KEY, "ACTIVE")
    }

    pub fn with_status(id: &str, key: &str, status: &str) -> Value {
        json!({
            "id": id,
            "type": "licenses",
            "attributes": {
                "key": key,
                "name": "Test License",
                "expiry": null,
                "status": status,
                "scheme": null,
                "metadata": {},
                "created": TIMESTAMP,
                "updated": TIMESTAMP
            },
            "relationships": {
                "policy": { "data": { "type": "policies", "id": "pol-test" } }
            }
        })
    }

    /// A license whose key is signed with `scheme`.
    pub fn signed(key: &str, scheme: &str) -> Value {
        let mut license = Self::with_status(LICENSE_ID, key, "ACTIVE");
        license["attributes"]["scheme"] = json!(scheme);
        license
    }
}

/// Factory for validation responses.
pub struct ValidationFixture;

impl ValidationFixture {
    pub fn valid(license: Value) -> Value {
        json!({
            "data": license,
            "meta": { "valid": true, "code": "VALID", "detail": "is valid" }
        })
    }

    pub fn invalid(license: Value, code: &str, detail: &str) -> Value {
        json!({
            "data": license,
            "meta": { "valid": false, "code": code, "detail": detail }
        })
    }
}

/// Factory for machine resources.
pub struct MachineFixture;

impl MachineFixture {
    pub fn resource(id: &str, license_id: &str, fingerprint: &str) -> Value {
        json!({
            "id": id,
            "type": "machines",
            "attributes": {
                "fingerprint": fingerprint,
                "name": format!("{} host", id),
                "platform": "linux-x86_64",
                "hostname": format!("{}.local", id),
                "cores": 8,
                "requireHeartbeat": false,
                "heartbeatStatus": "NOT_STARTED",
                "heartbeatDuration": null,
                "created": TIMESTAMP,
                "updated": TIMESTAMP
            },
            "relationships": {
                "license": { "data": { "type": "licenses", "id": license_id } }
            }
        })
    }

    /// Two machines bound to the default license.
    pub fn pair() -> Vec<Value> {
        vec![
            Self::resource("mach-1", LICENSE_ID, "fp-1"),
            Self::resource("mach-2", LICENSE_ID, "fp-2"),
        ]
    }
}

/// Factory for entitlement resources.
pub struct EntitlementFixture;

impl EntitlementFixture {
    pub fn resource(id: &str, code: &str) -> Value {
        json!({
            "id": id,
            "type": "entitlements",
            "attributes": {
                "name": code.to_lowercase(),
                "code": code,
                "created": TIMESTAMP,
                "updated": TIMESTAMP
            }
        })
    }
}

/// JSON:API error document with a single error.
pub fn error_document(code: &str, detail: &str) -> Value {
    json!({
        "errors": [{ "title": "Request failed", "detail": detail, "code": code }]
    })
}

/// Ed25519 keypair that signs license keys the way the licensing service does.
pub struct SigningFixture {
    signing_key: SigningKey,
}

impl SigningFixture {
    pub fn new() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Hex-encoded verify key.
    pub fn public_key(&self) -> String {
        hex::encode(self.signing_key.verifying_key().to_bytes())
    }

    /// `key/<payload>.<signature>` for `payload`.
    pub fn sign(&self, payload: &str) -> String {
        let signing_data = format!("key/{}", URL_SAFE_NO_PAD.encode(payload));
        let signature = self.signing_key.sign(signing_data.as_bytes());
        format!("{}.{}", signing_data, URL_SAFE_NO_PAD.encode(signature.to_bytes()))
    }
}

impl Default for SigningFixture {
    fn default() -> Self {
        Self::new()
    }
}
