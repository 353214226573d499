//! Offline verification of signed license keys.
//!
//! An `ED25519_SIGN` key looks like `key/<payload>.<signature>`, both parts
//! base64url encoded. The signature covers the ASCII text `key/<payload>`.

use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::{Engine, alphabet};
use ed25519_dalek::{Signature, Verifier as _, VerifyingKey};
use keygate_core::{Error, KeygenConfig, Result, get_config};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

const BASE64URL: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

const SIGNING_PREFIX: &str = "key";

/// Keygen schemes this crate knows about but cannot verify offline.
const UNVERIFIABLE_SCHEMES: &[&str] = &[
    "RSA_2048_PKCS1_PSS_SIGN_V2",
    "RSA_2048_PKCS1_SIGN_V2",
    "RSA_2048_PKCS1_PSS_SIGN",
    "RSA_2048_PKCS1_SIGN",
    "RSA_2048_PKCS1_ENCRYPT",
    "RSA_2048_JWT_RS256",
    "LEGACY_ENCRYPT",
];

/// Offline signing scheme of a license key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SchemeCode {
    #[serde(rename = "ED25519_SIGN")]
    Ed25519Sign,
}

impl SchemeCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemeCode::Ed25519Sign => "ED25519_SIGN",
        }
    }
}

impl fmt::Display for SchemeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SchemeCode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ED25519_SIGN" => Ok(SchemeCode::Ed25519Sign),
            s if UNVERIFIABLE_SCHEMES.contains(&s) => Err(Error::LicenseSchemeUnsupported),
            _ => Err(Error::LicenseSchemeNotSupported),
        }
    }
}

/// Verifies signed license keys against an account's public key.
#[derive(Debug, Clone)]
pub struct Verifier {
    key: VerifyingKey,
}

impl Verifier {
    /// Create a verifier from a hex-encoded Ed25519 public key.
    pub fn new(public_key: Option<&str>) -> Result<Self> {
        let public_key = public_key
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or(Error::PublicKeyMissing)?;

        let bytes = hex::decode(public_key).map_err(|_| Error::PublicKeyInvalid)?;
        let bytes: [u8; 32] = bytes.try_into().map_err(|_| Error::PublicKeyInvalid)?;
        let key = VerifyingKey::from_bytes(&bytes).map_err(|_| Error::PublicKeyInvalid)?;

        Ok(Self { key })
    }

    pub fn from_config(config: &KeygenConfig) -> Result<Self> {
        Self::new(config.public_key.as_deref())
    }

    /// Verify `signed_key` and return its decoded payload.
    pub fn verify(&self, scheme: SchemeCode, signed_key: &str) -> Result<String> {
        let payload = match scheme {
            SchemeCode::Ed25519Sign => self.verify_ed25519(signed_key)?,
        };
        debug!(scheme = %scheme, bytes = payload.len(), "License key verified");
        Ok(String::from_utf8_lossy(&payload).into_owned())
    }

    fn verify_ed25519(&self, signed_key: &str) -> Result<Vec<u8>> {
        let (signing_data, encoded_sig) = signed_key
            .trim()
            .split_once('.')
            .ok_or(Error::LicenseNotSigned)?;
        let (prefix, encoded_payload) = signing_data
            .split_once('/')
            .ok_or(Error::LicenseNotSigned)?;

        if prefix != SIGNING_PREFIX || encoded_payload.is_empty() || encoded_sig.is_empty() {
            return Err(Error::LicenseNotSigned);
        }

        let sig_bytes = BASE64URL
            .decode(encoded_sig)
            .map_err(|_| Error::LicenseKeyNotGenuine)?;
        let signature =
            Signature::from_slice(&sig_bytes).map_err(|_| Error::LicenseKeyNotGenuine)?;

        if self.key.verify(signing_data.as_bytes(), &signature).is_err() {
            warn!("License key signature verification failed");
            return Err(Error::LicenseKeyNotGenuine);
        }

        BASE64URL
            .decode(encoded_payload)
            .map_err(|_| Error::LicenseNotSigned)
    }
}

/// Verify a signed key with the public key of the process-wide configuration.
pub fn verify(scheme: SchemeCode, signed_key: &str) -> Result<String> {
    let config = get_config()?;
    Verifier::from_config(&config)?.verify(scheme, signed_key)
}

#[cfg(test)]
pub(crate) fn sign_key(signing_key: &ed25519_dalek::SigningKey, payload: &str) -> String {
    use ed25519_dalek::Signer;

    let signing_data = format!("{}/{}", SIGNING_PREFIX, BASE64URL.encode(payload));
    let signature = signing_key.sign(signing_data.as_bytes());
    format!("{}.{}", signing_data, BASE64URL.encode(signature.to_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::SigningKey;
    use rand::rngs::OsRng;

    fn keypair() -> (SigningKey, String) {
        let signing_key = SigningKey::generate(&mut OsRng);
        let public_key = hex::encode(signing_key.verifying_key().to_bytes());
        (signing_key, public_key)
    }

    #[test]
    fn test_verify_returns_payload() {
        let (signing_key, public_key) = keypair();
        let payload = r#"{"user":"alice@example.com","plan":"pro"}"#;
        let signed = sign_key(&signing_key, payload);

        let verifier = Verifier::new(Some(&public_key)).unwrap();
        assert_eq!(verifier.verify(SchemeCode::Ed25519Sign, &signed).unwrap(), payload);
    }

    #[test]
    fn test_verify_is_deterministic() {
        let (signing_key, public_key) = keypair();
        let signed = sign_key(&signing_key, "payload");
        let verifier = Verifier::new(Some(&public_key)).unwrap();

        let first = verifier.verify(SchemeCode::Ed25519Sign, &signed);
        for _ in 0..5 {
            assert_eq!(verifier.verify(SchemeCode::Ed25519Sign, &signed), first);
        }
        let bad = verifier.verify(SchemeCode::Ed25519Sign, "key/abc");
        assert_eq!(verifier.verify(SchemeCode::Ed25519Sign, "key/abc"), bad);
    }

    #[test]
    fn test_tampered_signature_not_genuine() {
        let (signing_key, public_key) = keypair();
        let signed = sign_key(&signing_key, "payload");
        let verifier = Verifier::new(Some(&public_key)).unwrap();

        let (signing_data, encoded_sig) = signed.split_once('.').unwrap();
        let sig = BASE64URL.decode(encoded_sig).unwrap();

        for i in 0..sig.len() {
            let mut tampered = sig.clone();
            tampered[i] ^= 0x01;
            let key = format!("{}.{}", signing_data, BASE64URL.encode(&tampered));
            assert_eq!(
                verifier.verify(SchemeCode::Ed25519Sign, &key),
                Err(Error::LicenseKeyNotGenuine),
                "byte {}",
                i
            );
        }
    }

    #[test]
    fn test_tampered_payload_not_genuine() {
        let (signing_key, public_key) = keypair();
        let signed = sign_key(&signing_key, "payload");
        let (_, encoded_sig) = signed.split_once('.').unwrap();
        let forged = format!("key/{}.{}", BASE64URL.encode("other payload"), encoded_sig);

        let verifier = Verifier::new(Some(&public_key)).unwrap();
        assert_eq!(
            verifier.verify(SchemeCode::Ed25519Sign, &forged),
            Err(Error::LicenseKeyNotGenuine)
        );
    }

    #[test]
    fn test_wrong_public_key_not_genuine() {
        let (signing_key, _) = keypair();
        let (_, other_public_key) = keypair();
        let signed = sign_key(&signing_key, "payload");

        let verifier = Verifier::new(Some(&other_public_key)).unwrap();
        assert_eq!(
            verifier.verify(SchemeCode::Ed25519Sign, &signed),
            Err(Error::LicenseKeyNotGenuine)
        );
    }

    #[test]
    fn test_unsigned_keys() {
        let (_, public_key) = keypair();
        let verifier = Verifier::new(Some(&public_key)).unwrap();

        for key in ["", "ABCD-1234-EFGH", "key/abc", "license/abc.def", "key/.def", "key/abc."] {
            assert_eq!(
                verifier.verify(SchemeCode::Ed25519Sign, key),
                Err(Error::LicenseNotSigned),
                "{:?}",
                key
            );
        }
    }

    #[test]
    fn test_public_key_errors() {
        assert_eq!(Verifier::new(None).unwrap_err(), Error::PublicKeyMissing);
        assert_eq!(Verifier::new(Some("  ")).unwrap_err(), Error::PublicKeyMissing);
        assert_eq!(Verifier::new(Some("zz")).unwrap_err(), Error::PublicKeyInvalid);
        assert_eq!(Verifier::new(Some("abcd")).unwrap_err(), Error::PublicKeyInvalid);
    }

    #[test]
    fn test_off_curve_public_key_invalid() {
        // About half of all y coordinates have no matching x on the curve.
        let off_curve = (2u8..=64)
            .map(|y| {
                let mut bytes = [0u8; 32];
                bytes[0] = y;
                bytes
            })
            .find(|bytes| VerifyingKey::from_bytes(bytes).is_err())
            .expect("an encoding that is not a curve point");

        let public_key = hex::encode(off_curve);
        assert_eq!(public_key.len(), 64);
        assert_eq!(
            Verifier::new(Some(&public_key)).unwrap_err(),
            Error::PublicKeyInvalid
        );
    }

    #[test]
    fn test_scheme_parsing() {
        assert_eq!("ED25519_SIGN".parse::<SchemeCode>(), Ok(SchemeCode::Ed25519Sign));
        assert_eq!(
            "RSA_2048_PKCS1_PSS_SIGN_V2".parse::<SchemeCode>(),
            Err(Error::LicenseSchemeUnsupported)
        );
        assert_eq!(
            "ROT13".parse::<SchemeCode>(),
            Err(Error::LicenseSchemeNotSupported)
        );
        assert_eq!(SchemeCode::Ed25519Sign.to_string(), "ED25519_SIGN");
    }
}
