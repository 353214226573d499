//! JSON error envelopes.
//!
//! An envelope is `{"type": <tag>, "details": <string | object>}`. String
//! details carry a message; object details carry the variant's fields by name.

use crate::error::Error;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    tag: String,
    #[serde(default)]
    details: Value,
}

#[derive(Deserialize)]
struct CodeDetail {
    code: String,
    detail: String,
}

#[derive(Deserialize)]
struct ApiErrorFields {
    code: String,
    detail: String,
    #[serde(default)]
    body: Value,
}

#[derive(Deserialize)]
struct NotActivatedFields {
    code: String,
    detail: String,
    #[serde(default)]
    license: Value,
}

#[derive(Deserialize)]
struct RateLimitFields {
    window: String,
    count: u64,
    limit: u64,
    remaining: u64,
    reset: i64,
    retry_after: u64,
}

/// The `details` of one envelope, bound to its tag for error reporting.
struct Details<'a> {
    tag: &'a str,
    value: Value,
}

impl Details<'_> {
    /// Details for a single-message variant: a bare string, or an object
    /// with a `details` string.
    fn text(self) -> Result<String, Error> {
        let tag = self.tag;
        match self.value {
            Value::String(s) => Ok(s),
            Value::Null => Ok(String::new()),
            Value::Object(mut map) => match map.remove("details") {
                Some(Value::String(s)) => Ok(s),
                _ => Err(mismatch(tag, "a message")),
            },
            _ => Err(mismatch(tag, "a message")),
        }
    }

    fn fields<T: DeserializeOwned>(self) -> Result<T, Error> {
        let tag = self.tag;
        if !self.value.is_object() {
            return Err(mismatch(tag, "structured details"));
        }
        serde_json::from_value(self.value)
            .map_err(|e| Error::JsonError(format!("{} details: {}", tag, e)))
    }

    /// Details of an expired license or machine file: the dataset object
    /// itself, or an object wrapping it under a lone `dataset` key.
    fn dataset(self) -> Result<Value, Error> {
        let tag = self.tag;
        match self.value {
            Value::Object(mut map) if is_wrapped(&map) => {
                Ok(map.remove("dataset").unwrap_or_default())
            }
            Value::Object(map) => Ok(Value::Object(map)),
            _ => Err(mismatch(tag, "a dataset object")),
        }
    }

    /// Raw message for tags we do not know.
    fn message(self) -> String {
        match self.value {
            Value::String(s) => s,
            Value::Null => String::new(),
            other => other.to_string(),
        }
    }
}

fn is_wrapped(map: &Map<String, Value>) -> bool {
    map.len() == 1 && map.contains_key("dataset")
}

fn mismatch(tag: &str, expected: &str) -> Error {
    Error::JsonError(format!("{} expects {}", tag, expected))
}

macro_rules! code_detail {
    ($details:expr, $variant:ident) => {{
        let CodeDetail { code, detail } = $details.fields()?;
        Error::$variant { code, detail }
    }};
}

fn decode(tag: &str, details: Details<'_>) -> Result<Error, Error> {
    let error = match tag {
        "UnexpectedError" => Error::UnexpectedError(details.text()?),
        "InvalidUrl" => Error::InvalidUrl,
        "SystemClockUnsynced" => Error::SystemClockUnsynced,
        "DecryptionError" => Error::DecryptionError(details.text()?),
        "HttpClient" => Error::HttpClient(details.text()?),
        "UrlParse" => Error::UrlParse(details.text()?),
        "JsonError" => Error::JsonError(details.text()?),
        "InvalidHeader" => Error::InvalidHeader(details.text()?),
        "UrlEncode" => Error::UrlEncode(details.text()?),
        "RateLimitExceeded" => {
            let f: RateLimitFields = details.fields()?;
            Error::RateLimitExceeded {
                window: f.window,
                count: f.count,
                limit: f.limit,
                remaining: f.remaining,
                reset: f.reset,
                retry_after: f.retry_after,
            }
        }
        "LicenseKeyMissing" => Error::LicenseKeyMissing,
        "LicenseSchemeMissing" => Error::LicenseSchemeMissing,
        "LicenseSchemeNotSupported" => Error::LicenseSchemeNotSupported,
        "LicenseNotSigned" => Error::LicenseNotSigned,
        "LicenseKeyNotGenuine" => Error::LicenseKeyNotGenuine,
        "PublicKeyMissing" => Error::PublicKeyMissing,
        "PublicKeyInvalid" => Error::PublicKeyInvalid,
        "LicenseSchemeUnsupported" => Error::LicenseSchemeUnsupported,
        "CerificateFileInvalid" | "CertificateFileInvalid" => {
            Error::CertificateFileInvalid(details.text()?)
        }
        "CertificateFileNotGenuine" => Error::CertificateFileNotGenuine(details.text()?),
        "CertificateFileNotSupported" => Error::CertificateFileNotSupported(details.text()?),
        "CerificateFileExpired" | "CertificateFileExpired" => Error::CertificateFileExpired,
        "LicenseFileInvalid" => Error::LicenseFileInvalid(details.text()?),
        "LicenseFileNotGenuine" => Error::LicenseFileNotGenuine(details.text()?),
        "LicenseFileNotSupported" => Error::LicenseFileNotSupported(details.text()?),
        "LicenseFileNotEncrypted" => Error::LicenseFileNotEncrypted,
        "LicenseFileExpired" => Error::LicenseFileExpired {
            dataset: details.dataset()?,
        },
        "MachineFileInvalid" => Error::MachineFileInvalid(details.text()?),
        "MachineFileNotGenuine" => Error::MachineFileNotGenuine(details.text()?),
        "MachineFileNotSupported" => Error::MachineFileNotSupported(details.text()?),
        "MachineFileExpired" => Error::MachineFileExpired {
            dataset: details.dataset()?,
        },
        "KeygenApiError" => {
            let ApiErrorFields { code, detail, body } = details.fields()?;
            Error::KeygenApiError { code, detail, body }
        }
        "TokenNotAllowed" => code_detail!(details, TokenNotAllowed),
        "TokenFormatInvalid" => code_detail!(details, TokenFormatInvalid),
        "TokenInvalid" => code_detail!(details, TokenInvalid),
        "TokenExpired" => code_detail!(details, TokenExpired),
        "LicenseSuspended" => code_detail!(details, LicenseSuspended),
        "LicenseExpired" => code_detail!(details, LicenseExpired),
        "LicenseNotAllowed" => code_detail!(details, LicenseNotAllowed),
        "LicenseNotActivated" => {
            let NotActivatedFields {
                code,
                detail,
                license,
            } = details.fields()?;
            Error::LicenseNotActivated {
                code,
                detail,
                license,
            }
        }
        "LicenseKeyInvalid" => code_detail!(details, LicenseKeyInvalid),
        "LicenseTokenInvalid" => code_detail!(details, LicenseTokenInvalid),
        "LicenseTooManyMachines" => code_detail!(details, LicenseTooManyMachines),
        "LicenseTooManyCores" => code_detail!(details, LicenseTooManyCores),
        "LicenseTooManyProcesses" => code_detail!(details, LicenseTooManyProcesses),
        "MachineAlreadyActivated" => code_detail!(details, MachineAlreadyActivated),
        "MachineLimitExceeded" => code_detail!(details, MachineLimitExceeded),
        "MachineNotFound" => Error::MachineNotFound,
        "ProcessLimitExceeded" => code_detail!(details, ProcessLimitExceeded),
        "ProcessNotFound" => Error::ProcessNotFound,
        "ComponentConflict" => code_detail!(details, ComponentConflict),
        "ComponentAlreadyActivated" => code_detail!(details, ComponentAlreadyActivated),
        "ComponentNotActivated" => code_detail!(details, ComponentNotActivated),
        "EnvironmentError" => code_detail!(details, EnvironmentError),
        "HeartbeatDead" => code_detail!(details, HeartbeatDead),
        "HeartbeatPingFailed" => code_detail!(details, HeartbeatPingFailed),
        "HeartbeatRequired" => code_detail!(details, HeartbeatRequired),
        "ValidationFingerprintMissing" => code_detail!(details, ValidationFingerprintMissing),
        "ValidationComponentsMissing" => code_detail!(details, ValidationComponentsMissing),
        "ValidationProductMissing" => code_detail!(details, ValidationProductMissing),
        "NotFound" => code_detail!(details, NotFound),
        _ => Error::Other {
            tag: tag.to_string(),
            message: details.message(),
        },
    };
    Ok(error)
}

impl Error {
    /// Decode an error envelope.
    ///
    /// Decoding is total: malformed input or details that do not fit the
    /// tag produce [`Error::JsonError`], unknown tags produce
    /// [`Error::Other`].
    pub fn from_envelope(json: &str) -> Error {
        match serde_json::from_str::<Value>(json) {
            Ok(value) => Error::from_envelope_value(value),
            Err(e) => Error::JsonError(e.to_string()),
        }
    }

    /// Decode an already parsed error envelope.
    pub fn from_envelope_value(value: Value) -> Error {
        let envelope: Envelope = match serde_json::from_value(value) {
            Ok(envelope) => envelope,
            Err(e) => return Error::JsonError(e.to_string()),
        };
        let details = Details {
            tag: &envelope.tag,
            value: envelope.details,
        };
        decode(&envelope.tag, details).unwrap_or_else(|e| e)
    }

    /// Encode this error as an envelope.
    pub fn to_envelope(&self) -> Value {
        json!({ "type": self.tag(), "details": self.details() })
    }

    pub fn to_envelope_string(&self) -> String {
        self.to_envelope().to_string()
    }

    fn details(&self) -> Value {
        match self {
            Error::UnexpectedError(details)
            | Error::DecryptionError(details)
            | Error::HttpClient(details)
            | Error::UrlParse(details)
            | Error::JsonError(details)
            | Error::InvalidHeader(details)
            | Error::UrlEncode(details)
            | Error::CertificateFileInvalid(details)
            | Error::CertificateFileNotGenuine(details)
            | Error::CertificateFileNotSupported(details)
            | Error::LicenseFileInvalid(details)
            | Error::LicenseFileNotGenuine(details)
            | Error::LicenseFileNotSupported(details)
            | Error::MachineFileInvalid(details)
            | Error::MachineFileNotGenuine(details)
            | Error::MachineFileNotSupported(details) => Value::String(details.clone()),
            Error::RateLimitExceeded {
                window,
                count,
                limit,
                remaining,
                reset,
                retry_after,
            } => json!({
                "window": window,
                "count": count,
                "limit": limit,
                "remaining": remaining,
                "reset": reset,
                "retry_after": retry_after,
            }),
            Error::LicenseFileExpired { dataset } | Error::MachineFileExpired { dataset } => {
                match dataset {
                    Value::Object(map) if !is_wrapped(map) => dataset.clone(),
                    _ => json!({ "dataset": dataset }),
                }
            }
            Error::KeygenApiError { code, detail, body } => {
                json!({ "code": code, "detail": detail, "body": body })
            }
            Error::LicenseNotActivated {
                code,
                detail,
                license,
            } => json!({ "code": code, "detail": detail, "license": license }),
            Error::TokenNotAllowed { code, detail }
            | Error::TokenFormatInvalid { code, detail }
            | Error::TokenInvalid { code, detail }
            | Error::TokenExpired { code, detail }
            | Error::LicenseSuspended { code, detail }
            | Error::LicenseExpired { code, detail }
            | Error::LicenseNotAllowed { code, detail }
            | Error::LicenseKeyInvalid { code, detail }
            | Error::LicenseTokenInvalid { code, detail }
            | Error::LicenseTooManyMachines { code, detail }
            | Error::LicenseTooManyCores { code, detail }
            | Error::LicenseTooManyProcesses { code, detail }
            | Error::MachineAlreadyActivated { code, detail }
            | Error::MachineLimitExceeded { code, detail }
            | Error::ProcessLimitExceeded { code, detail }
            | Error::ComponentConflict { code, detail }
            | Error::ComponentAlreadyActivated { code, detail }
            | Error::ComponentNotActivated { code, detail }
            | Error::EnvironmentError { code, detail }
            | Error::HeartbeatDead { code, detail }
            | Error::HeartbeatPingFailed { code, detail }
            | Error::HeartbeatRequired { code, detail }
            | Error::ValidationFingerprintMissing { code, detail }
            | Error::ValidationComponentsMissing { code, detail }
            | Error::ValidationProductMissing { code, detail }
            | Error::NotFound { code, detail } => json!({ "code": code, "detail": detail }),
            Error::Other { message, .. } => Value::String(message.clone()),
            // Unit variants carry only their default message.
            _ => Value::String(self.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_variant_ignores_details() {
        let err = Error::from_envelope(r#"{"type": "LicenseKeyMissing", "details": "whatever"}"#);
        assert_eq!(err, Error::LicenseKeyMissing);
    }

    #[test]
    fn test_message_variant_accepts_named_details() {
        let err = Error::from_envelope(
            r#"{"type": "HttpClient", "details": {"details": "connection reset"}}"#,
        );
        assert_eq!(err, Error::HttpClient("connection reset".to_string()));
    }

    #[test]
    fn test_structured_variant_rejects_string_details() {
        let err = Error::from_envelope(r#"{"type": "LicenseExpired", "details": "expired"}"#);
        match err {
            Error::JsonError(msg) => assert!(msg.contains("LicenseExpired")),
            other => panic!("expected JsonError, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_fields_is_decoding_failure() {
        let err = Error::from_envelope(
            r#"{"type": "RateLimitExceeded", "details": {"window": "1m"}}"#,
        );
        assert_eq!(err.tag(), "JsonError");
    }

    #[test]
    fn test_malformed_envelope() {
        assert_eq!(Error::from_envelope("not json").tag(), "JsonError");
        assert_eq!(Error::from_envelope(r#"{"details": "x"}"#).tag(), "JsonError");
    }

    #[test]
    fn test_unit_variant_encodes_default_message() {
        let envelope = Error::MachineNotFound.to_envelope();
        assert_eq!(envelope["type"], "MachineNotFound");
        assert_eq!(envelope["details"], "Machine no longer exists");
    }

    #[test]
    fn test_corrected_certificate_spelling_decodes() {
        let err = Error::from_envelope(r#"{"type": "CertificateFileExpired", "details": ""}"#);
        assert_eq!(err, Error::CertificateFileExpired);
        assert_eq!(err.tag(), "CerificateFileExpired");
    }
}
