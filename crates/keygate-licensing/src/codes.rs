//! Mapping of licensing service codes onto the error taxonomy.

use keygate_core::Error;
use serde_json::Value;

/// Error for a validation that completed with `meta.valid == false`.
///
/// `license` is the license document returned alongside the result, kept
/// for codes where the caller may want to inspect it.
pub(crate) fn validation_error(code: &str, detail: &str, license: &Value) -> Error {
    let (c, d) = (code.to_string(), detail.to_string());
    match code {
        "SUSPENDED" => Error::LicenseSuspended { code: c, detail: d },
        "EXPIRED" | "OVERDUE" => Error::LicenseExpired { code: c, detail: d },
        "NO_MACHINE" | "NO_MACHINES" | "FINGERPRINT_SCOPE_MISMATCH" => {
            Error::LicenseNotActivated {
                code: c,
                detail: d,
                license: license.clone(),
            }
        }
        "TOO_MANY_MACHINES" => Error::LicenseTooManyMachines { code: c, detail: d },
        "TOO_MANY_CORES" => Error::LicenseTooManyCores { code: c, detail: d },
        "TOO_MANY_PROCESSES" => Error::LicenseTooManyProcesses { code: c, detail: d },
        "FINGERPRINT_SCOPE_REQUIRED" | "FINGERPRINT_SCOPE_EMPTY" => {
            Error::ValidationFingerprintMissing { code: c, detail: d }
        }
        "COMPONENTS_SCOPE_REQUIRED" => Error::ValidationComponentsMissing { code: c, detail: d },
        "COMPONENTS_SCOPE_MISMATCH" => Error::ComponentNotActivated { code: c, detail: d },
        "PRODUCT_SCOPE_REQUIRED" => Error::ValidationProductMissing { code: c, detail: d },
        "HEARTBEAT_NOT_STARTED" => Error::HeartbeatRequired { code: c, detail: d },
        "HEARTBEAT_DEAD" => Error::HeartbeatDead { code: c, detail: d },
        "ENVIRONMENT_SCOPE_REQUIRED" | "ENVIRONMENT_SCOPE_MISMATCH" => {
            Error::EnvironmentError { code: c, detail: d }
        }
        "NOT_FOUND" => Error::LicenseKeyInvalid { code: c, detail: d },
        "BANNED" => Error::LicenseNotAllowed { code: c, detail: d },
        other if other.ends_with("_SCOPE_MISMATCH") || other.starts_with("ENTITLEMENTS_") => {
            Error::LicenseNotAllowed { code: c, detail: d }
        }
        _ => Error::KeygenApiError {
            code: c,
            detail: d,
            body: license.clone(),
        },
    }
}

/// Error for a response carrying an `errors` array.
pub(crate) fn api_error(code: &str, detail: &str, body: &Value) -> Error {
    let (c, d) = (code.to_string(), detail.to_string());
    match code {
        "TOKEN_INVALID" => Error::TokenInvalid { code: c, detail: d },
        "TOKEN_FORMAT_INVALID" => Error::TokenFormatInvalid { code: c, detail: d },
        "TOKEN_EXPIRED" => Error::TokenExpired { code: c, detail: d },
        "TOKEN_NOT_ALLOWED" => Error::TokenNotAllowed { code: c, detail: d },
        "LICENSE_INVALID" => Error::LicenseKeyInvalid { code: c, detail: d },
        "LICENSE_TOKEN_INVALID" => Error::LicenseTokenInvalid { code: c, detail: d },
        "LICENSE_SUSPENDED" => Error::LicenseSuspended { code: c, detail: d },
        "LICENSE_EXPIRED" => Error::LicenseExpired { code: c, detail: d },
        "LICENSE_NOT_ALLOWED" => Error::LicenseNotAllowed { code: c, detail: d },
        "MACHINE_LIMIT_EXCEEDED" => Error::MachineLimitExceeded { code: c, detail: d },
        "MACHINE_CORE_LIMIT_EXCEEDED" => Error::LicenseTooManyCores { code: c, detail: d },
        "FINGERPRINT_TAKEN" => Error::MachineAlreadyActivated { code: c, detail: d },
        "MACHINE_PROCESS_LIMIT_EXCEEDED" => Error::ProcessLimitExceeded { code: c, detail: d },
        "COMPONENTS_FINGERPRINT_CONFLICT" => Error::ComponentConflict { code: c, detail: d },
        "COMPONENTS_FINGERPRINT_TAKEN" => Error::ComponentAlreadyActivated { code: c, detail: d },
        "MACHINE_HEARTBEAT_DEAD" => Error::HeartbeatDead { code: c, detail: d },
        "MACHINE_HEARTBEAT_PING_FAILED" => Error::HeartbeatPingFailed { code: c, detail: d },
        "ENVIRONMENT_INVALID" | "ENVIRONMENT_NOT_SUPPORTED" => {
            Error::EnvironmentError { code: c, detail: d }
        }
        "NOT_FOUND" => Error::NotFound { code: c, detail: d },
        _ => Error::KeygenApiError {
            code: c,
            detail: d,
            body: body.clone(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_validation_codes() {
        let license = json!({ "id": "lic-1" });
        let cases = [
            ("SUSPENDED", "LicenseSuspended"),
            ("OVERDUE", "LicenseExpired"),
            ("TOO_MANY_CORES", "LicenseTooManyCores"),
            ("FINGERPRINT_SCOPE_REQUIRED", "ValidationFingerprintMissing"),
            ("HEARTBEAT_NOT_STARTED", "HeartbeatRequired"),
            ("NOT_FOUND", "LicenseKeyInvalid"),
            ("POLICY_SCOPE_MISMATCH", "LicenseNotAllowed"),
            ("ENTITLEMENTS_MISSING", "LicenseNotAllowed"),
            ("SOMETHING_NEW", "KeygenApiError"),
        ];

        for (code, tag) in cases {
            assert_eq!(validation_error(code, "d", &license).tag(), tag, "{}", code);
        }
    }

    #[test]
    fn test_not_activated_keeps_license() {
        let license = json!({ "id": "lic-1" });
        match validation_error("NO_MACHINE", "no machine", &license) {
            Error::LicenseNotActivated { license: snapshot, .. } => assert_eq!(snapshot, license),
            other => panic!("expected LicenseNotActivated, got {:?}", other),
        }
    }

    #[test]
    fn test_api_codes() {
        let body = json!({ "errors": [] });
        assert_eq!(api_error("TOKEN_EXPIRED", "d", &body).tag(), "TokenExpired");
        assert_eq!(api_error("FINGERPRINT_TAKEN", "d", &body).tag(), "MachineAlreadyActivated");
        assert_eq!(api_error("NOT_FOUND", "d", &body).tag(), "NotFound");

        match api_error("PAYMENT_REQUIRED", "pay up", &body) {
            Error::KeygenApiError { code, detail, body: raw } => {
                assert_eq!(code, "PAYMENT_REQUIRED");
                assert_eq!(detail, "pay up");
                assert_eq!(raw, body);
            }
            other => panic!("expected KeygenApiError, got {:?}", other),
        }
    }
}
