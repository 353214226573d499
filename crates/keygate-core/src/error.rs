//! Error types for keygate.

use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Every failure the licensing client can report.
///
/// The enum is closed: a discriminator sent by the licensing service that is
/// not listed here decodes to [`Error::Other`] instead of failing.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    // Transport and decoding errors
    #[error("Unexpected error: {0}")]
    UnexpectedError(String),

    #[error("Invalid URL")]
    InvalidUrl,

    #[error("System clock is out of sync")]
    SystemClockUnsynced,

    #[error("Decryption error: {0}")]
    DecryptionError(String),

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("URL parse error: {0}")]
    UrlParse(String),

    #[error("JSON error: {0}")]
    JsonError(String),

    #[error("Invalid header value: {0}")]
    InvalidHeader(String),

    #[error("URL encoding error: {0}")]
    UrlEncode(String),

    #[error(
        "Rate limit exceeded: window={window}, count={count}, limit={limit}, remaining={remaining}, reset={reset}, retry_after={retry_after}"
    )]
    RateLimitExceeded {
        window: String,
        count: u64,
        limit: u64,
        remaining: u64,
        reset: i64,
        retry_after: u64,
    },

    // Offline verification errors
    #[error("License key is missing")]
    LicenseKeyMissing,

    #[error("License scheme is missing")]
    LicenseSchemeMissing,

    #[error("License scheme is not supported")]
    LicenseSchemeNotSupported,

    #[error("License is not signed")]
    LicenseNotSigned,

    #[error("License key is not genuine")]
    LicenseKeyNotGenuine,

    #[error("Public key is missing")]
    PublicKeyMissing,

    #[error("Public key is invalid")]
    PublicKeyInvalid,

    #[error("License scheme unsupported")]
    LicenseSchemeUnsupported,

    // Certificate, license file and machine file errors
    #[error("Certificate file invalid: {0}")]
    CertificateFileInvalid(String),

    #[error("Certificate file not genuine: {0}")]
    CertificateFileNotGenuine(String),

    #[error("Certificate file not supported: {0}")]
    CertificateFileNotSupported(String),

    #[error("Certificate file expired")]
    CertificateFileExpired,

    #[error("License file invalid: {0}")]
    LicenseFileInvalid(String),

    #[error("License file not genuine: {0}")]
    LicenseFileNotGenuine(String),

    #[error("License file not supported: {0}")]
    LicenseFileNotSupported(String),

    #[error("License file not encrypted")]
    LicenseFileNotEncrypted,

    #[error("License file expired")]
    LicenseFileExpired { dataset: Value },

    #[error("Machine file invalid: {0}")]
    MachineFileInvalid(String),

    #[error("Machine file not genuine: {0}")]
    MachineFileNotGenuine(String),

    #[error("Machine file not supported: {0}")]
    MachineFileNotSupported(String),

    #[error("Machine file expired")]
    MachineFileExpired { dataset: Value },

    // Licensing service errors
    #[error("API error: {detail}")]
    KeygenApiError {
        code: String,
        detail: String,
        body: Value,
    },

    #[error("Token not allowed")]
    TokenNotAllowed { code: String, detail: String },

    #[error("Token format invalid")]
    TokenFormatInvalid { code: String, detail: String },

    #[error("Token invalid")]
    TokenInvalid { code: String, detail: String },

    #[error("Token expired")]
    TokenExpired { code: String, detail: String },

    #[error("License suspended")]
    LicenseSuspended { code: String, detail: String },

    #[error("License expired")]
    LicenseExpired { code: String, detail: String },

    #[error("License not allowed")]
    LicenseNotAllowed { code: String, detail: String },

    #[error("License not activated")]
    LicenseNotActivated {
        code: String,
        detail: String,
        license: Value,
    },

    #[error("License key invalid")]
    LicenseKeyInvalid { code: String, detail: String },

    #[error("License token invalid")]
    LicenseTokenInvalid { code: String, detail: String },

    #[error("License has too many machines")]
    LicenseTooManyMachines { code: String, detail: String },

    #[error("License has too many cores")]
    LicenseTooManyCores { code: String, detail: String },

    #[error("License has too many processes")]
    LicenseTooManyProcesses { code: String, detail: String },

    // Machine, process and component errors
    #[error("Machine already activated")]
    MachineAlreadyActivated { code: String, detail: String },

    #[error("Machine limit exceeded")]
    MachineLimitExceeded { code: String, detail: String },

    #[error("Machine no longer exists")]
    MachineNotFound,

    #[error("Process limit exceeded")]
    ProcessLimitExceeded { code: String, detail: String },

    #[error("Process no longer exists")]
    ProcessNotFound,

    #[error("Component conflict")]
    ComponentConflict { code: String, detail: String },

    #[error("Component already activated")]
    ComponentAlreadyActivated { code: String, detail: String },

    #[error("Component is not activated")]
    ComponentNotActivated { code: String, detail: String },

    #[error("Environment error")]
    EnvironmentError { code: String, detail: String },

    // Heartbeat errors
    #[error("Heartbeat dead")]
    HeartbeatDead { code: String, detail: String },

    #[error("Heartbeat ping failed")]
    HeartbeatPingFailed { code: String, detail: String },

    #[error("Heartbeat is required")]
    HeartbeatRequired { code: String, detail: String },

    // Validation scope errors
    #[error("Validation fingerprint scope is missing")]
    ValidationFingerprintMissing { code: String, detail: String },

    #[error("Validation components scope is missing")]
    ValidationComponentsMissing { code: String, detail: String },

    #[error("Validation product scope is missing")]
    ValidationProductMissing { code: String, detail: String },

    #[error("Not found")]
    NotFound { code: String, detail: String },

    // Generic
    #[error("{message}")]
    Other { tag: String, message: String },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// The stable discriminator of this error, as carried in the `type`
    /// field of an error envelope.
    pub fn tag(&self) -> &str {
        match self {
            Error::UnexpectedError(_) => "UnexpectedError",
            Error::InvalidUrl => "InvalidUrl",
            Error::SystemClockUnsynced => "SystemClockUnsynced",
            Error::DecryptionError(_) => "DecryptionError",
            Error::HttpClient(_) => "HttpClient",
            Error::UrlParse(_) => "UrlParse",
            Error::JsonError(_) => "JsonError",
            Error::InvalidHeader(_) => "InvalidHeader",
            Error::UrlEncode(_) => "UrlEncode",
            Error::RateLimitExceeded { .. } => "RateLimitExceeded",
            Error::LicenseKeyMissing => "LicenseKeyMissing",
            Error::LicenseSchemeMissing => "LicenseSchemeMissing",
            Error::LicenseSchemeNotSupported => "LicenseSchemeNotSupported",
            Error::LicenseNotSigned => "LicenseNotSigned",
            Error::LicenseKeyNotGenuine => "LicenseKeyNotGenuine",
            Error::PublicKeyMissing => "PublicKeyMissing",
            Error::PublicKeyInvalid => "PublicKeyInvalid",
            Error::LicenseSchemeUnsupported => "LicenseSchemeUnsupported",
            // The service spells these two tags without the "t".
            Error::CertificateFileInvalid(_) => "CerificateFileInvalid",
            Error::CertificateFileNotGenuine(_) => "CertificateFileNotGenuine",
            Error::CertificateFileNotSupported(_) => "CertificateFileNotSupported",
            Error::CertificateFileExpired => "CerificateFileExpired",
            Error::LicenseFileInvalid(_) => "LicenseFileInvalid",
            Error::LicenseFileNotGenuine(_) => "LicenseFileNotGenuine",
            Error::LicenseFileNotSupported(_) => "LicenseFileNotSupported",
            Error::LicenseFileNotEncrypted => "LicenseFileNotEncrypted",
            Error::LicenseFileExpired { .. } => "LicenseFileExpired",
            Error::MachineFileInvalid(_) => "MachineFileInvalid",
            Error::MachineFileNotGenuine(_) => "MachineFileNotGenuine",
            Error::MachineFileNotSupported(_) => "MachineFileNotSupported",
            Error::MachineFileExpired { .. } => "MachineFileExpired",
            Error::KeygenApiError { .. } => "KeygenApiError",
            Error::TokenNotAllowed { .. } => "TokenNotAllowed",
            Error::TokenFormatInvalid { .. } => "TokenFormatInvalid",
            Error::TokenInvalid { .. } => "TokenInvalid",
            Error::TokenExpired { .. } => "TokenExpired",
            Error::LicenseSuspended { .. } => "LicenseSuspended",
            Error::LicenseExpired { .. } => "LicenseExpired",
            Error::LicenseNotAllowed { .. } => "LicenseNotAllowed",
            Error::LicenseNotActivated { .. } => "LicenseNotActivated",
            Error::LicenseKeyInvalid { .. } => "LicenseKeyInvalid",
            Error::LicenseTokenInvalid { .. } => "LicenseTokenInvalid",
            Error::LicenseTooManyMachines { .. } => "LicenseTooManyMachines",
            Error::LicenseTooManyCores { .. } => "LicenseTooManyCores",
            Error::LicenseTooManyProcesses { .. } => "LicenseTooManyProcesses",
            Error::MachineAlreadyActivated { .. } => "MachineAlreadyActivated",
            Error::MachineLimitExceeded { .. } => "MachineLimitExceeded",
            Error::MachineNotFound => "MachineNotFound",
            Error::ProcessLimitExceeded { .. } => "ProcessLimitExceeded",
            Error::ProcessNotFound => "ProcessNotFound",
            Error::ComponentConflict { .. } => "ComponentConflict",
            Error::ComponentAlreadyActivated { .. } => "ComponentAlreadyActivated",
            Error::ComponentNotActivated { .. } => "ComponentNotActivated",
            Error::EnvironmentError { .. } => "EnvironmentError",
            Error::HeartbeatDead { .. } => "HeartbeatDead",
            Error::HeartbeatPingFailed { .. } => "HeartbeatPingFailed",
            Error::HeartbeatRequired { .. } => "HeartbeatRequired",
            Error::ValidationFingerprintMissing { .. } => "ValidationFingerprintMissing",
            Error::ValidationComponentsMissing { .. } => "ValidationComponentsMissing",
            Error::ValidationProductMissing { .. } => "ValidationProductMissing",
            Error::NotFound { .. } => "NotFound",
            Error::Other { tag, .. } => tag,
        }
    }

    /// How long the service asked us to back off, for rate-limit errors.
    ///
    /// The client never sleeps on its own; callers decide whether to retry.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Error::RateLimitExceeded { retry_after, .. } => {
                Some(Duration::from_secs(*retry_after))
            }
            _ => None,
        }
    }

    /// The service-provided error code, when the variant carries one.
    pub fn code(&self) -> Option<&str> {
        match self {
            Error::KeygenApiError { code, .. }
            | Error::LicenseNotActivated { code, .. }
            | Error::TokenNotAllowed { code, .. }
            | Error::TokenFormatInvalid { code, .. }
            | Error::TokenInvalid { code, .. }
            | Error::TokenExpired { code, .. }
            | Error::LicenseSuspended { code, .. }
            | Error::LicenseExpired { code, .. }
            | Error::LicenseNotAllowed { code, .. }
            | Error::LicenseKeyInvalid { code, .. }
            | Error::LicenseTokenInvalid { code, .. }
            | Error::LicenseTooManyMachines { code, .. }
            | Error::LicenseTooManyCores { code, .. }
            | Error::LicenseTooManyProcesses { code, .. }
            | Error::MachineAlreadyActivated { code, .. }
            | Error::MachineLimitExceeded { code, .. }
            | Error::ProcessLimitExceeded { code, .. }
            | Error::ComponentConflict { code, .. }
            | Error::ComponentAlreadyActivated { code, .. }
            | Error::ComponentNotActivated { code, .. }
            | Error::EnvironmentError { code, .. }
            | Error::HeartbeatDead { code, .. }
            | Error::HeartbeatPingFailed { code, .. }
            | Error::HeartbeatRequired { code, .. }
            | Error::ValidationFingerprintMissing { code, .. }
            | Error::ValidationComponentsMissing { code, .. }
            | Error::ValidationProductMissing { code, .. }
            | Error::NotFound { code, .. } => Some(code),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::JsonError(err.to_string())
    }
}
