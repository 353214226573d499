//! Integration test infrastructure for keygate.
//!
//! Tests run against [`MockKeygen`], a wiremock server that answers the
//! licensing endpoints with JSON:API documents built by the fixtures.
//! Tests against the real service live behind the `integration` feature.
//!
//! # Usage
//!
//! ```ignore
//! use keygate_tests::{LicenseFixture, MockKeygen};
//!
//! #[tokio::test]
//! async fn test_something() {
//!     let keygen = MockKeygen::start().await;
//!     keygen.mock_validate(LicenseFixture::active()).await;
//!     let license = keygen.client().validate(&[], &[]).await.unwrap();
//! }
//! ```

pub mod fixtures;
pub mod helpers;

pub use fixtures::*;
pub use helpers::*;

/// Initialize test logging (call once per test binary).
pub fn init_test_logging() {
    use tracing_subscriber::{EnvFilter, fmt};

    let _ = fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,keygate_licensing=debug")),
        )
        .with_test_writer()
        .try_init();
}
