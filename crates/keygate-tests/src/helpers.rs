//! Mock licensing service for integration tests.

use crate::fixtures::{ACCOUNT, LICENSE_KEY, PRODUCT, ValidationFixture};
use keygate_core::KeygenConfig;
use keygate_licensing::KeygenClient;
use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// A wiremock server standing in for the licensing API.
pub struct MockKeygen {
    server: MockServer,
}

impl MockKeygen {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn server(&self) -> &MockServer {
        &self.server
    }

    /// Configuration pointing at this server with the fixture account and key.
    pub fn config(&self) -> KeygenConfig {
        KeygenConfig::new(self.server.uri(), "v1", "1.7", ACCOUNT, PRODUCT)
            .with_license_key(LICENSE_KEY)
    }

    pub fn client(&self) -> KeygenClient {
        KeygenClient::new(self.config()).expect("Failed to create client")
    }

    /// Request path under the fixture account, e.g. `machines/mach-1`.
    pub fn account_path(&self, suffix: &str) -> String {
        format!("/v1/accounts/{}/{}", ACCOUNT, suffix)
    }

    /// Answer validate-key with a successful validation of `license`.
    pub async fn mock_validate(&self, license: Value) {
        self.respond(
            "POST",
            "licenses/actions/validate-key",
            ResponseTemplate::new(200).set_body_json(ValidationFixture::valid(license)),
        )
        .await;
    }

    /// Answer validate-key with a failed validation.
    pub async fn mock_validate_invalid(&self, license: Value, code: &str, detail: &str) {
        self.respond(
            "POST",
            "licenses/actions/validate-key",
            ResponseTemplate::new(200)
                .set_body_json(ValidationFixture::invalid(license, code, detail)),
        )
        .await;
    }

    pub async fn mock_machines(&self, license_id: &str, machines: Vec<Value>) {
        self.respond(
            "GET",
            &format!("licenses/{}/machines", license_id),
            ResponseTemplate::new(200).set_body_json(json!({ "data": machines })),
        )
        .await;
    }

    pub async fn mock_machine(&self, machine: Value) {
        let id = machine["id"].as_str().unwrap_or_default().to_string();
        self.respond(
            "GET",
            &format!("machines/{}", id),
            ResponseTemplate::new(200).set_body_json(json!({ "data": machine })),
        )
        .await;
    }

    /// Mount `response` for `verb` on an account-relative path.
    pub async fn respond(&self, verb: &str, suffix: &str, response: ResponseTemplate) {
        Mock::given(method(verb))
            .and(path(self.account_path(suffix)))
            .respond_with(response)
            .mount(&self.server)
            .await;
    }

    /// JSON bodies of every request received so far.
    pub async fn received_bodies(&self) -> Vec<Value> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter_map(|request| serde_json::from_slice(&request.body).ok())
            .collect()
    }
}
