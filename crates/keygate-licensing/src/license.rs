//! Validated license and its bound operations.

use crate::client::KeygenClient;
use crate::component::Component;
use crate::document::{LicenseAttributes, Resource};
use crate::entitlement::Entitlement;
use crate::machine::Machine;
use crate::verify::{SchemeCode, Verifier};
use chrono::{DateTime, Utc};
use keygate_core::{Error, Result};
use serde_json::{Map, Value};

/// A license returned by a successful validation.
///
/// The license keeps a handle to the client that validated it, so the
/// operations below run against the same account and configuration.
#[derive(Debug, Clone)]
pub struct License {
    pub id: String,
    pub key: String,
    pub name: Option<String>,
    pub expiry: Option<DateTime<Utc>>,
    /// Service status such as `ACTIVE`, `SUSPENDED` or `EXPIRED`.
    pub status: String,
    pub policy: Option<String>,
    /// Offline signing scheme, when the policy signs its keys.
    pub scheme: Option<String>,
    pub metadata: Map<String, Value>,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    client: KeygenClient,
}

impl License {
    pub(crate) fn from_resource(resource: Resource<LicenseAttributes>, client: KeygenClient) -> Self {
        let policy = resource.related_id("policy");
        let attributes = resource.attributes;

        Self {
            id: resource.id,
            key: attributes.key,
            name: attributes.name,
            expiry: attributes.expiry,
            status: attributes.status,
            policy,
            scheme: attributes.scheme,
            metadata: attributes.metadata,
            created: attributes.created,
            updated: attributes.updated,
            client,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == "ACTIVE"
    }

    /// Validate this license again with the given scope.
    ///
    /// The scope of the validation that produced this license is not reused.
    pub async fn validate(&self, fingerprints: &[String], entitlements: &[String]) -> Result<License> {
        self.client
            .validate_key(&self.key, fingerprints, entitlements)
            .await
    }

    /// Machines activated for this license.
    pub async fn machines(&self) -> Result<Vec<Machine>> {
        self.client.machines(self).await
    }

    /// One machine of this license, or `MachineNotFound`.
    pub async fn machine(&self, id: &str) -> Result<Machine> {
        self.client.machine(self, id).await
    }

    pub async fn entitlements(&self) -> Result<Vec<Entitlement>> {
        self.client.entitlements(self).await
    }

    /// Activate a machine with `fingerprint` for this license.
    pub async fn activate(&self, fingerprint: &str, components: &[Component]) -> Result<Machine> {
        self.client.activate(self, fingerprint, components).await
    }

    pub async fn deactivate(&self, machine_id: &str) -> Result<()> {
        self.client.deactivate(&self.key, machine_id).await
    }

    /// Verify this license's key offline with its own scheme.
    pub fn verify(&self) -> Result<String> {
        let scheme: SchemeCode = self
            .scheme
            .as_deref()
            .ok_or(Error::LicenseSchemeMissing)?
            .parse()?;
        Verifier::from_config(self.client.config())?.verify(scheme, &self.key)
    }
}
