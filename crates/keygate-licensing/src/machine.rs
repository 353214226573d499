//! Machines activated for a license.

use crate::client::KeygenClient;
use crate::document::{MachineAttributes, Resource};
use chrono::{DateTime, Utc};
use keygate_core::Result;

/// An activated machine. Two machines are equal when their IDs are.
#[derive(Debug, Clone)]
pub struct Machine {
    pub id: String,
    pub fingerprint: String,
    pub name: Option<String>,
    pub platform: Option<String>,
    pub hostname: Option<String>,
    pub cores: Option<i32>,
    pub require_heartbeat: bool,
    pub heartbeat_status: String,
    /// Heartbeat window in seconds.
    pub heartbeat_duration: Option<i32>,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    /// ID of the owning license.
    pub license_id: Option<String>,
    license_key: String,
    client: KeygenClient,
}

impl Machine {
    pub(crate) fn from_resource(
        resource: Resource<MachineAttributes>,
        license_key: String,
        client: KeygenClient,
    ) -> Self {
        let license_id = resource.related_id("license");
        let attributes = resource.attributes;

        Self {
            id: resource.id,
            fingerprint: attributes.fingerprint,
            name: attributes.name,
            platform: attributes.platform,
            hostname: attributes.hostname,
            cores: attributes.cores,
            require_heartbeat: attributes.require_heartbeat,
            heartbeat_status: attributes.heartbeat_status,
            heartbeat_duration: attributes.heartbeat_duration,
            created: attributes.created,
            updated: attributes.updated,
            license_id,
            license_key,
            client,
        }
    }

    pub async fn deactivate(&self) -> Result<()> {
        self.client.deactivate(&self.license_key, &self.id).await
    }

    /// Send a heartbeat ping and return the refreshed machine.
    pub async fn ping(&self) -> Result<Machine> {
        self.client.ping(&self.license_key, &self.id).await
    }
}

impl PartialEq for Machine {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Machine {}
