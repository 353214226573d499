//! JSON:API documents returned by the licensing service.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub(crate) struct Document<T> {
    pub data: T,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ValidationDocument {
    #[serde(default)]
    pub data: Option<Resource<LicenseAttributes>>,
    pub meta: ValidationMeta,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ValidationMeta {
    pub valid: bool,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub detail: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Resource<A> {
    pub id: String,
    pub attributes: A,
    #[serde(default)]
    pub relationships: Value,
}

impl<A> Resource<A> {
    /// ID of a to-one relationship, e.g. `relationships.license.data.id`.
    pub fn related_id(&self, name: &str) -> Option<String> {
        self.relationships
            .get(name)?
            .get("data")?
            .get("id")?
            .as_str()
            .map(str::to_string)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LicenseAttributes {
    pub key: String,
    pub name: Option<String>,
    pub expiry: Option<DateTime<Utc>>,
    pub status: String,
    pub scheme: Option<String>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MachineAttributes {
    pub fingerprint: String,
    pub name: Option<String>,
    pub platform: Option<String>,
    pub hostname: Option<String>,
    pub cores: Option<i32>,
    #[serde(default)]
    pub require_heartbeat: bool,
    #[serde(default)]
    pub heartbeat_status: String,
    pub heartbeat_duration: Option<i32>,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EntitlementAttributes {
    pub name: Option<String>,
    pub code: String,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

/// First entry of an `errors` array.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorObject {
    pub title: Option<String>,
    pub detail: Option<String>,
    pub code: Option<String>,
}

impl ApiErrorObject {
    pub fn first(body: &Value) -> Option<Self> {
        let first = body.get("errors")?.as_array()?.first()?;
        Self::deserialize(first).ok()
    }

    pub fn message(&self) -> &str {
        self.detail
            .as_deref()
            .or(self.title.as_deref())
            .unwrap_or_default()
    }
}
