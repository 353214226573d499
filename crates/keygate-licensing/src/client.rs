//! Keygen API client for online license validation.

use crate::codes;
use crate::component::Component;
use crate::document::{
    ApiErrorObject, Document, EntitlementAttributes, MachineAttributes, Resource,
    ValidationDocument,
};
use crate::entitlement::Entitlement;
use crate::fingerprint::MachineFingerprint;
use crate::license::License;
use crate::machine::Machine;
use chrono::{DateTime, Utc};
use keygate_core::{Error, KeygenConfig, Result, get_config};
use reqwest::header::{
    ACCEPT, AUTHORIZATION, CONTENT_TYPE, DATE, HeaderMap, HeaderValue, USER_AGENT,
};
use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use url::Url;

const JSON_API: &str = "application/vnd.api+json";
const DEFAULT_USER_AGENT: &str = concat!("keygate/", env!("CARGO_PKG_VERSION"));

/// Keygen API client.
///
/// Cloning is cheap: the configuration is shared and the underlying HTTP
/// client is reference counted.
#[derive(Debug, Clone)]
pub struct KeygenClient {
    config: Arc<KeygenConfig>,
    http: reqwest::Client,
    base: Url,
}

#[derive(Debug, Serialize)]
struct ValidateRequest<'a> {
    meta: ValidateMeta<'a>,
}

#[derive(Debug, Serialize)]
struct ValidateMeta<'a> {
    key: &'a str,
    scope: Scope<'a>,
}

#[derive(Debug, Serialize)]
struct Scope<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    product: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    environment: Option<&'a str>,
    #[serde(skip_serializing_if = "is_empty")]
    fingerprints: &'a [String],
    #[serde(skip_serializing_if = "is_empty")]
    entitlements: &'a [String],
}

fn is_empty(list: &&[String]) -> bool {
    list.is_empty()
}

impl KeygenClient {
    /// Create a client for an explicit configuration.
    pub fn new(config: KeygenConfig) -> Result<Self> {
        Self::with_shared(Arc::new(config))
    }

    /// Create a client from a snapshot of the process-wide configuration.
    pub fn from_global() -> Result<Self> {
        Self::with_shared(get_config()?)
    }

    pub fn with_shared(config: Arc<KeygenConfig>) -> Result<Self> {
        let mut base = Url::parse(&config.api_url).map_err(|_| Error::InvalidUrl)?;
        base.path_segments_mut()
            .map_err(|_| Error::InvalidUrl)?
            .pop_if_empty()
            .extend(config.api_prefix.split('/').filter(|s| !s.is_empty()))
            .extend(["accounts", config.account.as_str()]);

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(JSON_API));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_API));
        headers.insert("keygen-version", header_value(&config.api_version)?);
        headers.insert(
            USER_AGENT,
            header_value(config.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT))?,
        );

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| Error::HttpClient(e.to_string()))?;

        Ok(Self { config, http, base })
    }

    pub fn config(&self) -> &KeygenConfig {
        &self.config
    }

    /// Validate the configured license key.
    ///
    /// Empty `fingerprints` / `entitlements` leave that part of the scope out.
    pub async fn validate(&self, fingerprints: &[String], entitlements: &[String]) -> Result<License> {
        let key = self
            .config
            .license_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(Error::LicenseKeyMissing)?;
        self.validate_key(key, fingerprints, entitlements).await
    }

    /// Validate an arbitrary license key against this account.
    pub async fn validate_key(
        &self,
        key: &str,
        fingerprints: &[String],
        entitlements: &[String],
    ) -> Result<License> {
        if key.is_empty() {
            return Err(Error::LicenseKeyMissing);
        }

        info!(
            key_prefix = key_prefix(key),
            fingerprints = fingerprints.len(),
            entitlements = entitlements.len(),
            "Validating license online"
        );

        let request = ValidateRequest {
            meta: ValidateMeta {
                key,
                scope: Scope {
                    product: Some(self.config.product.as_str()).filter(|p| !p.is_empty()),
                    environment: self.config.environment.as_deref(),
                    fingerprints,
                    entitlements,
                },
            },
        };

        let url = self.url(&["licenses", "actions", "validate-key"])?;
        let body = self
            .send(Method::POST, url, Some(key), Some(serde_json::to_string(&request)?))
            .await?;

        let document = ValidationDocument::deserialize(&body)?;
        if !document.meta.valid {
            warn!(
                key_prefix = key_prefix(key),
                code = %document.meta.code,
                "License validation rejected"
            );
            let snapshot = body.get("data").cloned().unwrap_or(Value::Null);
            return Err(codes::validation_error(
                &document.meta.code,
                &document.meta.detail,
                &snapshot,
            ));
        }

        let resource = document
            .data
            .ok_or_else(|| Error::JsonError("validation response has no license data".to_string()))?;
        let license = License::from_resource(resource, self.clone());

        info!(license_id = %license.id, status = %license.status, "License validated successfully");
        Ok(license)
    }

    pub(crate) async fn machines(&self, license: &License) -> Result<Vec<Machine>> {
        let url = self.url(&["licenses", &license.id, "machines"])?;
        let body = self.send(Method::GET, url, Some(&license.key), None).await?;
        let document: Document<Vec<Resource<MachineAttributes>>> = serde_json::from_value(body)?;

        debug!(license_id = %license.id, count = document.data.len(), "Listed machines");
        Ok(document
            .data
            .into_iter()
            .map(|resource| Machine::from_resource(resource, license.key.clone(), self.clone()))
            .collect())
    }

    pub(crate) async fn machine(&self, license: &License, id: &str) -> Result<Machine> {
        let url = self.url(&["machines", id])?;
        let body = match self.send(Method::GET, url, Some(&license.key), None).await {
            Ok(body) => body,
            Err(Error::NotFound { .. }) => return Err(Error::MachineNotFound),
            Err(e) => return Err(e),
        };
        let document: Document<Resource<MachineAttributes>> = serde_json::from_value(body)?;
        let machine = Machine::from_resource(document.data, license.key.clone(), self.clone());

        if machine.license_id.as_deref().is_some_and(|owner| owner != license.id) {
            warn!(machine_id = %id, license_id = %license.id, "Machine belongs to another license");
            return Err(Error::MachineNotFound);
        }
        Ok(machine)
    }

    pub(crate) async fn entitlements(&self, license: &License) -> Result<Vec<Entitlement>> {
        let url = self.url(&["licenses", &license.id, "entitlements"])?;
        let body = self.send(Method::GET, url, Some(&license.key), None).await?;
        let document: Document<Vec<Resource<EntitlementAttributes>>> =
            serde_json::from_value(body)?;

        Ok(document.data.into_iter().map(Entitlement::from_resource).collect())
    }

    pub(crate) async fn activate(
        &self,
        license: &License,
        fingerprint: &str,
        components: &[Component],
    ) -> Result<Machine> {
        let host = MachineFingerprint::current();
        let platform = self.config.platform.clone().unwrap_or(host.platform);

        let mut relationships = json!({
            "license": { "data": { "type": "licenses", "id": license.id } }
        });
        if !components.is_empty() {
            let data: Vec<Value> = components.iter().map(Component::to_resource).collect();
            relationships["components"] = json!({ "data": data });
        }

        let request = json!({
            "data": {
                "type": "machines",
                "attributes": {
                    "fingerprint": fingerprint,
                    "hostname": host.hostname,
                    "platform": platform,
                    "cores": host.cores,
                },
                "relationships": relationships,
            }
        });

        info!(license_id = %license.id, fingerprint = %fingerprint, "Activating machine");
        let url = self.url(&["machines"])?;
        let body = self
            .send(Method::POST, url, Some(&license.key), Some(request.to_string()))
            .await?;
        let document: Document<Resource<MachineAttributes>> = serde_json::from_value(body)?;

        Ok(Machine::from_resource(document.data, license.key.clone(), self.clone()))
    }

    pub(crate) async fn deactivate(&self, key: &str, machine_id: &str) -> Result<()> {
        info!(machine_id = %machine_id, "Deactivating machine");
        let url = self.url(&["machines", machine_id])?;
        match self.send(Method::DELETE, url, Some(key), None).await {
            Ok(_) => Ok(()),
            Err(Error::NotFound { .. }) => Err(Error::MachineNotFound),
            Err(e) => Err(e),
        }
    }

    pub(crate) async fn ping(&self, key: &str, machine_id: &str) -> Result<Machine> {
        let url = self.url(&["machines", machine_id, "actions", "ping"])?;
        let body = match self.send(Method::POST, url, Some(key), None).await {
            Ok(body) => body,
            Err(Error::NotFound { .. }) => return Err(Error::MachineNotFound),
            Err(e) => return Err(e),
        };
        let document: Document<Resource<MachineAttributes>> = serde_json::from_value(body)?;

        debug!(machine_id = %machine_id, "Heartbeat ping sent");
        Ok(Machine::from_resource(document.data, key.to_string(), self.clone()))
    }

    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| Error::InvalidUrl)?
            .extend(segments);
        Ok(url)
    }

    /// `Bearer <token>` when a token is configured, else `License <key>`.
    fn authorization(&self, key: Option<&str>) -> Result<Option<HeaderValue>> {
        let value = match (self.config.token.as_deref(), key) {
            (Some(token), _) if !token.is_empty() => format!("Bearer {}", token),
            (_, Some(key)) if !key.is_empty() => format!("License {}", key),
            _ => return Ok(None),
        };
        let mut value = header_value(&value)?;
        value.set_sensitive(true);
        Ok(Some(value))
    }

    async fn send(
        &self,
        method: Method,
        url: Url,
        key: Option<&str>,
        body: Option<String>,
    ) -> Result<Value> {
        debug!(method = %method, path = url.path(), "Sending licensing request");

        let mut request = self.http.request(method, url);
        if let Some(auth) = self.authorization(key)? {
            request = request.header(AUTHORIZATION, auth);
        }
        if let Some(body) = body {
            request = request.body(body);
        }

        let response = request.send().await.map_err(|e| {
            error!(error = %e, "Licensing request failed");
            Error::HttpClient(e.to_string())
        })?;

        let status = response.status();
        let headers = response.headers().clone();
        self.check_clock(&headers)?;

        if status == StatusCode::TOO_MANY_REQUESTS {
            let err = rate_limit_error(&headers);
            warn!(retry_after = ?err.retry_after(), "Licensing service rate limit exceeded");
            return Err(err);
        }

        let text = response
            .text()
            .await
            .map_err(|e| Error::HttpClient(e.to_string()))?;

        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            match serde_json::from_str::<Value>(&text) {
                Ok(body) => body,
                Err(e) if status.is_success() => return Err(e.into()),
                Err(_) => return Err(status_error(status, Value::String(text))),
            }
        };

        if let Some(api_error) = ApiErrorObject::first(&body) {
            let code = api_error.code.as_deref().unwrap_or_default();
            warn!(status = %status, code = %code, "Licensing service returned an error");
            return Err(codes::api_error(code, api_error.message(), &body));
        }

        if status == StatusCode::NOT_FOUND {
            return Err(Error::NotFound {
                code: "NOT_FOUND".to_string(),
                detail: "The requested resource was not found".to_string(),
            });
        }
        if !status.is_success() {
            return Err(status_error(status, body));
        }

        Ok(body)
    }

    fn check_clock(&self, headers: &HeaderMap) -> Result<()> {
        let Some(max_drift) = self.config.max_clock_drift else {
            return Ok(());
        };
        let Some(date) = headers
            .get(DATE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| DateTime::parse_from_rfc2822(v).ok())
        else {
            return Ok(());
        };

        let drift = (Utc::now() - date.with_timezone(&Utc)).num_minutes().abs();
        if drift > max_drift {
            error!(drift_minutes = drift, max_drift, "System clock is out of sync");
            return Err(Error::SystemClockUnsynced);
        }
        Ok(())
    }
}

/// Validate the license key of the process-wide configuration.
pub async fn validate(fingerprints: &[String], entitlements: &[String]) -> Result<License> {
    KeygenClient::from_global()?
        .validate(fingerprints, entitlements)
        .await
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value).map_err(|e| Error::InvalidHeader(e.to_string()))
}

fn header_field<T: FromStr + Default>(headers: &HeaderMap, name: &str) -> T {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or_default()
}

fn rate_limit_error(headers: &HeaderMap) -> Error {
    Error::RateLimitExceeded {
        window: header_field(headers, "x-ratelimit-window"),
        count: header_field(headers, "x-ratelimit-count"),
        limit: header_field(headers, "x-ratelimit-limit"),
        remaining: header_field(headers, "x-ratelimit-remaining"),
        reset: header_field(headers, "x-ratelimit-reset"),
        retry_after: header_field(headers, "retry-after"),
    }
}

fn status_error(status: StatusCode, body: Value) -> Error {
    Error::KeygenApiError {
        code: status.as_u16().to_string(),
        detail: status.canonical_reason().unwrap_or("Unknown status").to_string(),
        body,
    }
}

/// First eight characters of a license key, safe to log.
pub(crate) fn key_prefix(key: &str) -> &str {
    key.char_indices().nth(8).map_or(key, |(i, _)| &key[..i])
}
