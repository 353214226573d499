//! Feature entitlements attached to a license.

use crate::document::{EntitlementAttributes, Resource};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Feature entitlement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entitlement {
    pub id: String,
    /// Human-readable name.
    pub name: Option<String>,
    /// Code used in validation scopes.
    pub code: String,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

impl Entitlement {
    pub(crate) fn from_resource(resource: Resource<EntitlementAttributes>) -> Self {
        Self {
            id: resource.id,
            name: resource.attributes.name,
            code: resource.attributes.code,
            created: resource.attributes.created,
            updated: resource.attributes.updated,
        }
    }
}

/// Whether `entitlements` contains every code in `required`.
pub fn has_all(entitlements: &[Entitlement], required: &[&str]) -> bool {
    required
        .iter()
        .all(|code| entitlements.iter().any(|e| e.code == *code))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entitlement(code: &str) -> Entitlement {
        Entitlement {
            id: format!("ent-{}", code),
            name: None,
            code: code.to_string(),
            created: Utc::now(),
            updated: Utc::now(),
        }
    }

    #[test]
    fn test_has_all() {
        let granted = vec![entitlement("SSO"), entitlement("AUDIT_LOG")];
        assert!(has_all(&granted, &["SSO"]));
        assert!(has_all(&granted, &[]));
        assert!(!has_all(&granted, &["SSO", "SCIM"]));
    }
}
