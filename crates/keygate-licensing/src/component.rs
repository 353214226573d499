//! Hardware components sent along with a machine activation.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub fingerprint: String,
    pub name: String,
}

impl Component {
    pub fn new(fingerprint: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: None,
            fingerprint: fingerprint.into(),
            name: name.into(),
        }
    }

    pub(crate) fn to_resource(&self) -> Value {
        let mut resource = json!({
            "type": "components",
            "attributes": { "fingerprint": self.fingerprint, "name": self.name },
        });
        if let Some(id) = &self.id {
            resource["id"] = json!(id);
        }
        resource
    }
}
