//! Typed resource schema registry.
//!
//! Loaded once at startup from an embedded YAML document and consulted
//! through a narrow lookup interface. Serializers receive the registry by
//! reference, so tests can supply a fake without touching process state.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use serde::Deserialize;

/// Schema entry for one result type.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSchema {
    /// JSON:API resource type tag, e.g. "account-balance".
    pub resource_type: String,
    /// Whether the document's `data` is a single resource.
    pub singleton: bool,
    /// Ordered attribute allowlist for each resource's attributes object.
    pub attribute_keys: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    definitions: IndexMap<String, ResourceSchema>,
}

impl SchemaRegistry {
    pub fn from_yaml(document: &str) -> Result<Self, serde_yaml::Error> {
        let definitions = serde_yaml::from_str(document)?;
        Ok(Self { definitions })
    }

    pub fn lookup(&self, result_name: &str) -> Option<&ResourceSchema> {
        self.definitions.get(result_name)
    }

    pub fn result_names(&self) -> impl Iterator<Item = &str> {
        self.definitions.keys().map(String::as_str)
    }
}

/// Registry built from the embedded schema document.
pub static SCHEMA: Lazy<SchemaRegistry> = Lazy::new(|| {
    SchemaRegistry::from_yaml(include_str!("resources.yaml"))
        .expect("embedded resource schema is valid YAML")
});
