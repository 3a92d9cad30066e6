//! JSON:API document assembly.
//!
//! Serializers reshape raw rows into [`ShapedResource`]s; this module wraps
//! them in the `{data, links}` envelope using resource-type metadata from the
//! schema registry. Only the top-level self link is populated; per-resource
//! `links.self` is always null.

use once_cell::sync::Lazy;
use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::config;
use crate::schema::{SchemaRegistry, SCHEMA};
use crate::types::{QueryParams, RawRow};

#[derive(Debug, Error)]
pub enum SerializeError {
    #[error("Unknown result type: {0}")]
    UnknownResultType(String),
}

/// Composes self-links of the form `{base}/students/{id}/{resourcePath}`.
#[derive(Debug, Clone)]
pub struct LinkBuilder {
    base_url: String,
}

impl LinkBuilder {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn resource_url(&self, subject_id: &str, resource_path: &str) -> String {
        format!("{}/students/{}/{}", self.base_url, subject_id, resource_path)
    }

    /// Self-link with a query string appended for non-empty params.
    /// Array-valued params arrive already comma-joined.
    pub fn resource_url_with_params(
        &self,
        subject_id: &str,
        resource_path: &str,
        pairs: &[(String, String)],
    ) -> String {
        let url = self.resource_url(subject_id, resource_path);
        if pairs.is_empty() {
            return url;
        }
        let query = pairs
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");
        format!("{url}?{query}")
    }
}

/// Collaborators every serializer needs: the schema registry and the link
/// builder. Passed by reference so tests can inject fakes.
#[derive(Clone, Copy)]
pub struct SerializeContext<'a> {
    pub schema: &'a SchemaRegistry,
    pub links: &'a LinkBuilder,
}

static LINKS: Lazy<LinkBuilder> = Lazy::new(|| LinkBuilder::new(config::config().api.base_url.as_str()));

/// Context backed by the process-wide registry and configured base URL.
pub fn default_context() -> SerializeContext<'static> {
    SerializeContext {
        schema: &SCHEMA,
        links: &LINKS,
    }
}

/// Descriptor consumed by the generic serialize step: resource type tag,
/// ordered attribute allowlist, and the document's top-level self link.
#[derive(Debug, Clone, PartialEq)]
pub struct SerializerArgs {
    pub resource_type: String,
    pub resource_keys: Vec<String>,
    pub top_level_self_link: String,
}

/// Look up resource-type metadata and compose the top-level self link.
pub fn build_serializer_args(
    ctx: &SerializeContext<'_>,
    subject_id: &str,
    result_name: &str,
    resource_path: &str,
    is_singleton: bool,
    params: &QueryParams,
) -> Result<SerializerArgs, SerializeError> {
    let entry = ctx
        .schema
        .lookup(result_name)
        .ok_or_else(|| SerializeError::UnknownResultType(result_name.to_string()))?;
    debug_assert_eq!(entry.singleton, is_singleton, "schema registry disagrees on document shape for {result_name}");

    let top_level_self_link = if params.is_empty() {
        ctx.links.resource_url(subject_id, resource_path)
    } else {
        ctx.links
            .resource_url_with_params(subject_id, resource_path, &params.to_pairs())
    };

    Ok(SerializerArgs {
        resource_type: entry.resource_type.clone(),
        resource_keys: entry.attribute_keys.clone(),
        top_level_self_link,
    })
}

/// One normalized resource ready for the JSON:API envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapedResource {
    pub id: String,
    pub attributes: RawRow,
}

impl ShapedResource {
    pub fn new(id: impl Into<String>, attributes: RawRow) -> Self {
        Self {
            id: id.into(),
            attributes,
        }
    }
}

fn resource_value(args: &SerializerArgs, shaped: &ShapedResource) -> Value {
    // Copy allowlisted attributes that are present; anything else the query
    // returned (alternate source columns, grouping keys) stays internal.
    let mut attributes = Map::new();
    for key in &args.resource_keys {
        if let Some(value) = shaped.attributes.get(key) {
            attributes.insert(key.clone(), value.clone());
        }
    }

    json!({
        "id": shaped.id,
        "type": args.resource_type,
        "attributes": attributes,
        "links": { "self": null }
    })
}

/// Document for a singleton resource; `data` is null when no row matched.
pub fn serialize_single(args: &SerializerArgs, shaped: Option<&ShapedResource>) -> Value {
    json!({
        "data": shaped.map(|s| resource_value(args, s)),
        "links": { "self": args.top_level_self_link }
    })
}

/// Document for a resource collection, preserving input order.
pub fn serialize_collection(args: &SerializerArgs, shaped: &[ShapedResource]) -> Value {
    json!({
        "data": shaped.iter().map(|s| resource_value(args, s)).collect::<Vec<_>>(),
        "links": { "self": args.top_level_self_link }
    })
}
