pub mod students;

use serde_json::Value;

use crate::api::jsonapi::{SerializeContext, SerializeError};
use crate::types::{QueryParams, ShapedRows};

/// Strategy object that reshapes one resource type's raw rows into a
/// JSON:API document. The fetcher hands rows to exactly one of these per
/// request; implementations are pure, single-pass transforms.
pub trait ResourceSerializer: Sync {
    fn serialize(
        &self,
        ctx: &SerializeContext<'_>,
        rows: ShapedRows,
        subject_id: &str,
        params: &QueryParams,
    ) -> Result<Value, SerializeError>;
}
