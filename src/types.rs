/// Shared types used across the codebase

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

/// One row as returned by the database driver: column name -> scalar.
/// Multiple raw rows may describe the same logical resource (denormalized
/// joins), which is what the serializer grouping steps collapse.
pub type RawRow = Map<String, Value>;

/// Result shape handed to a serializer after the singleton/collection
/// contract has been enforced. A singleton fetch that matched exactly one
/// row yields `One`; everything else yields `Many` (possibly empty).
#[derive(Debug, Clone, PartialEq)]
pub enum ShapedRows {
    One(RawRow),
    Many(Vec<RawRow>),
}

impl ShapedRows {
    /// Flatten to a row list, preserving query result order.
    pub fn into_rows(self) -> Vec<RawRow> {
        match self {
            ShapedRows::One(row) => vec![row],
            ShapedRows::Many(rows) => rows,
        }
    }

    /// The bare row for a singleton resource, if any row matched.
    pub fn into_singleton(self) -> Option<RawRow> {
        match self {
            ShapedRows::One(row) => Some(row),
            ShapedRows::Many(rows) => rows.into_iter().next(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            ShapedRows::One(_) => false,
            ShapedRows::Many(rows) => rows.is_empty(),
        }
    }
}

/// Filter parameters accepted by the student resource endpoints.
///
/// `term` may be a 6-digit year+quarter code or the literal sentinel
/// `current`, which the DAO resolves against the database before binding.
/// List-valued parameters arrive as comma-separated query strings.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QueryParams {
    pub term: Option<String>,
    pub transaction_type: Option<TransactionType>,
    #[serde(deserialize_with = "comma_list")]
    pub categories: Option<Vec<String>>,
    #[serde(deserialize_with = "comma_list")]
    pub codes: Option<Vec<String>>,
}

impl QueryParams {
    pub fn is_empty(&self) -> bool {
        self.term.is_none()
            && self.transaction_type.is_none()
            && self.categories.is_none()
            && self.codes.is_none()
    }

    /// Ordered key/value pairs for building a self-link query string.
    /// Array values are joined with commas.
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if let Some(term) = &self.term {
            pairs.push(("term".to_string(), term.clone()));
        }
        if let Some(transaction_type) = self.transaction_type {
            pairs.push(("transactionType".to_string(), transaction_type.as_str().to_string()));
        }
        if let Some(categories) = &self.categories {
            pairs.push(("categories".to_string(), categories.join(",")));
        }
        if let Some(codes) = &self.codes {
            pairs.push(("codes".to_string(), codes.join(",")));
        }
        pairs
    }
}

/// Transaction filter accepted by the account-transactions endpoint,
/// mapped to the single-letter codes stored in the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Charge,
    Payment,
}

impl TransactionType {
    pub fn code(self) -> &'static str {
        match self {
            TransactionType::Charge => "C",
            TransactionType::Payment => "P",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TransactionType::Charge => "charge",
            TransactionType::Payment => "payment",
        }
    }
}

/// Deserialize an optional comma-separated query value into a list.
fn comma_list<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.map(|s| s.split(',').map(|item| item.trim().to_string()).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_pairs_joins_lists_with_commas() {
        let params = QueryParams {
            term: Some("201901".to_string()),
            transaction_type: Some(TransactionType::Charge),
            categories: Some(vec!["TUI".to_string(), "HSG".to_string()]),
            codes: None,
        };
        assert_eq!(
            params.to_pairs(),
            vec![
                ("term".to_string(), "201901".to_string()),
                ("transactionType".to_string(), "charge".to_string()),
                ("categories".to_string(), "TUI,HSG".to_string()),
            ]
        );
    }

    #[test]
    fn empty_params_produce_no_pairs() {
        let params = QueryParams::default();
        assert!(params.is_empty());
        assert!(params.to_pairs().is_empty());
    }

    #[test]
    fn shaped_rows_singleton_accessors() {
        let mut row = RawRow::new();
        row.insert("a".to_string(), serde_json::json!(1));

        assert_eq!(ShapedRows::One(row.clone()).into_singleton(), Some(row.clone()));
        assert_eq!(ShapedRows::Many(vec![]).into_singleton(), None);
        assert!(ShapedRows::Many(vec![]).is_empty());
        assert_eq!(ShapedRows::One(row.clone()).into_rows(), vec![row]);
    }
}
