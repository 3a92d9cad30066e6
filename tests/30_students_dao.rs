//! Fetch pipeline tests against a stubbed connection provider.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use students_api_rust::api::jsonapi::{LinkBuilder, SerializeContext, SerializeError};
use students_api_rust::dao::students::{self, get_resource_by_id, DaoError};
use students_api_rust::database::connection::{Connection, ConnectionProvider};
use students_api_rust::database::manager::DatabaseError;
use students_api_rust::database::queries;
use students_api_rust::schema::SCHEMA;
use students_api_rust::serializers::ResourceSerializer;
use students_api_rust::types::{QueryParams, RawRow, ShapedRows, TransactionType};

const FAKE_ID: &str = "912345678";

fn row(pairs: &[(&str, Value)]) -> RawRow {
    let mut map = Map::new();
    for (key, value) in pairs {
        map.insert((*key).to_string(), value.clone());
    }
    map
}

/// Record of every query the stub executed, with its binds.
#[derive(Clone, Default)]
struct QueryLog {
    executed: Arc<Mutex<Vec<(String, Vec<(String, String)>)>>>,
}

impl QueryLog {
    fn executions_of(&self, sql: &str) -> usize {
        self.executed
            .lock()
            .unwrap()
            .iter()
            .filter(|(text, _)| text == sql)
            .count()
    }

    fn binds_for(&self, sql: &str) -> Option<Vec<(String, String)>> {
        self.executed
            .lock()
            .unwrap()
            .iter()
            .find(|(text, _)| text == sql)
            .map(|(_, binds)| binds.clone())
    }
}

#[derive(Clone)]
struct StubProvider {
    rows_by_sql: HashMap<String, Vec<RawRow>>,
    current_term: String,
    log: QueryLog,
}

impl StubProvider {
    fn new() -> Self {
        let mut rows_by_sql = HashMap::new();
        rows_by_sql.insert(
            "singleResult".to_string(),
            vec![row(&[("value", json!("a"))])],
        );
        rows_by_sql.insert(
            "multiResults".to_string(),
            vec![row(&[("value", json!("a"))]), row(&[("value", json!("b"))])],
        );
        Self {
            rows_by_sql,
            current_term: "201901".to_string(),
            log: QueryLog::default(),
        }
    }

    fn with_rows(mut self, sql: String, rows: Vec<RawRow>) -> Self {
        self.rows_by_sql.insert(sql, rows);
        self
    }
}

struct StubConnection {
    rows_by_sql: HashMap<String, Vec<RawRow>>,
    current_term: String,
    log: QueryLog,
}

#[async_trait]
impl ConnectionProvider for StubProvider {
    type Conn = StubConnection;

    async fn acquire(&self) -> Result<StubConnection, DatabaseError> {
        Ok(StubConnection {
            rows_by_sql: self.rows_by_sql.clone(),
            current_term: self.current_term.clone(),
            log: self.log.clone(),
        })
    }
}

#[async_trait]
impl Connection for StubConnection {
    async fn execute(
        &mut self,
        sql: &str,
        binds: &[(String, String)],
    ) -> Result<Vec<RawRow>, DatabaseError> {
        self.log
            .executed
            .lock()
            .unwrap()
            .push((sql.to_string(), binds.to_vec()));

        if sql == queries::current_term() {
            return Ok(vec![row(&[("currentTerm", json!(self.current_term))])]);
        }
        Ok(self.rows_by_sql.get(sql).cloned().unwrap_or_default())
    }
}

/// Serializer stub that returns the shaped rows it was given, so tests can
/// assert on the exact shape the fetcher produced.
#[derive(Default)]
struct EchoSerializer {
    invocations: AtomicUsize,
}

impl ResourceSerializer for EchoSerializer {
    fn serialize(
        &self,
        _ctx: &SerializeContext<'_>,
        rows: ShapedRows,
        _subject_id: &str,
        _params: &QueryParams,
    ) -> Result<Value, SerializeError> {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        Ok(match rows {
            ShapedRows::One(row) => Value::Object(row),
            ShapedRows::Many(rows) => {
                Value::Array(rows.into_iter().map(Value::Object).collect())
            }
        })
    }
}

fn single_result(_params: &QueryParams) -> String {
    "singleResult".to_string()
}

fn multi_results(_params: &QueryParams) -> String {
    "multiResults".to_string()
}

fn empty_result(_params: &QueryParams) -> String {
    "emptyResult".to_string()
}

#[tokio::test]
async fn singleton_fetch_passes_the_bare_row() {
    let provider = StubProvider::new();
    let links = LinkBuilder::new("https://api.example.edu/api/v1");
    let ctx = SerializeContext { schema: &SCHEMA, links: &links };
    let echo = EchoSerializer::default();

    let result = get_resource_by_id(
        &provider,
        &ctx,
        FAKE_ID,
        single_result,
        &echo,
        true,
        Vec::new(),
        &QueryParams::default(),
    )
    .await
    .unwrap();

    assert_eq!(result, json!({"value": "a"}));
    assert_eq!(echo.invocations.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn collection_fetch_passes_the_full_row_list_in_order() {
    let provider = StubProvider::new();
    let links = LinkBuilder::new("https://api.example.edu/api/v1");
    let ctx = SerializeContext { schema: &SCHEMA, links: &links };
    let echo = EchoSerializer::default();

    let single = get_resource_by_id(
        &provider,
        &ctx,
        FAKE_ID,
        single_result,
        &echo,
        false,
        Vec::new(),
        &QueryParams::default(),
    )
    .await
    .unwrap();
    assert_eq!(single, json!([{"value": "a"}]));

    let multi = get_resource_by_id(
        &provider,
        &ctx,
        FAKE_ID,
        multi_results,
        &echo,
        false,
        Vec::new(),
        &QueryParams::default(),
    )
    .await
    .unwrap();
    assert_eq!(multi, json!([{"value": "a"}, {"value": "b"}]));
}

#[tokio::test]
async fn singleton_fetch_with_multiple_rows_is_a_contract_violation() {
    let provider = StubProvider::new();
    let links = LinkBuilder::new("https://api.example.edu/api/v1");
    let ctx = SerializeContext { schema: &SCHEMA, links: &links };
    let echo = EchoSerializer::default();

    let err = get_resource_by_id(
        &provider,
        &ctx,
        FAKE_ID,
        multi_results,
        &echo,
        true,
        Vec::new(),
        &QueryParams::default(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, DaoError::SingletonViolation));
    assert_eq!(
        err.to_string(),
        "Expect a single object but got multiple results."
    );
    // The serializer is never invoked on a contract violation
    assert_eq!(echo.invocations.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn singleton_fetch_with_no_rows_passes_an_empty_collection() {
    let provider = StubProvider::new();
    let links = LinkBuilder::new("https://api.example.edu/api/v1");
    let ctx = SerializeContext { schema: &SCHEMA, links: &links };
    let echo = EchoSerializer::default();

    let result = get_resource_by_id(
        &provider,
        &ctx,
        FAKE_ID,
        empty_result,
        &echo,
        true,
        Vec::new(),
        &QueryParams::default(),
    )
    .await
    .unwrap();

    assert_eq!(result, json!([]));
    assert_eq!(echo.invocations.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn current_term_sentinel_is_resolved_exactly_once() {
    let provider = StubProvider::new();
    let links = LinkBuilder::new("https://api.example.edu/api/v1");
    let ctx = SerializeContext { schema: &SCHEMA, links: &links };
    let echo = EchoSerializer::default();
    let params = QueryParams {
        term: Some("current".to_string()),
        ..Default::default()
    };

    get_resource_by_id(
        &provider,
        &ctx,
        FAKE_ID,
        single_result,
        &echo,
        false,
        Vec::new(),
        &params,
    )
    .await
    .unwrap();

    assert_eq!(provider.log.executions_of(queries::current_term()), 1);

    // The resolved value, not the sentinel, is bound to the main query
    let binds = provider.log.binds_for("singleResult").unwrap();
    assert!(binds.contains(&("osuId".to_string(), FAKE_ID.to_string())));
    assert!(binds.contains(&("term".to_string(), "201901".to_string())));
    assert!(!binds.contains(&("term".to_string(), "current".to_string())));
}

#[tokio::test]
async fn explicit_term_skips_the_current_term_lookup() {
    let provider = StubProvider::new();
    let links = LinkBuilder::new("https://api.example.edu/api/v1");
    let ctx = SerializeContext { schema: &SCHEMA, links: &links };
    let echo = EchoSerializer::default();
    let params = QueryParams {
        term: Some("201803".to_string()),
        ..Default::default()
    };

    get_resource_by_id(
        &provider,
        &ctx,
        FAKE_ID,
        single_result,
        &echo,
        false,
        Vec::new(),
        &params,
    )
    .await
    .unwrap();

    assert_eq!(provider.log.executions_of(queries::current_term()), 0);
    let binds = provider.log.binds_for("singleResult").unwrap();
    assert!(binds.contains(&("term".to_string(), "201803".to_string())));
}

#[tokio::test]
async fn extra_binds_are_appended_after_subject_and_term() {
    let provider = StubProvider::new();
    let links = LinkBuilder::new("https://api.example.edu/api/v1");
    let ctx = SerializeContext { schema: &SCHEMA, links: &links };
    let echo = EchoSerializer::default();

    get_resource_by_id(
        &provider,
        &ctx,
        FAKE_ID,
        single_result,
        &echo,
        false,
        vec![
            ("code_0".to_string(), "AR".to_string()),
            ("code_1".to_string(), "REG".to_string()),
        ],
        &QueryParams::default(),
    )
    .await
    .unwrap();

    let binds = provider.log.binds_for("singleResult").unwrap();
    assert_eq!(
        binds,
        vec![
            ("osuId".to_string(), FAKE_ID.to_string()),
            ("code_0".to_string(), "AR".to_string()),
            ("code_1".to_string(), "REG".to_string()),
        ]
    );
}

#[tokio::test]
async fn identical_calls_yield_identical_documents() {
    let provider = StubProvider::new();
    let links = LinkBuilder::new("https://api.example.edu/api/v1");
    let ctx = SerializeContext { schema: &SCHEMA, links: &links };
    let echo = EchoSerializer::default();

    let first = get_resource_by_id(
        &provider,
        &ctx,
        FAKE_ID,
        multi_results,
        &echo,
        false,
        Vec::new(),
        &QueryParams::default(),
    )
    .await
    .unwrap();
    let second = get_resource_by_id(
        &provider,
        &ctx,
        FAKE_ID,
        multi_results,
        &echo,
        false,
        Vec::new(),
        &QueryParams::default(),
    )
    .await
    .unwrap();

    assert_eq!(first, second);
}

#[tokio::test]
async fn gpa_pipeline_end_to_end() {
    let gpa_sql = queries::gpa_levels_by_id(&QueryParams::default());
    let provider = StubProvider::new().with_rows(
        gpa_sql,
        vec![row(&[
            ("gpa", json!("3.96")),
            ("gpaType", json!("Institution")),
            ("gpaCreditHours", json!("107")),
            ("creditHoursAttempted", json!("107")),
            ("creditHoursEarned", json!("107")),
            ("creditHoursPassed", json!("107")),
            ("levelCode", json!("UG")),
            ("level", json!("Undergraduate")),
            ("qualityPoints", json!("423.50")),
        ])],
    );
    let links = LinkBuilder::new("https://api.example.edu/api/v1");
    let ctx = SerializeContext { schema: &SCHEMA, links: &links };

    let doc = students::get_gpa_by_id(&provider, &ctx, FAKE_ID).await.unwrap();

    assert_eq!(doc["data"]["id"], FAKE_ID);
    assert_eq!(doc["data"]["type"], "gpa");
    assert_eq!(
        doc["links"]["self"],
        "https://api.example.edu/api/v1/students/912345678/gpa"
    );
    assert_eq!(
        doc["data"]["attributes"]["gpaLevels"][0]["gpaCreditHours"],
        json!(107.0)
    );
}

#[tokio::test]
async fn transaction_type_filter_binds_its_single_letter_code() {
    let params = QueryParams {
        transaction_type: Some(TransactionType::Charge),
        ..Default::default()
    };
    let tx_sql = queries::transactions_by_id(&params);
    let provider = StubProvider::new().with_rows(
        tx_sql.clone(),
        vec![row(&[
            ("amount", json!("2850")),
            ("entryDate", json!("2016-12-31 12:29:54")),
            ("description", json!("Housing Payment")),
        ])],
    );
    let links = LinkBuilder::new("https://api.example.edu/api/v1");
    let ctx = SerializeContext { schema: &SCHEMA, links: &links };

    let doc = students::get_account_transactions_by_id(&provider, &ctx, FAKE_ID, &params)
        .await
        .unwrap();

    let binds = provider.log.binds_for(&tx_sql).unwrap();
    assert!(binds.contains(&("transactionType".to_string(), "C".to_string())));

    let transaction = &doc["data"]["attributes"]["transactions"][0];
    assert_eq!(transaction["amount"], json!(2850.0));
    assert_eq!(transaction["entryDate"], "2016-12-31T20:29:54Z");
}
