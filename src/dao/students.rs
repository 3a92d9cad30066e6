//! Student resource fetch pipeline.
//!
//! [`get_resource_by_id`] is the single generic fetch-and-serialize path:
//! acquire a connection, resolve the `current` term sentinel, execute the
//! descriptor's SQL, enforce the singleton/collection contract, and hand the
//! shaped rows to the resource's serializer.

use serde_json::Value;
use thiserror::Error;

use crate::api::jsonapi::{SerializeContext, SerializeError};
use crate::database::connection::{Connection, ConnectionProvider};
use crate::database::manager::DatabaseError;
use crate::database::queries::{self, QueryDescriptor};
use crate::serializers::students::{
    AcademicStatusSerializer, AccountBalanceSerializer, AccountTransactionsSerializer,
    ClassificationSerializer, ClassScheduleSerializer, DegreesSerializer,
    DualEnrollmentSerializer, EmergencyContactsSerializer, GpaSerializer, GradesSerializer,
    HoldsSerializer, WorkStudySerializer,
};
use crate::serializers::ResourceSerializer;
use crate::types::{QueryParams, ShapedRows};

#[derive(Debug, Error)]
pub enum DaoError {
    /// A singleton fetch matched more than one row. Fatal for the request;
    /// it signals a data-integrity issue or a missing filter.
    #[error("Expect a single object but got multiple results.")]
    SingletonViolation,

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Serialize(#[from] SerializeError),
}

/// Return serialized resource(s) by unique ID.
///
/// Exactly one connection is acquired per call and returns to the provider
/// on every exit path. When `params.term` is the `current` sentinel, the
/// current-term lookup runs first on the same connection and its single
/// scalar result replaces the bound term value.
pub async fn get_resource_by_id<P: ConnectionProvider>(
    provider: &P,
    ctx: &SerializeContext<'_>,
    subject_id: &str,
    sql: QueryDescriptor,
    serializer: &dyn ResourceSerializer,
    is_singleton: bool,
    extra_binds: Vec<(String, String)>,
    params: &QueryParams,
) -> Result<Value, DaoError> {
    let mut connection = provider.acquire().await?;

    let mut binds: Vec<(String, String)> = vec![("osuId".to_string(), subject_id.to_string())];
    if let Some(term) = &params.term {
        binds.push(("term".to_string(), term.clone()));
    }
    binds.extend(extra_binds);

    if params.term.as_deref() == Some("current") {
        let resolved = resolve_current_term(&mut connection).await?;
        for (name, value) in &mut binds {
            if name.as_str() == "term" {
                *value = resolved.clone();
            }
        }
    }

    let rows = connection.execute(&sql(params), &binds).await?;

    if is_singleton && rows.len() > 1 {
        return Err(DaoError::SingletonViolation);
    }

    let shaped = if is_singleton {
        match rows.into_iter().next() {
            Some(row) => ShapedRows::One(row),
            None => ShapedRows::Many(Vec::new()),
        }
    } else {
        ShapedRows::Many(rows)
    };

    Ok(serializer.serialize(ctx, shaped, subject_id, params)?)
}

/// Resolve the `current` term sentinel against the database.
async fn resolve_current_term<C: Connection>(connection: &mut C) -> Result<String, DaoError> {
    let rows = connection.execute(queries::current_term(), &[]).await?;
    let current = rows
        .first()
        .and_then(|row| row.get("currentTerm"))
        .and_then(|value| match value {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .ok_or_else(|| {
            DatabaseError::QueryError("current term lookup returned no usable row".to_string())
        })?;
    Ok(current)
}

/// Get GPA
pub async fn get_gpa_by_id<P: ConnectionProvider>(
    provider: &P,
    ctx: &SerializeContext<'_>,
    osu_id: &str,
) -> Result<Value, DaoError> {
    get_resource_by_id(
        provider,
        ctx,
        osu_id,
        queries::gpa_levels_by_id,
        &GpaSerializer,
        false,
        Vec::new(),
        &QueryParams::default(),
    )
    .await
}

/// Get account balance
pub async fn get_account_balance_by_id<P: ConnectionProvider>(
    provider: &P,
    ctx: &SerializeContext<'_>,
    osu_id: &str,
) -> Result<Value, DaoError> {
    get_resource_by_id(
        provider,
        ctx,
        osu_id,
        queries::account_balance_by_id,
        &AccountBalanceSerializer,
        true,
        Vec::new(),
        &QueryParams::default(),
    )
    .await
}

/// Get account transactions
pub async fn get_account_transactions_by_id<P: ConnectionProvider>(
    provider: &P,
    ctx: &SerializeContext<'_>,
    osu_id: &str,
    params: &QueryParams,
) -> Result<Value, DaoError> {
    let mut extra_binds = Vec::new();
    if let Some(transaction_type) = params.transaction_type {
        extra_binds.push(("transactionType".to_string(), transaction_type.code().to_string()));
    }
    if let Some(categories) = &params.categories {
        for (i, category) in categories.iter().enumerate() {
            extra_binds.push((format!("category_{i}"), category.clone()));
        }
    }
    get_resource_by_id(
        provider,
        ctx,
        osu_id,
        queries::transactions_by_id,
        &AccountTransactionsSerializer,
        false,
        extra_binds,
        params,
    )
    .await
}

/// Get academic status
pub async fn get_academic_status_by_id<P: ConnectionProvider>(
    provider: &P,
    ctx: &SerializeContext<'_>,
    osu_id: &str,
    params: &QueryParams,
) -> Result<Value, DaoError> {
    get_resource_by_id(
        provider,
        ctx,
        osu_id,
        queries::academic_status_by_id,
        &AcademicStatusSerializer,
        false,
        Vec::new(),
        params,
    )
    .await
}

/// Get classification
pub async fn get_classification_by_id<P: ConnectionProvider>(
    provider: &P,
    ctx: &SerializeContext<'_>,
    osu_id: &str,
) -> Result<Value, DaoError> {
    get_resource_by_id(
        provider,
        ctx,
        osu_id,
        queries::classification_by_id,
        &ClassificationSerializer,
        true,
        Vec::new(),
        &QueryParams::default(),
    )
    .await
}

/// Get grades
pub async fn get_grades_by_id<P: ConnectionProvider>(
    provider: &P,
    ctx: &SerializeContext<'_>,
    osu_id: &str,
    params: &QueryParams,
) -> Result<Value, DaoError> {
    get_resource_by_id(
        provider,
        ctx,
        osu_id,
        queries::grades_by_id,
        &GradesSerializer,
        false,
        Vec::new(),
        params,
    )
    .await
}

/// Get class schedule
pub async fn get_class_schedule_by_id<P: ConnectionProvider>(
    provider: &P,
    ctx: &SerializeContext<'_>,
    osu_id: &str,
    params: &QueryParams,
) -> Result<Value, DaoError> {
    get_resource_by_id(
        provider,
        ctx,
        osu_id,
        queries::class_schedule_by_id,
        &ClassScheduleSerializer,
        false,
        Vec::new(),
        params,
    )
    .await
}

/// Get holds
pub async fn get_holds_by_id<P: ConnectionProvider>(
    provider: &P,
    ctx: &SerializeContext<'_>,
    osu_id: &str,
    params: &QueryParams,
) -> Result<Value, DaoError> {
    let mut extra_binds = Vec::new();
    if let Some(codes) = &params.codes {
        for (i, code) in codes.iter().enumerate() {
            extra_binds.push((format!("code_{i}"), code.clone()));
        }
    }
    get_resource_by_id(
        provider,
        ctx,
        osu_id,
        queries::holds_by_id,
        &HoldsSerializer,
        false,
        extra_binds,
        params,
    )
    .await
}

/// Get work study
pub async fn get_work_study_by_id<P: ConnectionProvider>(
    provider: &P,
    ctx: &SerializeContext<'_>,
    osu_id: &str,
) -> Result<Value, DaoError> {
    get_resource_by_id(
        provider,
        ctx,
        osu_id,
        queries::awards_by_id,
        &WorkStudySerializer,
        false,
        Vec::new(),
        &QueryParams::default(),
    )
    .await
}

/// Get dual enrollment
pub async fn get_dual_enrollment_by_id<P: ConnectionProvider>(
    provider: &P,
    ctx: &SerializeContext<'_>,
    osu_id: &str,
    params: &QueryParams,
) -> Result<Value, DaoError> {
    get_resource_by_id(
        provider,
        ctx,
        osu_id,
        queries::dual_enrollment_by_id,
        &DualEnrollmentSerializer,
        false,
        Vec::new(),
        params,
    )
    .await
}

/// Get degrees
pub async fn get_degrees_by_id<P: ConnectionProvider>(
    provider: &P,
    ctx: &SerializeContext<'_>,
    osu_id: &str,
    params: &QueryParams,
) -> Result<Value, DaoError> {
    get_resource_by_id(
        provider,
        ctx,
        osu_id,
        queries::degrees_by_id,
        &DegreesSerializer,
        false,
        Vec::new(),
        params,
    )
    .await
}

/// Get emergency contacts
pub async fn get_emergency_contacts_by_id<P: ConnectionProvider>(
    provider: &P,
    ctx: &SerializeContext<'_>,
    osu_id: &str,
) -> Result<Value, DaoError> {
    get_resource_by_id(
        provider,
        ctx,
        osu_id,
        queries::emergency_contacts_by_id,
        &EmergencyContactsSerializer,
        false,
        Vec::new(),
        &QueryParams::default(),
    )
    .await
}
