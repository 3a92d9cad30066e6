use axum::{
    extract::{Path, Query},
    Json,
};
use serde_json::Value;

use crate::api::jsonapi::default_context;
use crate::dao::students;
use crate::database::connection::PgConnectionProvider;
use crate::error::ApiError;
use crate::types::QueryParams;

use super::{validate_osu_id, validate_term};

/// GET /api/v1/students/:osu_id/account-transactions
pub async fn get(
    Path(osu_id): Path<String>,
    Query(params): Query<QueryParams>,
) -> Result<Json<Value>, ApiError> {
    validate_osu_id(&osu_id)?;
    validate_term(&params)?;

    let provider = PgConnectionProvider::from_manager().await?;
    let ctx = default_context();
    let document = students::get_account_transactions_by_id(&provider, &ctx, &osu_id, &params).await?;
    Ok(Json(document))
}
