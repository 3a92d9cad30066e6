use axum::{extract::Path, Json};
use serde_json::Value;

use crate::api::jsonapi::default_context;
use crate::dao::students;
use crate::database::connection::PgConnectionProvider;
use crate::error::ApiError;

use super::validate_osu_id;

/// GET /api/v1/students/:osu_id/work-study
pub async fn get(Path(osu_id): Path<String>) -> Result<Json<Value>, ApiError> {
    validate_osu_id(&osu_id)?;

    let provider = PgConnectionProvider::from_manager().await?;
    let ctx = default_context();
    let document = students::get_work_study_by_id(&provider, &ctx, &osu_id).await?;
    Ok(Json(document))
}
