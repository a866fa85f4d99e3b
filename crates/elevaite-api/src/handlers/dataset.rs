//! Dataset and collection handlers. Open to access tokens and API keys.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

use elevaite_entity::collection::Collection;
use elevaite_entity::dataset::Dataset;

use crate::dto::request::{NamedResourceRequest, TagDatasetRequest};
use crate::error::ApiResult;
use crate::extractors::ValidJson;
use crate::state::AppState;
use crate::validators::Validated;
use crate::validators::rules;

/// GET /projects/{project_id}/datasets
pub async fn list_datasets(
    State(state): State<AppState>,
    v: Validated<rules::ReadDatasets>,
) -> ApiResult<Json<Vec<Dataset>>> {
    let datasets = state
        .services
        .datasets
        .list_datasets(v.project()?.id)
        .await?;
    Ok(Json(datasets))
}

/// POST /projects/{project_id}/datasets
pub async fn create_dataset(
    State(state): State<AppState>,
    v: Validated<rules::CreateDataset>,
    ValidJson(req): ValidJson<NamedResourceRequest>,
) -> ApiResult<(StatusCode, Json<Dataset>)> {
    let dataset = state
        .services
        .datasets
        .create_dataset(v.project()?.id, &req.name)
        .await?;
    Ok((StatusCode::CREATED, Json(dataset)))
}

/// GET /projects/{project_id}/datasets/{dataset_id}
pub async fn get_dataset(v: Validated<rules::ReadDatasets>) -> ApiResult<Json<Dataset>> {
    Ok(Json(v.dataset()?.clone()))
}

/// POST /projects/{project_id}/datasets/{dataset_id}/tags
pub async fn tag_dataset(
    State(state): State<AppState>,
    v: Validated<rules::TagDataset>,
    ValidJson(req): ValidJson<TagDatasetRequest>,
) -> ApiResult<Json<Dataset>> {
    let dataset = state
        .services
        .datasets
        .tag_dataset(v.dataset()?, &req.tags)
        .await?;
    Ok(Json(dataset))
}

/// GET /projects/{project_id}/collections
pub async fn list_collections(
    State(state): State<AppState>,
    v: Validated<rules::ReadCollections>,
) -> ApiResult<Json<Vec<Collection>>> {
    let collections = state
        .services
        .datasets
        .list_collections(v.project()?.id)
        .await?;
    Ok(Json(collections))
}

/// POST /projects/{project_id}/collections
pub async fn create_collection(
    State(state): State<AppState>,
    v: Validated<rules::CreateCollection>,
    ValidJson(req): ValidJson<NamedResourceRequest>,
) -> ApiResult<(StatusCode, Json<Collection>)> {
    let collection = state
        .services
        .datasets
        .create_collection(v.project()?.id, &req.name)
        .await?;
    Ok((StatusCode::CREATED, Json(collection)))
}
