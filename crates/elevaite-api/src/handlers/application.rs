//! Application, configuration and instance handlers.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

use elevaite_entity::application::{Application, Configuration, Instance, UpdateConfiguration};

use crate::dto::request::{
    CreateConfigurationRequest, CreateInstanceRequest, UpdateConfigurationRequest,
};
use crate::error::ApiResult;
use crate::extractors::ValidJson;
use crate::state::AppState;
use crate::validators::Validated;
use crate::validators::rules;

/// GET /application
///
/// Application types the caller was denied are left out.
pub async fn list_applications(
    State(state): State<AppState>,
    v: Validated<rules::ReadApplications>,
) -> ApiResult<Json<Vec<Application>>> {
    let applications = state
        .services
        .applications
        .list_applications(&v.info.denied_type_values())
        .await?;
    Ok(Json(applications))
}

/// GET /application/{application_id}
pub async fn get_application(
    v: Validated<rules::ReadApplications>,
) -> ApiResult<Json<Application>> {
    Ok(Json(v.application()?.clone()))
}

/// GET /application/{application_id}/configuration
pub async fn list_configurations(
    State(state): State<AppState>,
    v: Validated<rules::ReadConfigurations>,
) -> ApiResult<Json<Vec<Configuration>>> {
    let configurations = state
        .services
        .applications
        .list_configurations(v.application()?.id)
        .await?;
    Ok(Json(configurations))
}

/// POST /application/{application_id}/configuration
pub async fn create_configuration(
    State(state): State<AppState>,
    v: Validated<rules::CreateConfiguration>,
    ValidJson(req): ValidJson<CreateConfigurationRequest>,
) -> ApiResult<(StatusCode, Json<Configuration>)> {
    let configuration = state
        .services
        .applications
        .create_configuration(
            v.application()?.id,
            elevaite_service::CreateConfigurationRequest {
                name: req.name,
                is_template: req.is_template,
                raw: req.raw,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(configuration)))
}

/// GET /application/{application_id}/configuration/{configuration_id}
pub async fn get_configuration(
    v: Validated<rules::ReadConfigurations>,
) -> ApiResult<Json<Configuration>> {
    Ok(Json(v.configuration()?.clone()))
}

/// PUT /application/{application_id}/configuration/{configuration_id}
pub async fn update_configuration(
    State(state): State<AppState>,
    v: Validated<rules::UpdateConfiguration>,
    ValidJson(req): ValidJson<UpdateConfigurationRequest>,
) -> ApiResult<Json<Configuration>> {
    let configuration = v.configuration()?;
    let updated = state
        .services
        .applications
        .update_configuration(
            configuration.application_id,
            configuration.id,
            UpdateConfiguration {
                name: req.name,
                is_template: req.is_template,
                raw: req.raw,
            },
        )
        .await?;
    Ok(Json(updated))
}

/// GET /application/{application_id}/instance
pub async fn list_instances(
    State(state): State<AppState>,
    v: Validated<rules::ReadInstances>,
) -> ApiResult<Json<Vec<Instance>>> {
    let instances = state
        .services
        .applications
        .list_instances(v.application()?.id, v.project()?.id)
        .await?;
    Ok(Json(instances))
}

/// POST /application/{application_id}/instance
pub async fn create_instance(
    State(state): State<AppState>,
    v: Validated<rules::CreateInstance>,
    ValidJson(req): ValidJson<CreateInstanceRequest>,
) -> ApiResult<(StatusCode, Json<Instance>)> {
    let instance = state
        .services
        .applications
        .create_instance(
            v.application()?.id,
            v.project()?.id,
            elevaite_service::CreateInstanceRequest {
                name: req.name,
                configuration_id: req.configuration_id,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(instance)))
}

/// GET /application/{application_id}/instance/{instance_id}/configuration
pub async fn get_instance_configuration(
    State(state): State<AppState>,
    v: Validated<rules::ReadInstanceConfiguration>,
) -> ApiResult<Json<Configuration>> {
    let configuration = state
        .services
        .applications
        .instance_configuration(v.instance()?)
        .await?;
    Ok(Json(configuration))
}
