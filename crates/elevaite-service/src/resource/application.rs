//! Applications, configurations and instances.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use elevaite_core::error::AppError;
use elevaite_database::repositories::{
    ApplicationRepository, ConfigurationRepository, InstanceRepository,
};
use elevaite_entity::application::{
    Application, Configuration, CreateConfiguration, CreateInstance, Instance,
    UpdateConfiguration,
};

/// Type attribute of applications in permission trees.
const APPLICATION_TYPE: &str = "applicationType";

/// Handles application-bound resources.
#[derive(Debug, Clone)]
pub struct ApplicationService {
    applications: Arc<ApplicationRepository>,
    configurations: Arc<ConfigurationRepository>,
    instances: Arc<InstanceRepository>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateConfigurationRequest {
    pub name: String,
    #[serde(default)]
    pub is_template: bool,
    pub raw: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateInstanceRequest {
    pub name: String,
    pub configuration_id: Uuid,
}

impl ApplicationService {
    pub fn new(
        applications: Arc<ApplicationRepository>,
        configurations: Arc<ConfigurationRepository>,
        instances: Arc<InstanceRepository>,
    ) -> Self {
        Self {
            applications,
            configurations,
            instances,
        }
    }

    /// Applications minus the type branches the caller was denied.
    pub async fn list_applications(
        &self,
        denied_types: &BTreeMap<String, Vec<String>>,
    ) -> Result<Vec<Application>, AppError> {
        let excluded = denied_types
            .get(APPLICATION_TYPE)
            .cloned()
            .unwrap_or_default();
        self.applications.find_all_excluding(&excluded).await
    }

    pub async fn list_configurations(
        &self,
        application_id: Uuid,
    ) -> Result<Vec<Configuration>, AppError> {
        self.configurations.find_by_application(application_id).await
    }

    pub async fn create_configuration(
        &self,
        application_id: Uuid,
        req: CreateConfigurationRequest,
    ) -> Result<Configuration, AppError> {
        let configuration = self
            .configurations
            .create(&CreateConfiguration {
                application_id,
                name: req.name,
                is_template: req.is_template,
                raw: req.raw,
            })
            .await?;
        info!(
            configuration_id = %configuration.id,
            application_id = %application_id,
            "Configuration created"
        );
        Ok(configuration)
    }

    pub async fn update_configuration(
        &self,
        application_id: Uuid,
        configuration_id: Uuid,
        data: UpdateConfiguration,
    ) -> Result<Configuration, AppError> {
        let configuration = self
            .configurations
            .update(application_id, configuration_id, &data)
            .await?;
        info!(configuration_id = %configuration_id, "Configuration updated");
        Ok(configuration)
    }

    pub async fn list_instances(
        &self,
        application_id: Uuid,
        project_id: Uuid,
    ) -> Result<Vec<Instance>, AppError> {
        self.instances
            .find_by_application(application_id, project_id)
            .await
    }

    /// Starts an instance of one of the application's configurations.
    pub async fn create_instance(
        &self,
        application_id: Uuid,
        project_id: Uuid,
        req: CreateInstanceRequest,
    ) -> Result<Instance, AppError> {
        self.configuration_of(application_id, req.configuration_id)
            .await?;
        let instance = self
            .instances
            .create(&CreateInstance {
                application_id,
                configuration_id: req.configuration_id,
                project_id,
                name: req.name,
            })
            .await?;
        info!(
            instance_id = %instance.id,
            application_id = %application_id,
            project_id = %project_id,
            "Instance created"
        );
        Ok(instance)
    }

    /// The configuration an instance runs with.
    pub async fn instance_configuration(
        &self,
        instance: &Instance,
    ) -> Result<Configuration, AppError> {
        self.configuration_of(instance.application_id, instance.configuration_id)
            .await
    }

    async fn configuration_of(
        &self,
        application_id: Uuid,
        configuration_id: Uuid,
    ) -> Result<Configuration, AppError> {
        self.configurations
            .find(application_id, configuration_id)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!(
                    "Configuration - '{configuration_id}' - not found"
                ))
            })
    }
}
