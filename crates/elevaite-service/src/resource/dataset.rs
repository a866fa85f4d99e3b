//! Datasets and collections of a project.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use elevaite_core::error::AppError;
use elevaite_database::repositories::{CollectionRepository, DatasetRepository};
use elevaite_entity::collection::Collection;
use elevaite_entity::dataset::Dataset;

/// Handles project-bound data resources.
#[derive(Debug, Clone)]
pub struct DatasetService {
    datasets: Arc<DatasetRepository>,
    collections: Arc<CollectionRepository>,
}

impl DatasetService {
    pub fn new(datasets: Arc<DatasetRepository>, collections: Arc<CollectionRepository>) -> Self {
        Self {
            datasets,
            collections,
        }
    }

    pub async fn list_datasets(&self, project_id: Uuid) -> Result<Vec<Dataset>, AppError> {
        self.datasets.find_by_project(project_id).await
    }

    pub async fn create_dataset(&self, project_id: Uuid, name: &str) -> Result<Dataset, AppError> {
        let dataset = self.datasets.create(project_id, name).await?;
        info!(dataset_id = %dataset.id, project_id = %project_id, "Dataset created");
        Ok(dataset)
    }

    /// Adds tags to a dataset; tags already present are kept once.
    pub async fn tag_dataset(
        &self,
        dataset: &Dataset,
        tags: &[String],
    ) -> Result<Dataset, AppError> {
        let tags: Vec<String> = tags
            .iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        if tags.is_empty() {
            return Err(AppError::validation("At least one non-empty tag must be provided"));
        }
        let tagged = self
            .datasets
            .add_tags(dataset.project_id, dataset.id, &tags)
            .await?;
        info!(dataset_id = %dataset.id, count = tags.len(), "Dataset tagged");
        Ok(tagged)
    }

    pub async fn list_collections(&self, project_id: Uuid) -> Result<Vec<Collection>, AppError> {
        self.collections.find_by_project(project_id).await
    }

    pub async fn create_collection(
        &self,
        project_id: Uuid,
        name: &str,
    ) -> Result<Collection, AppError> {
        let collection = self.collections.create(project_id, name).await?;
        info!(collection_id = %collection.id, project_id = %project_id, "Collection created");
        Ok(collection)
    }
}
