//! Protected resources: applications with their configurations and
//! instances, datasets and collections.

pub mod application;
pub mod dataset;

pub use application::{ApplicationService, CreateConfigurationRequest, CreateInstanceRequest};
pub use dataset::DatasetService;
