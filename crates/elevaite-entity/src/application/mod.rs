//! Applications and the configurations and instances created from them.

pub mod configuration;
pub mod instance;
pub mod model;

pub use configuration::{Configuration, CreateConfiguration, UpdateConfiguration};
pub use instance::{CreateInstance, Instance, InstanceStatus};
pub use model::{Application, ApplicationType};
