//! Dataset catalog core: projects, datasets, images, labels and generated
//! record files stored in SQLite.
//! This crate is the single source of truth for catalog invariants.

pub mod config;
pub mod db;
pub mod inspect;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{CatalogConfig, ConfigError};
pub use inspect::image_inspector::{
    FsImageInspector, ImageInspector, ImageShape, InspectError, InspectResult,
};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::dataset::{Dataset, DatasetId};
pub use model::image::{Image, ImageId};
pub use model::label::{Label, LabelId};
pub use model::project::{Project, ProjectId};
pub use model::record_file::{RecordFile, RecordFileId};
pub use model::validation::ValidationError;
pub use repo::catalog_repo::{CatalogRepository, RepoError, RepoResult, SqliteCatalogRepository};
pub use service::catalog_service::{
    CatalogError, CatalogResult, CatalogService, DatasetRef, ImageRef, ImageSelection, NewDataset,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
