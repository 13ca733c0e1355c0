//! Catalog use-case service.
//!
//! # Responsibility
//! - Create projects, datasets, images, labels and record files.
//! - Resolve name/path references to stored entities.
//!
//! # Invariants
//! - Every public write runs in exactly one unit of work: it commits fully
//!   or leaves the catalog untouched.
//! - A dataset's project is looked up by name and created when missing.
//! - Images and labels never auto-create their dataset or image.
//! - Bulk label import pairs labels with images by position after sorting
//!   both sides by relative path. It is not a filename join.

use crate::db::with_unit_of_work;
use crate::inspect::image_inspector::{ImageInspector, InspectError};
use crate::logging::sanitize_message;
use crate::model::dataset::{Dataset, DatasetId};
use crate::model::image::{Image, ImageId};
use crate::model::label::Label;
use crate::model::now_epoch_ms;
use crate::model::project::Project;
use crate::model::record_file::RecordFile;
use crate::model::validation::ValidationError;
use crate::repo::catalog_repo::{CatalogRepository, RepoError, SqliteCatalogRepository};
use log::{error, info};
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;
use uuid::Uuid;

const MAX_LOGGED_ERROR_CHARS: usize = 200;

pub type CatalogResult<T> = Result<T, CatalogError>;

/// Errors from catalog service operations.
#[derive(Debug)]
pub enum CatalogError {
    /// No dataset with this name exists.
    DatasetNotFound(String),
    /// No image with this relative path exists.
    ImageNotFound(String),
    /// Bulk label import got a different number of labels and images.
    CountMismatch { label_paths: usize, images: usize },
    /// Per-image dimensions do not line up with the image paths.
    DimensionCountMismatch { paths: usize, dimensions: usize },
    /// Explicit label dataset differs from the image's own dataset.
    DatasetMismatch {
        image_rel_path: String,
        image_dataset: DatasetId,
        requested_dataset: DatasetId,
    },
    /// Storage rejected the write, e.g. a duplicate unique path or name.
    ConstraintViolation(String),
    Validation(ValidationError),
    Inspect(InspectError),
    Repo(RepoError),
}

impl Display for CatalogError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DatasetNotFound(name) => write!(f, "dataset not found: `{name}`"),
            Self::ImageNotFound(rel_path) => write!(f, "image not found: `{rel_path}`"),
            Self::CountMismatch {
                label_paths,
                images,
            } => write!(
                f,
                "label count {label_paths} does not match image count {images}"
            ),
            Self::DimensionCountMismatch { paths, dimensions } => write!(
                f,
                "got {dimensions} dimension entries for {paths} image paths"
            ),
            Self::DatasetMismatch {
                image_rel_path,
                image_dataset,
                requested_dataset,
            } => write!(
                f,
                "image `{image_rel_path}` belongs to dataset {image_dataset}, not {requested_dataset}"
            ),
            Self::ConstraintViolation(message) => write!(f, "constraint violation: {message}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::Inspect(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CatalogError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Inspect(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl CatalogError {
    fn code(&self) -> &'static str {
        match self {
            Self::DatasetNotFound(_) | Self::ImageNotFound(_) => "not_found",
            Self::CountMismatch { .. } | Self::DimensionCountMismatch { .. } => "count_mismatch",
            Self::DatasetMismatch { .. } => "dataset_mismatch",
            Self::ConstraintViolation(_) => "constraint_violation",
            Self::Validation(_) => "validation_failed",
            Self::Inspect(_) => "inspect_failed",
            Self::Repo(_) => "storage_failed",
        }
    }
}

impl From<RepoError> for CatalogError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::ConstraintViolation(message) => Self::ConstraintViolation(message),
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}

impl From<rusqlite::Error> for CatalogError {
    fn from(value: rusqlite::Error) -> Self {
        Self::from(RepoError::from(value))
    }
}

impl From<InspectError> for CatalogError {
    fn from(value: InspectError) -> Self {
        Self::Inspect(value)
    }
}

/// A dataset given either as a stored entity or by its unique name.
#[derive(Debug, Clone, Copy)]
pub enum DatasetRef<'a> {
    Handle(&'a Dataset),
    Name(&'a str),
}

impl<'a> From<&'a Dataset> for DatasetRef<'a> {
    fn from(value: &'a Dataset) -> Self {
        Self::Handle(value)
    }
}

impl<'a> From<&'a str> for DatasetRef<'a> {
    fn from(value: &'a str) -> Self {
        Self::Name(value)
    }
}

/// An image given either as a stored entity or by its relative path.
#[derive(Debug, Clone, Copy)]
pub enum ImageRef<'a> {
    Handle(&'a Image),
    Path(&'a str),
}

impl<'a> From<&'a Image> for ImageRef<'a> {
    fn from(value: &'a Image) -> Self {
        Self::Handle(value)
    }
}

impl<'a> From<&'a str> for ImageRef<'a> {
    fn from(value: &'a str) -> Self {
        Self::Path(value)
    }
}

/// Explicit pairing targets for bulk label import.
#[derive(Debug, Clone, Copy)]
pub enum ImageSelection<'a> {
    /// Relative paths of images that must already be stored.
    Paths(&'a [String]),
    /// Stored image entities.
    Images(&'a [Image]),
}

/// Input for [`CatalogService::add_dataset`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDataset {
    pub name: String,
    /// Epoch milliseconds; `None` stamps the current time.
    pub date: Option<i64>,
    /// Project to attach to. Created when no project has this name.
    pub project_name: String,
    pub num_training: u32,
    pub num_test: u32,
    pub num_validation: u32,
    pub training_data_path: String,
    pub test_data_path: String,
    pub validation_data_path: String,
}

/// Catalog facade over one SQLite connection and an image inspector.
pub struct CatalogService<'conn, I: ImageInspector> {
    conn: &'conn mut Connection,
    inspector: I,
}

impl<'conn, I: ImageInspector> CatalogService<'conn, I> {
    pub fn new(conn: &'conn mut Connection, inspector: I) -> Self {
        Self { conn, inspector }
    }

    /// Creates a project and re-parents `datasets` under it.
    ///
    /// Duplicate names are rejected by storage as `ConstraintViolation`.
    pub fn add_project(&mut self, name: &str, datasets: &[Dataset]) -> CatalogResult<Project> {
        let started_at = Instant::now();
        let result = with_unit_of_work(self.conn, |tx| -> CatalogResult<Project> {
            let repo = SqliteCatalogRepository::new(tx);
            let project = create_project(&repo, name)?;
            for dataset in datasets {
                if !repo.reassign_dataset_project(dataset.uuid, project.uuid)? {
                    return Err(CatalogError::DatasetNotFound(dataset.name.clone()));
                }
            }
            Ok(project)
        });
        log_outcome("project_create", started_at, &result);
        result
    }

    /// Creates a dataset, creating its project first when missing.
    pub fn add_dataset(&mut self, request: &NewDataset) -> CatalogResult<Dataset> {
        let started_at = Instant::now();
        let result = with_unit_of_work(self.conn, |tx| {
            create_dataset(&SqliteCatalogRepository::new(tx), request)
        });
        log_outcome("dataset_create", started_at, &result);
        result
    }

    /// Catalogs images under an existing dataset, in input order.
    ///
    /// `channels` applies to every image. `dimensions` holds one
    /// `(width, height)` per path. Missing values are read by the inspector.
    pub fn add_images<S: AsRef<str>>(
        &mut self,
        rel_paths: &[S],
        dataset: DatasetRef<'_>,
        channels: Option<u32>,
        dimensions: Option<&[(u32, u32)]>,
    ) -> CatalogResult<Vec<Image>> {
        let started_at = Instant::now();
        let inspector = &self.inspector;
        let result = with_unit_of_work(self.conn, |tx| {
            create_images(
                &SqliteCatalogRepository::new(tx),
                inspector,
                rel_paths,
                dataset,
                channels,
                dimensions,
            )
        });
        log_outcome("images_create", started_at, &result);
        result
    }

    /// Attaches one label to an existing image.
    ///
    /// `dataset` defaults to the image's dataset; when given it must match.
    pub fn add_label(
        &mut self,
        label_path: &str,
        image: ImageRef<'_>,
        label_type: &str,
        dataset: Option<&Dataset>,
    ) -> CatalogResult<Label> {
        let started_at = Instant::now();
        let result = with_unit_of_work(self.conn, |tx| {
            create_label(
                &SqliteCatalogRepository::new(tx),
                label_path,
                image,
                label_type,
                dataset,
            )
        });
        log_outcome("label_create", started_at, &result);
        result
    }

    /// Attaches one label per image of a dataset.
    ///
    /// Label paths and images are each sorted by relative path, then paired
    /// by position: the n-th smallest label path goes to the n-th smallest
    /// image path. With `images = None` every image of the dataset is a
    /// target. Counts must match exactly or nothing is written.
    pub fn add_labels<S: AsRef<str>>(
        &mut self,
        label_paths: &[S],
        dataset: DatasetRef<'_>,
        label_type: &str,
        images: Option<ImageSelection<'_>>,
    ) -> CatalogResult<Vec<Label>> {
        let started_at = Instant::now();
        let result = with_unit_of_work(self.conn, |tx| {
            create_labels(
                &SqliteCatalogRepository::new(tx),
                label_paths,
                dataset,
                label_type,
                images,
            )
        });
        log_outcome("labels_create", started_at, &result);
        result
    }

    /// Registers a generated record file for an existing dataset.
    pub fn add_record_file(
        &mut self,
        name: &str,
        date: Option<i64>,
        dataset: DatasetRef<'_>,
    ) -> CatalogResult<RecordFile> {
        let started_at = Instant::now();
        let result = with_unit_of_work(self.conn, |tx| -> CatalogResult<RecordFile> {
            let repo = SqliteCatalogRepository::new(tx);
            let dataset = resolve_dataset(&repo, dataset)?;
            let record_file =
                RecordFile::new(dataset.uuid, name, date.unwrap_or_else(now_epoch_ms));
            repo.insert_record_file(&record_file)?;
            Ok(record_file)
        });
        log_outcome("record_file_create", started_at, &result);
        result
    }

    pub fn get_project(&self, name: &str) -> CatalogResult<Option<Project>> {
        Ok(self.repo().find_project_by_name(name)?)
    }

    pub fn get_dataset(&self, name: &str) -> CatalogResult<Option<Dataset>> {
        Ok(self.repo().find_dataset_by_name(name)?)
    }

    pub fn get_image(&self, rel_path: &str) -> CatalogResult<Option<Image>> {
        Ok(self.repo().find_image_by_path(rel_path)?)
    }

    pub fn get_label(&self, rel_path: &str) -> CatalogResult<Option<Label>> {
        Ok(self.repo().find_label_by_path(rel_path)?)
    }

    pub fn list_datasets(&self, project: &Project) -> CatalogResult<Vec<Dataset>> {
        Ok(self.repo().list_datasets_for_project(project.uuid)?)
    }

    /// Images of a dataset, sorted by relative path.
    pub fn list_images(&self, dataset: DatasetRef<'_>) -> CatalogResult<Vec<Image>> {
        let repo = self.repo();
        let dataset = resolve_dataset(&repo, dataset)?;
        Ok(repo.list_images_for_dataset(dataset.uuid)?)
    }

    /// Labels of a dataset, sorted by relative path.
    pub fn list_labels(&self, dataset: DatasetRef<'_>) -> CatalogResult<Vec<Label>> {
        let repo = self.repo();
        let dataset = resolve_dataset(&repo, dataset)?;
        Ok(repo.list_labels_for_dataset(dataset.uuid)?)
    }

    pub fn list_image_labels(&self, image_id: ImageId) -> CatalogResult<Vec<Label>> {
        Ok(self.repo().list_labels_for_image(image_id)?)
    }

    pub fn list_record_files(&self, dataset: DatasetRef<'_>) -> CatalogResult<Vec<RecordFile>> {
        let repo = self.repo();
        let dataset = resolve_dataset(&repo, dataset)?;
        Ok(repo.list_record_files_for_dataset(dataset.uuid)?)
    }

    fn repo(&self) -> SqliteCatalogRepository<'_> {
        SqliteCatalogRepository::new(&*self.conn)
    }
}

/// Inserts a new project. Does not check for an existing one.
pub fn create_project<R: CatalogRepository>(repo: &R, name: &str) -> CatalogResult<Project> {
    let project = Project::new(name);
    repo.insert_project(&project)?;
    Ok(project)
}

/// Inserts a dataset, looking up or creating its project by name.
pub fn create_dataset<R: CatalogRepository>(
    repo: &R,
    request: &NewDataset,
) -> CatalogResult<Dataset> {
    let project = match repo.find_project_by_name(&request.project_name)? {
        Some(project) => project,
        None => {
            info!("event=project_autocreate module=catalog status=ok");
            create_project(repo, &request.project_name)?
        }
    };

    let dataset = Dataset {
        uuid: Uuid::new_v4(),
        project_id: project.uuid,
        name: request.name.clone(),
        date: request.date.unwrap_or_else(now_epoch_ms),
        num_training: request.num_training,
        num_test: request.num_test,
        num_validation: request.num_validation,
        training_data_path: request.training_data_path.clone(),
        test_data_path: request.test_data_path.clone(),
        validation_data_path: request.validation_data_path.clone(),
    };
    repo.insert_dataset(&dataset)?;
    Ok(dataset)
}

/// Inserts one image per path, inspecting files only for missing values.
pub fn create_images<R, I, S>(
    repo: &R,
    inspector: &I,
    rel_paths: &[S],
    dataset: DatasetRef<'_>,
    channels: Option<u32>,
    dimensions: Option<&[(u32, u32)]>,
) -> CatalogResult<Vec<Image>>
where
    R: CatalogRepository,
    I: ImageInspector,
    S: AsRef<str>,
{
    let dataset = resolve_dataset(repo, dataset)?;
    if let Some(dimensions) = dimensions {
        if dimensions.len() != rel_paths.len() {
            return Err(CatalogError::DimensionCountMismatch {
                paths: rel_paths.len(),
                dimensions: dimensions.len(),
            });
        }
    }

    let mut images = Vec::with_capacity(rel_paths.len());
    for (index, rel_path) in rel_paths.iter().enumerate() {
        let rel_path = rel_path.as_ref();
        let given_size = dimensions.map(|dimensions| dimensions[index]);
        let (width, height, channels) = match (given_size, channels) {
            (Some((width, height)), Some(channels)) => (width, height, channels),
            _ => {
                let shape = inspector.inspect(rel_path)?;
                let (width, height) = given_size.unwrap_or((shape.width, shape.height));
                (width, height, channels.unwrap_or(shape.channels))
            }
        };

        let image = Image::new(dataset.uuid, rel_path, width, height, channels);
        repo.insert_image(&image)?;
        images.push(image);
    }
    Ok(images)
}

/// Inserts one label for an existing image.
pub fn create_label<R: CatalogRepository>(
    repo: &R,
    label_path: &str,
    image: ImageRef<'_>,
    label_type: &str,
    dataset: Option<&Dataset>,
) -> CatalogResult<Label> {
    let image = resolve_image(repo, image)?;
    let dataset_id = match dataset {
        Some(dataset) if dataset.uuid != image.dataset_id => {
            return Err(CatalogError::DatasetMismatch {
                image_rel_path: image.rel_path,
                image_dataset: image.dataset_id,
                requested_dataset: dataset.uuid,
            });
        }
        Some(dataset) => dataset.uuid,
        None => image.dataset_id,
    };

    let label = Label::new(image.uuid, dataset_id, label_path, label_type);
    repo.insert_label(&label)?;
    Ok(label)
}

/// Inserts labels paired by sorted position with the target images.
pub fn create_labels<R, S>(
    repo: &R,
    label_paths: &[S],
    dataset: DatasetRef<'_>,
    label_type: &str,
    images: Option<ImageSelection<'_>>,
) -> CatalogResult<Vec<Label>>
where
    R: CatalogRepository,
    S: AsRef<str>,
{
    let dataset = resolve_dataset(repo, dataset)?;
    let mut targets = match images {
        None => repo.list_images_for_dataset(dataset.uuid)?,
        Some(ImageSelection::Paths(paths)) => {
            let mut paths: Vec<&str> = paths.iter().map(String::as_str).collect();
            paths.sort_unstable();
            paths
                .into_iter()
                .map(|path| resolve_image(repo, ImageRef::Path(path)))
                .collect::<CatalogResult<Vec<_>>>()?
        }
        Some(ImageSelection::Images(images)) => images
            .iter()
            .map(|image| resolve_image(repo, ImageRef::Handle(image)))
            .collect::<CatalogResult<Vec<_>>>()?,
    };
    targets.sort_by(|left, right| left.rel_path.cmp(&right.rel_path));

    let mut label_paths: Vec<&str> = label_paths.iter().map(|path| path.as_ref()).collect();
    label_paths.sort_unstable();

    if label_paths.len() != targets.len() {
        return Err(CatalogError::CountMismatch {
            label_paths: label_paths.len(),
            images: targets.len(),
        });
    }

    label_paths
        .into_iter()
        .zip(&targets)
        .map(|(label_path, image)| {
            create_label(
                repo,
                label_path,
                ImageRef::Handle(image),
                label_type,
                Some(&dataset),
            )
        })
        .collect()
}

/// Loads the stored dataset. A handle whose row is gone or was replaced
/// under the same name is not found.
fn resolve_dataset<R: CatalogRepository>(
    repo: &R,
    dataset: DatasetRef<'_>,
) -> CatalogResult<Dataset> {
    let (name, expected_id) = match dataset {
        DatasetRef::Handle(dataset) => (dataset.name.as_str(), Some(dataset.uuid)),
        DatasetRef::Name(name) => (name, None),
    };
    repo.find_dataset_by_name(name)?
        .filter(|stored| expected_id.map_or(true, |id| stored.uuid == id))
        .ok_or_else(|| CatalogError::DatasetNotFound(name.to_string()))
}

/// Loads the stored image, with the same handle rule as [`resolve_dataset`].
fn resolve_image<R: CatalogRepository>(repo: &R, image: ImageRef<'_>) -> CatalogResult<Image> {
    let (rel_path, expected_id) = match image {
        ImageRef::Handle(image) => (image.rel_path.as_str(), Some(image.uuid)),
        ImageRef::Path(rel_path) => (rel_path, None),
    };
    repo.find_image_by_path(rel_path)?
        .filter(|stored| expected_id.map_or(true, |id| stored.uuid == id))
        .ok_or_else(|| CatalogError::ImageNotFound(rel_path.to_string()))
}

fn log_outcome<T>(event: &str, started_at: Instant, result: &CatalogResult<T>) {
    let duration_ms = started_at.elapsed().as_millis();
    match result {
        Ok(_) => info!("event={event} module=catalog status=ok duration_ms={duration_ms}"),
        Err(err) => error!(
            "event={event} module=catalog status=error duration_ms={duration_ms} error_code={} error={}",
            err.code(),
            sanitize_message(&err.to_string(), MAX_LOGGED_ERROR_CHARS)
        ),
    }
}
