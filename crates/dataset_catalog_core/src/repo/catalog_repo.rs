//! Catalog repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide insert and lookup APIs over the catalog tables.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Write paths validate entities before SQL mutations.
//! - Read paths reject unparseable persisted state instead of masking it.
//! - Image and label listings are ordered by `rel_path ASC`.

use crate::db::DbError;
use crate::model::dataset::{Dataset, DatasetId};
use crate::model::image::{Image, ImageId};
use crate::model::label::Label;
use crate::model::project::{Project, ProjectId};
use crate::model::record_file::RecordFile;
use crate::model::validation::ValidationError;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const DATASET_SELECT_SQL: &str = "SELECT
    uuid,
    project_uuid,
    name,
    date,
    num_training,
    num_test,
    num_validation,
    training_data,
    test_data,
    validation_data
FROM datasets";

const IMAGE_SELECT_SQL: &str = "SELECT
    uuid,
    dataset_uuid,
    rel_path,
    height,
    width,
    channels,
    extension
FROM images";

const LABEL_SELECT_SQL: &str = "SELECT
    uuid,
    image_uuid,
    dataset_uuid,
    rel_path,
    type
FROM labels";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for catalog persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(ValidationError),
    Db(DbError),
    /// A UNIQUE, FOREIGN KEY or CHECK constraint rejected the write.
    ConstraintViolation(String),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::ConstraintViolation(message) => write!(f, "constraint violation: {message}"),
            Self::InvalidData(message) => write!(f, "invalid persisted catalog data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::ConstraintViolation(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(failure, message) = &value {
            if failure.code == ErrorCode::ConstraintViolation {
                return Self::ConstraintViolation(
                    message.clone().unwrap_or_else(|| failure.to_string()),
                );
            }
        }
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for catalog persistence.
pub trait CatalogRepository {
    fn insert_project(&self, project: &Project) -> RepoResult<()>;
    fn find_project_by_name(&self, name: &str) -> RepoResult<Option<Project>>;

    fn insert_dataset(&self, dataset: &Dataset) -> RepoResult<()>;
    fn find_dataset_by_name(&self, name: &str) -> RepoResult<Option<Dataset>>;
    fn list_datasets_for_project(&self, project_id: ProjectId) -> RepoResult<Vec<Dataset>>;
    /// Moves a dataset under another project. Returns `false` when the
    /// dataset does not exist.
    fn reassign_dataset_project(
        &self,
        dataset_id: DatasetId,
        project_id: ProjectId,
    ) -> RepoResult<bool>;

    fn insert_image(&self, image: &Image) -> RepoResult<()>;
    fn find_image_by_path(&self, rel_path: &str) -> RepoResult<Option<Image>>;
    fn list_images_for_dataset(&self, dataset_id: DatasetId) -> RepoResult<Vec<Image>>;

    fn insert_label(&self, label: &Label) -> RepoResult<()>;
    fn find_label_by_path(&self, rel_path: &str) -> RepoResult<Option<Label>>;
    fn list_labels_for_dataset(&self, dataset_id: DatasetId) -> RepoResult<Vec<Label>>;
    fn list_labels_for_image(&self, image_id: ImageId) -> RepoResult<Vec<Label>>;

    fn insert_record_file(&self, record_file: &RecordFile) -> RepoResult<()>;
    fn list_record_files_for_dataset(&self, dataset_id: DatasetId)
        -> RepoResult<Vec<RecordFile>>;
}

/// SQLite-backed catalog repository.
///
/// Borrows a plain connection or, through deref, an open transaction.
pub struct SqliteCatalogRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCatalogRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl CatalogRepository for SqliteCatalogRepository<'_> {
    fn insert_project(&self, project: &Project) -> RepoResult<()> {
        project.validate()?;
        self.conn.execute(
            "INSERT INTO projects (uuid, name) VALUES (?1, ?2);",
            params![project.uuid.to_string(), project.name.as_str()],
        )?;
        Ok(())
    }

    fn find_project_by_name(&self, name: &str) -> RepoResult<Option<Project>> {
        let row = self
            .conn
            .query_row(
                "SELECT uuid, name FROM projects WHERE name = ?1;",
                [name],
                |row| Ok((row.get::<_, String>("uuid")?, row.get::<_, String>("name")?)),
            )
            .optional()?;

        match row {
            Some((uuid_text, name)) => Ok(Some(Project {
                uuid: parse_uuid(&uuid_text, "projects.uuid")?,
                name,
            })),
            None => Ok(None),
        }
    }

    fn insert_dataset(&self, dataset: &Dataset) -> RepoResult<()> {
        dataset.validate()?;
        self.conn.execute(
            "INSERT INTO datasets (
                uuid,
                project_uuid,
                name,
                date,
                num_training,
                num_test,
                num_validation,
                training_data,
                test_data,
                validation_data
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10);",
            params![
                dataset.uuid.to_string(),
                dataset.project_id.to_string(),
                dataset.name.as_str(),
                dataset.date,
                dataset.num_training,
                dataset.num_test,
                dataset.num_validation,
                dataset.training_data_path.as_str(),
                dataset.test_data_path.as_str(),
                dataset.validation_data_path.as_str(),
            ],
        )?;
        Ok(())
    }

    fn find_dataset_by_name(&self, name: &str) -> RepoResult<Option<Dataset>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{DATASET_SELECT_SQL} WHERE name = ?1;"))?;
        let mut rows = stmt.query([name])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_dataset_row(row)?));
        }
        Ok(None)
    }

    fn list_datasets_for_project(&self, project_id: ProjectId) -> RepoResult<Vec<Dataset>> {
        let mut stmt = self.conn.prepare(&format!(
            "{DATASET_SELECT_SQL} WHERE project_uuid = ?1 ORDER BY date ASC, name ASC;"
        ))?;
        let mut rows = stmt.query([project_id.to_string()])?;
        let mut datasets = Vec::new();
        while let Some(row) = rows.next()? {
            datasets.push(parse_dataset_row(row)?);
        }
        Ok(datasets)
    }

    fn reassign_dataset_project(
        &self,
        dataset_id: DatasetId,
        project_id: ProjectId,
    ) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "UPDATE datasets SET project_uuid = ?1 WHERE uuid = ?2;",
            params![project_id.to_string(), dataset_id.to_string()],
        )?;
        Ok(changed > 0)
    }

    fn insert_image(&self, image: &Image) -> RepoResult<()> {
        image.validate()?;
        self.conn.execute(
            "INSERT INTO images (
                uuid,
                dataset_uuid,
                rel_path,
                height,
                width,
                channels,
                extension
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                image.uuid.to_string(),
                image.dataset_id.to_string(),
                image.rel_path.as_str(),
                image.height,
                image.width,
                image.channels,
                image.extension.as_str(),
            ],
        )?;
        Ok(())
    }

    fn find_image_by_path(&self, rel_path: &str) -> RepoResult<Option<Image>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{IMAGE_SELECT_SQL} WHERE rel_path = ?1;"))?;
        let mut rows = stmt.query([rel_path])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_image_row(row)?));
        }
        Ok(None)
    }

    fn list_images_for_dataset(&self, dataset_id: DatasetId) -> RepoResult<Vec<Image>> {
        let mut stmt = self.conn.prepare(&format!(
            "{IMAGE_SELECT_SQL} WHERE dataset_uuid = ?1 ORDER BY rel_path ASC;"
        ))?;
        let mut rows = stmt.query([dataset_id.to_string()])?;
        let mut images = Vec::new();
        while let Some(row) = rows.next()? {
            images.push(parse_image_row(row)?);
        }
        Ok(images)
    }

    fn insert_label(&self, label: &Label) -> RepoResult<()> {
        label.validate()?;
        self.conn.execute(
            "INSERT INTO labels (
                uuid,
                image_uuid,
                dataset_uuid,
                rel_path,
                type
            ) VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                label.uuid.to_string(),
                label.image_id.to_string(),
                label.dataset_id.to_string(),
                label.rel_path.as_str(),
                label.kind.as_str(),
            ],
        )?;
        Ok(())
    }

    fn find_label_by_path(&self, rel_path: &str) -> RepoResult<Option<Label>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{LABEL_SELECT_SQL} WHERE rel_path = ?1;"))?;
        let mut rows = stmt.query([rel_path])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_label_row(row)?));
        }
        Ok(None)
    }

    fn list_labels_for_dataset(&self, dataset_id: DatasetId) -> RepoResult<Vec<Label>> {
        self.list_labels_where("dataset_uuid", dataset_id)
    }

    fn list_labels_for_image(&self, image_id: ImageId) -> RepoResult<Vec<Label>> {
        self.list_labels_where("image_uuid", image_id)
    }

    fn insert_record_file(&self, record_file: &RecordFile) -> RepoResult<()> {
        record_file.validate()?;
        self.conn.execute(
            "INSERT INTO record_files (uuid, dataset_uuid, name, date)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                record_file.uuid.to_string(),
                record_file.dataset_id.to_string(),
                record_file.name.as_str(),
                record_file.date,
            ],
        )?;
        Ok(())
    }

    fn list_record_files_for_dataset(
        &self,
        dataset_id: DatasetId,
    ) -> RepoResult<Vec<RecordFile>> {
        let mut stmt = self.conn.prepare(
            "SELECT uuid, dataset_uuid, name, date
             FROM record_files
             WHERE dataset_uuid = ?1
             ORDER BY date ASC, name ASC;",
        )?;
        let mut rows = stmt.query([dataset_id.to_string()])?;
        let mut record_files = Vec::new();
        while let Some(row) = rows.next()? {
            let uuid_text: String = row.get("uuid")?;
            let dataset_text: String = row.get("dataset_uuid")?;
            record_files.push(RecordFile {
                uuid: parse_uuid(&uuid_text, "record_files.uuid")?,
                dataset_id: parse_uuid(&dataset_text, "record_files.dataset_uuid")?,
                name: row.get("name")?,
                date: row.get("date")?,
            });
        }
        Ok(record_files)
    }
}

impl SqliteCatalogRepository<'_> {
    // `column` is always a literal owned by this module.
    fn list_labels_where(&self, column: &'static str, id: Uuid) -> RepoResult<Vec<Label>> {
        let mut stmt = self.conn.prepare(&format!(
            "{LABEL_SELECT_SQL} WHERE {column} = ?1 ORDER BY rel_path ASC;"
        ))?;
        let mut rows = stmt.query([id.to_string()])?;
        let mut labels = Vec::new();
        while let Some(row) = rows.next()? {
            labels.push(parse_label_row(row)?);
        }
        Ok(labels)
    }
}

fn parse_dataset_row(row: &Row<'_>) -> RepoResult<Dataset> {
    let uuid_text: String = row.get("uuid")?;
    let project_text: String = row.get("project_uuid")?;
    Ok(Dataset {
        uuid: parse_uuid(&uuid_text, "datasets.uuid")?,
        project_id: parse_uuid(&project_text, "datasets.project_uuid")?,
        name: row.get("name")?,
        date: row.get("date")?,
        num_training: row.get("num_training")?,
        num_test: row.get("num_test")?,
        num_validation: row.get("num_validation")?,
        training_data_path: row.get("training_data")?,
        test_data_path: row.get("test_data")?,
        validation_data_path: row.get("validation_data")?,
    })
}

fn parse_image_row(row: &Row<'_>) -> RepoResult<Image> {
    let uuid_text: String = row.get("uuid")?;
    let dataset_text: String = row.get("dataset_uuid")?;
    let image = Image {
        uuid: parse_uuid(&uuid_text, "images.uuid")?,
        dataset_id: parse_uuid(&dataset_text, "images.dataset_uuid")?,
        rel_path: row.get("rel_path")?,
        height: row.get("height")?,
        width: row.get("width")?,
        channels: row.get("channels")?,
        extension: row.get("extension")?,
    };
    image
        .validate()
        .map_err(|err| RepoError::InvalidData(err.to_string()))?;
    Ok(image)
}

fn parse_label_row(row: &Row<'_>) -> RepoResult<Label> {
    let uuid_text: String = row.get("uuid")?;
    let image_text: String = row.get("image_uuid")?;
    let dataset_text: String = row.get("dataset_uuid")?;
    Ok(Label {
        uuid: parse_uuid(&uuid_text, "labels.uuid")?,
        image_id: parse_uuid(&image_text, "labels.image_uuid")?,
        dataset_id: parse_uuid(&dataset_text, "labels.dataset_uuid")?,
        rel_path: row.get("rel_path")?,
        kind: row.get("type")?,
    })
}

fn parse_uuid(value: &str, column: &'static str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{value}` in {column}")))
}
