use dataset_catalog_core::db::open_db_in_memory;
use dataset_catalog_core::{
    CatalogRepository, Dataset, Image, Label, Project, RecordFile, RepoError,
    SqliteCatalogRepository,
};
use rusqlite::Connection;
use uuid::Uuid;

fn insert_dataset(repo: &SqliteCatalogRepository<'_>, name: &str) -> Dataset {
    let project = Project::new(format!("{name}-project"));
    repo.insert_project(&project).unwrap();
    let dataset = Dataset {
        uuid: Uuid::new_v4(),
        project_id: project.uuid,
        name: name.to_string(),
        date: 1_700_000_000_000,
        num_training: 80,
        num_test: 10,
        num_validation: 10,
        training_data_path: format!("{name}/train.tfrecords"),
        test_data_path: format!("{name}/test.tfrecords"),
        validation_data_path: format!("{name}/val.tfrecords"),
    };
    repo.insert_dataset(&dataset).unwrap();
    dataset
}

#[test]
fn project_insert_and_find_by_name() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCatalogRepository::new(&conn);

    let project = Project::new("indoor");
    repo.insert_project(&project).unwrap();

    assert_eq!(repo.find_project_by_name("indoor").unwrap(), Some(project));
    assert_eq!(repo.find_project_by_name("outdoor").unwrap(), None);
}

#[test]
fn duplicate_project_name_is_constraint_violation() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCatalogRepository::new(&conn);

    repo.insert_project(&Project::new("indoor")).unwrap();
    let err = repo.insert_project(&Project::new("indoor")).unwrap_err();
    assert!(matches!(err, RepoError::ConstraintViolation(_)));
}

#[test]
fn dataset_with_unknown_project_is_constraint_violation() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCatalogRepository::new(&conn);

    let orphan = Dataset {
        uuid: Uuid::new_v4(),
        project_id: Uuid::new_v4(),
        name: "orphan".to_string(),
        date: 0,
        num_training: 0,
        num_test: 0,
        num_validation: 0,
        training_data_path: "t".to_string(),
        test_data_path: "t".to_string(),
        validation_data_path: "v".to_string(),
    };
    let err = repo.insert_dataset(&orphan).unwrap_err();
    assert!(matches!(err, RepoError::ConstraintViolation(_)));
}

#[test]
fn validation_runs_before_sql() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCatalogRepository::new(&conn);
    let dataset = insert_dataset(&repo, "nyu");

    let invalid = Image::new(dataset.uuid, "nyu/0001.png", 0, 480, 3);
    let err = repo.insert_image(&invalid).unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));
    assert_eq!(repo.find_image_by_path("nyu/0001.png").unwrap(), None);
}

#[test]
fn images_are_listed_by_relative_path() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCatalogRepository::new(&conn);
    let dataset = insert_dataset(&repo, "nyu");
    let other = insert_dataset(&repo, "kitti");

    for path in ["nyu/c.png", "nyu/a.png", "nyu/b.png"] {
        repo.insert_image(&Image::new(dataset.uuid, path, 4, 2, 3))
            .unwrap();
    }
    repo.insert_image(&Image::new(other.uuid, "kitti/a.png", 4, 2, 3))
        .unwrap();

    let paths: Vec<String> = repo
        .list_images_for_dataset(dataset.uuid)
        .unwrap()
        .into_iter()
        .map(|image| image.rel_path)
        .collect();
    assert_eq!(paths, ["nyu/a.png", "nyu/b.png", "nyu/c.png"]);
}

#[test]
fn label_roundtrip_and_listing_by_image_and_dataset() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCatalogRepository::new(&conn);
    let dataset = insert_dataset(&repo, "nyu");
    let image = Image::new(dataset.uuid, "nyu/0001.png", 4, 2, 3);
    repo.insert_image(&image).unwrap();

    let depth = Label::new(image.uuid, dataset.uuid, "nyu/0001_depth.png", "depth");
    let normals = Label::new(
        image.uuid,
        dataset.uuid,
        "nyu/0001_normals.png",
        "surface_normals",
    );
    repo.insert_label(&normals).unwrap();
    repo.insert_label(&depth).unwrap();

    assert_eq!(
        repo.find_label_by_path("nyu/0001_depth.png").unwrap(),
        Some(depth.clone())
    );
    assert_eq!(
        repo.list_labels_for_image(image.uuid).unwrap(),
        vec![depth.clone(), normals.clone()]
    );
    assert_eq!(
        repo.list_labels_for_dataset(dataset.uuid).unwrap(),
        vec![depth, normals]
    );
}

#[test]
fn duplicate_label_path_is_constraint_violation() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCatalogRepository::new(&conn);
    let dataset = insert_dataset(&repo, "nyu");
    let image = Image::new(dataset.uuid, "nyu/0001.png", 4, 2, 3);
    repo.insert_image(&image).unwrap();

    repo.insert_label(&Label::new(image.uuid, dataset.uuid, "shared.png", "depth"))
        .unwrap();
    let err = repo
        .insert_label(&Label::new(image.uuid, dataset.uuid, "shared.png", "mask"))
        .unwrap_err();
    assert!(matches!(err, RepoError::ConstraintViolation(_)));
}

#[test]
fn reassign_dataset_project_reports_missing_dataset() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCatalogRepository::new(&conn);
    let dataset = insert_dataset(&repo, "nyu");
    let target = Project::new("merged");
    repo.insert_project(&target).unwrap();

    assert!(repo
        .reassign_dataset_project(dataset.uuid, target.uuid)
        .unwrap());
    assert!(!repo
        .reassign_dataset_project(Uuid::new_v4(), target.uuid)
        .unwrap());
    let moved = repo.list_datasets_for_project(target.uuid).unwrap();
    assert_eq!(moved.len(), 1);
    assert_eq!(moved[0].uuid, dataset.uuid);
}

#[test]
fn record_files_are_listed_oldest_first() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCatalogRepository::new(&conn);
    let dataset = insert_dataset(&repo, "nyu");

    let newer = RecordFile::new(dataset.uuid, "v2.tfrecords", 2_000);
    let older = RecordFile::new(dataset.uuid, "v1.tfrecords", 1_000);
    repo.insert_record_file(&newer).unwrap();
    repo.insert_record_file(&older).unwrap();

    assert_eq!(
        repo.list_record_files_for_dataset(dataset.uuid).unwrap(),
        vec![older, newer]
    );
}

#[test]
fn corrupted_uuid_is_reported_as_invalid_data() {
    let conn = open_db_in_memory().unwrap();
    corrupt_project(&conn);
    let repo = SqliteCatalogRepository::new(&conn);

    let err = repo.find_project_by_name("broken").unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(message) if message.contains("projects.uuid")));
}

fn corrupt_project(conn: &Connection) {
    conn.execute(
        "INSERT INTO projects (uuid, name) VALUES ('not-a-uuid', 'broken');",
        [],
    )
    .unwrap();
}
