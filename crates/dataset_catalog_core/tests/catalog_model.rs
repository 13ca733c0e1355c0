use dataset_catalog_core::{Image, Label, Project, RecordFile, ValidationError};
use uuid::Uuid;

#[test]
fn image_new_derives_extension_and_generates_id() {
    let dataset_id = Uuid::new_v4();
    let image = Image::new(dataset_id, "scenes/0001.png", 640, 480, 3);

    assert!(!image.uuid.is_nil());
    assert_eq!(image.dataset_id, dataset_id);
    assert_eq!(image.width, 640);
    assert_eq!(image.height, 480);
    assert_eq!(image.extension, ".png");
    image.validate().unwrap();
}

#[test]
fn image_validate_rejects_zero_channels() {
    let image = Image::new(Uuid::new_v4(), "scenes/0001.png", 640, 480, 0);

    let err = image.validate().unwrap_err();
    assert_eq!(
        err,
        ValidationError::NonPositive {
            field: "channels",
            rel_path: "scenes/0001.png".to_string(),
        }
    );
}

#[test]
fn project_validate_rejects_blank_name_and_nil_id() {
    let blank = Project::new("   ");
    assert!(matches!(
        blank.validate(),
        Err(ValidationError::BlankField {
            entity: "project",
            field: "name"
        })
    ));

    let mut nil = Project::new("indoor");
    nil.uuid = Uuid::nil();
    assert_eq!(
        nil.validate().unwrap_err(),
        ValidationError::NilId { entity: "project" }
    );
}

#[test]
fn label_new_keeps_type_verbatim_and_serializes_it_as_type() {
    let label = Label::new(
        Uuid::new_v4(),
        Uuid::new_v4(),
        "labels/0001_depth.png",
        "Surface Normals",
    );
    assert_eq!(label.kind, "Surface Normals");

    let json = serde_json::to_value(&label).unwrap();
    assert_eq!(json["type"], "Surface Normals");
    assert_eq!(json["rel_path"], "labels/0001_depth.png");

    let decoded: Label = serde_json::from_value(json).unwrap();
    assert_eq!(decoded, label);
}

#[test]
fn label_validate_rejects_blank_type() {
    let label = Label::new(Uuid::new_v4(), Uuid::new_v4(), "labels/a.png", "  ");
    assert!(matches!(
        label.validate(),
        Err(ValidationError::BlankField { field: "type", .. })
    ));
}

#[test]
fn record_file_keeps_given_date() {
    let record_file = RecordFile::new(Uuid::new_v4(), "train.tfrecords", 1_700_000_000_000);
    assert_eq!(record_file.date, 1_700_000_000_000);
    record_file.validate().unwrap();
}
