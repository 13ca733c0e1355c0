use dataset_catalog_core::db::open_db_in_memory;
use dataset_catalog_core::{
    CatalogError, CatalogService, DatasetRef, FsImageInspector, ImageInspector, InspectError,
    NewDataset,
};
use std::path::Path;

fn write_png(root: &Path, rel_path: &str, width: u32, height: u32, color_type: u8) {
    let mut bytes = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    bytes.extend_from_slice(&13_u32.to_be_bytes());
    bytes.extend_from_slice(b"IHDR");
    bytes.extend_from_slice(&width.to_be_bytes());
    bytes.extend_from_slice(&height.to_be_bytes());
    bytes.extend_from_slice(&[8, color_type, 0, 0, 0]);
    bytes.extend_from_slice(&[0, 0, 0, 0]);

    let path = root.join(rel_path);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, bytes).unwrap();
}

#[test]
fn fs_inspector_reads_png_geometry_under_root() {
    let root = tempfile::tempdir().unwrap();
    write_png(root.path(), "nyu/rgba.png", 32, 16, 6);
    write_png(root.path(), "nyu/gray.png", 8, 4, 0);
    let inspector = FsImageInspector::new(root.path());

    let rgba = inspector.inspect("nyu/rgba.png").unwrap();
    assert_eq!((rgba.width, rgba.height, rgba.channels), (32, 16, 4));
    let gray = inspector.inspect("nyu/gray.png").unwrap();
    assert_eq!(gray.channels, 1);
}

fn write_jpeg_with_large_app_segments(root: &Path, rel_path: &str, components: u8) {
    let mut bytes = vec![0xFF, 0xD8];
    for _ in 0..2 {
        let payload = vec![0_u8; 40_000];
        bytes.extend_from_slice(&[0xFF, 0xE2]);
        bytes.extend_from_slice(&(payload.len() as u16 + 2).to_be_bytes());
        bytes.extend_from_slice(&payload);
    }
    let frame_length = 8 + 3 * u16::from(components);
    bytes.extend_from_slice(&[0xFF, 0xC0]);
    bytes.extend_from_slice(&frame_length.to_be_bytes());
    bytes.push(8);
    bytes.extend_from_slice(&16_u16.to_be_bytes());
    bytes.extend_from_slice(&32_u16.to_be_bytes());
    bytes.push(components);
    for id in 1..=components {
        bytes.extend_from_slice(&[id, 0x11, 0]);
    }
    bytes.extend_from_slice(&[0xFF, 0xD9]);

    std::fs::write(root.join(rel_path), bytes).unwrap();
}

#[test]
fn fs_inspector_finds_jpeg_frame_header_past_first_read() {
    let root = tempfile::tempdir().unwrap();
    write_jpeg_with_large_app_segments(root.path(), "photo.jpg", 3);
    let inspector = FsImageInspector::new(root.path());

    let shape = inspector.inspect("photo.jpg").unwrap();
    assert_eq!((shape.width, shape.height, shape.channels), (32, 16, 3));
}

#[test]
fn fs_inspector_reports_missing_file() {
    let root = tempfile::tempdir().unwrap();
    let inspector = FsImageInspector::new(root.path());

    let err = inspector.inspect("nyu/missing.png").unwrap_err();
    assert!(matches!(err, InspectError::Io { .. }));
}

#[test]
fn fs_inspector_rejects_non_image_files() {
    let root = tempfile::tempdir().unwrap();
    std::fs::write(root.path().join("notes.txt"), b"not an image").unwrap();
    let inspector = FsImageInspector::new(root.path());

    assert!(inspector.inspect("notes.txt").is_err());
}

#[test]
fn service_fills_geometry_from_mounted_files() {
    let root = tempfile::tempdir().unwrap();
    write_png(root.path(), "nyu/0001.png", 64, 48, 2);

    let mut conn = open_db_in_memory().unwrap();
    let mut service = CatalogService::new(&mut conn, FsImageInspector::new(root.path()));
    service
        .add_dataset(&NewDataset {
            name: "nyu".to_string(),
            date: None,
            project_name: "indoor".to_string(),
            num_training: 1,
            num_test: 0,
            num_validation: 0,
            training_data_path: "nyu/train".to_string(),
            test_data_path: "nyu/test".to_string(),
            validation_data_path: "nyu/val".to_string(),
        })
        .unwrap();

    let images = service
        .add_images(&["nyu/0001.png"], DatasetRef::Name("nyu"), None, None)
        .unwrap();
    assert_eq!(
        (images[0].width, images[0].height, images[0].channels),
        (64, 48, 3)
    );

    let err = service
        .add_images(&["nyu/absent.png"], DatasetRef::Name("nyu"), None, None)
        .unwrap_err();
    assert!(matches!(err, CatalogError::Inspect(InspectError::Io { .. })));
}
