use log::{debug, warn};
use std::fs::{copy, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{Error, GeometryError, IoContext, Result};
use crate::types::{AnnotationRecord, BoundingBox, ImageRecord, NormalizedBox, OutputDirs, YoloLabel};

/// Files produced for one image
#[derive(Debug, Clone, PartialEq)]
pub struct EmittedImage {
    pub image_path: PathBuf,
    pub label_path: PathBuf,
    pub annotation_count: usize,
}

/// Normalize an absolute-pixel box to center/size fractions of the image.
///
/// Values are not clamped, so boxes extending past the image edges yield
/// coordinates outside `[0, 1]`.
pub fn normalize(
    bbox: &BoundingBox,
    image_width: f64,
    image_height: f64,
) -> std::result::Result<NormalizedBox, GeometryError> {
    if image_width <= 0.0 || image_height <= 0.0 {
        return Err(GeometryError {
            width: image_width,
            height: image_height,
        });
    }

    Ok(NormalizedBox {
        x_center: (bbox.left + bbox.width / 2.0) / image_width,
        y_center: (bbox.top + bbox.height / 2.0) / image_height,
        width: bbox.width / image_width,
        height: bbox.height / image_height,
    })
}

/// COCO categories start at 1, darknet classes at 0.
pub fn remap_category(category_id: i64) -> i64 {
    category_id - 1
}

/// Convert the annotations of one image to the contents of its label file
pub fn convert_to_yolo_format(
    image: &ImageRecord,
    annotations: &[AnnotationRecord],
) -> Result<String> {
    let (image_width, image_height) = image.dimensions()?;
    let mut yolo_data = String::with_capacity(annotations.len() * 64);

    for annotation in annotations {
        let bbox = normalize(&annotation.bbox, image_width, image_height).map_err(|source| {
            Error::Geometry {
                image_id: image.id,
                source,
            }
        })?;
        let label = YoloLabel {
            class_id: remap_category(annotation.category_id),
            bbox,
        };

        if label.class_id < 0 {
            warn!(
                "Image {}: category {} maps to negative class {}",
                image.id, annotation.category_id, label.class_id
            );
        }
        if annotation.bbox.exceeds(image_width, image_height) {
            warn!(
                "Image {}: box {:?} exceeds the {}x{} image",
                image.id, annotation.bbox, image.width, image.height
            );
        }

        yolo_data.push_str(&label.to_string());
        yolo_data.push('\n');
    }

    Ok(yolo_data)
}

/// Destination image and label paths for `image` under `dirs`
pub fn destination_paths(image: &ImageRecord, dirs: &OutputDirs) -> Result<(PathBuf, PathBuf)> {
    let (file_name, stem) = match (image.path.file_name(), image.path.file_stem()) {
        (Some(file_name), Some(stem)) => (file_name, stem),
        _ => {
            return Err(Error::io(
                &image.path,
                std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "image path has no file name",
                ),
            ))
        }
    };

    // only the final extension is dropped, `frame.001.jpg` -> `frame.001.txt`
    let mut label_name = stem.to_os_string();
    label_name.push(".txt");

    let image_output_path = dirs.images_dir.join(file_name);
    let label_output_path = dirs.labels_dir.join(label_name);
    Ok((image_output_path, label_output_path))
}

/// Copy one image into the dataset and write its label file.
///
/// Dimensions are validated and every label line is computed before anything
/// touches the filesystem, so a geometry failure leaves no output behind for
/// this image. Images without annotations get an empty label file.
pub fn emit_image(
    image: &ImageRecord,
    annotations: &[AnnotationRecord],
    dirs: &OutputDirs,
) -> Result<EmittedImage> {
    let yolo_data = convert_to_yolo_format(image, annotations)?;
    let (image_output_path, label_output_path) = destination_paths(image, dirs)?;

    copy(&image.path, &image_output_path).map_err(|e| {
        // The error may come from either end of the copy
        let culprit = if image.path.is_file() {
            &image_output_path
        } else {
            &image.path
        };
        Error::io(culprit, e)
    })?;

    let mut writer = BufWriter::new(File::create(&label_output_path).at(&label_output_path)?);
    writer.write_all(yolo_data.as_bytes()).at(&label_output_path)?;
    writer.flush().at(&label_output_path)?;

    debug!(
        "Converted image {} ({} annotations) -> {}",
        image.id,
        annotations.len(),
        label_output_path.display()
    );

    Ok(EmittedImage {
        image_path: image_output_path,
        label_path: label_output_path,
        annotation_count: annotations.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn image(id: i64, path: &Path, width: u32, height: u32) -> ImageRecord {
        ImageRecord {
            id,
            path: path.to_path_buf(),
            width: width as f64,
            height: height as f64,
        }
    }

    fn annotation(image_id: i64, category_id: i64, bbox: [f64; 4]) -> AnnotationRecord {
        AnnotationRecord {
            image_id,
            category_id,
            bbox: bbox.into(),
        }
    }

    fn output_dirs(root: &Path) -> OutputDirs {
        let dirs = OutputDirs::new(root);
        fs::create_dir_all(&dirs.images_dir).unwrap();
        fs::create_dir_all(&dirs.labels_dir).unwrap();
        dirs
    }

    #[test]
    fn test_normalize() {
        let bbox = BoundingBox::from([10.0, 10.0, 20.0, 20.0]);
        let normalized = normalize(&bbox, 100.0, 100.0).unwrap();

        assert_eq!(normalized.x_center, 0.2);
        assert_eq!(normalized.y_center, 0.2);
        assert_eq!(normalized.width, 0.2);
        assert_eq!(normalized.height, 0.2);
    }

    #[test]
    fn test_normalize_round_trip() {
        let cases = [
            ([0.0, 0.0, 640.0, 480.0], 640.0, 480.0),
            ([13.5, 7.25, 101.0, 33.3], 333.0, 217.0),
            ([1.0, 2.0, 3.0, 4.0], 7.0, 11.0),
        ];
        for (raw, w, h) in cases {
            let bbox = BoundingBox::from(raw);
            let n = normalize(&bbox, w, h).unwrap();
            let left = n.x_center * w - n.width * w / 2.0;
            let top = n.y_center * h - n.height * h / 2.0;
            assert!((left - bbox.left).abs() < 1e-9);
            assert!((top - bbox.top).abs() < 1e-9);
            assert!((n.width * w - bbox.width).abs() < 1e-9);
            assert!((n.height * h - bbox.height).abs() < 1e-9);
        }
    }

    #[test]
    fn test_normalize_rejects_non_positive_dimensions() {
        let bbox = BoundingBox::from([0.0, 0.0, 1.0, 1.0]);
        assert!(normalize(&bbox, 0.0, 10.0).is_err());
        assert!(normalize(&bbox, 10.0, -1.0).is_err());
    }

    #[test]
    fn test_normalize_does_not_clamp() {
        let bbox = BoundingBox::from([90.0, -10.0, 40.0, 20.0]);
        let n = normalize(&bbox, 100.0, 100.0).unwrap();
        assert!(n.x_center + n.width / 2.0 > 1.0);
        assert_eq!(n.y_center, 0.0);
    }

    #[test]
    fn test_remap_category() {
        assert_eq!(remap_category(1), 0);
        assert_eq!(remap_category(80), 79);
        assert_eq!(remap_category(0), -1);
    }

    #[test]
    fn test_convert_to_yolo_format() {
        let img = image(1, Path::new("a.jpg"), 100, 100);
        let anns = vec![
            annotation(1, 2, [10.0, 10.0, 20.0, 20.0]),
            annotation(1, 1, [0.0, 0.0, 100.0, 50.0]),
        ];

        let yolo_data = convert_to_yolo_format(&img, &anns).unwrap();

        assert_eq!(yolo_data, "1 0.2 0.2 0.2 0.2\n0 0.5 0.25 1.0 0.5\n");
    }

    #[test]
    fn test_convert_keeps_negative_class() {
        let img = image(1, Path::new("a.jpg"), 10, 10);
        let anns = vec![annotation(1, 0, [0.0, 0.0, 5.0, 5.0])];

        let yolo_data = convert_to_yolo_format(&img, &anns).unwrap();

        assert!(yolo_data.starts_with("-1 "));
    }

    #[test]
    fn test_emit_image_writes_label_and_copies() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();
        let dirs = output_dirs(dst.path());
        let source = src.path().join("cat.v2.jpg");
        fs::write(&source, b"jpeg bytes").unwrap();

        let img = image(1, &source, 100, 100);
        let anns = vec![annotation(1, 2, [10.0, 10.0, 20.0, 20.0])];
        let emitted = emit_image(&img, &anns, &dirs).unwrap();

        assert_eq!(emitted.image_path, dirs.images_dir.join("cat.v2.jpg"));
        assert_eq!(emitted.label_path, dirs.labels_dir.join("cat.v2.txt"));
        assert_eq!(emitted.annotation_count, 1);
        assert_eq!(fs::read(&emitted.image_path).unwrap(), b"jpeg bytes");
        assert_eq!(
            fs::read_to_string(&emitted.label_path).unwrap(),
            "1 0.2 0.2 0.2 0.2\n"
        );
    }

    #[test]
    fn test_destination_paths_keep_inner_dots() {
        let dirs = OutputDirs::new("data/foo");
        let (image_path, label_path) =
            destination_paths(&image(1, Path::new("src/frame.001.jpg"), 8, 8), &dirs).unwrap();
        assert_eq!(image_path, PathBuf::from("data/foo/images/frame.001.jpg"));
        assert_eq!(label_path, PathBuf::from("data/foo/labels/frame.001.txt"));

        let (_, label_path) =
            destination_paths(&image(2, Path::new("noext"), 8, 8), &dirs).unwrap();
        assert_eq!(label_path, PathBuf::from("data/foo/labels/noext.txt"));
    }

    #[test]
    fn test_emit_image_without_annotations_creates_empty_label() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();
        let dirs = output_dirs(dst.path());
        let source = src.path().join("empty.png");
        fs::write(&source, b"png").unwrap();

        let emitted = emit_image(&image(2, &source, 50, 50), &[], &dirs).unwrap();

        assert!(emitted.label_path.exists());
        assert_eq!(fs::read_to_string(&emitted.label_path).unwrap(), "");
    }

    #[test]
    fn test_emit_image_missing_source_is_io_error() {
        let dst = tempfile::tempdir().unwrap();
        let dirs = output_dirs(dst.path());
        let missing = dst.path().join("nowhere/missing.jpg");

        let err = emit_image(&image(3, &missing, 10, 10), &[], &dirs).unwrap_err();

        match err {
            Error::Io { path, .. } => assert_eq!(path, missing),
            other => panic!("unexpected error: {other}"),
        }
        assert!(!dirs.labels_dir.join("missing.txt").exists());
    }

    #[test]
    fn test_emit_image_bad_geometry_writes_nothing() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();
        let dirs = output_dirs(dst.path());
        let source = src.path().join("flat.jpg");
        fs::write(&source, b"jpg").unwrap();

        let err = emit_image(&image(4, &source, 0, 10), &[], &dirs).unwrap_err();

        assert!(matches!(err, Error::Geometry { image_id: 4, .. }));
        assert!(!dirs.images_dir.join("flat.jpg").exists());
        assert!(!dirs.labels_dir.join("flat.txt").exists());
    }
}
