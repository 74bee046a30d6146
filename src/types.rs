use std::fmt;
use std::path::PathBuf;

use crate::error::{Error, GeometryError, Result};

// The ImageRecord struct representing one image of a COCO split
#[derive(Debug, Clone, PartialEq)]
pub struct ImageRecord {
    pub id: i64,
    pub path: PathBuf,
    pub width: f64,
    pub height: f64,
}

impl ImageRecord {
    /// Width and height, rejecting non-positive dimensions.
    pub fn dimensions(&self) -> Result<(f64, f64)> {
        if self.width <= 0.0 || self.height <= 0.0 {
            return Err(Error::Geometry {
                image_id: self.id,
                source: GeometryError {
                    width: self.width,
                    height: self.height,
                },
            });
        }
        Ok((self.width, self.height))
    }
}

/// Axis-aligned box in absolute pixels, COCO `[left, top, width, height]` order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl From<[f64; 4]> for BoundingBox {
    fn from([left, top, width, height]: [f64; 4]) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }
}

impl BoundingBox {
    /// Whether any edge of the box lies outside `[0, width] x [0, height]`.
    pub fn exceeds(&self, image_width: f64, image_height: f64) -> bool {
        self.left < 0.0
            || self.top < 0.0
            || self.left + self.width > image_width
            || self.top + self.height > image_height
    }
}

// The AnnotationRecord struct representing one box of an image
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationRecord {
    pub image_id: i64,
    pub category_id: i64,
    pub bbox: BoundingBox,
}

/// Box normalized to the image size, center/size form.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedBox {
    pub x_center: f64,
    pub y_center: f64,
    pub width: f64,
    pub height: f64,
}

/// One line of a darknet label file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YoloLabel {
    pub class_id: i64,
    pub bbox: NormalizedBox,
}

impl fmt::Display for YoloLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {}",
            self.class_id,
            format_float(self.bbox.x_center),
            format_float(self.bbox.y_center),
            format_float(self.bbox.width),
            format_float(self.bbox.height)
        )
    }
}

/// Shortest round-trip form with `.0` on integral values and a signed,
/// two-digit exponent (`1e-05`, `1e+16`), the way Python's `repr` writes floats.
pub fn format_float(value: f64) -> String {
    let repr = format!("{:?}", value);
    match repr.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            format!("{}e{}{:0>2}", mantissa, sign, digits)
        }
        None => repr,
    }
}

/// The two dataset partitions, processed identically but independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Split {
    Train,
    Valid,
}

impl Split {
    pub fn manifest_file_name(self) -> &'static str {
        match self {
            Split::Train => "train.txt",
            Split::Valid => "valid.txt",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Split::Train => "Train",
            Split::Valid => "Valid",
        }
    }
}

// Struct to hold the paths of the destination tree for one dataset
#[derive(Debug, Clone)]
pub struct OutputDirs {
    pub root: PathBuf,
    pub images_dir: PathBuf,
    pub labels_dir: PathBuf,
}

impl OutputDirs {
    /// Derive the layout under `root` without touching the filesystem.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            images_dir: root.join("images"),
            labels_dir: root.join("labels"),
            root,
        }
    }

    pub fn manifest_path(&self, split: Split) -> PathBuf {
        self.root.join(split.manifest_file_name())
    }

    pub fn class_registry_path(&self) -> PathBuf {
        self.root.join("classes.names")
    }

    pub fn descriptor_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{}.data", name))
    }
}

/// Result of converting both splits of a dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionSummary {
    pub classes: usize,
    pub train_images: usize,
    pub valid_images: usize,
    pub train_manifest: PathBuf,
    pub valid_manifest: PathBuf,
    pub descriptor: PathBuf,
}

impl ConversionSummary {
    pub fn print_summary(&self) {
        log::info!("=== Conversion Summary ===");
        log::info!("Classes: {}", self.classes);
        log::info!("Training images: {}", self.train_images);
        log::info!("Validation images: {}", self.valid_images);
        log::info!("Descriptor: {}", self.descriptor.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_display_keeps_float_shape() {
        let label = YoloLabel {
            class_id: 1,
            bbox: NormalizedBox {
                x_center: 0.2,
                y_center: 0.5,
                width: 1.0,
                height: 0.25,
            },
        };
        assert_eq!(label.to_string(), "1 0.2 0.5 1.0 0.25");
    }

    #[test]
    fn test_format_float_exponents() {
        assert_eq!(format_float(0.2), "0.2");
        assert_eq!(format_float(1.0), "1.0");
        assert_eq!(format_float(0.0001), "0.0001");
        assert_eq!(format_float(0.00001), "1e-05");
        assert_eq!(format_float(1.5e-7), "1.5e-07");
        assert_eq!(format_float(2.5e-123), "2.5e-123");
        assert_eq!(format_float(1e16), "1e+16");
        assert_eq!(format_float(-3e-6), "-3e-06");
    }

    #[test]
    fn test_zero_width_is_geometry_error() {
        let image = ImageRecord {
            id: 7,
            path: PathBuf::from("a.jpg"),
            width: 0.0,
            height: 10.0,
        };
        assert!(matches!(
            image.dimensions(),
            Err(Error::Geometry { image_id: 7, .. })
        ));
    }

    #[test]
    fn test_output_dirs_layout() {
        let dirs = OutputDirs::new("data/foo");
        assert_eq!(dirs.images_dir, PathBuf::from("data/foo/images"));
        assert_eq!(dirs.labels_dir, PathBuf::from("data/foo/labels"));
        assert_eq!(dirs.manifest_path(Split::Valid), PathBuf::from("data/foo/valid.txt"));
        assert_eq!(dirs.descriptor_path("foo"), PathBuf::from("data/foo/foo.data"));
    }

    #[test]
    fn test_bbox_exceeds() {
        let inside = BoundingBox::from([10.0, 10.0, 20.0, 20.0]);
        let outside = BoundingBox::from([90.0, 10.0, 20.0, 20.0]);
        assert!(!inside.exceeds(100.0, 100.0));
        assert!(outside.exceeds(100.0, 100.0));
    }
}
