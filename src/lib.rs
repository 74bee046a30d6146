//! COCO to darknet dataset converter
//!
//! This library converts COCO detection annotations (absolute-pixel boxes,
//! 1-based categories) into a darknet/YOLO training dataset: one normalized
//! label file per image, split manifests, a class registry and a `.data`
//! descriptor.

pub mod coco;
pub mod config;
pub mod conversion;
pub mod dataset;
pub mod error;
pub mod io;
pub mod model_config;
pub mod types;
pub mod utils;

// Re-export commonly used types and functions
pub use coco::AnnotationIndex;
pub use config::{Args, ConversionConfig};
pub use conversion::{emit_image, normalize, EmittedImage};
pub use dataset::{convert_dataset, convert_into, convert_split, convert_split_parallel};
pub use error::{Error, FormatError, GeometryError, Result};
pub use io::{setup_output_directories, write_class_registry, write_descriptor, ManifestWriter};
pub use model_config::ModelConfigScript;
pub use types::{AnnotationRecord, BoundingBox, ConversionSummary, ImageRecord, OutputDirs, Split};
