//! Error types shared by every stage of the conversion.

use std::path::{Path, PathBuf};
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Why a COCO annotation file could not be turned into an index.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("cannot read file: {0}")]
    Read(#[from] std::io::Error),
    #[error("malformed JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("image id {0} appears more than once")]
    DuplicateImage(i64),
    #[error("annotation {annotation_id} references unknown image id {image_id}")]
    UnknownImage { annotation_id: i64, image_id: i64 },
}

/// Image dimensions a box cannot be normalized against.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[error("non-positive image dimensions {width}x{height}")]
pub struct GeometryError {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid annotation file {}: {source}", path.display())]
    Format {
        path: PathBuf,
        #[source]
        source: FormatError,
    },

    #[error("image {image_id} cannot be normalized: {source}")]
    Geometry {
        image_id: i64,
        #[source]
        source: GeometryError,
    },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("model configuration script {} failed: {status}", script.display())]
    ModelConfig {
        script: PathBuf,
        status: std::process::ExitStatus,
    },
}

impl Error {
    pub(crate) fn format(path: &Path, source: impl Into<FormatError>) -> Self {
        Error::Format {
            path: path.to_path_buf(),
            source: source.into(),
        }
    }

    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Error::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Attach the offending path to a bare `std::io::Result`.
pub(crate) trait IoContext<T> {
    fn at(self, path: &Path) -> Result<T>;
}

impl<T> IoContext<T> for std::io::Result<T> {
    fn at(self, path: &Path) -> Result<T> {
        self.map_err(|e| Error::io(path, e))
    }
}
