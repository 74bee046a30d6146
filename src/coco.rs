//! COCO format data structures and the per-split annotation index
//!
//! This module reads a COCO detection file (image list plus annotation list) and
//! groups the annotations by the image they belong to.

use serde::Deserialize;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::error::{Error, FormatError, Result};
use crate::types::{AnnotationRecord, ImageRecord};

/// COCO category information
#[derive(Debug, Clone, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub supercategory: Option<String>,
}

/// COCO image information
#[derive(Debug, Clone, Deserialize)]
pub struct Image {
    pub id: i64,
    pub file_name: String,
    // some exporters write `640.0`
    pub width: f64,
    pub height: f64,
}

/// COCO annotation information
#[derive(Debug, Clone, Deserialize)]
pub struct Annotation {
    pub id: i64,
    pub image_id: i64,
    pub category_id: i64,
    pub bbox: [f64; 4], // [x, y, width, height]
}

/// The subset of a COCO file needed for detection conversion
#[derive(Debug, Clone, Deserialize)]
pub struct CocoFile {
    pub images: Vec<Image>,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    #[serde(default)]
    pub categories: Vec<Category>,
}

/// Images of one split and the annotations attached to each of them.
///
/// Images keep the order of the source file so that manifests are
/// reproducible; annotations keep source order within each image.
#[derive(Debug, Clone)]
pub struct AnnotationIndex {
    images: Vec<ImageRecord>,
    annotations: HashMap<i64, Vec<AnnotationRecord>>,
    categories: Vec<Category>,
}

impl AnnotationIndex {
    /// Load a COCO file. Image `file_name`s are used as given, i.e. relative
    /// ones resolve against the working directory.
    pub fn load(path: &Path) -> Result<Self> {
        Self::load_impl(path, None)
    }

    /// Load a COCO file, resolving relative image `file_name`s against `image_root`.
    pub fn load_with_image_root(path: &Path, image_root: &Path) -> Result<Self> {
        Self::load_impl(path, Some(image_root))
    }

    fn load_impl(path: &Path, image_root: Option<&Path>) -> Result<Self> {
        let file = File::open(path).map_err(|e| Error::format(path, e))?;
        let coco: CocoFile =
            serde_json::from_reader(BufReader::new(file)).map_err(|e| Error::format(path, e))?;
        Self::from_coco(coco, image_root).map_err(|e| Error::format(path, e))
    }

    /// Build the index from an already parsed COCO file.
    pub fn from_coco(
        coco: CocoFile,
        image_root: Option<&Path>,
    ) -> std::result::Result<Self, FormatError> {
        let mut annotations: HashMap<i64, Vec<AnnotationRecord>> =
            HashMap::with_capacity(coco.images.len());

        let mut images = Vec::with_capacity(coco.images.len());
        for image in coco.images {
            match annotations.entry(image.id) {
                Entry::Occupied(_) => return Err(FormatError::DuplicateImage(image.id)),
                Entry::Vacant(entry) => {
                    entry.insert(Vec::new());
                }
            }
            let path = match image_root {
                Some(root) => root.join(&image.file_name),
                None => PathBuf::from(&image.file_name),
            };
            images.push(ImageRecord {
                id: image.id,
                path,
                width: image.width,
                height: image.height,
            });
        }

        for annotation in coco.annotations {
            let list = annotations.get_mut(&annotation.image_id).ok_or(
                FormatError::UnknownImage {
                    annotation_id: annotation.id,
                    image_id: annotation.image_id,
                },
            )?;
            list.push(AnnotationRecord {
                image_id: annotation.image_id,
                category_id: annotation.category_id,
                bbox: annotation.bbox.into(),
            });
        }

        Ok(Self {
            images,
            annotations,
            categories: coco.categories,
        })
    }

    pub fn images(&self) -> &[ImageRecord] {
        &self.images
    }

    /// Annotations of `image_id`; empty for images without objects.
    pub fn annotations_for(&self, image_id: i64) -> &[AnnotationRecord] {
        self.annotations
            .get(&image_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Categories declared by the source file, if any.
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}
