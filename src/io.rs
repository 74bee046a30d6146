use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{IoContext, Result};
use crate::types::OutputDirs;
use crate::utils::{create_output_directory, ensure_directory};

/// Set up the directory structure for a darknet dataset under `root`.
///
/// With `clear` set, an existing tree at `root` is deleted first; otherwise
/// existing files are overwritten in place.
pub fn setup_output_directories(root: &Path, clear: bool) -> Result<OutputDirs> {
    let dirs = OutputDirs::new(root);
    if clear {
        create_output_directory(&dirs.root)?;
    } else {
        ensure_directory(&dirs.root)?;
    }
    ensure_directory(&dirs.images_dir)?;
    ensure_directory(&dirs.labels_dir)?;
    Ok(dirs)
}

/// Line-per-image list of the destination paths of one split
pub struct ManifestWriter {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl ManifestWriter {
    /// Open a split manifest for writing, truncating any previous content.
    pub fn create(path: &Path) -> Result<Self> {
        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(File::create(path).at(path)?),
        })
    }

    pub fn append(&mut self, image_path: &Path) -> Result<()> {
        writeln!(self.writer, "{}", image_path.display()).at(&self.path)
    }

    /// Flush buffered lines; lines are also flushed on drop, errors then being lost.
    pub fn finish(mut self) -> Result<PathBuf> {
        self.writer.flush().at(&self.path)?;
        Ok(self.path)
    }
}

/// Write the class names, one per line, in the given order
pub fn write_class_registry<S: AsRef<str>>(names: &[S], path: &Path) -> Result<()> {
    let mut registry = BufWriter::new(File::create(path).at(path)?);
    for name in names {
        writeln!(registry, "{}", name.as_ref()).at(path)?;
    }
    registry.flush().at(path)
}

/// Render the `.data` descriptor binding class count, manifests and class names
pub fn format_descriptor(
    class_count: usize,
    train_manifest: &Path,
    valid_manifest: &Path,
    class_registry: &Path,
) -> String {
    format!(
        "classes={}\ntrain={}\nvalid={}\nnames={}\n",
        class_count,
        train_manifest.display(),
        valid_manifest.display(),
        class_registry.display()
    )
}

/// Create the `.data` descriptor file for darknet training
pub fn write_descriptor(
    class_count: usize,
    train_manifest: &Path,
    valid_manifest: &Path,
    class_registry: &Path,
    path: &Path,
) -> Result<()> {
    let content = format_descriptor(class_count, train_manifest, valid_manifest, class_registry);
    let mut descriptor = BufWriter::new(File::create(path).at(path)?);
    descriptor.write_all(content.as_bytes()).at(path)?;
    descriptor.flush().at(path)
}
