use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::Path;

use crate::error::{IoContext, Result};

/// Create a progress bar with the given length and label
pub fn create_progress_bar(len: u64, label: &str) -> ProgressBar {
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(&format!(
                "{{spinner:.green}} [{}] [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} ({{eta}})",
                label
            ))
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb
}

/// Delete `path` if it exists and create it again, empty
pub fn create_output_directory(path: &Path) -> Result<()> {
    if path.exists() {
        log::warn!(
            "Directory {:?} already exists. Deleting and recreating it.",
            path
        );
        fs::remove_dir_all(path).at(path)?;
    }
    fs::create_dir_all(path).at(path)
}

/// Create `path` and its parents, keeping any existing content
pub fn ensure_directory(path: &Path) -> Result<()> {
    fs::create_dir_all(path).at(path)
}
