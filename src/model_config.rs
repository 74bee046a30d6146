//! Model-configuration step run alongside a conversion
//!
//! The darknet model config depends only on the number of classes. It is
//! produced by an external shell script that the binary calls once the class
//! list is known; the conversion pipeline itself never invokes it.

use log::info;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{Error, IoContext, Result};

/// A script that writes a model config for a given class count
#[derive(Debug, Clone, PartialEq)]
pub struct ModelConfigScript {
    pub script: PathBuf,
    /// File the script leaves in the working directory
    pub generated_cfg: PathBuf,
    pub config_dir: PathBuf,
}

impl ModelConfigScript {
    /// Destination of the generated config for dataset `name`.
    pub fn target_path(&self, name: &str) -> PathBuf {
        self.config_dir.join(format!("{}.cfg", name))
    }

    /// Run `bash <script> <class_count>` and move its output to `<config_dir>/<name>.cfg`.
    pub fn run(&self, name: &str, class_count: usize) -> Result<PathBuf> {
        info!("Invoking {}", self.script.display());
        let status = Command::new("bash")
            .arg(&self.script)
            .arg(class_count.to_string())
            .status()
            .at(&self.script)?;
        if !status.success() {
            return Err(Error::ModelConfig {
                script: self.script.clone(),
                status,
            });
        }

        let target = self.target_path(name);
        info!(
            "Moving {} to {}",
            self.generated_cfg.display(),
            target.display()
        );
        fs::create_dir_all(&self.config_dir).at(&self.config_dir)?;
        move_file(&self.generated_cfg, &target)?;
        Ok(target)
    }
}

// `rename` fails across filesystems, fall back to copy and delete
fn move_file(from: &Path, to: &Path) -> Result<()> {
    if fs::rename(from, to).is_ok() {
        return Ok(());
    }
    fs::copy(from, to).at(from)?;
    fs::remove_file(from).at(from)
}
