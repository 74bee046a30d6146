use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments parser for converting COCO detection files to a darknet dataset.
#[derive(Parser, Debug, Clone)]
#[command(version, long_about = None)]
pub struct Args {
    /// Dataset name; output goes to <data_root>/<name>
    #[arg(value_parser = validate_name)]
    pub name: String,

    /// COCO annotation file of the training set
    pub training: PathBuf,

    /// COCO annotation file of the validation set
    pub validation: PathBuf,

    /// Class names in category order (repeat for every class)
    #[arg(long = "class-name", required = true)]
    pub class_names: Vec<String>,

    /// Delete an existing dataset directory before converting
    #[arg(long = "clear")]
    pub clear: bool,

    /// Directory holding all converted datasets
    #[arg(long = "data_root", default_value = "data")]
    pub data_root: PathBuf,

    /// Directory that image file names in the annotation files are relative to
    #[arg(long = "image_root")]
    pub image_root: Option<PathBuf>,

    /// Convert the images of each split on a thread pool
    #[arg(long = "parallel")]
    pub parallel: bool,

    /// Script generating the model configuration, called with the class count
    #[arg(long = "model_script")]
    pub model_script: Option<PathBuf>,

    /// Config file the model script writes to the working directory
    #[arg(long = "generated_cfg", default_value = "yolov3-custom.cfg")]
    pub generated_cfg: PathBuf,

    /// Directory receiving the generated <name>.cfg
    #[arg(long = "config_dir", default_value = "config")]
    pub config_dir: PathBuf,
}

impl Args {
    /// Extract the settings the conversion library needs.
    pub fn to_conversion_config(&self) -> ConversionConfig {
        ConversionConfig {
            name: self.name.clone(),
            training: self.training.clone(),
            validation: self.validation.clone(),
            class_names: self.class_names.clone(),
            data_root: self.data_root.clone(),
            image_root: self.image_root.clone(),
            clear: self.clear,
            parallel: self.parallel,
        }
    }

    /// The model-configuration step, if a script was given.
    pub fn to_model_config(&self) -> Option<crate::model_config::ModelConfigScript> {
        self.model_script
            .as_ref()
            .map(|script| crate::model_config::ModelConfigScript {
                script: script.clone(),
                generated_cfg: self.generated_cfg.clone(),
                config_dir: self.config_dir.clone(),
            })
    }
}

/// Settings for converting one dataset
#[derive(Debug, Clone)]
pub struct ConversionConfig {
    pub name: String,
    pub training: PathBuf,
    pub validation: PathBuf,
    pub class_names: Vec<String>,
    pub data_root: PathBuf,
    pub image_root: Option<PathBuf>,
    pub clear: bool,
    pub parallel: bool,
}

impl ConversionConfig {
    /// Destination root of this dataset, `<data_root>/<name>`.
    pub fn dataset_root(&self) -> PathBuf {
        self.data_root.join(&self.name)
    }
}

// The dataset name becomes a directory and a file name
fn validate_name(s: &str) -> Result<String, String> {
    if s.is_empty() || s == "." || s == ".." || s.contains(['/', '\\']) {
        Err("NAME must be a plain directory name".to_string())
    } else {
        Ok(s.to_string())
    }
}
