use clap::Parser;
use log::{error, info};
use std::process::ExitCode;

use coco2darknet::{convert_into, setup_output_directories, Args};

fn run(args: &Args) -> coco2darknet::Result<()> {
    let config = args.to_conversion_config();
    let dirs = setup_output_directories(&config.dataset_root(), config.clear)?;

    if let Some(model) = args.to_model_config() {
        model.run(&config.name, config.class_names.len())?;
    }

    let summary = convert_into(&config, &dirs)?;
    summary.print_summary();
    Ok(())
}

fn main() -> ExitCode {
    // Initialize the logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    info!("===== COCO-darknet data adapter =====");

    match run(&args) {
        Ok(()) => {
            info!("Conversion process completed successfully.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Failed to convert dataset: {}", e);
            ExitCode::FAILURE
        }
    }
}
