use indicatif::ProgressBar;
use log::{info, warn};
use rayon::prelude::*;
use std::collections::HashSet;

use crate::coco::AnnotationIndex;
use crate::config::ConversionConfig;
use crate::conversion::{destination_paths, emit_image, EmittedImage};
use crate::error::Result;
use crate::io::{setup_output_directories, write_class_registry, write_descriptor, ManifestWriter};
use crate::types::{ConversionSummary, OutputDirs, Split};
use crate::utils::create_progress_bar;

/// Convert every image of `index` in order, appending each destination image
/// path to `manifest`.
///
/// Stops at the first failing image. Manifest lines written before the
/// failure stay in place.
pub fn convert_split(
    index: &AnnotationIndex,
    dirs: &OutputDirs,
    manifest: &mut ManifestWriter,
    pb: &ProgressBar,
) -> Result<usize> {
    let mut count = 0;
    for image in index.images() {
        let emitted = emit_image(image, index.annotations_for(image.id), dirs)?;
        manifest.append(&emitted.image_path)?;
        pb.inc(1);
        count += 1;
    }
    Ok(count)
}

// Images sharing a destination image or label file must be written in order
fn has_colliding_destinations(index: &AnnotationIndex, dirs: &OutputDirs) -> bool {
    let mut seen = HashSet::with_capacity(index.len() * 2);
    for image in index.images() {
        match destination_paths(image, dirs) {
            Ok((image_path, label_path)) => {
                if !seen.insert(image_path) || !seen.insert(label_path) {
                    return true;
                }
            }
            // let the sequential driver report it at the right position
            Err(_) => return true,
        }
    }
    false
}

/// Same output as [`convert_split`], with images converted in parallel.
///
/// Manifest lines are written in index order once all images are done. On
/// failure the error of the first failing image in index order is returned and
/// the manifest holds exactly the images before it. Splits in which two images
/// map to the same destination file are converted sequentially.
pub fn convert_split_parallel(
    index: &AnnotationIndex,
    dirs: &OutputDirs,
    manifest: &mut ManifestWriter,
    pb: &ProgressBar,
) -> Result<usize> {
    if has_colliding_destinations(index, dirs) {
        warn!("Images share destination file names, converting sequentially");
        return convert_split(index, dirs, manifest, pb);
    }

    let results: Vec<Result<EmittedImage>> = index
        .images()
        .par_iter()
        .map(|image| {
            let result = emit_image(image, index.annotations_for(image.id), dirs);
            pb.inc(1);
            result
        })
        .collect();

    let mut count = 0;
    for result in results {
        manifest.append(&result?.image_path)?;
        count += 1;
    }
    Ok(count)
}

// Category ids beyond the registry are allowed, only reported
fn check_class_coverage(index: &AnnotationIndex, class_count: usize, split: Split) {
    let max_class = index
        .images()
        .iter()
        .flat_map(|image| index.annotations_for(image.id))
        .map(|annotation| annotation.category_id)
        .max();
    if let Some(max_class) = max_class {
        if max_class > class_count as i64 {
            warn!(
                "[{}] category id {} exceeds the {} registered class names",
                split.label(),
                max_class,
                class_count
            );
        }
    }
    if !index.categories().is_empty() && index.categories().len() != class_count {
        warn!(
            "[{}] annotation file declares {} categories, {} class names given",
            split.label(),
            index.categories().len(),
            class_count
        );
    }
}

/// Load one split and convert it into `dirs`, writing its manifest.
pub fn process_split(
    config: &ConversionConfig,
    dirs: &OutputDirs,
    split: Split,
) -> Result<usize> {
    let source = match split {
        Split::Train => &config.training,
        Split::Valid => &config.validation,
    };

    info!("Parsing {} set {}", split.label(), source.display());
    let index = match &config.image_root {
        Some(root) => AnnotationIndex::load_with_image_root(source, root)?,
        None => AnnotationIndex::load(source)?,
    };
    check_class_coverage(&index, config.class_names.len(), split);

    let mut manifest = ManifestWriter::create(&dirs.manifest_path(split))?;
    let pb = create_progress_bar(index.len() as u64, split.label());
    let result = if config.parallel {
        convert_split_parallel(&index, dirs, &mut manifest, &pb)
    } else {
        convert_split(&index, dirs, &mut manifest, &pb)
    };
    let count = match result {
        Ok(count) => count,
        Err(e) => {
            pb.abandon();
            // keep what was written so far, the conversion error takes precedence
            let _ = manifest.finish();
            return Err(e);
        }
    };
    manifest.finish()?;
    pb.finish_with_message(format!("{} processing complete", split.label()));

    info!("Copied {} files", count);
    Ok(count)
}

/// Main dataset conversion pipeline
pub fn convert_dataset(config: &ConversionConfig) -> Result<ConversionSummary> {
    let dirs = setup_output_directories(&config.dataset_root(), config.clear)?;
    convert_into(config, &dirs)
}

/// Convert both splits into directories already prepared by
/// [`setup_output_directories`], writing registry and descriptor.
pub fn convert_into(config: &ConversionConfig, dirs: &OutputDirs) -> Result<ConversionSummary> {
    info!("Writing classes.names");
    let class_registry = dirs.class_registry_path();
    write_class_registry(&config.class_names, &class_registry)?;

    let train_images = process_split(config, dirs, Split::Train)?;
    let valid_images = process_split(config, dirs, Split::Valid)?;

    let train_manifest = dirs.manifest_path(Split::Train);
    let valid_manifest = dirs.manifest_path(Split::Valid);
    let descriptor = dirs.descriptor_path(&config.name);
    info!("Writing {}", descriptor.display());
    write_descriptor(
        config.class_names.len(),
        &train_manifest,
        &valid_manifest,
        &class_registry,
        &descriptor,
    )?;

    Ok(ConversionSummary {
        classes: config.class_names.len(),
        train_images,
        valid_images,
        train_manifest,
        valid_manifest,
        descriptor,
    })
}
