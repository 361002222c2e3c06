//! Per-product processing chain and the directory batch loop around it.
//!
//! Each product runs strictly in sequence: load, resample, optional subset, retrieval,
//! export. The batch stops at the first failing product unless
//! [`ProcessingParams::continue_on_error`] is set.
use std::path::{Path, PathBuf};

use crate::core::params::ProcessingParams;
use crate::core::processing::ops::{
    RESAMPLE_OPERATOR, SUBSET_OPERATOR, resample_params, retrieval_params, subset_params,
};
use crate::core::validate::validate_processing_inputs;
use crate::error::{Error, Result};
use crate::io::engine::ProcessingEngine;
use crate::session::Reporter;
use crate::types::OutputLayers;

/// Input folder, output folder, optional clipping geometry and layer toggles of one run
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessingJob {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub aoi: Option<PathBuf>,
    pub layers: OutputLayers,
}

/// Outcome of a processing batch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessingReport {
    /// Files written by the engine, in processing order
    pub processed: Vec<PathBuf>,
    /// Directory entries that are not product folders
    pub skipped: usize,
    /// Product folder name and error text, only populated with `continue_on_error`
    pub errors: Vec<(String, String)>,
}

/// Product folders directly under `input_dir` whose name ends with `suffix`, in lexical
/// order, plus the number of other entries.
pub fn list_products(input_dir: &Path, suffix: &str) -> Result<(Vec<PathBuf>, usize)> {
    let mut products = Vec::new();
    let mut skipped = 0;
    for entry in std::fs::read_dir(input_dir)? {
        let path = entry?.path();
        let matches = path
            .file_name()
            .map(|n| n.to_string_lossy().ends_with(suffix))
            .unwrap_or(false);
        if matches && path.is_dir() {
            products.push(path);
        } else {
            skipped += 1;
        }
    }
    products.sort();
    Ok((products, skipped))
}

fn product_name(product_dir: &Path) -> String {
    product_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| product_dir.display().to_string())
}

/// Run the full chain for one product folder and return the written file.
pub fn process_product<E: ProcessingEngine>(
    engine: &E,
    product_dir: &Path,
    job: &ProcessingJob,
    params: &ProcessingParams,
    reporter: &Reporter,
) -> Result<PathBuf> {
    let descriptor = product_dir.join(&params.metadata_file);
    if !descriptor.is_file() {
        return Err(Error::Processing(format!(
            "missing product descriptor {}",
            descriptor.display()
        )));
    }
    reporter.info(format!("Loading product: {}", descriptor.display()));
    let product = engine.read_product(&descriptor)?;

    reporter.info(format!("Resampling to {} m", params.target_resolution));
    let product = engine.create_product(RESAMPLE_OPERATOR, &resample_params(params), product)?;

    let product = match job.aoi.as_deref() {
        Some(aoi) if aoi.exists() => {
            reporter.info(format!("Subsetting by {}", aoi.display()));
            engine.create_product(SUBSET_OPERATOR, &subset_params(params, aoi), product)?
        }
        Some(aoi) => {
            reporter.warn(format!(
                "Skipping subset: area of interest {} not found",
                aoi.display()
            ));
            product
        }
        None => {
            reporter.info("Skipping subset: no area of interest given");
            product
        }
    };

    reporter.info(format!("Running {}", params.retrieval_operator));
    let product = engine.create_product(
        &params.retrieval_operator,
        &retrieval_params(&params.c2rcc, &job.layers),
        product,
    )?;

    let target = job
        .output_dir
        .join(format!("{}{}", product_name(product_dir), params.output_suffix));
    reporter.info("Exporting selected layers");
    let written = engine.write_product(product, &target, &params.output_format)?;
    reporter.info(format!("Done: {}", written.display()));
    Ok(written)
}

/// Process every product folder of `job.input_dir` into `job.output_dir`.
pub fn process_directory<E: ProcessingEngine>(
    engine: &E,
    job: &ProcessingJob,
    params: &ProcessingParams,
    reporter: &Reporter,
) -> Result<ProcessingReport> {
    validate_processing_inputs(&job.input_dir)?;
    std::fs::create_dir_all(&job.output_dir)?;

    let (products, skipped) = list_products(&job.input_dir, &params.product_suffix)?;
    let mut report = ProcessingReport {
        skipped,
        ..ProcessingReport::default()
    };
    if products.is_empty() {
        reporter.warn(format!(
            "No *{} product folders in {}",
            params.product_suffix,
            job.input_dir.display()
        ));
    }

    for product_dir in products {
        match process_product(engine, &product_dir, job, params, reporter) {
            Ok(written) => report.processed.push(written),
            Err(e) => {
                let name = product_name(&product_dir);
                reporter.error(format!("Processing of {} failed: {}", name, e));
                if !params.continue_on_error {
                    return Err(e);
                }
                report.errors.push((name, e.to_string()));
            }
        }
    }

    Ok(report)
}
