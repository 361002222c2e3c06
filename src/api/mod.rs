//! High-level library API: one entry point per pipeline run (search, download batch,
//! directory processing). Each converts failures at its boundary into log lines and
//! notifications on the [`Reporter`] before returning them. Prefer these over the
//! low-level `io` and `core` modules when integrating s2water.
use std::path::{Path, PathBuf};

use crate::core::params::ProcessingParams;
use crate::core::processing::pipeline;
use crate::core::processing::{ProcessingJob, ProcessingReport};
use crate::core::query::SearchCriteria;
use crate::error::{Error, Result};
use crate::io::catalog::{BearerToken, CatalogClient, CatalogError, ProductRecord};
use crate::io::engine::ProcessingEngine;
use crate::io::geometry::load_area_of_interest;
use crate::session::Reporter;
use crate::types::NotificationKind;

/// Download batch report
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DownloadReport {
    pub saved: Vec<PathBuf>,
    /// Product name and error text for each failed item
    pub failed: Vec<(String, String)>,
    /// True if any item was rejected because the session is no longer valid
    pub session_expired: bool,
}

/// Load the AOI, query the catalog and report the matching products.
///
/// An empty result is `Ok(vec![])` with an informational notification; on failure the
/// error is logged and download stays disabled.
pub fn search_products(
    client: &CatalogClient,
    token: &BearerToken,
    criteria: &SearchCriteria,
    reporter: &Reporter,
) -> Result<Vec<ProductRecord>> {
    reporter.set_download_enabled(false);
    let outcome = run_search(client, token, criteria, reporter);
    match &outcome {
        Ok(products) if products.is_empty() => {
            reporter.info("No products found");
            reporter.notify(
                NotificationKind::Info,
                "Search",
                "No products match the search criteria.",
            );
        }
        Ok(products) => {
            reporter.info(format!("Found {} products", products.len()));
            reporter.set_download_enabled(true);
        }
        Err(e) => reporter.error(format!("Search failed: {}", e)),
    }
    outcome
}

fn run_search(
    client: &CatalogClient,
    token: &BearerToken,
    criteria: &SearchCriteria,
    reporter: &Reporter,
) -> Result<Vec<ProductRecord>> {
    let aoi = load_area_of_interest(&criteria.aoi_path)?;
    reporter.info(format!(
        "Loaded AOI {} (CRS {}{})",
        criteria.aoi_path.display(),
        aoi.source_crs,
        if aoi.reprojected {
            ", reprojected to EPSG:4326"
        } else {
            ""
        }
    ));
    reporter.info(format!(
        "Searching {} products from {} to {} with cloud cover below {}%",
        criteria.level, criteria.start, criteria.end, criteria.cloud_cover
    ));
    let products = client.search(token, criteria, &aoi.wkt)?;
    for product in &products {
        reporter.info(format!("  {}", product.name));
    }
    Ok(products)
}

/// Download `products` into `folder`, one at a time.
///
/// A failing product is logged with its name and the batch moves on. The completion
/// notification is emitted whatever the individual outcomes.
pub fn download_products(
    client: &CatalogClient,
    token: &BearerToken,
    products: &[ProductRecord],
    folder: &Path,
    reporter: &Reporter,
) -> Result<DownloadReport> {
    if products.is_empty() {
        reporter.notify(NotificationKind::Error, "Download", Error::NoProducts.to_string());
        return Err(Error::NoProducts);
    }

    let mut report = DownloadReport::default();
    for product in products {
        reporter.info(format!("Downloading {}", product.name));
        match client.download_product(token, product, folder) {
            Ok(path) => {
                reporter.info(format!("Saved {}", path.display()));
                report.saved.push(path);
            }
            Err(e) => {
                reporter.error(format!("Error downloading {}: {}", product.name, e));
                if matches!(e, CatalogError::Unauthorized(_)) {
                    report.session_expired = true;
                }
                report.failed.push((product.name.clone(), e.to_string()));
            }
        }
    }

    let summary = format!(
        "Downloaded {} of {} products to {}",
        report.saved.len(),
        products.len(),
        folder.display()
    );
    reporter.info(summary.clone());
    reporter.notify(NotificationKind::Info, "Download complete", summary);
    Ok(report)
}

/// Run the processing pipeline over `job.input_dir`.
///
/// Emits a single completion notification, or a single error notification carrying the
/// error text when the batch stops early.
pub fn process_directory<E: ProcessingEngine>(
    engine: &E,
    job: &ProcessingJob,
    params: &ProcessingParams,
    reporter: &Reporter,
) -> Result<ProcessingReport> {
    reporter.info(format!(
        "Processing {} -> {}",
        job.input_dir.display(),
        job.output_dir.display()
    ));
    let outcome = pipeline::process_directory(engine, job, params, reporter);
    match &outcome {
        Ok(report) => {
            let mut message = format!(
                "Processing complete: {} products written",
                report.processed.len()
            );
            if !report.errors.is_empty() {
                message.push_str(&format!(", {} failed", report.errors.len()));
            }
            reporter.info(message.clone());
            reporter.notify(NotificationKind::Info, "Complete", message);
        }
        Err(e) => reporter.notify(NotificationKind::Error, "Error", e.to_string()),
    }
    outcome
}
