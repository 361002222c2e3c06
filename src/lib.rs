#![doc = r#"
s2water — Sentinel-2 acquisition and water-quality processing.

This crate drives two external systems: the Copernicus Data Space catalog (login, search
by area of interest, cloud cover and date range, redirect-following streaming download)
and the ESA SNAP toolkit (resample, subset, C2RCC retrieval, export). It powers the
`s2water` CLI and can be embedded in your own Rust applications.

Stability
---------
The public library API is experimental in initial releases and may evolve. Breaking
changes can occur.

Requirements
------------
- GDAL development headers and runtime (area-of-interest files are read with OGR).
- ESA SNAP with its `gpt` command-line tool for the processing half.
- Rust 2024 edition toolchain.

Add dependency
--------------
```toml
[dependencies]
s2water = "0.1"
```

Quick start: search and download
--------------------------------
```rust,no_run
use std::sync::Arc;
use chrono::NaiveDate;
use s2water::{
    CatalogClient, ReqwestTransport, Reporter, SearchCriteria, ProductLevel,
    search_products, download_products,
};
use s2water::core::params::AppConfig;

fn main() -> s2water::Result<()> {
    let config = AppConfig::default();
    let transport = Arc::new(ReqwestTransport::new(None).map_err(s2water::Error::config)?);
    let client = CatalogClient::new(transport, config.catalog, config.download);
    let token = client.authenticate("user@example.com", "secret")?;

    let criteria = SearchCriteria {
        level: ProductLevel::Level1C,
        cloud_cover: 20.0,
        start: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
        end: NaiveDate::from_ymd_opt(2024, 5, 31).unwrap(),
        aoi_path: "/data/lake.shp".into(),
        output_dir: "/data/downloads".into(),
    };
    let reporter = Reporter::silent();
    let products = search_products(&client, &token, &criteria, &reporter)?;
    let report = download_products(&client, &token, &products, &criteria.output_dir, &reporter)?;
    println!("saved={} failed={}", report.saved.len(), report.failed.len());
    Ok(())
}
```

Processing a folder of products
-------------------------------
```rust,no_run
use s2water::{GptEngine, ProcessingJob, OutputLayers, Reporter, process_directory};
use s2water::core::params::{EngineConfig, ProcessingParams};

fn main() -> s2water::Result<()> {
    let engine = GptEngine::new(&EngineConfig::default());
    let job = ProcessingJob {
        input_dir: "/data/safe_root".into(),
        output_dir: "/data/c2rcc".into(),
        aoi: Some("/data/lake.shp".into()),
        layers: OutputLayers::default(),
    };
    let params = ProcessingParams {
        continue_on_error: true,
        ..ProcessingParams::default()
    };
    let report = process_directory(&engine, &job, &params, &Reporter::silent())?;
    println!("processed={} errors={}", report.processed.len(), report.errors.len());
    Ok(())
}
```

Background tasks
----------------
[`session::Coordinator`] runs search, download and processing on worker threads, keeps
the bearer token and product list, and reports progress as [`session::Event`]s. Starting
a task of a kind that is still running fails with [`Error::TaskBusy`].

Error handling
--------------
All public functions return `s2water::Result<T>`; match on `s2water::Error` to handle
specific cases.

```rust,no_run
use s2water::{CatalogError, Error};

fn describe(result: s2water::Result<()>) {
    match result {
        Ok(()) => {}
        Err(Error::Validation(errors)) => eprintln!("{} invalid inputs", errors.messages().len()),
        Err(Error::Catalog(CatalogError::Authentication(text))) => eprintln!("login: {text}"),
        Err(other) => eprintln!("Other error: {other}"),
    }
}
```

Useful modules
--------------
- [`api`] — high-level entry points with notifications.
- [`session`] — coordinator, events and the reporter handed to pipelines.
- [`types`] — product levels, output-layer toggles, notification kinds.
- [`io`] — geometry loader, HTTP transport, catalog client, processing engines.
- [`error`] — crate-level `Error` and `Result`.
"#]

// Core modules (public)
pub mod api;
pub mod core;
pub mod error;
pub mod io;
pub mod session;
pub mod types;

// Curated public API surface
// Types
pub use core::params::{AppConfig, ProcessingParams};
pub use core::processing::{ProcessingJob, ProcessingReport};
pub use core::query::SearchCriteria;
pub use core::validate::{RawSearchInputs, ValidationErrors};
pub use error::{Error, Result};
pub use types::{NotificationKind, OutputLayers, ProductLevel};

// Clients and engines
pub use io::catalog::{BearerToken, CatalogClient, CatalogError, ProductRecord};
pub use io::geometry::{AreaOfInterest, load_area_of_interest};
pub use io::gpt::GptEngine;
pub use io::http::ReqwestTransport;

// Coordination
pub use session::{Coordinator, Event, Reporter};

// High-level API re-exports
pub use api::{DownloadReport, download_products, process_directory, search_products};
