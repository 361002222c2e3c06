use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Top-level configuration, suitable for JSON config files. Every field has a default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub catalog: CatalogConfig,
    pub download: DownloadConfig,
    pub processing: ProcessingParams,
    pub engine: EngineConfig,
}

impl AppConfig {
    /// Load a configuration file. Missing fields keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        serde_json::from_str(&text)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }
}

/// Identity and catalog endpoints of the Copernicus Data Space Ecosystem.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub identity_url: String,
    pub client_id: String,
    pub catalog_url: String,
    /// `{id}` is replaced by the product identifier
    pub download_url_template: String,
    pub collection: String,
    /// Results requested per call (`$top`)
    pub page_size: usize,
    /// Upper bound on `@odata.nextLink` pages followed per search
    pub max_pages: usize,
    /// Request timeout; `None` leaves network calls unbounded
    pub timeout_secs: Option<u64>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            identity_url:
                "https://identity.dataspace.copernicus.eu/auth/realms/CDSE/protocol/openid-connect/token"
                    .to_string(),
            client_id: "cdse-public".to_string(),
            catalog_url: "https://catalogue.dataspace.copernicus.eu/odata/v1/Products".to_string(),
            download_url_template:
                "https://catalogue.dataspace.copernicus.eu/odata/v1/Products({id})/$value"
                    .to_string(),
            collection: "SENTINEL-2".to_string(),
            page_size: 100,
            max_pages: 1,
            timeout_secs: None,
        }
    }
}

impl CatalogConfig {
    pub fn download_url(&self, product_id: &str) -> String {
        self.download_url_template.replace("{id}", product_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    pub chunk_size: usize,
    pub max_redirects: usize,
    /// Extension appended to downloaded archives
    pub package_suffix: String,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            chunk_size: 8192,
            max_redirects: 10,
            package_suffix: "zip".to_string(),
        }
    }
}

/// Physical constants passed to the C2RCC retrieval operator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct C2rccParams {
    /// PSU
    pub salinity: f64,
    /// Degrees Celsius
    pub temperature: f64,
    /// Dobson units
    pub ozone: f64,
    /// hPa
    pub pressure: f64,
}

impl Default for C2rccParams {
    fn default() -> Self {
        Self {
            salinity: 35.0,
            temperature: 15.0,
            ozone: 330.0,
            pressure: 1013.0,
        }
    }
}

/// Processing parameters suitable for config files and presets
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingParams {
    /// Directory-name suffix identifying product folders
    pub product_suffix: String,
    /// Metadata descriptor read from inside each product folder
    pub metadata_file: String,
    pub target_resolution: u32,
    pub upsampling: String,
    pub downsampling: String,
    pub resample_on_pyramid_levels: bool,
    /// Name of the Subset operator parameter carrying the AOI vector file
    pub subset_parameter: String,
    pub retrieval_operator: String,
    pub c2rcc: C2rccParams,
    pub output_suffix: String,
    pub output_format: String,
    /// If true, a failing product is recorded and the batch moves on
    pub continue_on_error: bool,
}

impl Default for ProcessingParams {
    fn default() -> Self {
        Self {
            product_suffix: ".SAFE".to_string(),
            metadata_file: "MTD_MSIL1C.xml".to_string(),
            target_resolution: 10,
            upsampling: "Nearest".to_string(),
            downsampling: "First".to_string(),
            resample_on_pyramid_levels: false,
            subset_parameter: "shapefile".to_string(),
            retrieval_operator: "c2rcc.msi".to_string(),
            c2rcc: C2rccParams::default(),
            output_suffix: "_C2RCC".to_string(),
            output_format: "BEAM-DIMAP".to_string(),
            continue_on_error: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// SNAP Graph Processing Tool executable
    pub gpt_path: PathBuf,
    /// Extra arguments placed before the graph file (e.g. `-q 4`, `-c 2G`)
    pub extra_args: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            gpt_path: PathBuf::from("gpt"),
            extra_args: Vec::new(),
        }
    }
}
