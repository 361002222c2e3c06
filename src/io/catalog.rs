//! Client for the Copernicus Data Space identity, OData catalog and download endpoints.
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use reqwest::Url;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, trace};

use crate::core::params::{CatalogConfig, DownloadConfig};
use crate::core::query::{SearchCriteria, build_filter, search_parameters};
use crate::io::http::{HttpResponse, HttpTransport, TransportError};

/// Errors raised while talking to the catalog
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Authentication failed: {0}")]
    Authentication(String),
    #[error("Session rejected by the catalog (HTTP {0}); log in again")]
    Unauthorized(u16),
    #[error("Search failed: {0}")]
    Search(String),
    #[error("Download of {product} failed: {reason}")]
    Download { product: String, reason: String },
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Access token attached to every catalog and download request
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("BearerToken(***)")
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ContentDate {
    #[serde(rename = "Start")]
    pub start: Option<DateTime<Utc>>,
    #[serde(rename = "End")]
    pub end: Option<DateTime<Utc>>,
}

/// One catalog entry. Immutable once fetched.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProductRecord {
    #[serde(rename = "Id")]
    pub id: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "ContentLength", default)]
    pub content_length: Option<u64>,
    #[serde(rename = "ContentDate", default)]
    pub content_date: Option<ContentDate>,
    #[serde(rename = "Online", default)]
    pub online: Option<bool>,
}

impl ProductRecord {
    /// Display name up to its first `.`
    pub fn base_name(&self) -> &str {
        self.name.split('.').next().unwrap_or(&self.name)
    }

    /// Local archive file name, e.g. `S2B_MSIL2A_..._T33UVR_20240503T112233.zip`
    pub fn archive_name(&self, suffix: &str) -> String {
        format!("{}.{}", self.base_name(), suffix)
    }
}

#[derive(Debug, Deserialize)]
struct SearchPage {
    #[serde(default)]
    value: Vec<ProductRecord>,
    #[serde(rename = "@odata.count", default)]
    count: Option<u64>,
    #[serde(rename = "@odata.nextLink", default)]
    next_link: Option<String>,
}

/// Catalog client over an injectable transport
#[derive(Clone)]
pub struct CatalogClient {
    transport: Arc<dyn HttpTransport>,
    config: CatalogConfig,
    download: DownloadConfig,
}

impl std::fmt::Debug for CatalogClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogClient")
            .field("catalog_url", &self.config.catalog_url)
            .finish()
    }
}

fn read_error_text(response: HttpResponse) -> String {
    let status = response.status;
    match response.text() {
        Ok(text) if !text.trim().is_empty() => text,
        _ => format!("HTTP {}", status),
    }
}

impl CatalogClient {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        config: CatalogConfig,
        download: DownloadConfig,
    ) -> Self {
        Self {
            transport,
            config,
            download,
        }
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    pub fn download_config(&self) -> &DownloadConfig {
        &self.download
    }

    /// Exchange credentials for a bearer token (password grant).
    pub fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<BearerToken, CatalogError> {
        let form = [
            ("client_id", self.config.client_id.as_str()),
            ("username", username),
            ("password", password),
            ("grant_type", "password"),
        ];
        let response = self.transport.post_form(&self.config.identity_url, &form)?;
        if !response.is_success() {
            return Err(CatalogError::Authentication(read_error_text(response)));
        }
        let body = response
            .text()
            .map_err(|e| CatalogError::Authentication(e.to_string()))?;
        let token: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| CatalogError::Authentication(format!("malformed token response: {}", e)))?;
        info!("Authenticated as {}", username);
        Ok(BearerToken::new(token.access_token))
    }

    /// Run a catalog search. An empty result is `Ok(vec![])`, not an error.
    pub fn search(
        &self,
        token: &BearerToken,
        criteria: &SearchCriteria,
        aoi_wkt: &str,
    ) -> Result<Vec<ProductRecord>, CatalogError> {
        let filter = build_filter(&self.config.collection, criteria, aoi_wkt);
        debug!("Catalog filter: {}", filter);

        let mut products = Vec::new();
        let mut next: Option<String> = None;
        for page in 0..self.config.max_pages.max(1) {
            let response = match &next {
                None => self.transport.get_with_bearer(
                    &self.config.catalog_url,
                    &search_parameters(&filter, self.config.page_size),
                    token.as_str(),
                )?,
                Some(link) => self.transport.get_with_bearer(link, &[], token.as_str())?,
            };
            info!("HTTP status: {}", response.status);
            if matches!(response.status, 401 | 403) {
                return Err(CatalogError::Unauthorized(response.status));
            }
            if !response.is_success() {
                return Err(CatalogError::Search(read_error_text(response)));
            }
            let body = response
                .text()
                .map_err(|e| CatalogError::Search(e.to_string()))?;
            let parsed: SearchPage = serde_json::from_str(&body)
                .map_err(|e| CatalogError::Search(format!("malformed catalog response: {}", e)))?;
            if page == 0 {
                if let Some(count) = parsed.count {
                    debug!("Catalog reports {} matching products", count);
                }
            }
            products.extend(parsed.value);
            match parsed.next_link {
                Some(link) => next = Some(link),
                None => break,
            }
        }
        Ok(products)
    }

    /// Request `url`, re-issuing the request with the bearer header at every redirect hop.
    pub fn resolve_content(
        &self,
        token: &BearerToken,
        url: &str,
    ) -> Result<HttpResponse, CatalogError> {
        let mut current = url.to_string();
        let mut hops = 0;
        loop {
            let response = self.transport.get_with_bearer(&current, &[], token.as_str())?;
            if !response.is_redirect() {
                return Ok(response);
            }
            hops += 1;
            if hops > self.download.max_redirects {
                return Err(CatalogError::Download {
                    product: url.to_string(),
                    reason: format!("more than {} redirects", self.download.max_redirects),
                });
            }
            let location = response.location.clone().ok_or_else(|| CatalogError::Download {
                product: url.to_string(),
                reason: format!("HTTP {} without Location header", response.status),
            })?;
            current = resolve_location(&current, &location).map_err(|reason| {
                CatalogError::Download {
                    product: url.to_string(),
                    reason,
                }
            })?;
            trace!("Redirect {} -> {}", response.status, current);
        }
    }

    /// Download one product into `folder` and return the written path.
    ///
    /// A partially written file is removed when streaming fails.
    pub fn download_product(
        &self,
        token: &BearerToken,
        product: &ProductRecord,
        folder: &Path,
    ) -> Result<PathBuf, CatalogError> {
        let url = self.config.download_url(&product.id);
        let response = self.resolve_content(token, &url)?;
        if matches!(response.status, 401 | 403) {
            return Err(CatalogError::Unauthorized(response.status));
        }
        if !response.is_success() {
            let status = response.status;
            return Err(CatalogError::Download {
                product: product.name.clone(),
                reason: format!("HTTP {}: {}", status, read_error_text(response)),
            });
        }

        let path = folder.join(product.archive_name(&self.download.package_suffix));
        let written = stream_to_file(response.body, &path, self.download.chunk_size);
        match written {
            Ok(bytes) => {
                debug!("Wrote {} bytes to {:?}", bytes, path);
                Ok(path)
            }
            Err(e) => {
                // Best-effort cleanup
                let _ = std::fs::remove_file(&path);
                Err(CatalogError::Download {
                    product: product.name.clone(),
                    reason: e.to_string(),
                })
            }
        }
    }
}

fn resolve_location(current: &str, location: &str) -> Result<String, String> {
    let base = Url::parse(current).map_err(|e| format!("invalid URL {}: {}", current, e))?;
    base.join(location)
        .map(|u| u.to_string())
        .map_err(|e| format!("invalid redirect target {}: {}", location, e))
}

/// Copy `body` to `path` in `chunk_size` pieces, returning the byte count.
pub fn stream_to_file(
    mut body: Box<dyn Read + Send>,
    path: &Path,
    chunk_size: usize,
) -> std::io::Result<u64> {
    let mut file = File::create(path)?;
    let mut buf = vec![0u8; chunk_size.max(1)];
    let mut total = 0u64;
    loop {
        let n = match body.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        file.write_all(&buf[..n])?;
        total += n as u64;
    }
    file.flush()?;
    Ok(total)
}
