//! Boundary to the external geophysical processing engine.
//!
//! The engine is a black box: it loads a product, applies named operators with a
//! parameter map, and writes the final product to a container format.
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to build processing graph: {0}")]
    Graph(String),
    #[error("Could not launch {program}: {reason}")]
    Launch { program: String, reason: String },
    #[error("Engine exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },
    #[error("Operator {operator} failed: {reason}")]
    Operator { operator: String, reason: String },
}

/// A single operator parameter value
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
}

impl std::fmt::Display for ParamValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParamValue::Int(v) => write!(f, "{}", v),
            ParamValue::Float(v) => write!(f, "{:?}", v),
            ParamValue::Bool(v) => write!(f, "{}", v),
            ParamValue::Text(v) => write!(f, "{}", v),
        }
    }
}

/// Ordered named-parameter map for one operator invocation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OperatorParams {
    entries: Vec<(String, ParamValue)>,
}

impl OperatorParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: ParamValue) -> Self {
        self.put(name, value);
        self
    }

    /// Insert or replace `name`.
    pub fn put(&mut self, name: &str, value: ParamValue) {
        match self.entries.iter_mut().find(|(k, _)| k == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name.to_string(), value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.entries.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Processing engine accessed through product handles.
pub trait ProcessingEngine: Send + Sync {
    /// Opaque handle to a loaded or derived product
    type Product: Send;

    /// Load a product from its metadata descriptor file.
    fn read_product(&self, descriptor: &Path) -> Result<Self::Product, EngineError>;

    /// Apply `operator` to `source`, returning the derived product.
    fn create_product(
        &self,
        operator: &str,
        params: &OperatorParams,
        source: Self::Product,
    ) -> Result<Self::Product, EngineError>;

    /// Persist `product` at `target` in `format`; returns the file actually written.
    fn write_product(
        &self,
        product: Self::Product,
        target: &Path,
        format: &str,
    ) -> Result<PathBuf, EngineError>;
}

/// File extension the engine appends for a container format
pub fn format_extension(format: &str) -> &str {
    match format {
        "BEAM-DIMAP" => "dim",
        "GeoTIFF" | "GeoTIFF-BigTIFF" => "tif",
        "NetCDF4-CF" | "NetCDF4-BEAM" | "NetCDF-CF" | "NetCDF-BEAM" => "nc",
        "ENVI" => "hdr",
        other => other,
    }
}

/// `target` with the format's extension appended (never replacing an existing one).
pub fn written_path(target: &Path, format: &str) -> PathBuf {
    let mut name = target.as_os_str().to_os_string();
    name.push(".");
    name.push(format_extension(format));
    PathBuf::from(name)
}
