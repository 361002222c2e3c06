//! I/O layer: area-of-interest vector files, the HTTP transport, the Copernicus
//! catalog client, and the processing engine boundary with its `gpt` backend.
pub mod geometry;
pub use geometry::{AreaOfInterest, BoundingBox, GeometryError, load_area_of_interest};

pub mod http;
pub use http::{HttpResponse, HttpTransport, ReqwestTransport, TransportError};

pub mod catalog;
pub use catalog::{BearerToken, CatalogClient, CatalogError, ProductRecord};

pub mod engine;
pub use engine::{EngineError, OperatorParams, ParamValue, ProcessingEngine};

pub mod gpt;
pub use gpt::{GptEngine, SnapGraph};
