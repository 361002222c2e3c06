//! Core building blocks: configuration, input validation, catalog query construction,
//! and the processing pipeline. These are internal primitives consumed by the
//! high-level `api` module and the session coordinator.
pub mod params;
pub mod processing;
pub mod query;
pub mod validate;
