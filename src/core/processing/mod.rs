pub mod ops;
pub mod pipeline;

pub use pipeline::{ProcessingJob, ProcessingReport, process_directory, process_product};
