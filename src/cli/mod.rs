//! Command Line Interface (CLI) layer for s2water.
//!
//! This module defines argument parsing (`args`), error types (`errors`),
//! and the orchestration logic (`runner`) that drives the session coordinator
//! for the search, download and processing workflows and prints its events.
//!
//! If you are embedding s2water into another application, prefer using
//! `s2water::api` or `s2water::session` instead of calling the CLI code.
pub mod args;
pub mod errors;
pub mod runner;

pub use args::CliArgs;
pub use runner::run;
