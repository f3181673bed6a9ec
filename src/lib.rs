//! # pubmed-ris
//!
//! Convert a list of DOIs into RIS records using PubMed metadata.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`models`]: Core data structures (Doi, BibliographicRecord, ResolutionOutcome, RunResult)
//! - [`pipeline`]: Input normalization, per-DOI resolution and RIS output
//! - [`sources`]: The literature index capability and its PubMed implementation
//! - [`utils`]: HTTP client and RIS formatting
//! - [`config`]: Configuration management
//! - [`ui`]: Terminal progress and summaries

pub mod config;
pub mod models;
pub mod pipeline;
pub mod sources;
pub mod ui;
pub mod utils;

// Re-export commonly used types
pub use models::{BibliographicRecord, Doi, ResolutionOutcome, RunResult};
pub use pipeline::{Pipeline, PipelineError};
pub use sources::{LiteratureSource, PubMedSource};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
