//! Core data models for DOIs, bibliographic records and resolution outcomes.

mod outcome;
mod record;

pub use outcome::{ResolutionError, ResolutionOutcome, RunResult};
pub use record::{publication_year, BibliographicRecord, Doi, DocumentSummary, RecordBuilder};
