//! Utility modules supporting the conversion pipeline.
//!
//! - [`HttpClient`]: shared reqwest client with bounded request and connect timeouts
//! - [`format_ris_entry`]: render a [`crate::models::BibliographicRecord`] as an RIS entry

mod http;
mod ris;

pub use http::{HttpClient, DEFAULT_TIMEOUT};
pub use ris::{format_ris_entry, format_ris_line, RisTag, JOURNAL_ARTICLE};
