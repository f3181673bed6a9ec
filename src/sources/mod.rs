//! Literature index sources.
//!
//! This module defines the [`LiteratureSource`] trait: the narrow capability the resolver
//! needs from a remote bibliographic index. A source answers two questions:
//!
//! 1. which record identifiers match a search term, and
//! 2. what the summary metadata for one identifier is.
//!
//! [`PubMedSource`] talks to NCBI E-utilities. [`MockSource`] returns canned answers and is
//! what the pipeline tests run against.
//!
//! # NCBI usage policy
//!
//! E-utilities expects every caller to identify itself with a `tool` name and a contact
//! `email`. Both come from [`crate::config::PubMedConfig`]; an `api_key` raises the
//! allowed request rate but is optional.

pub mod mock;
mod pubmed;

pub use mock::MockSource;
pub use pubmed::{PubMedSource, DEFAULT_EUTILS_BASE_URL};

use crate::models::{DocumentSummary, ResolutionError};
use async_trait::async_trait;

/// A remote literature index that can be searched and summarised.
#[async_trait]
pub trait LiteratureSource: Send + Sync + std::fmt::Debug {
    /// Unique identifier for this source (e.g. "pubmed")
    fn id(&self) -> &str;

    /// Human-readable name of this source
    fn name(&self) -> &str;

    /// Search the index, returning matching record identifiers in relevance order
    async fn search(&self, term: &str) -> Result<Vec<String>, SourceError>;

    /// Fetch summary metadata for a single record identifier
    async fn summary(&self, id: &str) -> Result<Vec<DocumentSummary>, SourceError>;
}

/// Errors that can occur when interacting with a source
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// Network or HTTP transport error
    #[error("Network error: {0}")]
    Network(String),

    /// The request did not complete within the configured timeout
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Parsing error (XML or JSON)
    #[error("Parse error: {0}")]
    Parse(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimit,

    /// API error from the source
    #[error("API error: {0}")]
    Api(String),

    /// Other error
    #[error("Error: {0}")]
    Other(String),
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SourceError::Timeout(err.to_string())
        } else {
            SourceError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        SourceError::Parse(format!("JSON: {}", err))
    }
}

impl From<quick_xml::DeError> for SourceError {
    fn from(err: quick_xml::DeError) -> Self {
        SourceError::Parse(format!("XML: {}", err))
    }
}

impl From<SourceError> for ResolutionError {
    fn from(err: SourceError) -> Self {
        match err {
            SourceError::Parse(_) => ResolutionError::MalformedResponse(err.to_string()),
            SourceError::Network(_)
            | SourceError::Timeout(_)
            | SourceError::RateLimit
            | SourceError::Api(_)
            | SourceError::Other(_) => ResolutionError::Transient(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_is_malformed() {
        let err: ResolutionError = SourceError::Parse("bad xml".to_string()).into();
        assert!(matches!(err, ResolutionError::MalformedResponse(_)));
    }

    #[test]
    fn test_network_errors_are_transient() {
        for err in [
            SourceError::Network("refused".to_string()),
            SourceError::Timeout("30s".to_string()),
            SourceError::RateLimit,
            SourceError::Api("status 500".to_string()),
        ] {
            let converted: ResolutionError = err.into();
            assert!(matches!(converted, ResolutionError::Transient(_)));
        }
    }
}
