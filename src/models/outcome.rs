//! Per-DOI resolution outcomes and the aggregate result of a run.

use std::path::PathBuf;

use super::record::{BibliographicRecord, Doi};

/// Why a DOI could not be resolved.
///
/// Both kinds are written to the miss list; the distinction only matters for logs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolutionError {
    /// Network failure, timeout, rate limit or error status from the service
    #[error("transient failure: {0}")]
    Transient(String),

    /// The service answered, but not in a shape we understand
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

/// Result of resolving one DOI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionOutcome {
    /// The index returned a record for this DOI
    Found(BibliographicRecord),

    /// The search returned no identifiers
    NotFound(Doi),

    /// The lookup failed; treated as a miss for output purposes
    Error(Doi, ResolutionError),
}

impl ResolutionOutcome {
    /// The DOI this outcome belongs to
    pub fn doi(&self) -> &Doi {
        match self {
            ResolutionOutcome::Found(record) => &record.doi,
            ResolutionOutcome::NotFound(doi) | ResolutionOutcome::Error(doi, _) => doi,
        }
    }

    /// Whether a record was found
    pub fn is_found(&self) -> bool {
        matches!(self, ResolutionOutcome::Found(_))
    }
}

/// Everything one run produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunResult {
    /// Formatted RIS blocks, in input order
    pub records: Vec<String>,

    /// DOIs that were not found or failed, in input order
    pub missing: Vec<Doi>,

    /// Where the records were written
    pub records_path: PathBuf,

    /// Where the miss list was written, if any DOI missed
    pub missing_path: Option<PathBuf>,
}

impl RunResult {
    /// Number of resolved DOIs
    pub fn found_count(&self) -> usize {
        self.records.len()
    }

    /// Number of unresolved DOIs
    pub fn missing_count(&self) -> usize {
        self.missing.len()
    }

    /// Number of DOIs processed
    pub fn total(&self) -> usize {
        self.found_count() + self.missing_count()
    }

    /// Whether every DOI resolved
    pub fn all_found(&self) -> bool {
        self.missing.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RecordBuilder;

    #[test]
    fn test_outcome_doi() {
        let found = ResolutionOutcome::Found(RecordBuilder::new("10.1/a").build());
        let missing = ResolutionOutcome::NotFound(Doi::new("10.1/b"));
        let failed = ResolutionOutcome::Error(
            Doi::new("10.1/c"),
            ResolutionError::Transient("timeout".to_string()),
        );

        assert_eq!(found.doi().as_str(), "10.1/a");
        assert_eq!(missing.doi().as_str(), "10.1/b");
        assert_eq!(failed.doi().as_str(), "10.1/c");
        assert!(found.is_found());
        assert!(!missing.is_found());
        assert!(!failed.is_found());
    }

    #[test]
    fn test_run_result_counts() {
        let result = RunResult {
            records: vec!["block".to_string()],
            missing: vec![Doi::new("10.1/x"), Doi::new("10.1/y")],
            ..Default::default()
        };

        assert_eq!(result.found_count(), 1);
        assert_eq!(result.missing_count(), 2);
        assert_eq!(result.total(), 3);
        assert!(!result.all_found());
        assert!(RunResult::default().all_found());
    }

    #[test]
    fn test_resolution_error_display() {
        let err = ResolutionError::MalformedResponse("empty summary".to_string());
        assert_eq!(err.to_string(), "malformed response: empty summary");
    }
}
