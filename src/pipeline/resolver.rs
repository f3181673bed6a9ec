//! Metadata resolution: one DOI -> one outcome.

use std::sync::Arc;
use std::time::Duration;

use crate::config::RunConfig;
use crate::models::{BibliographicRecord, Doi, ResolutionError, ResolutionOutcome};
use crate::sources::LiteratureSource;

/// Field-restricted search term for a DOI, e.g. `10.1000/abc999[DOI]`
pub fn search_term(doi: &Doi) -> String {
    format!("{}[DOI]", doi)
}

/// Resolves DOIs against a literature source, one at a time.
///
/// Every call to [`Resolver::resolve`] ends with a fixed pause, whatever the outcome.
#[derive(Debug, Clone)]
pub struct Resolver {
    source: Arc<dyn LiteratureSource>,
    delay: Duration,
}

impl Resolver {
    /// Create a resolver paced by the run configuration
    pub fn new(source: Arc<dyn LiteratureSource>, config: &RunConfig) -> Self {
        Self::with_delay(source, config.delay)
    }

    /// Create a resolver with an explicit pause after each attempt
    pub fn with_delay(source: Arc<dyn LiteratureSource>, delay: Duration) -> Self {
        Self { source, delay }
    }

    /// The source being queried
    pub fn source(&self) -> &dyn LiteratureSource {
        self.source.as_ref()
    }

    /// Resolve one DOI. Never fails: source errors become [`ResolutionOutcome::Error`].
    #[tracing::instrument(skip(self, doi), fields(doi = %doi, source = self.source.id()))]
    pub async fn resolve(&self, doi: &Doi) -> ResolutionOutcome {
        let outcome = self.lookup(doi).await;

        match &outcome {
            ResolutionOutcome::Found(_) => tracing::debug!("record found"),
            ResolutionOutcome::NotFound(_) => tracing::info!("no metadata found"),
            ResolutionOutcome::Error(_, err) => tracing::warn!(error = %err, "lookup failed"),
        }

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        outcome
    }

    async fn lookup(&self, doi: &Doi) -> ResolutionOutcome {
        let ids = match self.source.search(&search_term(doi)).await {
            Ok(ids) => ids,
            Err(err) => return ResolutionOutcome::Error(doi.clone(), err.into()),
        };

        // Only the first hit is used
        let Some(id) = ids.first() else {
            return ResolutionOutcome::NotFound(doi.clone());
        };

        let summaries = match self.source.summary(id).await {
            Ok(summaries) => summaries,
            Err(err) => return ResolutionOutcome::Error(doi.clone(), err.into()),
        };

        match summaries.first() {
            Some(summary) => {
                ResolutionOutcome::Found(BibliographicRecord::from_summary(doi, summary))
            }
            None => ResolutionOutcome::Error(
                doi.clone(),
                ResolutionError::MalformedResponse(format!("empty summary for id {}", id)),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::mock::make_summary;
    use crate::sources::MockSource;

    fn resolver(source: &Arc<MockSource>) -> Resolver {
        Resolver::with_delay(source.clone(), Duration::ZERO)
    }

    #[test]
    fn test_search_term() {
        assert_eq!(search_term(&Doi::new("10.1000/abc999")), "10.1000/abc999[DOI]");
        assert_eq!(search_term(&Doi::new("")), "[DOI]");
    }

    #[tokio::test]
    async fn test_resolve_found() {
        let source = Arc::new(MockSource::new().with_hit(
            "10.1000/abc999",
            "12345",
            make_summary("Example Study", "J Test", "5", "10-20", "2021 Jan"),
        ));

        let outcome = resolver(&source).resolve(&Doi::new("10.1000/abc999")).await;

        match outcome {
            ResolutionOutcome::Found(record) => {
                assert_eq!(record.title, "Example Study");
                assert_eq!(record.year, "2021");
                assert_eq!(record.doi.as_str(), "10.1000/abc999");
            }
            other => panic!("expected Found, got {:?}", other),
        }
        assert_eq!(
            source.calls(),
            vec!["search:10.1000/abc999[DOI]".to_string(), "summary:12345".to_string()]
        );
    }

    #[tokio::test]
    async fn test_resolve_not_found_skips_summary() {
        let source = Arc::new(MockSource::new());
        let outcome = resolver(&source).resolve(&Doi::new("10.1000/xyz123")).await;

        assert_eq!(outcome, ResolutionOutcome::NotFound(Doi::new("10.1000/xyz123")));
        assert_eq!(source.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_resolve_uses_first_id_only() {
        let source = Arc::new(MockSource::new());
        source.set_search("10.1/multi[DOI]", vec!["111".to_string(), "222".to_string()]);
        source.set_summary("111", vec![make_summary("First", "J", "1", "1", "2001")]);
        source.set_summary("222", vec![make_summary("Second", "J", "2", "2", "2002")]);

        let outcome = resolver(&source).resolve(&Doi::new("10.1/multi")).await;

        match outcome {
            ResolutionOutcome::Found(record) => assert_eq!(record.title, "First"),
            other => panic!("expected Found, got {:?}", other),
        }
        assert!(!source.calls().contains(&"summary:222".to_string()));
    }

    #[tokio::test]
    async fn test_resolve_search_failure_is_transient() {
        let source = Arc::new(MockSource::new());
        source.fail_search("10.1/down[DOI]", "connection reset");

        let outcome = resolver(&source).resolve(&Doi::new("10.1/down")).await;
        assert!(matches!(
            outcome,
            ResolutionOutcome::Error(_, ResolutionError::Transient(_))
        ));
    }

    #[tokio::test]
    async fn test_resolve_malformed_summary() {
        let source = Arc::new(MockSource::new());
        source.set_search("10.1/bad[DOI]", vec!["9".to_string()]);
        source.malformed_summary("9", "unexpected body");

        let outcome = resolver(&source).resolve(&Doi::new("10.1/bad")).await;
        assert!(matches!(
            outcome,
            ResolutionOutcome::Error(_, ResolutionError::MalformedResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_resolve_empty_summary_is_malformed() {
        let source = Arc::new(MockSource::new());
        source.set_search("10.1/none[DOI]", vec!["5".to_string()]);

        let outcome = resolver(&source).resolve(&Doi::new("10.1/none")).await;
        match outcome {
            ResolutionOutcome::Error(doi, ResolutionError::MalformedResponse(msg)) => {
                assert_eq!(doi.as_str(), "10.1/none");
                assert!(msg.contains('5'));
            }
            other => panic!("expected malformed error, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_resolve_waits_after_every_attempt() {
        let source = Arc::new(MockSource::new());
        let resolver = Resolver::with_delay(source.clone(), Duration::from_millis(300));

        let start = tokio::time::Instant::now();
        resolver.resolve(&Doi::new("10.1/a")).await;
        resolver.resolve(&Doi::new("10.1/b")).await;

        assert!(start.elapsed() >= Duration::from_millis(600));
    }

    #[test]
    fn test_new_uses_run_config_delay() {
        let source: Arc<dyn LiteratureSource> = Arc::new(MockSource::new());
        let resolver = Resolver::new(source, &RunConfig::default());
        assert_eq!(resolver.delay, Duration::from_millis(300));
        assert_eq!(resolver.source().id(), "mock");
    }
}
