//! Mock source for testing purposes.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::models::DocumentSummary;
use crate::sources::{LiteratureSource, SourceError};

#[derive(Debug, Clone)]
enum Reply<T> {
    Ok(T),
    Network(String),
    Malformed(String),
}

impl<T: Clone> Reply<T> {
    fn to_result(&self) -> Result<T, SourceError> {
        match self {
            Reply::Ok(value) => Ok(value.clone()),
            Reply::Network(msg) => Err(SourceError::Network(msg.clone())),
            Reply::Malformed(msg) => Err(SourceError::Parse(msg.clone())),
        }
    }
}

/// A mock source that returns predefined responses.
///
/// Unknown search terms return no ids and unknown ids return an empty summary list.
/// Every call is recorded so tests can assert on the exact request sequence.
#[derive(Debug, Default)]
pub struct MockSource {
    searches: Mutex<HashMap<String, Reply<Vec<String>>>>,
    summaries: Mutex<HashMap<String, Reply<Vec<DocumentSummary>>>>,
    calls: Mutex<Vec<String>>,
}

impl MockSource {
    /// Create a new mock source with no canned responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a DOI that resolves to `id` with the given summary.
    pub fn with_hit(self, doi: &str, id: &str, summary: DocumentSummary) -> Self {
        self.set_search(&format!("{}[DOI]", doi), vec![id.to_string()]);
        self.set_summary(id, vec![summary]);
        self
    }

    /// Set the ids returned for a search term.
    pub fn set_search(&self, term: &str, ids: Vec<String>) {
        let mut guard = self.searches.lock().unwrap();
        guard.insert(term.to_string(), Reply::Ok(ids));
    }

    /// Make a search term fail with a network error.
    pub fn fail_search(&self, term: &str, message: &str) {
        let mut guard = self.searches.lock().unwrap();
        guard.insert(term.to_string(), Reply::Network(message.to_string()));
    }

    /// Set the summary elements returned for an id.
    pub fn set_summary(&self, id: &str, summaries: Vec<DocumentSummary>) {
        let mut guard = self.summaries.lock().unwrap();
        guard.insert(id.to_string(), Reply::Ok(summaries));
    }

    /// Make the summary for an id fail with a parse error.
    pub fn malformed_summary(&self, id: &str, message: &str) {
        let mut guard = self.summaries.lock().unwrap();
        guard.insert(id.to_string(), Reply::Malformed(message.to_string()));
    }

    /// Calls made so far, as `search:<term>` and `summary:<id>` entries.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record_call(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl LiteratureSource for MockSource {
    fn id(&self) -> &str {
        "mock"
    }

    fn name(&self) -> &str {
        "Mock Source"
    }

    async fn search(&self, term: &str) -> Result<Vec<String>, SourceError> {
        self.record_call(format!("search:{}", term));
        let guard = self.searches.lock().unwrap();
        match guard.get(term) {
            Some(reply) => reply.to_result(),
            None => Ok(Vec::new()),
        }
    }

    async fn summary(&self, id: &str) -> Result<Vec<DocumentSummary>, SourceError> {
        self.record_call(format!("summary:{}", id));
        let guard = self.summaries.lock().unwrap();
        match guard.get(id) {
            Some(reply) => reply.to_result(),
            None => Ok(Vec::new()),
        }
    }
}

/// Helper function to create a summary for testing.
pub fn make_summary(
    title: &str,
    journal: &str,
    volume: &str,
    pages: &str,
    pub_date: &str,
) -> DocumentSummary {
    DocumentSummary {
        title: Some(title.to_string()),
        full_journal_name: Some(journal.to_string()),
        volume: Some(volume.to_string()),
        pages: Some(pages.to_string()),
        pub_date: Some(pub_date.to_string()),
    }
}
