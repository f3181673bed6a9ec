//! PubMed source implementation using the E-utilities API.
//!
//! Two endpoints are used:
//!
//! - `esearch.fcgi` (XML) turns a search term into a list of PMIDs
//! - `esummary.fcgi` (JSON, version 2.0) returns the document summary for one PMID

use async_trait::async_trait;
use quick_xml::de::from_str;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::config::PubMedConfig;
use crate::models::DocumentSummary;
use crate::sources::{LiteratureSource, SourceError};
use crate::utils::HttpClient;

/// NCBI E-utilities base URL
pub const DEFAULT_EUTILS_BASE_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils";

const DATABASE: &str = "pubmed";

/// PubMed source
///
/// Uses NCBI E-utilities for searching and summarising PubMed records.
#[derive(Debug, Clone)]
pub struct PubMedSource {
    client: Arc<HttpClient>,
    base_url: String,
    tool: String,
    email: Option<String>,
    api_key: Option<String>,
}

impl PubMedSource {
    /// Create a new PubMed source with its own HTTP client
    pub fn new(config: &PubMedConfig, timeout: Duration) -> Result<Self, SourceError> {
        Ok(Self::with_client(Arc::new(HttpClient::new(timeout)?), config))
    }

    /// Create with a custom HTTP client
    pub fn with_client(client: Arc<HttpClient>, config: &PubMedConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            tool: config.tool.clone(),
            email: config.email.clone(),
            api_key: config.api_key.clone(),
        }
    }

    /// Parameters NCBI wants on every request
    fn identity_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("tool", self.tool.clone())];
        if let Some(email) = &self.email {
            params.push(("email", email.clone()));
        }
        if let Some(api_key) = &self.api_key {
            params.push(("api_key", api_key.clone()));
        }
        params
    }

    fn build_url(&self, endpoint: &str, mut params: Vec<(&'static str, String)>) -> String {
        params.extend(self.identity_params());
        let query = params
            .iter()
            .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");

        format!("{}/{}?{}", self.base_url, endpoint, query)
    }

    /// Build E-utilities search URL
    fn build_search_url(&self, term: &str) -> String {
        self.build_url(
            "esearch.fcgi",
            vec![
                ("db", DATABASE.to_string()),
                ("term", term.to_string()),
                ("retmode", "xml".to_string()),
            ],
        )
    }

    /// Build E-utilities summary URL for a single PubMed ID
    fn build_summary_url(&self, id: &str) -> String {
        self.build_url(
            "esummary.fcgi",
            vec![
                ("db", DATABASE.to_string()),
                ("id", id.to_string()),
                ("retmode", "json".to_string()),
                ("version", "2.0".to_string()),
            ],
        )
    }

    /// Parse E-utilities search response XML
    fn parse_search_response(xml: &str) -> Result<Vec<String>, SourceError> {
        #[derive(Debug, Deserialize)]
        #[allow(non_snake_case)]
        struct ESearchResult {
            IdList: Option<IdList>,
            ERROR: Option<String>,
        }

        #[derive(Debug, Deserialize)]
        struct IdList {
            #[serde(rename = "Id", default)]
            ids: Vec<String>,
        }

        let result: ESearchResult = from_str(xml)
            .map_err(|e| SourceError::Parse(format!("Failed to parse PubMed search XML: {}", e)))?;

        if let Some(error) = result.ERROR {
            return Err(SourceError::Api(format!("PubMed search error: {}", error)));
        }

        let ids = result.IdList.map(|list| list.ids).unwrap_or_default();
        Ok(ids
            .into_iter()
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .collect())
    }

    /// Parse E-utilities summary response JSON
    fn parse_summary_response(json: &str) -> Result<Vec<DocumentSummary>, SourceError> {
        #[derive(Debug, Deserialize)]
        struct ESummaryResponse {
            #[serde(default)]
            error: Option<String>,
            #[serde(default)]
            esummaryresult: Option<Vec<String>>,
            #[serde(default)]
            result: Option<HashMap<String, serde_json::Value>>,
        }

        #[derive(Debug, Deserialize)]
        struct DocSum {
            #[serde(default)]
            title: Option<String>,
            #[serde(default)]
            fulljournalname: Option<String>,
            #[serde(default)]
            volume: Option<String>,
            #[serde(default)]
            pages: Option<String>,
            #[serde(default)]
            pubdate: Option<String>,
            #[serde(default)]
            error: Option<String>,
        }

        let response: ESummaryResponse = serde_json::from_str(json).map_err(|e| {
            SourceError::Parse(format!("Failed to parse PubMed summary JSON: {}", e))
        })?;

        if let Some(error) = response.error {
            return Err(SourceError::Api(format!("PubMed summary error: {}", error)));
        }
        if let Some(messages) = response.esummaryresult {
            return Err(SourceError::Api(format!(
                "PubMed summary error: {}",
                messages.join("; ")
            )));
        }

        let mut result = response
            .result
            .ok_or_else(|| SourceError::Parse("PubMed summary has no result object".to_string()))?;

        let uids: Vec<String> = match result.remove("uids") {
            Some(value) => serde_json::from_value(value)?,
            None => return Err(SourceError::Parse("PubMed summary has no uids".to_string())),
        };

        let mut summaries = Vec::with_capacity(uids.len());
        for uid in uids {
            let value = result.remove(&uid).ok_or_else(|| {
                SourceError::Parse(format!("PubMed summary is missing document {}", uid))
            })?;
            let doc: DocSum = serde_json::from_value(value)?;

            if let Some(error) = doc.error {
                return Err(SourceError::Api(format!("PubMed summary for {}: {}", uid, error)));
            }

            summaries.push(DocumentSummary {
                title: doc.title,
                full_journal_name: doc.fulljournalname,
                volume: doc.volume,
                pages: doc.pages,
                pub_date: doc.pubdate,
            });
        }

        Ok(summaries)
    }

    async fn fetch_text(&self, url: &str, what: &str) -> Result<String, SourceError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                SourceError::Timeout(format!("PubMed {} timed out: {}", what, e))
            } else {
                SourceError::Network(format!("Failed to {} PubMed: {}", what, e))
            }
        })?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            tracing::debug!("PubMed API rate-limited during {}", what);
            return Err(SourceError::RateLimit);
        }
        if !status.is_success() {
            return Err(SourceError::Api(format!(
                "PubMed API returned status: {}",
                status
            )));
        }

        response
            .text()
            .await
            .map_err(|e| SourceError::Network(format!("Failed to read response: {}", e)))
    }
}

#[async_trait]
impl LiteratureSource for PubMedSource {
    fn id(&self) -> &str {
        "pubmed"
    }

    fn name(&self) -> &str {
        "PubMed"
    }

    async fn search(&self, term: &str) -> Result<Vec<String>, SourceError> {
        tracing::debug!(term, "PubMed esearch");
        let url = self.build_search_url(term);
        let xml = self.fetch_text(&url, "search").await?;
        Self::parse_search_response(&xml)
    }

    async fn summary(&self, id: &str) -> Result<Vec<DocumentSummary>, SourceError> {
        tracing::debug!(id, "PubMed esummary");
        let url = self.build_summary_url(id);
        let json = self.fetch_text(&url, "summarise").await?;
        Self::parse_summary_response(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Doi, ResolutionError, ResolutionOutcome};
    use crate::pipeline::Resolver;
    use mockito::Matcher;

    const SEARCH_HIT: &str = r#"<?xml version="1.0" encoding="UTF-8" ?>
<!DOCTYPE eSearchResult PUBLIC "-//NLM//DTD esearch 20060628//EN" "https://eutils.ncbi.nlm.nih.gov/eutils/dtd/20060628/esearch.dtd">
<eSearchResult><Count>2</Count><RetMax>2</RetMax><RetStart>0</RetStart><IdList>
<Id>12345</Id>
<Id>67890</Id>
</IdList><TranslationSet/><QueryTranslation>10.1000/abc999[DOI]</QueryTranslation></eSearchResult>
"#;

    const SEARCH_EMPTY: &str = r#"<?xml version="1.0" encoding="UTF-8" ?>
<eSearchResult><Count>0</Count><RetMax>0</RetMax><RetStart>0</RetStart><IdList/><TranslationSet/><QueryTranslation>(10.1000/xyz123[DOI])</QueryTranslation><ErrorList><PhraseNotFound>10.1000/xyz123[DOI]</PhraseNotFound></ErrorList></eSearchResult>
"#;

    const SEARCH_ERROR: &str = r#"<?xml version="1.0" encoding="UTF-8" ?>
<eSearchResult><ERROR>Empty term and query_key - nothing todo</ERROR></eSearchResult>
"#;

    const SUMMARY_HIT: &str = r#"{
  "header": {"type": "esummary", "version": "0.3"},
  "result": {
    "uids": ["12345"],
    "12345": {
      "uid": "12345",
      "pubdate": "2021 Jan",
      "source": "J Test",
      "title": "Example Study",
      "volume": "5",
      "issue": "2",
      "pages": "10-20",
      "fulljournalname": "J Test",
      "authors": [{"name": "Doe J", "authtype": "Author"}]
    }
  }
}"#;

    fn test_config(base_url: &str) -> PubMedConfig {
        PubMedConfig {
            email: Some("tester@example.org".to_string()),
            api_key: None,
            tool: "pubmed-ris-tests".to_string(),
            base_url: base_url.to_string(),
        }
    }

    fn source_for(base_url: &str) -> PubMedSource {
        PubMedSource::new(&test_config(base_url), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_build_search_url() {
        let source = source_for(DEFAULT_EUTILS_BASE_URL);
        let url = source.build_search_url("10.1000/abc999[DOI]");

        assert!(url.starts_with("https://eutils.ncbi.nlm.nih.gov/entrez/eutils/esearch.fcgi?"));
        assert!(url.contains("db=pubmed"));
        assert!(url.contains("term=10.1000%2Fabc999%5BDOI%5D"));
        assert!(url.contains("retmode=xml"));
        assert!(url.contains("tool=pubmed-ris-tests"));
        assert!(url.contains("email=tester%40example.org"));
        assert!(!url.contains("api_key"));
    }

    #[test]
    fn test_build_summary_url_with_api_key() {
        let mut config = test_config("https://example.org/eutils/");
        config.api_key = Some("secret".to_string());
        let source = PubMedSource::new(&config, Duration::from_secs(5)).unwrap();

        let url = source.build_summary_url("12345");
        assert!(url.starts_with("https://example.org/eutils/esummary.fcgi?"));
        assert!(url.contains("id=12345"));
        assert!(url.contains("retmode=json"));
        assert!(url.contains("version=2.0"));
        assert!(url.contains("api_key=secret"));
    }

    #[test]
    fn test_parse_search_response() {
        let ids = PubMedSource::parse_search_response(SEARCH_HIT).unwrap();
        assert_eq!(ids, vec!["12345".to_string(), "67890".to_string()]);
    }

    #[test]
    fn test_parse_search_response_empty() {
        let ids = PubMedSource::parse_search_response(SEARCH_EMPTY).unwrap();
        assert!(ids.is_empty());
    }

    #[test]
    fn test_parse_search_response_error() {
        let result = PubMedSource::parse_search_response(SEARCH_ERROR);
        assert!(matches!(result, Err(SourceError::Api(_))));
    }

    #[test]
    fn test_parse_search_response_garbage() {
        let result = PubMedSource::parse_search_response("<eSearchResult><IdList><Id>1");
        assert!(matches!(result, Err(SourceError::Parse(_))));
    }

    #[test]
    fn test_parse_summary_response() {
        let summaries = PubMedSource::parse_summary_response(SUMMARY_HIT).unwrap();
        assert_eq!(summaries.len(), 1);

        let summary = &summaries[0];
        assert_eq!(summary.title.as_deref(), Some("Example Study"));
        assert_eq!(summary.full_journal_name.as_deref(), Some("J Test"));
        assert_eq!(summary.volume.as_deref(), Some("5"));
        assert_eq!(summary.pages.as_deref(), Some("10-20"));
        assert_eq!(summary.pub_date.as_deref(), Some("2021 Jan"));
    }

    #[test]
    fn test_parse_summary_response_missing_fields() {
        let json = r#"{"result": {"uids": ["1"], "1": {"uid": "1", "title": "Only a title"}}}"#;
        let summaries = PubMedSource::parse_summary_response(json).unwrap();

        assert_eq!(summaries[0].title.as_deref(), Some("Only a title"));
        assert!(summaries[0].volume.is_none());
        assert!(summaries[0].pub_date.is_none());
    }

    #[test]
    fn test_parse_summary_response_errors() {
        let doc_error = r#"{"result": {"uids": ["9"], "9": {"uid": "9", "error": "cannot get document summary"}}}"#;
        assert!(matches!(
            PubMedSource::parse_summary_response(doc_error),
            Err(SourceError::Api(_))
        ));

        let top_error = r#"{"error": "API rate limit exceeded"}"#;
        assert!(matches!(
            PubMedSource::parse_summary_response(top_error),
            Err(SourceError::Api(_))
        ));

        let no_result = r#"{"header": {}}"#;
        assert!(matches!(
            PubMedSource::parse_summary_response(no_result),
            Err(SourceError::Parse(_))
        ));
    }

    #[tokio::test]
    async fn test_search_against_mock_server() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/esearch.fcgi")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("db".into(), "pubmed".into()),
                Matcher::UrlEncoded("term".into(), "10.1000/abc999[DOI]".into()),
                Matcher::UrlEncoded("email".into(), "tester@example.org".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "text/xml")
            .with_body(SEARCH_HIT)
            .create_async()
            .await;

        let source = source_for(&server.url());
        let ids = source.search("10.1000/abc999[DOI]").await.unwrap();

        assert_eq!(ids[0], "12345");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_summary_against_mock_server() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/esummary.fcgi")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("id".into(), "12345".into()),
                Matcher::UrlEncoded("retmode".into(), "json".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(SUMMARY_HIT)
            .create_async()
            .await;

        let source = source_for(&server.url());
        let summaries = source.summary("12345").await.unwrap();

        assert_eq!(summaries[0].title.as_deref(), Some("Example Study"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_rate_limited_status() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/esearch.fcgi")
            .match_query(Matcher::Any)
            .with_status(429)
            .create_async()
            .await;

        let source = source_for(&server.url());
        let result = source.search("10.1/x[DOI]").await;
        assert!(matches!(result, Err(SourceError::RateLimit)));
    }

    #[tokio::test]
    async fn test_server_error_status() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/esummary.fcgi")
            .match_query(Matcher::Any)
            .with_status(502)
            .create_async()
            .await;

        let source = source_for(&server.url());
        let result = source.summary("1").await;
        assert!(matches!(result, Err(SourceError::Api(_))));
    }

    #[tokio::test]
    async fn test_silent_server_times_out() {
        // Accepts connections and never answers
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let _server = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let config = test_config(&format!("http://{}", addr));
        let source = PubMedSource::new(&config, Duration::from_millis(200)).unwrap();

        let result = source.search("10.1000/slow[DOI]").await;
        assert!(matches!(result, Err(SourceError::Timeout(_))), "got {:?}", result);

        let resolver = Resolver::with_delay(Arc::new(source), Duration::ZERO);
        match resolver.resolve(&Doi::new("10.1000/slow")).await {
            ResolutionOutcome::Error(doi, ResolutionError::Transient(_)) => {
                assert_eq!(doi.as_str(), "10.1000/slow");
            }
            other => panic!("expected transient error, got {:?}", other),
        }
    }
}
