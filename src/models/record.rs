//! DOI and bibliographic record models.

use std::fmt;

/// A normalized DOI string.
///
/// Created once from an input row and never modified afterwards. The value may be
/// empty or malformed; such DOIs are still resolved (and will simply miss).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Doi(String);

impl Doi {
    /// Wrap an already-normalized DOI string
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The DOI as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the DOI is empty (e.g. an empty input cell)
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Doi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Doi {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// One summary element returned by the literature index for a record id.
///
/// Every field is optional; absent fields map to empty strings in the record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentSummary {
    pub title: Option<String>,
    pub full_journal_name: Option<String>,
    pub volume: Option<String>,
    pub pages: Option<String>,
    pub pub_date: Option<String>,
}

/// A resolved bibliographic record, ready to be written as RIS.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BibliographicRecord {
    /// Article title
    pub title: String,

    /// Full journal name
    pub journal: String,

    /// Journal volume
    pub volume: String,

    /// Page range, as given upstream
    pub pages: String,

    /// Up to four leading characters of the upstream publication date
    pub year: String,

    /// The normalized input DOI (never the index's own identifier)
    pub doi: Doi,
}

impl BibliographicRecord {
    /// Map a summary element onto a record for the given input DOI.
    pub fn from_summary(doi: &Doi, summary: &DocumentSummary) -> Self {
        let field = |value: &Option<String>| value.clone().unwrap_or_default();

        Self {
            title: field(&summary.title),
            journal: field(&summary.full_journal_name),
            volume: field(&summary.volume),
            pages: field(&summary.pages),
            year: summary
                .pub_date
                .as_deref()
                .map(publication_year)
                .unwrap_or_default(),
            doi: doi.clone(),
        }
    }
}

/// First four characters of a raw publication date.
///
/// No validation: `"2021 Jan"` gives `"2021"`, `"Spr"` gives `"Spr"`. Counts characters,
/// so multi-byte input is never split.
pub fn publication_year(raw: &str) -> String {
    raw.chars().take(4).collect()
}

/// Builder for constructing records in tests and fixtures
#[derive(Debug, Clone)]
pub struct RecordBuilder {
    record: BibliographicRecord,
}

impl RecordBuilder {
    /// Start a record for the given DOI
    pub fn new(doi: impl Into<String>) -> Self {
        Self {
            record: BibliographicRecord {
                doi: Doi::new(doi),
                ..Default::default()
            },
        }
    }

    /// Set title
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.record.title = title.into();
        self
    }

    /// Set journal name
    pub fn journal(mut self, journal: impl Into<String>) -> Self {
        self.record.journal = journal.into();
        self
    }

    /// Set volume
    pub fn volume(mut self, volume: impl Into<String>) -> Self {
        self.record.volume = volume.into();
        self
    }

    /// Set page range
    pub fn pages(mut self, pages: impl Into<String>) -> Self {
        self.record.pages = pages.into();
        self
    }

    /// Set year from a raw publication date (truncated like upstream data)
    pub fn pub_date(mut self, raw: &str) -> Self {
        self.record.year = publication_year(raw);
        self
    }

    /// Build the record
    pub fn build(self) -> BibliographicRecord {
        self.record
    }
}
