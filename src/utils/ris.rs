//! RIS record formatting.
//!
//! Each record is eight `XX  - value` lines. The tag is two characters, followed by two
//! spaces, a hyphen and a space; import tools match this byte for byte.

use std::fmt;

use crate::models::BibliographicRecord;

/// The RIS tags this crate emits, in emission order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RisTag {
    /// Reference type
    Type,
    /// Primary title
    Title,
    /// Journal name
    Journal,
    /// Volume
    Volume,
    /// Start page (holds the full page range)
    StartPage,
    /// Publication year
    Year,
    /// DOI
    Doi,
    /// End of reference
    EndOfReference,
}

impl RisTag {
    /// Two-letter tag code
    pub fn code(self) -> &'static str {
        match self {
            RisTag::Type => "TY",
            RisTag::Title => "TI",
            RisTag::Journal => "JO",
            RisTag::Volume => "VL",
            RisTag::StartPage => "SP",
            RisTag::Year => "PY",
            RisTag::Doi => "DO",
            RisTag::EndOfReference => "ER",
        }
    }
}

impl fmt::Display for RisTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Reference type written for every record
pub const JOURNAL_ARTICLE: &str = "JOUR";

/// Format one tag line (no trailing newline)
pub fn format_ris_line(tag: RisTag, value: &str) -> String {
    format!("{}  - {}", tag, value)
}

/// Format a record as an eight-line RIS entry, lines joined by `\n`, no trailing newline.
///
/// Field values are written verbatim.
pub fn format_ris_entry(record: &BibliographicRecord) -> String {
    [
        format_ris_line(RisTag::Type, JOURNAL_ARTICLE),
        format_ris_line(RisTag::Title, &record.title),
        format_ris_line(RisTag::Journal, &record.journal),
        format_ris_line(RisTag::Volume, &record.volume),
        format_ris_line(RisTag::StartPage, &record.pages),
        format_ris_line(RisTag::Year, &record.year),
        format_ris_line(RisTag::Doi, record.doi.as_str()),
        format_ris_line(RisTag::EndOfReference, ""),
    ]
    .join("\n")
}
