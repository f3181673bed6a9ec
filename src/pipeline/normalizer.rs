//! Input normalization: tab-separated table -> ordered DOIs.

use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use super::PipelineError;
use crate::models::Doi;

/// Header of the column holding DOIs (matched after trimming)
pub const DOI_COLUMN: &str = "DOI";

/// `http(s)://doi.org/` or `http(s)://dx.doi.org/`, any case, at the start only
#[allow(clippy::expect_used)]
static DOI_URL_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^https?://(?:dx\.)?doi\.org/").expect("DOI prefix regex is valid")
});

/// Strip one leading DOI resolver URL prefix.
///
/// Anything without such a prefix is returned unchanged, including empty and
/// malformed values.
pub fn normalize_doi(raw: &str) -> Doi {
    Doi::new(DOI_URL_PREFIX.replace(raw, ""))
}

/// Read a tab-separated table with a header row and normalize its `DOI` column.
///
/// Rows keep their order; duplicates and empty cells are passed through. Rows shorter
/// than the header yield an empty DOI.
pub fn normalize_table<R: Read>(reader: R) -> Result<Vec<Doi>, PipelineError> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let column = headers
        .iter()
        .position(|h| h == DOI_COLUMN)
        .ok_or_else(|| PipelineError::Schema {
            column: DOI_COLUMN.to_string(),
            found: headers.iter().collect::<Vec<_>>().join(", "),
        })?;

    let mut dois = Vec::new();
    for result in rdr.records() {
        let record = result?;
        dois.push(normalize_doi(record.get(column).unwrap_or("")));
    }

    Ok(dois)
}

/// Read and normalize the DOIs of an input file
pub fn read_dois(path: &Path) -> Result<Vec<Doi>, PipelineError> {
    let file = File::open(path).map_err(|source| PipelineError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let dois = normalize_table(file)?;
    tracing::info!(count = dois.len(), path = %path.display(), "Number of DOIs read");
    Ok(dois)
}
