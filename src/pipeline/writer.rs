//! Output writing: RIS records file plus the optional miss list.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use super::PipelineError;
use crate::models::{Doi, ResolutionOutcome, RunResult};
use crate::utils::format_ris_entry;

/// First line of the miss-list file
pub const MISSING_HEADER: &str = "Missing_DOIs";

const MISSING_SUFFIX: &str = "_not_found.txt";

/// Miss-list path for a records path: `out.ris` -> `out_not_found.txt`
pub fn missing_path_for(records_path: &Path) -> PathBuf {
    let stem = records_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    records_path.with_file_name(format!("{}{}", stem, MISSING_SUFFIX))
}

/// Streams found records to the records file and collects misses.
///
/// The records file is truncated on creation and each block is flushed as soon as it is
/// written. [`RisWriter::finish`] writes the miss list only when something missed.
#[derive(Debug)]
pub struct RisWriter {
    out: BufWriter<File>,
    records_path: PathBuf,
    records: Vec<String>,
    missing: Vec<Doi>,
}

impl RisWriter {
    /// Create (or truncate) the records file
    pub fn create(records_path: &Path) -> Result<Self, PipelineError> {
        let file = File::create(records_path).map_err(|source| PipelineError::Io {
            path: records_path.to_path_buf(),
            source,
        })?;

        Ok(Self {
            out: BufWriter::new(file),
            records_path: records_path.to_path_buf(),
            records: Vec::new(),
            missing: Vec::new(),
        })
    }

    /// Record one outcome: found records are appended, everything else is a miss
    pub fn record(&mut self, outcome: &ResolutionOutcome) -> Result<(), PipelineError> {
        match outcome {
            ResolutionOutcome::Found(record) => {
                let entry = format_ris_entry(record);
                self.write_block(&entry)?;
                self.records.push(entry);
            }
            ResolutionOutcome::NotFound(doi) | ResolutionOutcome::Error(doi, _) => {
                self.missing.push(doi.clone());
            }
        }
        Ok(())
    }

    fn write_block(&mut self, entry: &str) -> Result<(), PipelineError> {
        self.out
            .write_all(entry.as_bytes())
            .and_then(|_| self.out.write_all(b"\n\n"))
            .and_then(|_| self.out.flush())
            .map_err(|source| PipelineError::Io {
                path: self.records_path.clone(),
                source,
            })
    }

    /// Flush the records file and write the miss list if any DOI missed.
    ///
    /// With no misses, a miss list left over from an earlier run is removed, so the file
    /// exists exactly when the latest run had misses.
    pub fn finish(mut self) -> Result<RunResult, PipelineError> {
        self.out.flush().map_err(|source| PipelineError::Io {
            path: self.records_path.clone(),
            source,
        })?;

        let missing_path = missing_path_for(&self.records_path);
        let written = if self.missing.is_empty() {
            remove_stale(&missing_path)?;
            None
        } else {
            write_missing(&missing_path, &self.missing)?;
            Some(missing_path)
        };

        Ok(RunResult {
            records: self.records,
            missing: self.missing,
            records_path: self.records_path,
            missing_path: written,
        })
    }
}

fn write_missing(path: &Path, missing: &[Doi]) -> Result<(), PipelineError> {
    let io_err = |source: std::io::Error| PipelineError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut out = BufWriter::new(File::create(path).map_err(io_err)?);
    writeln!(out, "{}", MISSING_HEADER).map_err(io_err)?;
    for doi in missing {
        writeln!(out, "{}", doi).map_err(io_err)?;
    }
    out.flush().map_err(io_err)
}

fn remove_stale(path: &Path) -> Result<(), PipelineError> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            tracing::debug!(path = %path.display(), "removed stale miss list");
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(PipelineError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Write a complete list of outcomes in one go
pub fn write_outcomes<'a, I>(outcomes: I, records_path: &Path) -> Result<RunResult, PipelineError>
where
    I: IntoIterator<Item = &'a ResolutionOutcome>,
{
    let mut writer = RisWriter::create(records_path)?;
    for outcome in outcomes {
        writer.record(outcome)?;
    }
    writer.finish()
}
