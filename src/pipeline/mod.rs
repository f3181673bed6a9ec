//! The DOI -> RIS conversion pipeline.
//!
//! Three stages run in a fixed order, each consuming only the previous stage's output:
//!
//! 1. [`normalizer`] reads the input table and yields normalized [`Doi`]s
//! 2. [`resolver`] turns each DOI into a [`ResolutionOutcome`] (search, then summary)
//! 3. [`writer`] appends found records to the RIS file and collects misses
//!
//! Only a missing `DOI` column, an unreadable input or an unwritable output stop a run.
//! Per-DOI failures end up on the miss list.

pub mod normalizer;
pub mod resolver;
pub mod writer;

pub use normalizer::{normalize_doi, normalize_table, read_dois, DOI_COLUMN};
pub use resolver::{search_term, Resolver};
pub use writer::{missing_path_for, write_outcomes, RisWriter, MISSING_HEADER};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::RunConfig;
use crate::models::{Doi, ResolutionOutcome, RunResult};
use crate::sources::LiteratureSource;

/// Fatal pipeline errors
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The input table has no `DOI` column
    #[error("Missing required column '{column}' in input (found: {found})")]
    Schema { column: String, found: String },

    /// The input is not a readable tab-separated table
    #[error("Failed to read input table: {0}")]
    Input(#[from] csv::Error),

    /// A file could not be opened or written
    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Progress callbacks for a run. All methods default to doing nothing.
pub trait RunObserver {
    /// Called once the input has been read
    fn on_start(&mut self, _total: usize) {}

    /// Called before a DOI is resolved (`index` is 1-based)
    fn on_item(&mut self, _index: usize, _total: usize, _doi: &Doi) {}

    /// Called after a DOI has been resolved and recorded
    fn on_outcome(&mut self, _index: usize, _total: usize, _outcome: &ResolutionOutcome) {}

    /// Called after the output files are written
    fn on_finish(&mut self, _result: &RunResult) {}
}

/// Observer that ignores every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl RunObserver for NoopObserver {}

/// Drives normalization, resolution and writing for one source.
#[derive(Debug, Clone)]
pub struct Pipeline {
    resolver: Resolver,
}

impl Pipeline {
    /// Create a pipeline over a literature source
    pub fn new(config: RunConfig, source: Arc<dyn LiteratureSource>) -> Self {
        Self {
            resolver: Resolver::new(source, &config),
        }
    }

    /// Create a pipeline around an existing resolver
    pub fn with_resolver(resolver: Resolver) -> Self {
        Self { resolver }
    }

    /// The literature source DOIs are resolved against
    pub fn source(&self) -> &dyn LiteratureSource {
        self.resolver.source()
    }

    /// Convert the DOIs in `input` into RIS records at `output`.
    ///
    /// The input is read and validated before the output file is touched, so a schema
    /// error leaves no files behind.
    pub async fn run(
        &self,
        input: &Path,
        output: &Path,
        observer: &mut dyn RunObserver,
    ) -> Result<RunResult, PipelineError> {
        let dois = read_dois(input)?;
        self.run_dois(&dois, output, observer).await
    }

    /// Resolve already-normalized DOIs, in order, and write the outputs
    pub async fn run_dois(
        &self,
        dois: &[Doi],
        output: &Path,
        observer: &mut dyn RunObserver,
    ) -> Result<RunResult, PipelineError> {
        let total = dois.len();
        observer.on_start(total);

        let mut writer = RisWriter::create(output)?;
        for (i, doi) in dois.iter().enumerate() {
            let index = i + 1;
            observer.on_item(index, total, doi);

            let outcome = self.resolver.resolve(doi).await;
            writer.record(&outcome)?;

            observer.on_outcome(index, total, &outcome);
        }

        let result = writer.finish()?;
        tracing::info!(
            source = self.source().name(),
            found = result.found_count(),
            missing = result.missing_count(),
            records = %result.records_path.display(),
            "conversion finished"
        );

        observer.on_finish(&result);
        Ok(result)
    }
}
