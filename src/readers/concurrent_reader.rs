use crate::error::{ProcessingError, Result};
use crate::models::DatedObservation;
use crate::readers::isd_reader::{Extractor, FileObservations, IsdReader};
use crate::readers::record_filter::{RecordFilter, RejectionCounts};
use crate::utils::pool::build_worker_pool;
use indicatif::ProgressBar;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Observations gathered from several input files, in file order.
#[derive(Debug, Clone, Default)]
pub struct ObservationBatch<T> {
    pub observations: Vec<T>,
    pub counts: RejectionCounts,
    pub files: usize,
}

pub struct ConcurrentReader {
    max_workers: usize,
    use_mmap: bool,
}

impl ConcurrentReader {
    pub fn new(max_workers: usize) -> Self {
        Self {
            max_workers: max_workers.max(1),
            use_mmap: false,
        }
    }

    pub fn with_mmap(mut self, use_mmap: bool) -> Self {
        self.use_mmap = use_mmap;
        self
    }

    /// Expand directories into the regular files they contain (sorted, hidden
    /// files skipped); plain file paths are kept as given.
    pub fn discover_files(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();

        for input in inputs {
            if input.is_dir() {
                let mut found = Vec::new();
                for entry in std::fs::read_dir(input)? {
                    let path = entry?.path();
                    if path.is_file() && !is_hidden(&path) {
                        found.push(path);
                    }
                }
                found.sort();
                debug!(dir = %input.display(), files = found.len(), "discovered input files");
                files.extend(found);
            } else if input.is_file() {
                files.push(input.clone());
            } else {
                return Err(ProcessingError::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("input not found: {}", input.display()),
                )));
            }
        }

        Ok(files)
    }

    /// Read dated observations from every input file concurrently
    pub async fn read_all_dated(
        &self,
        inputs: &[PathBuf],
        progress: Option<ProgressBar>,
    ) -> Result<ObservationBatch<DatedObservation>> {
        self.read_all(inputs, RecordFilter::filter_dated, progress)
            .await
    }

    async fn read_all<T: Send + 'static>(
        &self,
        inputs: &[PathBuf],
        extract: Extractor<T>,
        progress: Option<ProgressBar>,
    ) -> Result<ObservationBatch<T>> {
        let files = Self::discover_files(inputs)?;
        if let Some(pb) = &progress {
            pb.set_length(files.len() as u64);
        }

        let max_workers = self.max_workers;
        let use_mmap = self.use_mmap;

        let batch = tokio::task::spawn_blocking(move || {
            Self::read_files_parallel(&files, extract, max_workers, use_mmap, progress.as_ref())
        })
        .await??;

        info!(files = batch.files, "{}", batch.counts.summary());
        Ok(batch)
    }

    /// Read files on a dedicated Rayon pool, keeping the input file order
    fn read_files_parallel<T: Send>(
        files: &[PathBuf],
        extract: Extractor<T>,
        max_workers: usize,
        use_mmap: bool,
        progress: Option<&ProgressBar>,
    ) -> Result<ObservationBatch<T>> {
        let pool = build_worker_pool(max_workers)?;

        let per_file: Vec<FileObservations<T>> = pool.install(|| {
            files
                .par_iter()
                .map(|path| {
                    let reader = IsdReader::with_mmap(use_mmap);
                    let result = reader.read_with(path, extract);
                    if let Some(pb) = progress {
                        pb.inc(1);
                    }
                    result
                })
                .collect::<Result<Vec<_>>>()
        })?;

        let mut batch = ObservationBatch {
            observations: Vec::with_capacity(per_file.iter().map(|f| f.observations.len()).sum()),
            counts: RejectionCounts::default(),
            files: per_file.len(),
        };
        for file in per_file {
            batch.counts.merge(&file.counts);
            batch.observations.extend(file.observations);
        }

        Ok(batch)
    }
}

impl Default for ConcurrentReader {
    fn default() -> Self {
        Self::new(num_cpus::get())
    }
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with('.'))
}
