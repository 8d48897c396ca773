use crate::analyzers::{AnomalyMode, AnomalyReport, MonthlyAnomalyDetector, StddevKind};
use crate::error::Result;
use crate::models::DatedObservation;
use crate::readers::{ConcurrentReader, RejectionCounts};
use crate::settings::Settings;
use crate::utils::pool::build_worker_pool;
use crate::utils::progress::ProgressReporter;
use std::path::PathBuf;
use tracing::info;

/// Output of one batch run.
#[derive(Debug, Clone)]
pub struct BatchOutput {
    pub report: AnomalyReport,
    pub counts: RejectionCounts,
    pub files: usize,
}

/// Batch pipeline: load dated observations from every input, then compute
/// monthly bands and anomalies on a worker pool.
pub struct BatchProcessor {
    max_workers: usize,
    use_mmap: bool,
    mode: AnomalyMode,
    stddev_kind: StddevKind,
}

impl BatchProcessor {
    pub fn new(max_workers: usize) -> Self {
        Self {
            max_workers: max_workers.max(1),
            use_mmap: false,
            mode: AnomalyMode::default(),
            stddev_kind: StddevKind::default(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.processing.max_workers)
            .with_mmap(settings.processing.use_mmap)
            .with_mode(settings.anomaly.mode)
            .with_stddev_kind(settings.anomaly.stddev)
    }

    pub fn with_mmap(mut self, use_mmap: bool) -> Self {
        self.use_mmap = use_mmap;
        self
    }

    pub fn with_mode(mut self, mode: AnomalyMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_stddev_kind(mut self, stddev_kind: StddevKind) -> Self {
        self.stddev_kind = stddev_kind;
        self
    }

    /// Read every input and run the monthly anomaly detector over it
    pub async fn process(
        &self,
        inputs: &[PathBuf],
        progress: Option<&ProgressReporter>,
    ) -> Result<BatchOutput> {
        if let Some(p) = progress {
            p.set_message("Reading ISD records...");
        }

        let reader = ConcurrentReader::new(self.max_workers).with_mmap(self.use_mmap);
        let batch = reader
            .read_all_dated(inputs, progress.and_then(|p| p.bar()))
            .await?;

        if let Some(p) = progress {
            p.set_message(&format!(
                "Computing monthly statistics over {} observations...",
                batch.observations.len()
            ));
        }

        let report = self.detect(batch.observations).await?;

        if let Some(p) = progress {
            p.finish_with_message(&format!(
                "Analysed {} months from {} files",
                report.monthly_stats.len(),
                batch.files
            ));
        }

        info!(
            files = batch.files,
            accepted = batch.counts.accepted,
            rejected = batch.counts.rejected(),
            "batch pipeline complete"
        );

        Ok(BatchOutput {
            report,
            counts: batch.counts,
            files: batch.files,
        })
    }

    /// Run the detector on a dedicated Rayon pool off the async runtime
    pub async fn detect(&self, observations: Vec<DatedObservation>) -> Result<AnomalyReport> {
        let max_workers = self.max_workers;
        let detector = MonthlyAnomalyDetector::new(self.mode).with_stddev_kind(self.stddev_kind);

        tokio::task::spawn_blocking(move || {
            let pool = build_worker_pool(max_workers)?;

            pool.install(|| detector.detect(&observations))
        })
        .await?
    }
}

impl Default for BatchProcessor {
    fn default() -> Self {
        Self::new(num_cpus::get())
    }
}
