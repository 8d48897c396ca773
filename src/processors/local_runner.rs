use crate::error::{ProcessingError, Result};
use crate::models::YearCorrelation;
use crate::processors::stream_mapper::StreamMapper;
use crate::processors::stream_reducer::{ReduceSummary, StreamReducer};
use crate::readers::RejectionCounts;
use crate::utils::constants::{DEFAULT_BUFFER_SIZE, FIELD_SEPARATOR};
use std::fs::File;
use std::io::{BufReader, Cursor};
use std::path::PathBuf;
use tracing::{debug, info};

/// Result of a local map → sort → reduce run.
#[derive(Debug, Clone)]
pub struct LocalRunOutput {
    pub correlations: Vec<YearCorrelation>,
    pub map_counts: RejectionCounts,
    pub reduce_summary: ReduceSummary,
}

/// Runs the streaming mapper and reducer in-process, standing in for the
/// external orchestrator: input files are split into partitions mapped on
/// scoped threads, the mapped tuples are sorted by key, then reduced.
pub struct LocalMapReduce {
    partitions: usize,
    reducer: StreamReducer,
}

impl LocalMapReduce {
    pub fn new(partitions: usize) -> Self {
        Self {
            partitions: partitions.max(1),
            reducer: StreamReducer::new(),
        }
    }

    pub fn with_skip_degenerate_years(mut self, skip: bool) -> Self {
        self.reducer = self.reducer.with_skip_degenerate_years(skip);
        self
    }

    pub fn run(&self, files: &[PathBuf]) -> Result<LocalRunOutput> {
        let (mut tuples, map_counts) = self.map_partitions(files)?;

        // shuffle: stable sort on the key keeps each partition's value order
        tuples.sort_by(|a, b| key_of(a).cmp(key_of(b)));
        debug!(tuples = tuples.len(), "sorted mapped tuples");

        let mut shuffled = tuples.join("\n");
        shuffled.push('\n');
        let (correlations, reduce_summary) = self.reducer.reduce(Cursor::new(shuffled))?;

        info!(
            files = files.len(),
            partitions = self.partitions,
            years = correlations.len(),
            "local map/reduce complete"
        );

        Ok(LocalRunOutput {
            correlations,
            map_counts,
            reduce_summary,
        })
    }

    /// Map every file, one scoped thread per partition of files.
    fn map_partitions(&self, files: &[PathBuf]) -> Result<(Vec<String>, RejectionCounts)> {
        if files.is_empty() {
            return Ok((Vec::new(), RejectionCounts::default()));
        }

        let per_partition = files.len().div_ceil(self.partitions);

        let results: Vec<Result<(Vec<u8>, RejectionCounts)>> = crossbeam::scope(|scope| {
            let handles: Vec<_> = files
                .chunks(per_partition)
                .map(|partition| scope.spawn(move |_| map_partition(partition)))
                .collect();

            handles
                .into_iter()
                .map(|handle| {
                    handle.join().unwrap_or_else(|_| {
                        Err(ProcessingError::Worker("mapper thread panicked".to_string()))
                    })
                })
                .collect()
        })
        .map_err(|_| ProcessingError::Worker("mapper scope panicked".to_string()))?;

        let mut tuples = Vec::new();
        let mut counts = RejectionCounts::default();
        for result in results {
            let (output, partition_counts) = result?;
            counts.merge(&partition_counts);

            let text = String::from_utf8(output)
                .map_err(|e| ProcessingError::InvalidFormat(e.to_string()))?;
            tuples.extend(text.lines().map(str::to_owned));
        }

        Ok((tuples, counts))
    }
}

impl Default for LocalMapReduce {
    fn default() -> Self {
        Self::new(num_cpus::get())
    }
}

fn map_partition(partition: &[PathBuf]) -> Result<(Vec<u8>, RejectionCounts)> {
    let mapper = StreamMapper::new();
    let mut output = Vec::new();
    let mut counts = RejectionCounts::default();

    for path in partition {
        let file = File::open(path)?;
        let reader = BufReader::with_capacity(DEFAULT_BUFFER_SIZE, file);
        counts.merge(&mapper.run(reader, &mut output)?);
    }

    Ok((output, counts))
}

fn key_of(tuple: &str) -> &str {
    tuple.split(FIELD_SEPARATOR).next().unwrap_or(tuple)
}
