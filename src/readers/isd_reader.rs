use crate::error::Result;
use crate::models::{CleanedObservation, DatedObservation};
use crate::readers::record_filter::{RecordFilter, RejectReason, RejectionCounts};
use crate::utils::constants::DEFAULT_BUFFER_SIZE;
use memmap2::Mmap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, trace};

/// Turns one raw line into an observation, or says why it was skipped.
pub type Extractor<T> = fn(&RecordFilter, &[u8]) -> std::result::Result<T, RejectReason>;

/// Observations accepted from one input, with the tally of skipped lines.
#[derive(Debug, Clone, Default)]
pub struct FileObservations<T> {
    pub observations: Vec<T>,
    pub counts: RejectionCounts,
}

pub struct IsdReader {
    filter: RecordFilter,
    use_mmap: bool,
}

impl IsdReader {
    pub fn new() -> Self {
        Self {
            filter: RecordFilter::new(),
            use_mmap: false,
        }
    }

    pub fn with_mmap(use_mmap: bool) -> Self {
        Self {
            filter: RecordFilter::new(),
            use_mmap,
        }
    }

    /// Read dated observations (with station position) from a file
    pub fn read_dated(&self, path: &Path) -> Result<FileObservations<DatedObservation>> {
        self.read_with(path, RecordFilter::filter_dated)
    }

    pub(crate) fn read_with<T>(
        &self,
        path: &Path,
        extract: Extractor<T>,
    ) -> Result<FileObservations<T>> {
        let result = if self.use_mmap {
            self.read_mmap(path, extract)?
        } else {
            self.read_buffered(path, extract)?
        };

        debug!(path = %path.display(), "{}", result.counts.summary());
        Ok(result)
    }

    /// Read records using buffered I/O
    fn read_buffered<T>(&self, path: &Path, extract: Extractor<T>) -> Result<FileObservations<T>> {
        let file = File::open(path)?;
        let reader = BufReader::with_capacity(DEFAULT_BUFFER_SIZE, file);
        let mut stream = ObservationIterator::new(reader, extract);

        let mut observations = Vec::new();
        for obs in stream.by_ref() {
            observations.push(obs?);
        }

        Ok(FileObservations {
            observations,
            counts: stream.counts(),
        })
    }

    /// Read records using memory-mapped I/O for large files
    fn read_mmap<T>(&self, path: &Path, extract: Extractor<T>) -> Result<FileObservations<T>> {
        let file = File::open(path)?;
        let mut result = FileObservations {
            observations: Vec::new(),
            counts: RejectionCounts::default(),
        };

        // zero-length mappings are rejected by the OS
        if file.metadata()?.len() == 0 {
            return Ok(result);
        }

        // SAFETY: the mapping is read-only and dropped before returning
        let mmap = unsafe { Mmap::map(&file)? };

        for line in mmap.split(|b| *b == b'\n') {
            if is_blank(line) {
                continue;
            }

            let outcome = extract(&self.filter, line);
            result.counts.record(&outcome);
            match outcome {
                Ok(obs) => result.observations.push(obs),
                Err(reason) => trace!(%reason, "skipping record"),
            }
        }

        Ok(result)
    }
}

impl Default for IsdReader {
    fn default() -> Self {
        Self::new()
    }
}

fn is_blank(line: &[u8]) -> bool {
    line.iter().all(|b| b.is_ascii_whitespace())
}

/// Streams accepted observations out of any line source, skipping rejected records.
pub struct ObservationIterator<R, T> {
    reader: R,
    filter: RecordFilter,
    extract: Extractor<T>,
    buffer: Vec<u8>,
    counts: RejectionCounts,
}

impl<R: BufRead, T> ObservationIterator<R, T> {
    pub fn new(reader: R, extract: Extractor<T>) -> Self {
        Self {
            reader,
            filter: RecordFilter::new(),
            extract,
            buffer: Vec::with_capacity(256),
            counts: RejectionCounts::default(),
        }
    }

    /// Outcomes seen so far
    pub fn counts(&self) -> RejectionCounts {
        self.counts
    }
}

impl<R: BufRead> ObservationIterator<R, CleanedObservation> {
    pub fn cleaned(reader: R) -> Self {
        Self::new(reader, RecordFilter::filter_line)
    }
}

impl<R: BufRead, T> Iterator for ObservationIterator<R, T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buffer.clear();

            match self.reader.read_until(b'\n', &mut self.buffer) {
                Ok(0) => return None, // EOF
                Ok(_) => {
                    if is_blank(&self.buffer) {
                        continue;
                    }

                    let outcome = (self.extract)(&self.filter, &self.buffer);
                    self.counts.record(&outcome);
                    match outcome {
                        Ok(obs) => return Some(Ok(obs)),
                        Err(reason) => trace!(%reason, "skipping record"),
                    }
                }
                Err(e) => return Some(Err(e.into())),
            }
        }
    }
}
