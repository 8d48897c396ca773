use crate::error::Result;
use crate::models::CleanedObservation;
use crate::readers::{ObservationIterator, RejectionCounts};
use crate::utils::constants::FIELD_SEPARATOR;
use std::io::{BufRead, Write};
use tracing::info;

/// Map stage of the streaming pipeline: raw ISD lines in,
/// `year\ttemperature\thumidity` tuples out.
#[derive(Debug, Clone, Copy, Default)]
pub struct StreamMapper;

impl StreamMapper {
    pub fn new() -> Self {
        Self
    }

    /// Wire form of one tuple, without the newline
    pub fn format_tuple(obs: &CleanedObservation) -> String {
        format!(
            "{:04}{sep}{}{sep}{}",
            obs.year,
            obs.temperature,
            obs.humidity,
            sep = FIELD_SEPARATOR
        )
    }

    /// Filter every line of `reader`, writing one tuple per accepted record.
    pub fn run<R: BufRead, W: Write>(&self, reader: R, mut writer: W) -> Result<RejectionCounts> {
        let mut stream = ObservationIterator::cleaned(reader);

        for obs in stream.by_ref() {
            writeln!(writer, "{}", Self::format_tuple(&obs?))?;
        }
        writer.flush()?;

        let counts = stream.counts();
        info!("map: {}", counts.summary());
        Ok(counts)
    }
}
