use crate::analyzers::YearCorrelationAggregator;
use crate::error::Result;
use crate::models::{CleanedObservation, YearCorrelation};
use crate::utils::constants::FIELD_SEPARATOR;
use std::io::{BufRead, Write};
use tracing::{info, warn};

/// What the reduce stage consumed and produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReduceSummary {
    pub tuples: u64,
    pub skipped: u64,
    pub years: usize,
}

/// Reduce stage of the streaming pipeline: `year\ttemperature\thumidity`
/// tuples in, `year\tcorrelation` lines out, ascending by year.
///
/// Input does not need to be sorted; every tuple is grouped before any
/// correlation is computed.
#[derive(Debug, Clone, Copy, Default)]
pub struct StreamReducer {
    skip_degenerate_years: bool,
}

impl StreamReducer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_skip_degenerate_years(mut self, skip: bool) -> Self {
        self.skip_degenerate_years = skip;
        self
    }

    /// Parse one wire tuple. Integers may carry a sign and leading zeros.
    pub fn parse_tuple(line: &str) -> Option<CleanedObservation> {
        let mut fields = line.trim().split(FIELD_SEPARATOR);
        let year = fields.next()?.trim().parse().ok()?;
        let temperature = fields.next()?.trim().parse().ok()?;
        let humidity = fields.next()?.trim().parse().ok()?;

        if fields.next().is_some() {
            return None;
        }

        Some(CleanedObservation::new(year, temperature, humidity))
    }

    /// Group every tuple of `reader` by year and correlate each year.
    pub fn reduce<R: BufRead>(&self, mut reader: R) -> Result<(Vec<YearCorrelation>, ReduceSummary)> {
        let mut aggregator =
            YearCorrelationAggregator::new().with_skip_degenerate_years(self.skip_degenerate_years);
        let mut summary = ReduceSummary::default();

        let mut buffer = Vec::new();
        let mut line_number = 0usize;

        loop {
            buffer.clear();
            if reader.read_until(b'\n', &mut buffer)? == 0 {
                break;
            }
            line_number += 1;

            let tuple = match std::str::from_utf8(&buffer) {
                Ok(line) if line.trim().is_empty() => continue,
                Ok(line) => Self::parse_tuple(line),
                Err(_) => None,
            };

            match tuple {
                Some(obs) => {
                    summary.tuples += 1;
                    aggregator.push(obs);
                }
                None => {
                    summary.skipped += 1;
                    warn!(
                        line = line_number,
                        content = %String::from_utf8_lossy(&buffer).trim_end(),
                        "skipping malformed tuple"
                    );
                }
            }
        }

        let correlations = aggregator.finish()?;
        summary.years = correlations.len();
        Ok((correlations, summary))
    }

    /// Reduce `reader` and write one `year\tcorrelation` line per year.
    pub fn run<R: BufRead, W: Write>(&self, reader: R, mut writer: W) -> Result<ReduceSummary> {
        let (correlations, summary) = self.reduce(reader)?;

        for correlation in &correlations {
            writeln!(writer, "{}", correlation.to_wire())?;
        }
        writer.flush()?;

        info!(
            tuples = summary.tuples,
            skipped = summary.skipped,
            years = summary.years,
            "reduce complete"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProcessingError;
    use std::io::Cursor;

    #[test]
    fn test_parse_tuple_accepts_raw_record_values() {
        assert_eq!(
            StreamReducer::parse_tuple("1928\t+0050\t-0040"),
            Some(CleanedObservation::new(1928, 50, -40))
        );
        assert_eq!(
            StreamReducer::parse_tuple("1930\t10\t5\r"),
            Some(CleanedObservation::new(1930, 10, 5))
        );
    }

    #[test]
    fn test_parse_tuple_rejects_bad_lines() {
        assert_eq!(StreamReducer::parse_tuple("1928\t50"), None);
        assert_eq!(StreamReducer::parse_tuple("1928\t50\t40\t1"), None);
        assert_eq!(StreamReducer::parse_tuple("1928 50 40"), None);
        assert_eq!(StreamReducer::parse_tuple("year\tt\th"), None);
    }

    #[test]
    fn test_run_writes_sorted_correlations() {
        let input = "1931\t1\t2\n1930\t10\t5\n1931\t5\t9\n1930\t20\t15\n";
        let mut output = Vec::new();

        let summary = StreamReducer::new()
            .run(Cursor::new(input), &mut output)
            .unwrap();

        assert_eq!(
            String::from_utf8(output).unwrap(),
            "1930\t1.0\n1931\t1.0\n"
        );
        assert_eq!(
            summary,
            ReduceSummary {
                tuples: 4,
                skipped: 0,
                years: 2
            }
        );
    }

    #[test]
    fn test_malformed_tuples_are_skipped() {
        let input = "1930\t10\t5\ngarbage\n\n1930\t20\t15\n";
        let (correlations, summary) = StreamReducer::new().reduce(Cursor::new(input)).unwrap();

        assert_eq!(correlations.len(), 1);
        assert_eq!(correlations[0].correlation, 1.0);
        assert_eq!(summary.skipped, 1);
    }

    #[test]
    fn test_non_utf8_tuple_is_skipped() {
        let input: &[u8] = b"1930\t10\t5\n19\xff0\t1\t2\n1930\t20\t15\n";
        let (correlations, summary) = StreamReducer::new().reduce(Cursor::new(input)).unwrap();

        assert_eq!(correlations.len(), 1);
        assert_eq!(correlations[0].year, 1930);
        assert_eq!(correlations[0].correlation, 1.0);
        assert_eq!(summary.tuples, 2);
        assert_eq!(summary.skipped, 1);
    }

    #[test]
    fn test_constant_year_fails_unless_skipped() {
        let input = "1928\t10\t5\n1930\t10\t5\n1930\t20\t15\n";

        let strict = StreamReducer::new().reduce(Cursor::new(input));
        assert!(matches!(
            strict,
            Err(ProcessingError::YearStatistics { year: 1928, .. })
        ));

        let (correlations, _) = StreamReducer::new()
            .with_skip_degenerate_years(true)
            .reduce(Cursor::new(input))
            .unwrap();
        assert_eq!(correlations.len(), 1);
        assert_eq!(correlations[0].year, 1930);
    }
}
