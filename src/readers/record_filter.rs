use chrono::NaiveDate;
use std::str::FromStr;
use thiserror::Error;

use crate::models::{CleanedObservation, DatedObservation, QualityCode};
use crate::utils::constants::{
    ALTITUDE_FIELD, DATE_FIELD, HUMIDITY_FIELD, HUMIDITY_QUALITY_FIELD, LATITUDE_FIELD,
    LONGITUDE_FIELD, MIN_RECORD_LENGTH, MISSING_MEASUREMENT, TEMPERATURE_FIELD,
    TEMPERATURE_QUALITY_FIELD, YEAR_FIELD,
};

/// Why a raw line produced no observation. Every reason means "skip the record".
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RejectReason {
    #[error("record is too short or has unparsable fields")]
    Malformed,

    #[error("temperature or humidity is missing (+9999)")]
    MissingMeasurement,

    #[error("quality code outside the accepted set")]
    RejectedQualityCode,
}

/// Tally of filter outcomes over a stream of lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RejectionCounts {
    pub accepted: u64,
    pub malformed: u64,
    pub missing: u64,
    pub rejected_quality: u64,
}

impl RejectionCounts {
    pub fn record<T>(&mut self, outcome: &Result<T, RejectReason>) {
        match outcome {
            Ok(_) => self.accepted += 1,
            Err(RejectReason::Malformed) => self.malformed += 1,
            Err(RejectReason::MissingMeasurement) => self.missing += 1,
            Err(RejectReason::RejectedQualityCode) => self.rejected_quality += 1,
        }
    }

    pub fn merge(&mut self, other: &RejectionCounts) {
        self.accepted += other.accepted;
        self.malformed += other.malformed;
        self.missing += other.missing;
        self.rejected_quality += other.rejected_quality;
    }

    pub fn rejected(&self) -> u64 {
        self.malformed + self.missing + self.rejected_quality
    }

    pub fn total(&self) -> u64 {
        self.accepted + self.rejected()
    }

    pub fn summary(&self) -> String {
        format!(
            "{} lines read: {} accepted, {} malformed, {} missing measurement, {} rejected quality code",
            self.total(),
            self.accepted,
            self.malformed,
            self.missing,
            self.rejected_quality
        )
    }
}

/// Extracts the temperature/humidity fields of an ISD fixed-width record and
/// drops records whose measurements are missing or of unacceptable quality.
///
/// The filter holds no state, so one instance can be shared across threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordFilter;

impl RecordFilter {
    pub fn new() -> Self {
        Self
    }

    /// Filter one line into the (year, temperature, humidity) tuple.
    pub fn filter_line(&self, line: &[u8]) -> Result<CleanedObservation, RejectReason> {
        let line = self.accept_measurements(line)?;

        Ok(CleanedObservation {
            year: parse_field(&line[YEAR_FIELD])?,
            temperature: parse_field(&line[TEMPERATURE_FIELD])?,
            humidity: parse_field(&line[HUMIDITY_FIELD])?,
        })
    }

    /// Filter one line into a dated observation that keeps the station position.
    pub fn filter_dated(&self, line: &[u8]) -> Result<DatedObservation, RejectReason> {
        let line = self.accept_measurements(line)?;

        let date_str =
            std::str::from_utf8(&line[DATE_FIELD]).map_err(|_| RejectReason::Malformed)?;
        let date =
            NaiveDate::parse_from_str(date_str, "%Y%m%d").map_err(|_| RejectReason::Malformed)?;

        Ok(DatedObservation {
            date,
            latitude: parse_field(&line[LATITUDE_FIELD])?,
            longitude: parse_field(&line[LONGITUDE_FIELD])?,
            altitude: parse_field(&line[ALTITUDE_FIELD])?,
            temperature: parse_field(&line[TEMPERATURE_FIELD])?,
            humidity: parse_field(&line[HUMIDITY_FIELD])?,
        })
    }

    /// Apply the length, sentinel and quality-code rules shared by both outputs.
    ///
    /// The sentinel check runs first: a missing value is rejected whatever its
    /// quality code says.
    fn accept_measurements<'a>(&self, line: &'a [u8]) -> Result<&'a [u8], RejectReason> {
        let line = trim_line_terminator(line);

        if line.len() < MIN_RECORD_LENGTH {
            return Err(RejectReason::Malformed);
        }

        if &line[TEMPERATURE_FIELD] == MISSING_MEASUREMENT
            || &line[HUMIDITY_FIELD] == MISSING_MEASUREMENT
        {
            return Err(RejectReason::MissingMeasurement);
        }

        let temperature_quality = QualityCode::from_byte(line[TEMPERATURE_QUALITY_FIELD.start]);
        let humidity_quality = QualityCode::from_byte(line[HUMIDITY_QUALITY_FIELD.start]);
        if !temperature_quality.is_accepted() || !humidity_quality.is_accepted() {
            return Err(RejectReason::RejectedQualityCode);
        }

        Ok(line)
    }
}

/// Drop a trailing `\n` or `\r\n`. Other whitespace is significant in a fixed-width record.
fn trim_line_terminator(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

fn parse_field<T: FromStr>(bytes: &[u8]) -> Result<T, RejectReason> {
    std::str::from_utf8(bytes)
        .ok()
        .and_then(|s| s.parse::<T>().ok())
        .ok_or(RejectReason::Malformed)
}
