use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::utils::constants::ACCEPTED_QUALITY_CODES;

/// A record that survived the filter, reduced to what the year correlation needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanedObservation {
    pub year: i32,
    /// Tenths of a degree Celsius
    pub temperature: i32,
    /// Tenths of the station unit
    pub humidity: i32,
}

impl CleanedObservation {
    pub fn new(year: i32, temperature: i32, humidity: i32) -> Self {
        Self {
            year,
            temperature,
            humidity,
        }
    }
}

/// A filtered record with its date and station position, used by the monthly pipeline.
///
/// Coordinates stay in the integer units of the ISD layout: thousandths of a
/// degree for latitude/longitude, metres for altitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatedObservation {
    pub date: NaiveDate,
    pub latitude: i32,
    pub longitude: i32,
    pub altitude: i32,
    pub temperature: i32,
    pub humidity: i32,
}

impl DatedObservation {
    pub fn year(&self) -> i32 {
        self.date.year()
    }

    pub fn month(&self) -> u32 {
        self.date.month()
    }

    pub fn year_month(&self) -> (i32, u32) {
        (self.year(), self.month())
    }

    pub fn to_cleaned(&self) -> CleanedObservation {
        CleanedObservation::new(self.year(), self.temperature, self.humidity)
    }
}

/// ISD quality code attached to each measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualityCode {
    PassedGrossLimits,
    PassedAllChecks,
    Suspect,
    Erroneous,
    SourcePassedGrossLimits,
    SourcePassedAllChecks,
    SourceSuspect,
    SourceErroneous,
    PassedGrossLimitsIfPresent,
    Other(u8),
}

impl QualityCode {
    pub fn from_byte(value: u8) -> Self {
        match value {
            b'0' => QualityCode::PassedGrossLimits,
            b'1' => QualityCode::PassedAllChecks,
            b'2' => QualityCode::Suspect,
            b'3' => QualityCode::Erroneous,
            b'4' => QualityCode::SourcePassedGrossLimits,
            b'5' => QualityCode::SourcePassedAllChecks,
            b'6' => QualityCode::SourceSuspect,
            b'7' => QualityCode::SourceErroneous,
            b'9' => QualityCode::PassedGrossLimitsIfPresent,
            other => QualityCode::Other(other),
        }
    }

    pub fn as_byte(&self) -> u8 {
        match self {
            QualityCode::PassedGrossLimits => b'0',
            QualityCode::PassedAllChecks => b'1',
            QualityCode::Suspect => b'2',
            QualityCode::Erroneous => b'3',
            QualityCode::SourcePassedGrossLimits => b'4',
            QualityCode::SourcePassedAllChecks => b'5',
            QualityCode::SourceSuspect => b'6',
            QualityCode::SourceErroneous => b'7',
            QualityCode::PassedGrossLimitsIfPresent => b'9',
            QualityCode::Other(value) => *value,
        }
    }

    pub fn is_accepted(&self) -> bool {
        ACCEPTED_QUALITY_CODES.contains(&self.as_byte())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepted_quality_codes() {
        for code in b"01459" {
            assert!(QualityCode::from_byte(*code).is_accepted());
        }
        for code in b"2367AMPRU " {
            assert!(!QualityCode::from_byte(*code).is_accepted());
        }
    }

    #[test]
    fn test_quality_code_round_trips_byte() {
        assert_eq!(QualityCode::from_byte(b'5'), QualityCode::SourcePassedAllChecks);
        assert_eq!(QualityCode::from_byte(b'A').as_byte(), b'A');
    }

    #[test]
    fn test_dated_observation_accessors() {
        let obs = DatedObservation {
            date: NaiveDate::from_ymd_opt(1928, 7, 14).unwrap(),
            latitude: 51317,
            longitude: -5300,
            altitude: 74,
            temperature: 193,
            humidity: 118,
        };

        assert_eq!(obs.year_month(), (1928, 7));
        assert_eq!(obs.to_cleaned(), CleanedObservation::new(1928, 193, 118));
    }
}
