use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Pearson correlation between temperature and humidity for one year.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YearCorrelation {
    pub year: i32,
    pub observations: usize,
    pub correlation: f64,
}

impl YearCorrelation {
    /// `year\tcorrelation`, the reducer's output line without the newline
    pub fn to_wire(&self) -> String {
        format!("{:04}\t{:?}", self.year, self.correlation)
    }
}

/// Mean and standard-deviation bands of one (year, month) group.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonthlyStats {
    pub year: i32,
    pub month: u32,
    pub observations: u64,
    pub avg_temperature: f64,
    pub avg_humidity: f64,
    pub stddev_temperature: f64,
    pub stddev_humidity: f64,
    pub upper_temperature: f64,
    pub lower_temperature: f64,
    pub upper_humidity: f64,
    pub lower_humidity: f64,
}

impl MonthlyStats {
    pub fn key(&self) -> (i32, u32) {
        (self.year, self.month)
    }

    pub fn temperature_in_band(&self, value: f64) -> bool {
        (self.lower_temperature..=self.upper_temperature).contains(&value)
    }

    pub fn humidity_in_band(&self, value: f64) -> bool {
        (self.lower_humidity..=self.upper_humidity).contains(&value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnomalyKind {
    Temperature,
    Humidity,
    Both,
}

impl AnomalyKind {
    pub fn from_flags(temperature: bool, humidity: bool) -> Option<Self> {
        match (temperature, humidity) {
            (true, true) => Some(AnomalyKind::Both),
            (true, false) => Some(AnomalyKind::Temperature),
            (false, true) => Some(AnomalyKind::Humidity),
            (false, false) => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AnomalyKind::Temperature => "temperature",
            AnomalyKind::Humidity => "humidity",
            AnomalyKind::Both => "both",
        }
    }
}

/// A single observation lying outside its month's band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlaggedObservation {
    pub year: i32,
    pub month: u32,
    pub date: NaiveDate,
    pub temperature: i32,
    pub humidity: i32,
    pub kind: AnomalyKind,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_format_keeps_float_repr() {
        let exact = YearCorrelation {
            year: 1930,
            observations: 2,
            correlation: 1.0,
        };
        assert_eq!(exact.to_wire(), "1930\t1.0");

        let negative = YearCorrelation {
            year: 1929,
            observations: 10,
            correlation: -0.25,
        };
        assert_eq!(negative.to_wire(), "1929\t-0.25");
    }

    #[test]
    fn test_anomaly_kind_from_flags() {
        assert_eq!(AnomalyKind::from_flags(true, true), Some(AnomalyKind::Both));
        assert_eq!(AnomalyKind::from_flags(false, true), Some(AnomalyKind::Humidity));
        assert_eq!(AnomalyKind::from_flags(false, false), None);
    }

    #[test]
    fn test_band_bounds_are_inclusive() {
        let stats = MonthlyStats {
            year: 1931,
            month: 5,
            observations: 3,
            avg_temperature: 10.0,
            avg_humidity: 5.0,
            stddev_temperature: 1.0,
            stddev_humidity: 1.0,
            upper_temperature: 12.0,
            lower_temperature: 8.0,
            upper_humidity: 7.0,
            lower_humidity: 3.0,
        };

        assert!(stats.temperature_in_band(12.0));
        assert!(stats.temperature_in_band(8.0));
        assert!(!stats.temperature_in_band(12.5));
        assert!(!stats.humidity_in_band(2.9));
    }
}
