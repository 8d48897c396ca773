//! Record builders shared by the unit tests.

use crate::models::{AnomalyKind, DatedObservation, FlaggedObservation};
use chrono::NaiveDate;

/// Build an ISD fixed-width line with the given date, measurements and quality codes.
///
/// Station position is fixed at +51317 / -005300, altitude +0074.
pub fn isd_line(
    date: &str,
    temperature: &str,
    temp_quality: char,
    humidity: &str,
    hum_quality: char,
) -> String {
    let mut line = String::with_capacity(120);
    line.push_str("007103777099999");
    line.push_str(date);
    line.push_str("1200");
    line.push('4');
    line.push_str("+51317");
    line.push_str("-005300");
    line.push_str("FM-12");
    line.push_str("+0074");
    while line.len() < 87 {
        line.push('9');
    }
    line.push_str(temperature);
    line.push(temp_quality);
    line.push_str(humidity);
    line.push(hum_quality);
    line.push_str("102001ADDGF108991");
    line
}

/// Shorthand for an accepted line with quality code `1` on both measurements.
pub fn valid_line(date: &str, temperature: i32, humidity: i32) -> String {
    isd_line(
        date,
        &format!("{:+05}", temperature),
        '1',
        &format!("{:+05}", humidity),
        '1',
    )
}

pub fn observation(
    year: i32,
    month: u32,
    day: u32,
    temperature: i32,
    humidity: i32,
) -> DatedObservation {
    DatedObservation {
        date: NaiveDate::from_ymd_opt(year, month, day).unwrap(),
        latitude: 51317,
        longitude: -5300,
        altitude: 74,
        temperature,
        humidity,
    }
}

pub fn flagged(
    year: i32,
    month: u32,
    day: u32,
    temperature: i32,
    humidity: i32,
    kind: AnomalyKind,
) -> FlaggedObservation {
    FlaggedObservation {
        year,
        month,
        date: NaiveDate::from_ymd_opt(year, month, day).unwrap(),
        temperature,
        humidity,
        kind,
    }
}
