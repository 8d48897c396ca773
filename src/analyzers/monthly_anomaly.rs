use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, info};

use crate::analyzers::statistics::{MomentAccumulator, StddevKind};
use crate::error::{Result, StatsError};
use crate::models::{AnomalyKind, DatedObservation, FlaggedObservation, MonthlyStats};
use crate::utils::constants::ANOMALY_THRESHOLD;

/// How anomalies are selected once the monthly bands are known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnomalyMode {
    /// Compare each month's mean against its own band. The mean always sits
    /// exactly `k·σ` from either bound, so no month is ever selected.
    StrictReproduce,
    /// Flag individual observations lying outside their month's band.
    #[default]
    Corrected,
}

impl AnomalyMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnomalyMode::StrictReproduce => "strict-reproduce",
            AnomalyMode::Corrected => "corrected",
        }
    }
}

impl fmt::Display for AnomalyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AnomalyMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "strict-reproduce" | "strict" => Ok(AnomalyMode::StrictReproduce),
            "corrected" => Ok(AnomalyMode::Corrected),
            other => Err(format!(
                "unknown anomaly mode '{}', expected 'strict-reproduce' or 'corrected'",
                other
            )),
        }
    }
}

/// Running moments of one (year, month) group.
#[derive(Debug, Clone, Copy, Default)]
struct MonthAccumulator {
    temperature: MomentAccumulator,
    humidity: MomentAccumulator,
}

impl MonthAccumulator {
    fn push(&mut self, obs: &DatedObservation) {
        self.temperature.push(obs.temperature);
        self.humidity.push(obs.humidity);
    }

    fn merge(self, other: &MonthAccumulator) -> Self {
        Self {
            temperature: self.temperature.merge(&other.temperature),
            humidity: self.humidity.merge(&other.humidity),
        }
    }
}

type MonthGroups = BTreeMap<(i32, u32), MonthAccumulator>;

fn merge_groups(mut left: MonthGroups, right: MonthGroups) -> MonthGroups {
    for (key, acc) in right {
        let entry = left.entry(key).or_default();
        *entry = entry.merge(&acc);
    }
    left
}

/// Outcome of a monthly anomaly run.
#[derive(Debug, Clone, Serialize)]
pub struct AnomalyReport {
    pub mode: AnomalyMode,
    /// Every (year, month) group, ascending
    pub monthly_stats: Vec<MonthlyStats>,
    /// Months selected as anomalous, ascending
    pub flagged_months: Vec<MonthlyStats>,
    /// Observations outside their month's band (corrected mode only)
    pub flagged_observations: Vec<FlaggedObservation>,
}

impl AnomalyReport {
    pub fn summary(&self) -> String {
        let mut summary = String::new();

        summary.push_str("=== Monthly Anomaly Report ===\n");
        summary.push_str(&format!("Mode: {}\n", self.mode));
        summary.push_str(&format!("Months analysed: {}\n", self.monthly_stats.len()));
        summary.push_str(&format!("Anomalous months: {}\n", self.flagged_months.len()));
        summary.push_str(&format!(
            "Flagged observations: {}\n",
            self.flagged_observations.len()
        ));

        if !self.flagged_observations.is_empty() {
            summary.push_str("\nTop 10 Flagged Observations:\n");
            for (i, flagged) in self.flagged_observations.iter().take(10).enumerate() {
                summary.push_str(&format!(
                    "  {}. {}: temperature {}, humidity {} ({})\n",
                    i + 1,
                    flagged.date,
                    flagged.temperature,
                    flagged.humidity,
                    flagged.kind.as_str()
                ));
            }
        }

        summary
    }
}

/// Groups dated observations by (year, month), derives `avg ± k·σ` bands
/// with k = 2, and selects anomalies according to the [`AnomalyMode`].
pub struct MonthlyAnomalyDetector {
    mode: AnomalyMode,
    stddev_kind: StddevKind,
    threshold: f64,
}

impl MonthlyAnomalyDetector {
    pub fn new(mode: AnomalyMode) -> Self {
        Self {
            mode,
            stddev_kind: StddevKind::default(),
            threshold: ANOMALY_THRESHOLD,
        }
    }

    pub fn with_stddev_kind(mut self, stddev_kind: StddevKind) -> Self {
        self.stddev_kind = stddev_kind;
        self
    }

    pub fn mode(&self) -> AnomalyMode {
        self.mode
    }

    /// Mean and band of every (year, month) group, ascending by key.
    pub fn monthly_stats(&self, observations: &[DatedObservation]) -> Result<Vec<MonthlyStats>> {
        let groups = observations
            .par_iter()
            .fold(MonthGroups::new, |mut groups, obs| {
                groups.entry(obs.year_month()).or_default().push(obs);
                groups
            })
            .reduce(MonthGroups::new, merge_groups);

        debug!(groups = groups.len(), "grouped observations by month");

        let stats = groups
            .into_iter()
            .map(|(key, acc)| self.build_stats(key, &acc))
            .collect::<std::result::Result<Vec<_>, StatsError>>()?;

        Ok(stats)
    }

    fn build_stats(
        &self,
        (year, month): (i32, u32),
        acc: &MonthAccumulator,
    ) -> std::result::Result<MonthlyStats, StatsError> {
        let avg_temperature = acc.temperature.mean()?;
        let avg_humidity = acc.humidity.mean()?;
        let stddev_temperature = acc.temperature.stddev(self.stddev_kind)?;
        let stddev_humidity = acc.humidity.stddev(self.stddev_kind)?;

        Ok(MonthlyStats {
            year,
            month,
            observations: acc.temperature.count(),
            avg_temperature,
            avg_humidity,
            stddev_temperature,
            stddev_humidity,
            upper_temperature: avg_temperature + self.threshold * stddev_temperature,
            lower_temperature: avg_temperature - self.threshold * stddev_temperature,
            upper_humidity: avg_humidity + self.threshold * stddev_humidity,
            lower_humidity: avg_humidity - self.threshold * stddev_humidity,
        })
    }

    /// Which measurements of `obs` fall outside the band of its month.
    ///
    /// Bounds are inclusive. An undefined (NaN) deviation flags nothing.
    pub fn classify(&self, stats: &MonthlyStats, obs: &DatedObservation) -> Option<AnomalyKind> {
        let temperature = !stats.stddev_temperature.is_nan()
            && !stats.temperature_in_band(obs.temperature as f64);
        let humidity =
            !stats.stddev_humidity.is_nan() && !stats.humidity_in_band(obs.humidity as f64);

        AnomalyKind::from_flags(temperature, humidity)
    }

    pub fn detect(&self, observations: &[DatedObservation]) -> Result<AnomalyReport> {
        let monthly_stats = self.monthly_stats(observations)?;

        let (flagged_months, flagged_observations) = match self.mode {
            // |avg - (avg ± k·σ)| > k·σ reduces to k·σ > k·σ: no month qualifies
            AnomalyMode::StrictReproduce => (Vec::new(), Vec::new()),
            AnomalyMode::Corrected => self.flag_observations(&monthly_stats, observations),
        };

        info!(
            mode = %self.mode,
            months = monthly_stats.len(),
            flagged_months = flagged_months.len(),
            flagged_observations = flagged_observations.len(),
            "anomaly detection complete"
        );

        Ok(AnomalyReport {
            mode: self.mode,
            monthly_stats,
            flagged_months,
            flagged_observations,
        })
    }

    fn flag_observations(
        &self,
        monthly_stats: &[MonthlyStats],
        observations: &[DatedObservation],
    ) -> (Vec<MonthlyStats>, Vec<FlaggedObservation>) {
        let by_month: BTreeMap<(i32, u32), &MonthlyStats> =
            monthly_stats.iter().map(|s| (s.key(), s)).collect();

        let mut flagged: Vec<FlaggedObservation> = observations
            .par_iter()
            .filter_map(|obs| {
                let stats = by_month.get(&obs.year_month())?;
                let kind = self.classify(stats, obs)?;
                Some(FlaggedObservation {
                    year: obs.year(),
                    month: obs.month(),
                    date: obs.date,
                    temperature: obs.temperature,
                    humidity: obs.humidity,
                    kind,
                })
            })
            .collect();

        // stable: input order survives within a month
        flagged.sort_by_key(|f| (f.year, f.month));

        let months = monthly_stats
            .iter()
            .filter(|stats| {
                flagged
                    .binary_search_by_key(&stats.key(), |f| (f.year, f.month))
                    .is_ok()
            })
            .copied()
            .collect();

        (months, flagged)
    }
}

impl Default for MonthlyAnomalyDetector {
    fn default() -> Self {
        Self::new(AnomalyMode::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::observation;
    use pretty_assertions::assert_eq;

    fn spread_month(year: i32, month: u32) -> Vec<DatedObservation> {
        let mut observations: Vec<DatedObservation> = (1..=9)
            .map(|day| observation(year, month, day, 0, 5))
            .collect();
        observations.push(observation(year, month, 10, 100, 5));
        observations
    }

    fn varied_observations() -> Vec<DatedObservation> {
        let mut observations = Vec::new();
        for (i, (temperature, humidity)) in [
            (137, -63),
            (-472, -671),
            (1520, 947),
            (1932, 1183),
            (520, 306),
            (3, 7),
            (-1029, -1322),
            (674, 446),
        ]
        .into_iter()
        .enumerate()
        {
            let month = (i % 3) as u32 + 1;
            observations.push(observation(1928, month, i as u32 + 1, temperature, humidity));
            observations.push(observation(1929, month, i as u32 + 2, humidity, temperature / 3));
        }
        observations
    }

    #[test]
    fn test_monthly_stats_are_sorted_and_banded() {
        let mut observations = spread_month(1931, 2);
        observations.extend(spread_month(1928, 7));
        observations.extend(spread_month(1931, 1));

        let stats = MonthlyAnomalyDetector::default()
            .monthly_stats(&observations)
            .unwrap();

        let keys: Vec<(i32, u32)> = stats.iter().map(|s| s.key()).collect();
        assert_eq!(keys, vec![(1928, 7), (1931, 1), (1931, 2)]);

        // sample estimator: 9000 / 9
        let first = &stats[0];
        let sigma = 1000f64.sqrt();
        assert_eq!(first.observations, 10);
        assert_eq!(first.avg_temperature, 10.0);
        assert!((first.stddev_temperature - sigma).abs() < 1e-9);
        assert!((first.upper_temperature - (10.0 + 2.0 * sigma)).abs() < 1e-9);
        assert!((first.lower_temperature - (10.0 - 2.0 * sigma)).abs() < 1e-9);
        assert_eq!(first.avg_humidity, 5.0);
        assert_eq!(first.stddev_humidity, 0.0);
    }

    #[test]
    fn test_default_stddev_is_sample_estimator() {
        let observations = vec![observation(1933, 6, 1, 10, 1), observation(1933, 6, 2, 20, 3)];

        let sample = MonthlyAnomalyDetector::default()
            .monthly_stats(&observations)
            .unwrap();
        assert!((sample[0].stddev_temperature - 50f64.sqrt()).abs() < 1e-12);
        assert!((sample[0].stddev_humidity - 2f64.sqrt()).abs() < 1e-12);

        let population = MonthlyAnomalyDetector::default()
            .with_stddev_kind(StddevKind::Population)
            .monthly_stats(&observations)
            .unwrap();
        assert_eq!(population[0].stddev_temperature, 5.0);
        assert_eq!(population[0].upper_temperature, 25.0);
    }

    #[test]
    fn test_strict_mode_never_flags() {
        let detector = MonthlyAnomalyDetector::new(AnomalyMode::StrictReproduce);
        let mut observations = varied_observations();
        observations.extend(spread_month(1930, 4));

        let report = detector.detect(&observations).unwrap();
        assert!(!report.monthly_stats.is_empty());
        assert!(report.flagged_months.is_empty());
        assert!(report.flagged_observations.is_empty());
    }

    #[test]
    fn test_corrected_mode_flags_outliers() {
        let mut observations = spread_month(1931, 2);
        observations.extend(spread_month(1928, 7));

        let report = MonthlyAnomalyDetector::new(AnomalyMode::Corrected)
            .detect(&observations)
            .unwrap();

        assert_eq!(report.flagged_observations.len(), 2);
        assert_eq!(report.flagged_observations[0].year, 1928);
        assert_eq!(report.flagged_observations[0].temperature, 100);
        assert_eq!(report.flagged_observations[0].kind, AnomalyKind::Temperature);
        assert_eq!(report.flagged_observations[1].year, 1931);

        let months: Vec<(i32, u32)> = report.flagged_months.iter().map(|s| s.key()).collect();
        assert_eq!(months, vec![(1928, 7), (1931, 2)]);
    }

    #[test]
    fn test_corrected_mode_flags_exactly_outside_band() {
        let detector = MonthlyAnomalyDetector::new(AnomalyMode::Corrected);
        let observations = varied_observations();
        let report = detector.detect(&observations).unwrap();

        let by_month: BTreeMap<(i32, u32), MonthlyStats> = report
            .monthly_stats
            .iter()
            .map(|s| (s.key(), *s))
            .collect();

        let expected = observations
            .iter()
            .filter(|obs| {
                let stats = &by_month[&obs.year_month()];
                let t = obs.temperature as f64;
                let h = obs.humidity as f64;
                t < stats.avg_temperature - 2.0 * stats.stddev_temperature
                    || t > stats.avg_temperature + 2.0 * stats.stddev_temperature
                    || h < stats.avg_humidity - 2.0 * stats.stddev_humidity
                    || h > stats.avg_humidity + 2.0 * stats.stddev_humidity
            })
            .count();

        assert_eq!(report.flagged_observations.len(), expected);
    }

    #[test]
    fn test_flagged_observations_keep_input_order_within_month() {
        let mut observations = spread_month(1930, 3);
        observations.push(observation(1930, 3, 20, -100, 5));
        observations.insert(0, observation(1930, 3, 25, 0, 500));

        let report = MonthlyAnomalyDetector::default()
            .detect(&observations)
            .unwrap();

        let days: Vec<u32> = report
            .flagged_observations
            .iter()
            .map(|f| chrono::Datelike::day(&f.date))
            .collect();
        assert_eq!(days, vec![25, 10, 20]);

        let kinds: Vec<AnomalyKind> = report.flagged_observations.iter().map(|f| f.kind).collect();
        assert_eq!(
            kinds,
            vec![AnomalyKind::Humidity, AnomalyKind::Temperature, AnomalyKind::Temperature]
        );
    }

    #[test]
    fn test_single_observation_sample_stddev_flags_nothing() {
        let detector =
            MonthlyAnomalyDetector::new(AnomalyMode::Corrected).with_stddev_kind(StddevKind::Sample);
        let observations = vec![observation(1929, 2, 1, -1030, -1320)];

        let report = detector.detect(&observations).unwrap();
        assert_eq!(report.monthly_stats.len(), 1);
        assert!(report.monthly_stats[0].stddev_temperature.is_nan());
        assert!(report.flagged_observations.is_empty());
    }

    #[test]
    fn test_empty_input_gives_empty_report() {
        let report = MonthlyAnomalyDetector::default().detect(&[]).unwrap();
        assert!(report.monthly_stats.is_empty());
        assert!(report.summary().contains("Months analysed: 0"));
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("strict-reproduce".parse::<AnomalyMode>(), Ok(AnomalyMode::StrictReproduce));
        assert_eq!("Corrected".parse::<AnomalyMode>(), Ok(AnomalyMode::Corrected));
        assert!("lenient".parse::<AnomalyMode>().is_err());
        assert_eq!(AnomalyMode::StrictReproduce.to_string(), "strict-reproduce");
    }
}
