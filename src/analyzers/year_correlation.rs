use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::analyzers::statistics::correlation;
use crate::error::{ProcessingError, Result, StatsError};
use crate::models::{CleanedObservation, YearCorrelation};

/// Temperatures and humidities of one year, in arrival order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct YearSeries {
    pub temperatures: Vec<f64>,
    pub humidities: Vec<f64>,
}

impl YearSeries {
    pub fn push(&mut self, temperature: i32, humidity: i32) {
        self.temperatures.push(temperature as f64);
        self.humidities.push(humidity as f64);
    }

    pub fn len(&self) -> usize {
        self.temperatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.temperatures.is_empty()
    }

    pub fn correlation(&self) -> std::result::Result<f64, StatsError> {
        correlation(&self.temperatures, &self.humidities)
    }
}

/// Groups cleaned observations by year and computes one correlation per year.
#[derive(Debug, Clone, Default)]
pub struct YearCorrelationAggregator {
    years: BTreeMap<i32, YearSeries>,
    skip_degenerate_years: bool,
}

impl YearCorrelationAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Omit years whose correlation is undefined instead of failing on them.
    pub fn with_skip_degenerate_years(mut self, skip: bool) -> Self {
        self.skip_degenerate_years = skip;
        self
    }

    pub fn push(&mut self, obs: CleanedObservation) {
        self.years
            .entry(obs.year)
            .or_default()
            .push(obs.temperature, obs.humidity);
    }

    /// Append another aggregator's series after ours, year by year.
    pub fn merge(&mut self, other: YearCorrelationAggregator) {
        for (year, series) in other.years {
            let entry = self.years.entry(year).or_default();
            entry.temperatures.extend(series.temperatures);
            entry.humidities.extend(series.humidities);
        }
    }

    pub fn year_count(&self) -> usize {
        self.years.len()
    }

    pub fn series(&self, year: i32) -> Option<&YearSeries> {
        self.years.get(&year)
    }

    /// One correlation per year, ascending by year.
    pub fn finish(self) -> Result<Vec<YearCorrelation>> {
        let skip_degenerate = self.skip_degenerate_years;
        let mut results = Vec::with_capacity(self.years.len());

        for (year, series) in self.years {
            match series.correlation() {
                Ok(correlation) => {
                    debug!(year, observations = series.len(), correlation, "year correlated");
                    results.push(YearCorrelation {
                        year,
                        observations: series.len(),
                        correlation,
                    });
                }
                Err(source) if skip_degenerate => {
                    warn!(year, observations = series.len(), %source, "skipping year");
                }
                Err(source) => return Err(ProcessingError::YearStatistics { year, source }),
            }
        }

        Ok(results)
    }
}

impl Extend<CleanedObservation> for YearCorrelationAggregator {
    fn extend<I: IntoIterator<Item = CleanedObservation>>(&mut self, iter: I) {
        for obs in iter {
            self.push(obs);
        }
    }
}

impl FromIterator<CleanedObservation> for YearCorrelationAggregator {
    fn from_iter<I: IntoIterator<Item = CleanedObservation>>(iter: I) -> Self {
        let mut aggregator = Self::new();
        aggregator.extend(iter);
        aggregator
    }
}
