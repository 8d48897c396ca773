//! Population statistics over `f64` series, plus an integer moment accumulator
//! that can be merged across partitions.

use serde::{Deserialize, Serialize};

use crate::error::StatsError;

/// Arithmetic mean.
pub fn mean(xs: &[f64]) -> Result<f64, StatsError> {
    if xs.is_empty() {
        return Err(StatsError::EmptyInput);
    }
    Ok(xs.iter().sum::<f64>() / xs.len() as f64)
}

/// Population covariance, `Σ(x - x̄)(y - ȳ) / n`.
pub fn covariance(xs: &[f64], ys: &[f64]) -> Result<f64, StatsError> {
    if xs.len() != ys.len() {
        return Err(StatsError::LengthMismatch {
            left: xs.len(),
            right: ys.len(),
        });
    }

    let mean_x = mean(xs)?;
    let mean_y = mean(ys)?;
    let sum: f64 = xs
        .iter()
        .zip(ys)
        .map(|(x, y)| (x - mean_x) * (y - mean_y))
        .sum();

    Ok(sum / xs.len() as f64)
}

/// Population standard deviation, `sqrt(Σ(x - x̄)² / n)`.
pub fn stddev(xs: &[f64]) -> Result<f64, StatsError> {
    let m = mean(xs)?;
    let variance = xs.iter().map(|x| (x - m) * (x - m)).sum::<f64>() / xs.len() as f64;
    Ok(variance.sqrt())
}

/// Pearson correlation, `cov(x, y) / (σx · σy)`.
///
/// Fails with [`StatsError::ZeroVariance`] when either series is constant.
pub fn correlation(xs: &[f64], ys: &[f64]) -> Result<f64, StatsError> {
    let cov = covariance(xs, ys)?;
    let denominator = stddev(xs)? * stddev(ys)?;

    if denominator == 0.0 {
        return Err(StatsError::ZeroVariance);
    }

    Ok(cov / denominator)
}

/// Divisor used for variance.
///
/// Defaults to the sample estimator, the `stddev` aggregate of dataframe
/// engines. The free functions above are always population forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StddevKind {
    /// Divide by `n`
    Population,
    /// Divide by `n - 1`
    #[default]
    Sample,
}

impl std::str::FromStr for StddevKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "population" => Ok(StddevKind::Population),
            "sample" => Ok(StddevKind::Sample),
            other => Err(format!(
                "unknown stddev kind '{}', expected 'population' or 'sample'",
                other
            )),
        }
    }
}

/// Count, sum and sum of squares of integer samples.
///
/// Sums are kept in `i128` so merging partitions in any order gives the same
/// exact totals; floating point only enters when a statistic is read out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MomentAccumulator {
    count: u64,
    sum: i128,
    sum_of_squares: i128,
}

impl MomentAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, value: i32) {
        let value = value as i128;
        self.count += 1;
        self.sum += value;
        self.sum_of_squares += value * value;
    }

    pub fn merge(mut self, other: &MomentAccumulator) -> Self {
        self.count += other.count;
        self.sum += other.sum;
        self.sum_of_squares += other.sum_of_squares;
        self
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn mean(&self) -> Result<f64, StatsError> {
        if self.is_empty() {
            return Err(StatsError::EmptyInput);
        }
        Ok(self.sum as f64 / self.count as f64)
    }

    /// Variance with the given divisor. A sample variance of one value is NaN.
    pub fn variance(&self, kind: StddevKind) -> Result<f64, StatsError> {
        if self.is_empty() {
            return Err(StatsError::EmptyInput);
        }

        let n = self.count as i128;
        // n² · population variance, exact and never negative
        let scaled = n * self.sum_of_squares - self.sum * self.sum;

        let divisor = match kind {
            StddevKind::Population => n * n,
            StddevKind::Sample if n < 2 => return Ok(f64::NAN),
            StddevKind::Sample => n * (n - 1),
        };

        Ok(scaled as f64 / divisor as f64)
    }

    pub fn stddev(&self, kind: StddevKind) -> Result<f64, StatsError> {
        Ok(self.variance(kind)?.sqrt())
    }
}

impl Extend<i32> for MomentAccumulator {
    fn extend<I: IntoIterator<Item = i32>>(&mut self, iter: I) {
        for value in iter {
            self.push(value);
        }
    }
}
