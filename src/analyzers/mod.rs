pub mod monthly_anomaly;
pub mod statistics;
pub mod year_correlation;

pub use monthly_anomaly::{AnomalyMode, AnomalyReport, MonthlyAnomalyDetector};
pub use statistics::{correlation, covariance, mean, stddev, MomentAccumulator, StddevKind};
pub use year_correlation::{YearCorrelationAggregator, YearSeries};
