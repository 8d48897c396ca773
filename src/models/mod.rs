pub mod observation;
pub mod summary;

pub use observation::{CleanedObservation, DatedObservation, QualityCode};
pub use summary::{AnomalyKind, FlaggedObservation, MonthlyStats, YearCorrelation};
