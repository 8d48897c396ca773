pub mod concurrent_reader;
pub mod isd_reader;
pub mod record_filter;

pub use concurrent_reader::{ConcurrentReader, ObservationBatch};
pub use isd_reader::{FileObservations, IsdReader, ObservationIterator};
pub use record_filter::{RecordFilter, RejectReason, RejectionCounts};
