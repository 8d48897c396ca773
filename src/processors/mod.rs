pub mod batch_processor;
pub mod local_runner;
pub mod stream_mapper;
pub mod stream_reducer;

pub use batch_processor::{BatchOutput, BatchProcessor};
pub use local_runner::{LocalMapReduce, LocalRunOutput};
pub use stream_mapper::StreamMapper;
pub use stream_reducer::{ReduceSummary, StreamReducer};
