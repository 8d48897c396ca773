pub mod constants;
pub mod filename;
pub mod pool;
pub mod progress;

pub use constants::*;
pub use filename::generate_default_output_filename;
pub use pool::build_worker_pool;
pub use progress::ProgressReporter;
