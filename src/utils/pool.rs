use crate::error::{ProcessingError, Result};

/// Dedicated rayon pool so `max_workers` bounds the parallel stages.
pub fn build_worker_pool(threads: usize) -> Result<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|index| format!("isd-worker-{}", index))
        .build()
        .map_err(|e| ProcessingError::Worker(format!("cannot start {} workers: {}", threads, e)))
}
