use crate::foundation::error::{StepcastError, StepcastResult};

/// Dedicated rayon pool; `None` uses rayon's default size.
pub(crate) fn build_thread_pool(threads: Option<usize>, what: &str) -> StepcastResult<rayon::ThreadPool> {
    if threads == Some(0) {
        return Err(StepcastError::config(format!(
            "{what} threads must be >= 1 when set"
        )));
    }

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| StepcastError::config(format!("failed to build {what} thread pool: {e}")))
}
