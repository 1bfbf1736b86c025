//! Runtime utilities that abstract over the underlying async executor.
//!
//! Synchronous callers (logging layers, builders running outside a runtime)
//! use [`block_on`] to drive a future to completion on a throwaway
//! current-thread runtime.

pub use tokio::runtime::{Builder, Handle, Runtime};

/// Runs the provided future to completion using a lightweight runtime.
///
/// Returns an error if the runtime could not be built.
pub fn block_on<F>(future: F) -> std::io::Result<F::Output>
where
    F: std::future::Future,
{
    let runtime = Builder::new_current_thread().enable_all().build()?;
    Ok(runtime.block_on(future))
}

/// Returns `true` when called from inside a tokio runtime.
pub fn in_runtime() -> bool {
    Handle::try_current().is_ok()
}
