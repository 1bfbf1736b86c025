//! Task spawning and execution abstractions.
//!
//! - `spawn`: Runs a future concurrently and returns an awaitable `JoinHandle`
//! - `spawn_blocking`: Offloads blocking work (file probing, image decoding)
//!   to the blocking thread pool
//!
//! # Examples
//!
//! ```rust
//! use core_async::task;
//!
//! async fn example() {
//!     let handle = task::spawn(async { 42 });
//!     assert_eq!(handle.await.unwrap(), 42);
//!
//!     let sum = task::spawn_blocking(|| (1..=4).sum::<u32>()).await.unwrap();
//!     assert_eq!(sum, 10);
//! }
//! ```

pub use tokio::task::{spawn_blocking, yield_now, AbortHandle, JoinError, JoinHandle};

/// Spawns a new asynchronous task on the current runtime.
///
/// The spawned task may run on a different thread, so both the future and its
/// output must be `Send`.
pub fn spawn<F>(future: F) -> JoinHandle<F::Output>
where
    F: std::future::Future + Send + 'static,
    F::Output: Send + 'static,
{
    tokio::task::spawn(future)
}

/// Result type for task operations.
pub type Result<T> = std::result::Result<T, JoinError>;
