//! Synchronization primitives.
//!
//! Async-aware channels used for the engine's command and event plumbing,
//! plus a cancellation token for cooperative shutdown of background tasks.
//!
//! # Examples
//!
//! ```rust
//! use core_async::sync::mpsc;
//!
//! async fn example() {
//!     let (tx, mut rx) = mpsc::unbounded_channel();
//!     tx.send(7).unwrap();
//!     assert_eq!(rx.recv().await, Some(7));
//! }
//! ```

pub use tokio::sync::{broadcast, mpsc, oneshot, watch, Mutex, Notify, RwLock};

pub use tokio_util::sync::CancellationToken;
