//! Runtime abstraction layer for the presenter core.
//!
//! Every engine crate reaches the async runtime through this crate instead of
//! depending on tokio directly. The surface is deliberately small: the engine
//! needs task spawning, monotonic timers that honour tokio's paused test
//! clock, and a handful of channel types.
//!
//! # Modules
//!
//! - `task`: Task spawning and execution
//! - `time`: Sleep, deadlines, timeouts and the runtime-aware `Instant`
//! - `sync`: Channels and notification primitives
//! - `runtime`: Blocking entry points for synchronous callers
//!
//! # Examples
//!
//! ```rust
//! use core_async::task;
//! use core_async::time::{sleep, Duration};
//!
//! async fn example() {
//!     let handle = task::spawn(async {
//!         sleep(Duration::from_millis(10)).await;
//!         42
//!     });
//!     assert_eq!(handle.await.unwrap(), 42);
//! }
//! ```

pub mod runtime;
pub mod sync;
pub mod task;
pub mod time;

// Re-export commonly used types at crate root for convenience
pub use task::spawn;
pub use time::{sleep, Duration, Instant};

// Macros resolve their internals through `$crate`, so callers do not need a
// direct tokio dependency.
pub use tokio::{join, select};
