//! Task records and the store that owns them.
//!
//! - [`task`] - the [`Task`] record observers see
//! - [`status`] - the [`TaskStatus`] lifecycle
//! - [`store`] - the lock-guarded [`TaskStore`]
//!
//! # Examples
//!
//! ```rust
//! use fetchq::download::{TaskStatus, TaskStore};
//!
//! let store = TaskStore::new();
//! let id = store.create("https://example.com/file.zip");
//!
//! store.mutate(&id, |task| task.status = TaskStatus::Downloading)?;
//! assert_eq!(store.get(&id).unwrap().status, TaskStatus::Downloading);
//! # Ok::<(), fetchq::Error>(())
//! ```

pub mod status;
pub mod store;
pub mod task;

pub use status::TaskStatus;
pub use store::{Snapshot, TaskStore};
pub use task::Task;
