//! Change-driven status snapshots.
//!
//! Each subscriber polls the task store on a fixed period and receives the
//! full snapshot whenever it differs, by value, from the last one that
//! subscriber was sent. Subscribers are independent: one falling behind or
//! being dropped never affects another.

use crate::download::{Snapshot, TaskStore};

use futures::stream::{self, BoxStream, StreamExt};
use std::sync::Arc;
use std::time::Duration;

/// How often subscribers compare the store against their last snapshot.
pub const STATUS_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// An endless stream of task snapshots, emitted only on change.
pub type StatusStream = BoxStream<'static, Snapshot>;

struct Cursor {
    store: Arc<TaskStore>,
    last: Snapshot,
    polled: bool,
}

/// Starts a new subscription.
///
/// The cursor starts out empty, so an empty store emits nothing until the
/// first task appears.
pub fn subscribe(store: Arc<TaskStore>) -> StatusStream {
    let cursor = Cursor {
        store,
        last: Snapshot::new(),
        polled: false,
    };

    stream::unfold(cursor, |mut cursor| async move {
        loop {
            if cursor.polled {
                tokio::time::sleep(STATUS_POLL_INTERVAL).await;
            }
            cursor.polled = true;

            let current = cursor.store.snapshot();
            if current != cursor.last {
                cursor.last = current.clone();
                return Some((current, cursor));
            }
        }
    })
    .boxed()
}
