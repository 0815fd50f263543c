//! Change notifications for mutated entities.
//!
//! # Responsibility
//! - Keep a set of observers interested in changes of one entity type.
//! - Fan a change out to every observer synchronously.
//!
//! # Invariants
//! - Membership is by observer instance; attaching twice keeps one entry.
//! - `notify` runs every observer even when some of them fail.
//! - Iteration order across observers is unspecified.

use crate::model::EntityId;
use crate::repo::RepoResult;
use log::{debug, warn};
use rusqlite::Connection;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub mod channel;

/// Listener told about a changed entity identity.
pub trait Observer: Send + Sync {
    /// Short label used in log events.
    fn name(&self) -> &str;

    /// Called once per notified change. `store` is the connection the change
    /// was committed on.
    fn on_update(&self, store: &Connection, subject_id: EntityId) -> RepoResult<()>;
}

/// Outcome of one `notify` fan-out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NotifyReport {
    pub delivered: usize,
    pub failed: usize,
}

/// Observer set for one mutation source.
#[derive(Default)]
pub struct ChangeSubject {
    observers: Mutex<HashMap<usize, Arc<dyn Observer>>>,
}

impl ChangeSubject {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an observer. Returns `false` when this instance was already attached.
    pub fn attach(&self, observer: Arc<dyn Observer>) -> bool {
        let key = observer_key(&observer);
        let mut observers = self.lock();
        if observers.contains_key(&key) {
            return false;
        }
        observers.insert(key, observer);
        true
    }

    /// Removes an observer. Returns `false` when it was not attached.
    pub fn detach(&self, observer: &Arc<dyn Observer>) -> bool {
        self.lock().remove(&observer_key(observer)).is_some()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Calls `on_update(subject_id)` on every attached observer.
    ///
    /// Failures are logged and counted; they never stop the fan-out.
    pub fn notify(&self, store: &Connection, subject_id: EntityId) -> NotifyReport {
        // Observers may attach or detach from inside `on_update`.
        let snapshot: Vec<Arc<dyn Observer>> = self.lock().values().cloned().collect();
        let mut report = NotifyReport::default();

        for observer in snapshot {
            match observer.on_update(store, subject_id) {
                Ok(()) => report.delivered += 1,
                Err(err) => {
                    report.failed += 1;
                    warn!(
                        "event=observer_notify module=observer status=error observer={} subject_id={} error={}",
                        observer.name(),
                        subject_id,
                        err
                    );
                }
            }
        }

        debug!(
            "event=observer_notify module=observer status=done subject_id={} delivered={} failed={}",
            subject_id, report.delivered, report.failed
        );
        report
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<usize, Arc<dyn Observer>>> {
        self.observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

fn observer_key(observer: &Arc<dyn Observer>) -> usize {
    Arc::as_ptr(observer) as *const () as usize
}
