//! Registry of in-flight task executions.
//!
//! Every running subprocess has exactly one entry, keyed by a [`TaskId`]
//! that is handed out by the registry itself and never reused. All state,
//! including the id counter, sits behind a single mutex; no operation holds
//! it across an `.await` or while doing subprocess I/O.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Identity of a running task. Starts at 1, strictly increasing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(pub u64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Registry lookup failure.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RegistryError {
    /// No live task has this id.
    #[error("task with ID {0} not found")]
    NotFound(TaskId),
}

/// Point-in-time view of one registry entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSnapshot {
    pub id: TaskId,
    pub command: String,
}

struct TaskEntry {
    command: String,
    cancel: CancellationToken,
}

#[derive(Default)]
struct Inner {
    last_id: u64,
    tasks: BTreeMap<TaskId, TaskEntry>,
}

/// Concurrency-safe table of running tasks.
#[derive(Default)]
pub struct TaskRegistry {
    inner: Mutex<Inner>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next id and store the entry under it.
    pub fn register(&self, command: impl Into<String>, cancel: CancellationToken) -> TaskId {
        let command = command.into();
        let mut inner = self.inner.lock();
        inner.last_id += 1;
        let id = TaskId(inner.last_id);
        debug!(task_id = %id, command = %command, "task registered");
        inner.tasks.insert(id, TaskEntry { command, cancel });
        id
    }

    /// Register and return a guard that deregisters on drop.
    pub fn register_guarded(
        self: &Arc<Self>,
        command: impl Into<String>,
        cancel: CancellationToken,
    ) -> TaskGuard {
        let id = self.register(command, cancel);
        TaskGuard {
            registry: Arc::clone(self),
            id,
        }
    }

    /// Remove an entry. Returns `false` if it was already gone.
    pub fn deregister(&self, id: TaskId) -> bool {
        let removed = self.inner.lock().tasks.remove(&id).is_some();
        if removed {
            debug!(task_id = %id, "task deregistered");
        }
        removed
    }

    /// Snapshot of every live entry, ordered by id.
    pub fn list(&self) -> Vec<TaskSnapshot> {
        self.inner
            .lock()
            .tasks
            .iter()
            .map(|(id, entry)| TaskSnapshot {
                id: *id,
                command: entry.command.clone(),
            })
            .collect()
    }

    /// Request cancellation of a task.
    ///
    /// Does not wait for the subprocess to exit; the runner observes the
    /// token and deregisters the entry itself.
    pub fn cancel(&self, id: TaskId) -> Result<(), RegistryError> {
        let inner = self.inner.lock();
        let entry = inner.tasks.get(&id).ok_or(RegistryError::NotFound(id))?;
        entry.cancel.cancel();
        debug!(task_id = %id, "task cancellation requested");
        Ok(())
    }

    /// Request cancellation of every live task. Returns how many were signalled.
    pub fn cancel_all(&self) -> usize {
        let inner = self.inner.lock();
        for entry in inner.tasks.values() {
            entry.cancel.cancel();
        }
        inner.tasks.len()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Keeps a task registered for as long as it is alive.
///
/// Dropping the guard removes the entry, so an early return or a panic in
/// the runner cannot leak it.
pub struct TaskGuard {
    registry: Arc<TaskRegistry>,
    id: TaskId,
}

impl TaskGuard {
    pub fn id(&self) -> TaskId {
        self.id
    }
}

impl Drop for TaskGuard {
    fn drop(&mut self) {
        self.registry.deregister(self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashSet;

    #[test]
    fn ids_start_at_one_and_increase() {
        let reg = TaskRegistry::new();
        let a = reg.register("sleep 1", CancellationToken::new());
        let b = reg.register("sleep 2", CancellationToken::new());
        assert_eq!(a, TaskId(1));
        assert_eq!(b, TaskId(2));
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn list_is_ordered_snapshot() {
        let reg = TaskRegistry::new();
        reg.register("sleep 10", CancellationToken::new());
        reg.register("top -b", CancellationToken::new());
        let list = reg.list();
        assert_eq!(
            list,
            vec![
                TaskSnapshot { id: TaskId(1), command: "sleep 10".into() },
                TaskSnapshot { id: TaskId(2), command: "top -b".into() },
            ]
        );
    }

    #[test]
    fn deregister_is_idempotent() {
        let reg = TaskRegistry::new();
        let id = reg.register("x", CancellationToken::new());
        assert!(reg.deregister(id));
        assert!(!reg.deregister(id));
        assert!(!reg.deregister(TaskId(42)));
        assert!(reg.is_empty());
    }

    #[test]
    fn cancel_unknown_reports_not_found_and_mutates_nothing() {
        let reg = TaskRegistry::new();
        let token = CancellationToken::new();
        reg.register("x", token.clone());

        let err = reg.cancel(TaskId(7)).unwrap_err();
        assert_eq!(err, RegistryError::NotFound(TaskId(7)));
        assert_eq!(err.to_string(), "task with ID 7 not found");
        assert_eq!(reg.len(), 1);
        assert!(!token.is_cancelled());
    }

    #[test]
    fn cancel_fires_token_but_keeps_entry() {
        let reg = TaskRegistry::new();
        let token = CancellationToken::new();
        let id = reg.register("sleep 10", token.clone());

        reg.cancel(id).unwrap();
        assert!(token.is_cancelled());
        // Removal is the runner's job.
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn ids_never_reused_after_cancel_and_deregister() {
        let reg = TaskRegistry::new();
        let k = reg.register("a", CancellationToken::new());
        reg.cancel(k).unwrap();
        assert!(reg.deregister(k));
        assert!(reg.is_empty());

        let next = reg.register("b", CancellationToken::new());
        assert!(next > k);
    }

    #[test]
    fn guard_deregisters_on_drop() {
        let reg = Arc::new(TaskRegistry::new());
        let guard = reg.register_guarded("sleep 1", CancellationToken::new());
        let id = guard.id();
        assert_eq!(reg.list()[0].id, id);
        drop(guard);
        assert!(reg.is_empty());
    }

    #[test]
    fn guard_deregisters_on_panic() {
        let reg = Arc::new(TaskRegistry::new());
        let reg2 = Arc::clone(&reg);
        let result = std::thread::spawn(move || {
            let _guard = reg2.register_guarded("boom", CancellationToken::new());
            panic!("runner blew up");
        })
        .join();
        assert!(result.is_err());
        assert!(reg.is_empty());
    }

    #[tokio::test]
    async fn panicking_task_leaves_runtime_and_registry_usable() {
        let reg = Arc::new(TaskRegistry::new());
        let reg2 = Arc::clone(&reg);
        let joined = tokio::spawn(async move {
            let _guard = reg2.register_guarded("boom", CancellationToken::new());
            tokio::task::yield_now().await;
            panic!("runner blew up");
        })
        .await;

        assert!(joined.unwrap_err().is_panic());
        assert!(reg.is_empty());
        assert_eq!(reg.register("next", CancellationToken::new()), TaskId(2));
    }

    #[test]
    fn cancel_all_signals_every_task() {
        let reg = TaskRegistry::new();
        let tokens: Vec<_> = (0..3).map(|_| CancellationToken::new()).collect();
        for t in &tokens {
            reg.register("x", t.clone());
        }
        assert_eq!(reg.cancel_all(), 3);
        assert!(tokens.iter().all(|t| t.is_cancelled()));
    }

    #[test]
    fn concurrent_register_yields_distinct_ids() {
        let reg = Arc::new(TaskRegistry::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let reg = Arc::clone(&reg);
                std::thread::spawn(move || {
                    (0..250)
                        .map(|i| reg.register(format!("cmd {i}"), CancellationToken::new()))
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut seen = HashSet::new();
        for h in handles {
            for id in h.join().unwrap() {
                assert!(seen.insert(id), "duplicate id {id}");
            }
        }
        assert_eq!(seen.len(), 2000);
        assert_eq!(reg.len(), 2000);
    }

    #[test]
    fn list_during_churn_never_sees_duplicates() {
        let reg = Arc::new(TaskRegistry::new());
        let writers: Vec<_> = (0..4)
            .map(|_| {
                let reg = Arc::clone(&reg);
                std::thread::spawn(move || {
                    for _ in 0..500 {
                        let id = reg.register("churn", CancellationToken::new());
                        reg.deregister(id);
                    }
                })
            })
            .collect();

        let reader = {
            let reg = Arc::clone(&reg);
            std::thread::spawn(move || {
                for _ in 0..500 {
                    let snapshot = reg.list();
                    let ids: HashSet<_> = snapshot.iter().map(|s| s.id).collect();
                    assert_eq!(ids.len(), snapshot.len());
                    assert!(snapshot.windows(2).all(|w| w[0].id < w[1].id));
                    assert!(snapshot.iter().all(|s| s.command == "churn"));
                }
            })
        };

        for w in writers {
            w.join().unwrap();
        }
        reader.join().unwrap();
        assert!(reg.is_empty());
    }
}
