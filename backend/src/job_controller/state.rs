//! Tracks background ingestion jobs.
//!
//! The main components are:
//! - `JobsState`: a clonable, thread-safe registry of job statuses plus the
//!   per-table locks that keep two jobs from loading the same table at once.
//!   It is injected into the Actix application state in `main.rs`.
//! - `JobUpdate`: a status change sent by a running job.
//! - `start_job_updater`: a long-running task that applies `JobUpdate`s to the
//!   registry in the order they were sent.

use common::jobs::JobStatus;
use log::warn;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::{mpsc, Mutex, OwnedMutexGuard, RwLock};

#[derive(Clone)]
pub struct JobsState {
    /// Job id to its latest status. Read by `GET /jobs/{job_id}`, written by
    /// `register` and the updater task.
    pub jobs: Arc<RwLock<HashMap<String, JobStatus>>>,

    /// Jobs push their progress and final status through this channel so that
    /// a late progress update can never overwrite the terminal status.
    pub tx: mpsc::Sender<JobUpdate>,

    table_locks: Arc<std::sync::Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

#[derive(Debug)]
pub struct JobUpdate {
    pub(crate) job_id: String,
    pub(crate) status: JobStatus,
}

/// Holds a table lock for the lifetime of a job.
pub struct TableGuard {
    table: String,
    lock: Arc<Mutex<()>>,
    guard: Option<OwnedMutexGuard<()>>,
    locks: Arc<std::sync::Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl Drop for TableGuard {
    fn drop(&mut self) {
        self.guard.take();
        let Ok(mut locks) = self.locks.lock() else {
            return;
        };
        // one reference in the map, one here: nobody else is waiting
        if Arc::strong_count(&self.lock) == 2 {
            locks.remove(&self.table);
        }
    }
}

impl JobsState {
    pub fn new(tx: mpsc::Sender<JobUpdate>) -> Self {
        Self {
            jobs: Arc::new(RwLock::new(HashMap::new())),
            tx,
            table_locks: Arc::new(std::sync::Mutex::new(HashMap::new())),
        }
    }

    pub async fn register(&self, job_id: &str) {
        self.jobs
            .write()
            .await
            .insert(job_id.to_string(), JobStatus::Pending);
    }

    pub async fn status(&self, job_id: &str) -> Option<JobStatus> {
        self.jobs.read().await.get(job_id).cloned()
    }

    pub async fn report(&self, job_id: &str, status: JobStatus) {
        let update = JobUpdate {
            job_id: job_id.to_string(),
            status,
        };
        if self.tx.send(update).await.is_err() {
            warn!("Job updater is gone; dropping status for job {}", job_id);
        }
    }

    /// Waits until no other job holds `table`, then holds it until the guard drops.
    pub async fn lock_table(&self, table: &str) -> TableGuard {
        let lock = {
            let mut locks = match self.table_locks.lock() {
                Ok(locks) => locks,
                Err(poisoned) => poisoned.into_inner(),
            };
            locks
                .entry(table.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        let guard = lock.clone().lock_owned().await;
        TableGuard {
            table: table.to_string(),
            lock,
            guard: Some(guard),
            locks: self.table_locks.clone(),
        }
    }

    #[cfg(test)]
    pub(crate) fn held_tables(&self) -> usize {
        self.table_locks.lock().map(|l| l.len()).unwrap_or(0)
    }
}

/// Applies `JobUpdate`s to the registry until every sender is dropped.
/// A job that reached `Completed` or `Failed` keeps that status.
pub async fn start_job_updater(state: JobsState, mut rx: mpsc::Receiver<JobUpdate>) {
    while let Some(update) = rx.recv().await {
        let mut jobs = state.jobs.write().await;
        if jobs.get(&update.job_id).is_some_and(JobStatus::is_terminal) {
            continue;
        }
        jobs.insert(update.job_id, update.status);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn state() -> (JobsState, mpsc::Receiver<JobUpdate>) {
        let (tx, rx) = mpsc::channel(16);
        (JobsState::new(tx), rx)
    }

    #[tokio::test]
    async fn updates_are_applied_in_order() {
        let (state, rx) = state();
        state.register("job").await;
        assert_eq!(state.status("job").await, Some(JobStatus::Pending));

        state.report("job", JobStatus::InProgress(10)).await;
        state.report("job", JobStatus::Completed("done".into())).await;
        let updater = tokio::spawn(start_job_updater(state.clone(), rx));

        tokio::time::timeout(Duration::from_secs(5), async {
            while state.status("job").await != Some(JobStatus::Completed("done".into())) {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();
        updater.abort();
    }

    #[tokio::test]
    async fn terminal_status_is_final() {
        let (state, rx) = state();
        state.register("job").await;
        state.report("job", JobStatus::Failed("boom".into())).await;
        state.report("job", JobStatus::InProgress(3)).await;
        let updater = tokio::spawn(start_job_updater(state.clone(), rx));

        tokio::time::timeout(Duration::from_secs(5), async {
            while state.status("job").await == Some(JobStatus::Pending) {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert_eq!(state.status("job").await, Some(JobStatus::Failed("boom".into())));
        updater.abort();
    }

    #[tokio::test]
    async fn same_table_is_exclusive() {
        let (state, _rx) = state();
        let first = state.lock_table("t").await;

        let contender = state.clone();
        let waiting = tokio::spawn(async move {
            let _guard = contender.lock_table("t").await;
        });
        tokio::task::yield_now().await;
        assert!(!waiting.is_finished());

        drop(first);
        tokio::time::timeout(Duration::from_secs(5), waiting)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(state.held_tables(), 0);
    }

    #[tokio::test]
    async fn different_tables_do_not_block() {
        let (state, _rx) = state();
        let _a = state.lock_table("a").await;
        let _b = tokio::time::timeout(Duration::from_secs(5), state.lock_table("b"))
            .await
            .unwrap();
        assert_eq!(state.held_tables(), 2);
    }
}
