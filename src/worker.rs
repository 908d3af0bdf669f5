//! Async handle over an editing session.
//!
//! Store work is blocking file I/O, so every operation runs on tokio's
//! blocking pool while holding the session lock. One operation is in flight
//! at a time; its result comes back to the awaiting task.

use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::config::StoreConfig;
use crate::error::{MarksError, Result};
use crate::record::{Marks, StudentRecord};
use crate::session::{EditorSession, Navigation, Preview, SubmitOutcome};
use crate::store::MarksStore;

#[derive(Clone, Default)]
pub struct MarksWorker {
    session: Arc<Mutex<Option<EditorSession>>>,
}

impl MarksWorker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load `path` and start a session on its first data row, replacing any
    /// open session
    pub async fn open(&self, path: PathBuf, config: StoreConfig) -> Result<StudentRecord> {
        let mut guard = self.session.clone().lock_owned().await;

        tokio::task::spawn_blocking(move || {
            if let Some(mut previous) = guard.take() {
                previous.close();
            }
            let session = EditorSession::new(MarksStore::open(&path, config)?)?;
            let record = session.current()?;
            *guard = Some(session);
            Ok(record)
        })
        .await
        .map_err(|e| MarksError::Worker(format!("Task join error: {}", e)))?
    }

    async fn run<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut EditorSession) -> Result<T> + Send + 'static,
    {
        let mut guard = self.session.clone().lock_owned().await;

        tokio::task::spawn_blocking(move || {
            let session = guard.as_mut().ok_or(MarksError::Closed)?;
            op(session)
        })
        .await
        .map_err(|e| MarksError::Worker(format!("Task join error: {}", e)))?
    }

    pub async fn current(&self) -> Result<StudentRecord> {
        self.run(|session| session.current()).await
    }

    pub async fn cursor(&self) -> Result<usize> {
        self.run(|session| Ok(session.cursor())).await
    }

    pub async fn stage(&self, marks: Marks) -> Result<Preview> {
        self.run(move |session| session.stage(marks)).await
    }

    pub async fn discard(&self) -> Result<()> {
        self.run(|session| {
            session.discard();
            Ok(())
        })
        .await
    }

    pub async fn submit(&self) -> Result<SubmitOutcome> {
        self.run(|session| Ok(session.submit())).await
    }

    pub async fn next(&self) -> Result<Navigation> {
        self.run(|session| session.next()).await
    }

    pub async fn previous(&self) -> Result<Navigation> {
        self.run(|session| session.previous()).await
    }

    pub async fn go_to(&self, row: usize) -> Result<Navigation> {
        self.run(move |session| session.go_to(row)).await
    }

    /// Close the open session, if any
    pub async fn close(&self) -> Result<()> {
        let mut guard = self.session.clone().lock_owned().await;

        tokio::task::spawn_blocking(move || {
            if let Some(mut session) = guard.take() {
                session.close();
            }
        })
        .await
        .map_err(|e| MarksError::Worker(format!("Task join error: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(dir: &tempfile::TempDir) -> PathBuf {
        let path = dir.path().join("marks.csv");
        std::fs::write(
            &path,
            "Name,USN,Exam1,Exam2,Exam3\nAlice,USN001,40,35,45\nBob,USN002,10,20,30\n",
        )
        .unwrap();
        path
    }

    #[tokio::test]
    async fn test_open_stage_submit_next() {
        let dir = tempfile::tempdir().unwrap();
        let path = sample(&dir);
        let worker = MarksWorker::new();

        let first = worker.open(path.clone(), StoreConfig::default()).await.unwrap();
        assert_eq!(first.name(), "Alice");

        let preview = worker.stage(Marks::new(10.0, 20.0, 30.0)).await.unwrap();
        assert_eq!(preview.total, 60.0);

        match worker.submit().await.unwrap() {
            SubmitOutcome::Saved { has_next, .. } => assert!(has_next),
            other => panic!("unexpected outcome {:?}", other),
        }

        match worker.next().await.unwrap() {
            Navigation::Moved(record) => assert_eq!(record.name(), "Bob"),
            other => panic!("unexpected navigation {:?}", other),
        }
        assert_eq!(worker.cursor().await.unwrap(), 2);

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("Alice,USN001,10.00,20.00,30.00\n"));
    }

    #[tokio::test]
    async fn test_operations_without_session() {
        let worker = MarksWorker::new();
        assert!(matches!(worker.current().await, Err(MarksError::Closed)));

        worker.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_close_ends_session() {
        let dir = tempfile::tempdir().unwrap();
        let worker = MarksWorker::new();
        worker.open(sample(&dir), StoreConfig::default()).await.unwrap();

        worker.close().await.unwrap();
        worker.close().await.unwrap();
        assert!(matches!(worker.next().await, Err(MarksError::Closed)));
    }

    #[tokio::test]
    async fn test_open_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let worker = MarksWorker::new();

        let result = worker
            .open(dir.path().join("missing.csv"), StoreConfig::default())
            .await;
        assert!(matches!(result, Err(MarksError::Io { .. })));
    }
}
