//! InMemoryJobSource - 開発用のバッチ配送元
//!
//! # 学習ポイント
//! - tokio::sync::Mutex + Notify による待ち合わせ（ロックを持ったまま await しない）
//! - close() 後は残りを払い出し終えてから `SourceError::Closed`

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};

use crate::domain::JobBatch;
use crate::ports::{JobSource, SourceError, TaskBatch};

#[derive(Default)]
struct State {
    pending: VecDeque<TaskBatch>,
    closed: bool,
}

/// InMemoryJobSource は FIFO でバッチを払い出す
///
/// ```ignore
/// let source = InMemoryJobSource::new();
/// source.push("test_v0.0", batch).await;
/// let next = source.next_batch(Duration::from_secs(1)).await?;
/// ```
#[derive(Default)]
pub struct InMemoryJobSource {
    state: Mutex<State>,
    notify: Notify,
}

impl InMemoryJobSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn push(&self, task_name: impl Into<String>, jobs: JobBatch) {
        let mut state = self.state.lock().await;
        state.pending.push_back(TaskBatch {
            task_name: task_name.into(),
            jobs,
        });
        drop(state);
        self.notify.notify_one();
    }

    /// これ以上 push しない。待機中の呼び出しも起こす。
    pub async fn close(&self) {
        self.state.lock().await.closed = true;
        self.notify.notify_waiters();
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.pending.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl JobSource for InMemoryJobSource {
    async fn next_batch(&self, timeout: Duration) -> Result<Option<TaskBatch>, SourceError> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            // notified() は lock より前に作る（push との取りこぼし防止）
            let notified = self.notify.notified();
            {
                let mut state = self.state.lock().await;
                if let Some(batch) = state.pending.pop_front() {
                    return Ok(Some(batch));
                }
                if state.closed {
                    return Err(SourceError::Closed);
                }
            }

            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return Ok(None);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Job, JobId, UnitId};
    use std::sync::Arc;

    fn batch() -> JobBatch {
        JobBatch::new(vec![Job::new(
            JobId::generate(),
            "test_v0.0",
            vec![],
            UnitId::generate(),
        )])
    }

    #[tokio::test]
    async fn test_fifo_order() {
        let source = InMemoryJobSource::new();
        source.push("a_v1", batch()).await;
        source.push("b_v1", batch()).await;

        let first = source.next_batch(Duration::from_millis(10)).await.unwrap();
        let second = source.next_batch(Duration::from_millis(10)).await.unwrap();
        assert_eq!(first.unwrap().task_name, "a_v1");
        assert_eq!(second.unwrap().task_name, "b_v1");
        assert!(source.is_empty().await);
    }

    #[tokio::test]
    async fn test_timeout_returns_none() {
        let source = InMemoryJobSource::new();
        let next = source.next_batch(Duration::from_millis(50)).await.unwrap();
        assert!(next.is_none());
    }

    #[tokio::test]
    async fn test_push_wakes_waiter() {
        let source = Arc::new(InMemoryJobSource::new());
        let waiter = tokio::spawn({
            let source = source.clone();
            async move { source.next_batch(Duration::from_secs(5)).await }
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        source.push("late_v1", batch()).await;

        let got = waiter.await.unwrap().unwrap();
        assert_eq!(got.unwrap().task_name, "late_v1");
    }

    #[tokio::test]
    async fn test_close_drains_then_errors() {
        let source = InMemoryJobSource::new();
        source.push("a_v1", batch()).await;
        source.close().await;

        assert!(source.next_batch(Duration::from_millis(10)).await.unwrap().is_some());
        assert!(matches!(
            source.next_batch(Duration::from_millis(10)).await,
            Err(SourceError::Closed)
        ));
    }
}
