//! JobSource port - (task_name, JobBatch) の取得元
//!
//! 本番ではオーケストレーターからの配送キュー、開発・テストでは
//! `impls::InMemoryJobSource` を使います。

use std::time::Duration;

use async_trait::async_trait;

use crate::domain::JobBatch;

/// 1 回の pull で得られる作業単位
#[derive(Debug, Clone, PartialEq)]
pub struct TaskBatch {
    pub task_name: String,
    pub jobs: JobBatch,
}

/// JobSource はバッチを 1 件ずつ払い出す
///
/// # 設計原則
/// - timeout までに何もなければ `Ok(None)`
/// - 同じバッチを 2 回払い出さない
#[async_trait]
pub trait JobSource: Send + Sync {
    async fn next_batch(&self, timeout: Duration) -> Result<Option<TaskBatch>, SourceError>;
}

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("job source closed")]
    Closed,

    #[error("job source failed: {0}")]
    OperationFailed(String),
}
