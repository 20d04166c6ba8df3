//! ジョブキューのトランスポート port
//!
//! `QueueRpcClient` は呼び出しごとに `connect()` し、`submit_job()` を 1 回だけ
//! 発行して `shutdown()` します（接続プールはしない）。

use std::time::Duration;

use async_trait::async_trait;

use crate::client::error::ClientResult;

/// submit_job() が返った時点のジョブ状態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    /// サーバーがまだ受け付けていない
    Pending,
    /// 受け付け済みだが完了していない（poll timeout）
    Created,
    Complete,
    /// ワーカーが異常終了した
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobResponse {
    pub state: JobState,
    pub result: Vec<u8>,
}

impl JobResponse {
    pub fn new(state: JobState, result: impl Into<Vec<u8>>) -> Self {
        Self {
            state,
            result: result.into(),
        }
    }
}

#[async_trait]
pub trait QueueConnector: Send + Sync {
    async fn connect(&self, server: &str) -> ClientResult<Box<dyn QueueConnection>>;
}

/// 1 回分の接続
#[async_trait]
pub trait QueueConnection: Send {
    /// 完了・失敗・poll_timeout のいずれかまで待つ
    async fn submit_job(
        &mut self,
        ability: &str,
        data: &[u8],
        poll_timeout: Duration,
    ) -> ClientResult<JobResponse>;

    async fn shutdown(&mut self);
}
