//! JobStore port - Job の最終状態の永続化
//!
//! スキーマはこのクレートの責務外です。Task Runner は確定した Job を
//! 1 件ずつ `save()` に渡すだけです。

use async_trait::async_trait;

use crate::domain::{HandlerError, Job};

/// JobStore は Job の状態・終了コード・出力を保存
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn save(&self, job: &Job) -> Result<(), HandlerError>;
}
