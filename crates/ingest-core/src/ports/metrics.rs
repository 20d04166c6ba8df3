//! JobMetrics port - ジョブ結果のカウンタ
//!
//! Task Runner は Job ごとに `job_completed` か `job_failed` のどちらかを
//! ちょうど 1 回呼びます。

/// JobMetrics は task 単位の完了 / 失敗を記録
pub trait JobMetrics: Send + Sync {
    fn job_completed(&self, task_name: &str);
    fn job_failed(&self, task_name: &str);
}

/// 何もしない実装
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMetrics;

impl JobMetrics for NoopMetrics {
    fn job_completed(&self, _task_name: &str) {}
    fn job_failed(&self, _task_name: &str) {}
}
