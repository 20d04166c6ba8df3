//! TaskRunner - 1 バッチを all-or-nothing で実行する
//!
//! # フロー
//! 1. ConnectionGuard::close_stale()
//! 2. 全 Job に同じ開始時刻を記録（handler 呼び出しより前）
//! 3. handler.call(batch)（panic も handler の失敗として扱う）
//! 4. 成功: Job ごとに exit code で Completed / Failed を確定 → 保存 → メトリクス
//! 5. 失敗: 未確定の Job を Failed にしてエラー文を付与 → 保存 → 全 Job を失敗として計上 → 元のエラーを返す
//! 6. ConnectionGuard::close_stale()
//!
//! リトライはしません（オーケストレーターの責務）。

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tracing::{debug, error, info, warn};

use crate::domain::{HandlerError, JobBatch, JobStatus};
use crate::ports::{Clock, ConnectionGuard, JobMetrics, JobStore};
use crate::registry::JobHandler;

/// TaskRunner はバッチ実行の後処理を一手に引き受ける
#[derive(Clone)]
pub struct TaskRunner {
    clock: Arc<dyn Clock>,
    store: Arc<dyn JobStore>,
    metrics: Arc<dyn JobMetrics>,
    connections: Arc<dyn ConnectionGuard>,
}

impl TaskRunner {
    pub fn new(
        clock: Arc<dyn Clock>,
        store: Arc<dyn JobStore>,
        metrics: Arc<dyn JobMetrics>,
        connections: Arc<dyn ConnectionGuard>,
    ) -> Self {
        Self {
            clock,
            store,
            metrics,
            connections,
        }
    }

    /// バッチを実行する。
    ///
    /// 戻り値が `Ok` でも、個々の Job は exit code 次第で Failed になり得ます。
    /// `Err` は handler 自身が失敗したときだけで、その時点で全 Job は終端状態です。
    pub async fn run_task(
        &self,
        task_name: &str,
        handler: &dyn JobHandler,
        jobs: &mut JobBatch,
    ) -> Result<(), HandlerError> {
        self.connections.close_stale();
        jobs.set_start_times(self.clock.now());

        debug!(task_name = %task_name, jobs = jobs.len(), "running batch");
        let result = match AssertUnwindSafe(handler.call(jobs)).catch_unwind().await {
            Ok(result) => result,
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                error!(task_name = %task_name, panic_msg = %message, "handler panicked");
                Err(HandlerError::new(format!("handler panicked: {message}")))
            }
        };

        let outcome = match result {
            Ok(()) => self.finish_batch(task_name, jobs).await,
            Err(err) => {
                self.abort_batch(task_name, jobs, &err).await;
                Err(err)
            }
        };

        self.connections.close_stale();
        outcome
    }

    /// handler を呼べないバッチ（未登録 / ロード不能）を失敗として確定する
    pub async fn reject_batch(&self, task_name: &str, jobs: &mut JobBatch, err: &HandlerError) {
        jobs.set_start_times(self.clock.now());
        self.abort_batch(task_name, jobs, err).await;
    }

    async fn finish_batch(&self, task_name: &str, jobs: &mut JobBatch) -> Result<(), HandlerError> {
        let mut save_error = None;

        for job in jobs.iter_mut() {
            job.finalize();
            info!(
                task_name = %task_name,
                job_id = %job.id,
                exit_code = ?job.exit_code(),
                status = ?job.status(),
                "job finished"
            );
            if !job.output().is_empty() {
                debug!(job_id = %job.id, stdout = %job.output(), "job output");
            }
            if !job.error_output().is_empty() {
                debug!(job_id = %job.id, stderr = %job.error_output(), "job error output");
            }

            if let Err(err) = self.store.save(job).await {
                error!(job_id = %job.id, error = %err, "failed to save job");
                save_error.get_or_insert(err);
            }

            match job.status() {
                JobStatus::Completed => self.metrics.job_completed(task_name),
                _ => self.metrics.job_failed(task_name),
            }
        }

        match save_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn abort_batch(&self, task_name: &str, jobs: &mut JobBatch, err: &HandlerError) {
        error!(task_name = %task_name, error = %err, jobs = jobs.len(), "batch failed");
        let text = err.to_string();

        for job in jobs.iter_mut() {
            if !job.mark_failed(&text) {
                debug!(job_id = %job.id, status = ?job.status(), "job already terminal");
            }
            if let Err(save_err) = self.store.save(job).await {
                warn!(job_id = %job.id, error = %save_err, "failed to save failed job");
            }
            self.metrics.job_failed(task_name);
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
