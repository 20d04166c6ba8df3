//! WorkerLoop - バッチの取得と dispatch
//!
//! # フロー
//! 1. JobSource::next_batch() で (task_name, JobBatch) を取得
//! 2. HandlerRegistry で handler を解決（未登録 / ロード不能はバッチ失敗）
//! 3. task ごとの Semaphore で同時実行数を制限
//! 4. TaskRunner::run_task()
//! 5. エラーはログに出して次のバッチへ（ワーカーは止めない）

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Semaphore, watch};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::task_runner::TaskRunner;
use crate::domain::{HandlerError, JobBatch};
use crate::ports::{JobSource, SourceError, TaskBatch};
use crate::registry::HandlerRegistry;

/// dispatch 1 回分の結果
#[derive(Debug)]
pub struct DispatchOutcome {
    pub task_name: String,
    pub jobs: JobBatch,
    pub result: Result<(), HandlerError>,
}

/// Dispatcher は registry と runner を束ね、task ごとの並行数を守る
///
/// Semaphore は構築時に全 task 分を作るので、実行中はロックなしで引けます。
pub struct Dispatcher {
    registry: Arc<HandlerRegistry>,
    runner: TaskRunner,
    limits: HashMap<String, Arc<Semaphore>>,
}

impl Dispatcher {
    pub fn new(registry: Arc<HandlerRegistry>, runner: TaskRunner) -> Self {
        let limits = registry
            .descriptors()
            .filter(|d| d.is_available())
            .map(|d| {
                (
                    d.task_name().to_string(),
                    Arc::new(Semaphore::new(d.concurrency())),
                )
            })
            .collect();
        Self {
            registry,
            runner,
            limits,
        }
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    pub async fn dispatch(&self, batch: TaskBatch) -> DispatchOutcome {
        let TaskBatch {
            task_name,
            mut jobs,
        } = batch;

        let resolved = self
            .registry
            .resolve(&task_name)
            .and_then(|d| d.handler().map(|h| (d.task_name().to_string(), h)));

        let (key, handler) = match resolved {
            Ok(found) => found,
            Err(err) => {
                let err = HandlerError::from(err);
                self.runner.reject_batch(&task_name, &mut jobs, &err).await;
                return DispatchOutcome {
                    task_name,
                    jobs,
                    result: Err(err),
                };
            }
        };

        // 登録済みの task には必ず Semaphore がある
        let _permit = match self.limits.get(&key) {
            Some(limit) => match Arc::clone(limit).acquire_owned().await {
                Ok(permit) => Some(permit),
                Err(_) => {
                    let err = HandlerError::infrastructure(format!(
                        "concurrency limit for {key} is closed"
                    ));
                    self.runner.reject_batch(&task_name, &mut jobs, &err).await;
                    return DispatchOutcome {
                        task_name,
                        jobs,
                        result: Err(err),
                    };
                }
            },
            None => None,
        };

        let result = self
            .runner
            .run_task(&task_name, handler.as_ref(), &mut jobs)
            .await;
        DispatchOutcome {
            task_name,
            jobs,
            result,
        }
    }
}

/// Worker pool handle.
/// - `request_shutdown()` で新しいバッチの取得をやめる（実行中の handler は待つ）
/// - `shutdown_and_join()` で全ワーカーの終了を待てる
pub struct WorkerPool {
    shutdown_tx: watch::Sender<bool>,
    joins: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawn `n` workers.
    pub fn spawn(
        n: usize,
        source: Arc<dyn JobSource>,
        dispatcher: Arc<Dispatcher>,
        poll_interval: Duration,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let mut joins = Vec::with_capacity(n);
        for worker_id in 0..n {
            let source = Arc::clone(&source);
            let dispatcher = Arc::clone(&dispatcher);
            let mut rx = shutdown_rx.clone();

            joins.push(tokio::spawn(async move {
                worker_loop(worker_id, source, dispatcher, poll_interval, &mut rx).await;
            }));
        }

        Self { shutdown_tx, joins }
    }

    pub fn request_shutdown(&self) {
        // receivers may already be gone
        let _ = self.shutdown_tx.send(true);
    }

    /// 全ワーカーが自然に止まるのを待つ（JobSource が Closed を返すまで）
    pub async fn join(self) {
        for j in self.joins {
            if let Err(e) = j.await {
                error!(error = %e, "worker task panicked");
            }
        }
    }

    pub async fn shutdown_and_join(self) {
        self.request_shutdown();
        self.join().await;
    }
}

async fn worker_loop(
    worker_id: usize,
    source: Arc<dyn JobSource>,
    dispatcher: Arc<Dispatcher>,
    poll_interval: Duration,
    shutdown_rx: &mut watch::Receiver<bool>,
) {
    info!(worker_id, "worker started");
    loop {
        if *shutdown_rx.borrow() {
            break;
        }

        let next = tokio::select! {
            changed = shutdown_rx.changed() => {
                // sender が消えたら止める
                if changed.is_err() {
                    break;
                }
                continue;
            }
            next = source.next_batch(poll_interval) => next,
        };

        let batch = match next {
            Ok(Some(batch)) => batch,
            Ok(None) => continue,
            Err(SourceError::Closed) => break,
            Err(err) => {
                warn!(worker_id, error = %err, "failed to fetch batch");
                tokio::time::sleep(poll_interval).await;
                continue;
            }
        };

        let outcome = dispatcher.dispatch(batch).await;
        if let Err(err) = &outcome.result {
            error!(
                worker_id,
                task_name = %outcome.task_name,
                kind = ?err.kind(),
                error = %err,
                "task failed"
            );
        }
    }
    info!(worker_id, "worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ErrorKind, Job, JobId, JobStatus, UnitId};
    use crate::impls::{InMemoryJobSource, InMemoryJobStore, InMemoryMetrics};
    use crate::ports::{NoConnections, SystemClock};
    use crate::registry::handler::testing::{ExitWith, FailAfter, PanicAfter};
    use crate::registry::{JobHandler, StaticLoader};
    use async_trait::async_trait;
    use serde_json::{Value, json};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// 同時実行数の最大値を記録する
    struct Gate {
        declared: usize,
        running: AtomicUsize,
        peak: AtomicUsize,
    }

    impl Gate {
        fn new(declared: usize) -> Self {
            Self {
                declared,
                running: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl JobHandler for Gate {
        async fn call(&self, jobs: &mut JobBatch) -> Result<(), HandlerError> {
            let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(30)).await;
            self.running.fetch_sub(1, Ordering::SeqCst);
            for job in jobs.iter_mut() {
                job.set_exit_code(0);
            }
            Ok(())
        }

        fn concurrent_instances(&self) -> Option<Value> {
            Some(json!(self.declared))
        }
    }

    fn batch(task: &str) -> JobBatch {
        JobBatch::new(vec![Job::new(
            JobId::generate(),
            task,
            vec![],
            UnitId::generate(),
        )])
    }

    fn dispatcher(loader: &StaticLoader, metrics: Arc<InMemoryMetrics>) -> Arc<Dispatcher> {
        let registry = Arc::new(HandlerRegistry::load_table(
            [
                ("test_v0.0", "cmd_test"),
                ("broken_v1", "broken"),
                ("gate_v1", "gate"),
                ("panic_v1", "panics"),
                ("missing_v1", "not_linked"),
            ],
            loader,
        ));
        let runner = TaskRunner::new(
            Arc::new(SystemClock),
            Arc::new(InMemoryJobStore::new()),
            metrics,
            Arc::new(NoConnections),
        );
        Arc::new(Dispatcher::new(registry, runner))
    }

    fn loader(gate: Arc<Gate>) -> StaticLoader {
        let mut loader = StaticLoader::new();
        loader
            .register_handler("cmd_test", Arc::new(ExitWith(0)))
            .unwrap();
        loader
            .register_handler(
                "broken",
                Arc::new(FailAfter {
                    finish: 0,
                    message: "handler blew up",
                }),
            )
            .unwrap();
        loader.register_handler("gate", gate).unwrap();
        loader
            .register_handler(
                "panics",
                Arc::new(PanicAfter {
                    finish: 0,
                    message: "handler panicked mid-batch",
                }),
            )
            .unwrap();
        loader
    }

    #[tokio::test]
    async fn test_unknown_task_fails_the_batch() {
        let metrics = Arc::new(InMemoryMetrics::new());
        let d = dispatcher(&loader(Arc::new(Gate::new(1))), metrics.clone());

        let outcome = d
            .dispatch(TaskBatch {
                task_name: "nosuch_v1".into(),
                jobs: batch("nosuch_v1"),
            })
            .await;

        let err = outcome.result.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(outcome.jobs.iter().all(|j| j.status() == JobStatus::Failed));
        assert!(outcome.jobs.iter().all(|j| j.error_output().contains("nosuch_v1")));
        assert_eq!(metrics.counts("nosuch_v1").failed, 1);
    }

    #[tokio::test]
    async fn test_unavailable_handler_is_a_configuration_error_at_dispatch() {
        let metrics = Arc::new(InMemoryMetrics::new());
        let d = dispatcher(&loader(Arc::new(Gate::new(1))), metrics.clone());

        let outcome = d
            .dispatch(TaskBatch {
                task_name: "Missing_V1".into(),
                jobs: batch("missing_v1"),
            })
            .await;

        let err = outcome.result.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(err.message().contains("not_linked"));
        assert!(outcome.jobs.all_terminal());
    }

    #[tokio::test]
    async fn test_dispatch_is_case_insensitive() {
        let metrics = Arc::new(InMemoryMetrics::new());
        let d = dispatcher(&loader(Arc::new(Gate::new(1))), metrics.clone());

        let outcome = d
            .dispatch(TaskBatch {
                task_name: "TEST_v0.0".into(),
                jobs: batch("test_v0.0"),
            })
            .await;

        assert!(outcome.result.is_ok());
        assert_eq!(metrics.counts("TEST_v0.0").completed, 1);
    }

    #[tokio::test]
    async fn test_pool_survives_failing_batches() {
        let metrics = Arc::new(InMemoryMetrics::new());
        let d = dispatcher(&loader(Arc::new(Gate::new(1))), metrics.clone());
        let source = Arc::new(InMemoryJobSource::new());

        source.push("broken_v1", batch("broken_v1")).await;
        source.push("test_v0.0", batch("test_v0.0")).await;
        source.push("broken_v1", batch("broken_v1")).await;
        source.push("test_v0.0", batch("test_v0.0")).await;
        source.close().await;

        let pool = WorkerPool::spawn(2, source, d, Duration::from_millis(20));
        pool.join().await;

        assert_eq!(metrics.counts("broken_v1").failed, 2);
        assert_eq!(metrics.counts("test_v0.0").completed, 2);
    }

    #[tokio::test]
    async fn test_single_worker_keeps_going_after_a_panicking_handler() {
        let metrics = Arc::new(InMemoryMetrics::new());
        let d = dispatcher(&loader(Arc::new(Gate::new(1))), metrics.clone());
        let source = Arc::new(InMemoryJobSource::new());

        source.push("panic_v1", batch("panic_v1")).await;
        source.push("test_v0.0", batch("test_v0.0")).await;
        source.close().await;

        let pool = WorkerPool::spawn(1, source.clone(), d, Duration::from_millis(20));
        tokio::time::timeout(Duration::from_secs(5), pool.join())
            .await
            .unwrap();

        assert_eq!(metrics.counts("panic_v1").failed, 1);
        assert_eq!(metrics.counts("test_v0.0").completed, 1);
        assert_eq!(source.len().await, 0);
    }

    #[tokio::test]
    async fn test_same_task_parallelism_is_capped() {
        let gate = Arc::new(Gate::new(2));
        let metrics = Arc::new(InMemoryMetrics::new());
        let d = dispatcher(&loader(gate.clone()), metrics.clone());
        let source = Arc::new(InMemoryJobSource::new());

        for _ in 0..6 {
            source.push("gate_v1", batch("gate_v1")).await;
        }
        source.close().await;

        let pool = WorkerPool::spawn(4, source, d, Duration::from_millis(20));
        pool.join().await;

        assert_eq!(metrics.counts("gate_v1").completed, 6);
        assert!(gate.peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_shutdown_stops_idle_workers() {
        let metrics = Arc::new(InMemoryMetrics::new());
        let d = dispatcher(&loader(Arc::new(Gate::new(1))), metrics);
        let source = Arc::new(InMemoryJobSource::new());

        let pool = WorkerPool::spawn(3, source, d, Duration::from_secs(5));
        tokio::time::timeout(Duration::from_secs(1), pool.shutdown_and_join())
            .await
            .unwrap();
    }
}
