//! WorkerBuilder - ワーカーの構築とワイヤリング
//!
//! # 学習ポイント
//! - Builder パターンの実装
//! - ports の既定値（SystemClock / NoopMetrics / NoConnections）
//! - 任意の起動時検証（expect_tasks）

use std::sync::Arc;
use std::time::Duration;

use crate::impls::InMemoryJobStore;
use crate::ports::{
    Clock, ConnectionGuard, JobMetrics, JobSource, JobStore, NoConnections, NoopMetrics,
    SystemClock,
};
use crate::registry::{HandlerLoader, HandlerRegistry, StaticLoader};

use super::task_runner::TaskRunner;
use super::worker_loop::{Dispatcher, WorkerPool};

/// WorkerBuilder はワーカーを構築
///
/// # 使用例
/// ```ignore
/// let worker = WorkerBuilder::new(loader)
///     .store(Arc::new(PgJobStore::new(pool)))
///     .expect_tasks(&["clamscan_v0.0"])
///     .build()?;
/// let pool = worker.spawn(4, source, Duration::from_millis(250));
/// ```
///
/// ロードできない handler は既定では起動を止めません（dispatch 時にバッチ失敗）。
/// `expect_tasks()` で名前を挙げた task だけは `build()` 時に検査します。
pub struct WorkerBuilder {
    loader: Box<dyn HandlerLoader>,
    clock: Arc<dyn Clock>,
    store: Arc<dyn JobStore>,
    metrics: Arc<dyn JobMetrics>,
    connections: Arc<dyn ConnectionGuard>,
    expected_tasks: Option<Vec<String>>,
}

/// BuildError はワーカー構築時のエラー
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Unavailable task handlers: {0:?}. These tasks were expected but could not be loaded.")]
    UnavailableTasks(Vec<String>),
}

impl WorkerBuilder {
    pub fn new(loader: impl HandlerLoader + 'static) -> Self {
        Self {
            loader: Box::new(loader),
            clock: Arc::new(SystemClock),
            store: Arc::new(InMemoryJobStore::new()),
            metrics: Arc::new(NoopMetrics),
            connections: Arc::new(NoConnections),
            expected_tasks: None,
        }
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn store(mut self, store: Arc<dyn JobStore>) -> Self {
        self.store = store;
        self
    }

    pub fn metrics(mut self, metrics: Arc<dyn JobMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn connections(mut self, connections: Arc<dyn ConnectionGuard>) -> Self {
        self.connections = connections;
        self
    }

    /// 起動時にロードできていなければならない task 名
    pub fn expect_tasks(mut self, task_names: &[&str]) -> Self {
        self.expected_tasks = Some(task_names.iter().map(|t| t.to_string()).collect());
        self
    }

    /// 組み込みテーブル全体をロードして Worker を作る
    pub fn build(self) -> Result<Worker, BuildError> {
        let registry = HandlerRegistry::load_all(self.loader.as_ref());
        self.finish(registry)
    }

    fn finish(self, registry: HandlerRegistry) -> Result<Worker, BuildError> {
        if let Some(expected) = &self.expected_tasks {
            let unavailable: Vec<String> = expected
                .iter()
                .filter(|t| !registry.resolve(t).is_ok_and(|d| d.is_available()))
                .cloned()
                .collect();
            if !unavailable.is_empty() {
                return Err(BuildError::UnavailableTasks(unavailable));
            }
        }

        let runner = TaskRunner::new(self.clock, self.store, self.metrics, self.connections);
        let dispatcher = Arc::new(Dispatcher::new(Arc::new(registry), runner));
        Ok(Worker { dispatcher })
    }
}

impl Default for WorkerBuilder {
    fn default() -> Self {
        Self::new(StaticLoader::new())
    }
}

/// Worker は構築済みの dispatcher を持つ
pub struct Worker {
    dispatcher: Arc<Dispatcher>,
}

impl Worker {
    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    pub fn registry(&self) -> &HandlerRegistry {
        self.dispatcher.registry()
    }

    pub fn spawn(&self, n: usize, source: Arc<dyn JobSource>, poll_interval: Duration) -> WorkerPool {
        WorkerPool::spawn(n, source, Arc::clone(&self.dispatcher), poll_interval)
    }
}
