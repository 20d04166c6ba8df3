//! InMemoryMetrics - task ごとの完了 / 失敗カウンタ

use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

use crate::observability::TaskCounts;
use crate::ports::JobMetrics;

#[derive(Debug, Default)]
pub struct InMemoryMetrics {
    counts: Mutex<BTreeMap<String, TaskCounts>>,
}

impl InMemoryMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn counts(&self, task_name: &str) -> TaskCounts {
        self.counts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(task_name)
            .copied()
            .unwrap_or_default()
    }

    /// task 名順のスナップショット
    pub fn snapshot(&self) -> BTreeMap<String, TaskCounts> {
        self.counts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn bump(&self, task_name: &str, f: impl FnOnce(&mut TaskCounts)) {
        let mut counts = self.counts.lock().unwrap_or_else(PoisonError::into_inner);
        f(counts.entry(task_name.to_string()).or_default());
    }
}

impl JobMetrics for InMemoryMetrics {
    fn job_completed(&self, task_name: &str) {
        self.bump(task_name, |c| c.completed += 1);
    }

    fn job_failed(&self, task_name: &str) {
        self.bump(task_name, |c| c.failed += 1);
    }
}
