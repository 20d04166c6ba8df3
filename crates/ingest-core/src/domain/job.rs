//! Job record and batch bookkeeping.
//!
//! Job はオーケストレーターが作成し、Task Runner がバッチ単位で消費します。
//! 状態を書き換えてよいのは Task Runner だけで、handler は
//! `set_exit_code()` と出力の書き込みだけを行います。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{JobId, UnitId};

/// Job state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

/// One unit of work belonging to a SIP / Transfer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub task_name: String,
    pub arguments: Vec<String>,
    pub unit_id: UnitId,
    start_time: Option<DateTime<Utc>>,
    status: JobStatus,
    exit_code: Option<i32>,
    #[serde(default)]
    output: String,
    #[serde(default)]
    error_output: String,
}

impl Job {
    pub fn new(
        id: JobId,
        task_name: impl Into<String>,
        arguments: Vec<String>,
        unit_id: UnitId,
    ) -> Self {
        Self {
            id,
            task_name: task_name.into(),
            arguments,
            unit_id,
            start_time: None,
            status: JobStatus::Pending,
            exit_code: None,
            output: String::new(),
            error_output: String::new(),
        }
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        self.start_time
    }

    pub fn exit_code(&self) -> Option<i32> {
        self.exit_code
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn error_output(&self) -> &str {
        &self.error_output
    }

    /// handler が終了コードを報告する唯一の入口
    pub fn set_exit_code(&mut self, code: i32) {
        self.exit_code = Some(code);
    }

    pub fn write_output(&mut self, text: &str) {
        self.output.push_str(text);
    }

    pub fn write_error(&mut self, text: &str) {
        self.error_output.push_str(text);
    }

    /// 成功パスの確定処理。exit code 0 のみ Completed、それ以外（未報告含む）は Failed。
    pub(crate) fn finalize(&mut self) {
        if self.status.is_terminal() {
            return;
        }
        self.status = match self.exit_code {
            Some(0) => JobStatus::Completed,
            _ => JobStatus::Failed,
        };
    }

    /// 異常終了したバッチ内の Job を強制的に Failed にする。
    /// 既に終端状態の Job には触れない（false を返す）。
    pub(crate) fn mark_failed(&mut self, error: &str) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = JobStatus::Failed;
        if !self.error_output.is_empty() && !self.error_output.ends_with('\n') {
            self.error_output.push('\n');
        }
        self.error_output.push_str(error);
        true
    }

    pub fn succeeded(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Jobs dequeued together for one task; the unit of failure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobBatch {
    jobs: Vec<Job>,
}

impl JobBatch {
    pub fn new(jobs: Vec<Job>) -> Self {
        Self { jobs }
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Job> {
        self.jobs.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Job> {
        self.jobs.iter_mut()
    }

    pub fn into_jobs(self) -> Vec<Job> {
        self.jobs
    }

    /// 全 Job に同じ開始時刻を記録して Running にする
    pub(crate) fn set_start_times(&mut self, now: DateTime<Utc>) {
        for job in &mut self.jobs {
            job.start_time = Some(now);
            job.status = JobStatus::Running;
        }
    }

    pub fn all_terminal(&self) -> bool {
        self.jobs.iter().all(|j| j.status.is_terminal())
    }
}

impl From<Vec<Job>> for JobBatch {
    fn from(jobs: Vec<Job>) -> Self {
        Self::new(jobs)
    }
}

impl<'a> IntoIterator for &'a JobBatch {
    type Item = &'a Job;
    type IntoIter = std::slice::Iter<'a, Job>;

    fn into_iter(self) -> Self::IntoIter {
        self.jobs.iter()
    }
}

impl<'a> IntoIterator for &'a mut JobBatch {
    type Item = &'a mut Job;
    type IntoIter = std::slice::IterMut<'a, Job>;

    fn into_iter(self) -> Self::IntoIter {
        self.jobs.iter_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    fn job() -> Job {
        Job::new(JobId::generate(), "test_v0.0", vec![], UnitId::generate())
    }

    #[test]
    fn new_job_is_pending() {
        let j = job();
        assert_eq!(j.status(), JobStatus::Pending);
        assert!(j.start_time().is_none());
        assert!(j.exit_code().is_none());
    }

    #[rstest]
    #[case::zero(Some(0), JobStatus::Completed)]
    #[case::non_zero(Some(2), JobStatus::Failed)]
    #[case::unreported(None, JobStatus::Failed)]
    fn finalize_classifies_by_exit_code(#[case] code: Option<i32>, #[case] expected: JobStatus) {
        let mut j = job();
        if let Some(code) = code {
            j.set_exit_code(code);
        }
        j.finalize();
        assert_eq!(j.status(), expected);
    }

    #[test]
    fn mark_failed_skips_terminal_jobs() {
        let mut done = job();
        done.set_exit_code(0);
        done.finalize();
        assert!(!done.mark_failed("boom"));
        assert_eq!(done.status(), JobStatus::Completed);
        assert!(done.error_output().is_empty());

        let mut running = job();
        running.write_error("partial");
        assert!(running.mark_failed("boom"));
        assert_eq!(running.status(), JobStatus::Failed);
        assert_eq!(running.error_output(), "partial\nboom");
    }

    #[test]
    fn set_start_times_uses_one_timestamp() {
        let now = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let mut batch = JobBatch::new(vec![job(), job(), job()]);
        batch.set_start_times(now);

        assert!(batch.iter().all(|j| j.start_time() == Some(now)));
        assert!(batch.iter().all(|j| j.status() == JobStatus::Running));
        assert!(!batch.all_terminal());
    }
}
