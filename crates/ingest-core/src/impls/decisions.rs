//! InMemoryDecisions - DecisionLookup のテスト / 開発用実装
//!
//! 追加した順序がそのまま `awaiting_decision` の返す順序になります。

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use crate::client::ClientResult;
use crate::domain::{JobId, LinkId, UnitId};
use crate::ports::DecisionLookup;

#[derive(Debug, Clone, Copy)]
struct Pending {
    job_id: JobId,
    unit_id: UnitId,
    link_id: LinkId,
}

#[derive(Debug, Default)]
pub struct InMemoryDecisions {
    pending: Mutex<Vec<Pending>>,
}

impl InMemoryDecisions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, unit_id: UnitId, link_id: LinkId, job_id: JobId) {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Pending {
                job_id,
                unit_id,
                link_id,
            });
    }

    /// 承認済みとして取り除く
    pub fn resolve(&self, job_id: JobId) {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|p| p.job_id != job_id);
    }
}

#[async_trait]
impl DecisionLookup for InMemoryDecisions {
    async fn awaiting_decision(
        &self,
        unit_id: UnitId,
        link_id: Option<LinkId>,
    ) -> ClientResult<Vec<JobId>> {
        let pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(pending
            .iter()
            .filter(|p| p.unit_id == unit_id)
            .filter(|p| link_id.is_none_or(|l| l == p.link_id))
            .map(|p| p.job_id)
            .collect())
    }
}
