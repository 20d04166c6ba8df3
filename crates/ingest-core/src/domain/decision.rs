//! Decision model: pending choice points fetched from the orchestrator.
//!
//! ローカルには永続化しない読み取り専用の射影です。

use serde::{Deserialize, Serialize};

use super::ids::{JobId, UnitId};
use super::package::PackageType;

/// One selectable chain at a decision point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub chain_id: String,
    pub label: String,
}

/// A decision awaiting operator approval.
///
/// `id` は Job の ID（approve_job に渡す値）です。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub id: JobId,
    pub unit_id: UnitId,
    pub unit_type: PackageType,
    pub unit_path: String,
    pub choices: Vec<Choice>,
}

impl Decision {
    pub fn choice(&self, chain_id: &str) -> Option<&Choice> {
        self.choices.iter().find(|c| c.chain_id == chain_id)
    }
}
