//! getUnitsStatuses / getUnitStatus の応答
//!
//! 現行サーバーは `Package` をそのまま返しますが、旧ダッシュボード互換のサーバーは
//! 次の形で返します（一覧は `{"objects": [...]}` で包まれることもある）。
//!
//! ```text
//! { "uuid", "timestamp": f64, "active": bool, "directory", "access_system_id"?,
//!   "jobs": [{ "uuid", "link_id", "currentstep", "timestamp", "microservicegroup",
//!              "type", "choices"?: { chain id: label } }] }
//! ```
//!
//! `status` キーがあれば現行形式、なければ旧形式として読みます。

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use crate::client::error::{ClientError, ClientResult};
use crate::domain::{
    Choice, JobId, JobStep, JobSummary, Package, PackageStatus, PackageType, UnitId,
};

#[derive(Debug, Deserialize)]
struct LegacyPackage {
    #[serde(default)]
    uuid: Option<UnitId>,
    #[serde(default)]
    id: Option<UnitId>,
    #[serde(default, rename = "type")]
    package_type: Option<PackageType>,
    #[serde(default)]
    timestamp: Option<f64>,
    #[serde(default)]
    active: bool,
    #[serde(default)]
    directory: String,
    #[serde(default)]
    accession: String,
    #[serde(default)]
    access_system_id: Option<String>,
    #[serde(default)]
    jobs: Vec<LegacyJob>,
}

#[derive(Debug, Deserialize)]
struct LegacyJob {
    uuid: JobId,
    #[serde(default)]
    link_id: String,
    #[serde(default)]
    currentstep: Value,
    #[serde(default)]
    timestamp: Value,
    #[serde(default)]
    microservicegroup: String,
    #[serde(default, rename = "type")]
    link_description: String,
    #[serde(default)]
    choices: Option<BTreeMap<String, String>>,
}

/// Job の currentstep（数値コードでもラベルでも来る）
fn job_step(value: &Value) -> JobStep {
    match value {
        Value::Number(n) => match n.as_i64() {
            Some(1) => JobStep::AwaitingDecision,
            Some(2) => JobStep::CompletedSuccessfully,
            Some(3) => JobStep::ExecutingCommands,
            Some(4) => JobStep::Failed,
            _ => JobStep::Unknown,
        },
        Value::String(s) => match s.to_ascii_lowercase().as_str() {
            "awaiting decision" | "awaiting_decision" => JobStep::AwaitingDecision,
            "completed successfully" | "completed_successfully" => JobStep::CompletedSuccessfully,
            "executing command(s)" | "executing_commands" => JobStep::ExecutingCommands,
            "failed" => JobStep::Failed,
            _ => JobStep::Unknown,
        },
        _ => JobStep::Unknown,
    }
}

fn legacy_timestamp(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

impl From<LegacyJob> for JobSummary {
    fn from(job: LegacyJob) -> Self {
        JobSummary {
            id: job.uuid,
            link_id: job.link_id,
            status: job_step(&job.currentstep),
            created_at: legacy_timestamp(job.timestamp),
            group: job.microservicegroup,
            link_description: job.link_description,
            choices: job.choices.map(|choices| {
                choices
                    .into_iter()
                    .map(|(chain_id, label)| Choice { chain_id, label })
                    .collect()
            }),
        }
    }
}

impl LegacyPackage {
    fn into_package(self, requested: Option<PackageType>) -> Result<Package, String> {
        let id = self
            .uuid
            .or(self.id)
            .ok_or_else(|| "missing field `uuid`".to_string())?;
        let package_type = self
            .package_type
            .or(requested)
            .ok_or_else(|| "package type missing".to_string())?;
        let jobs: Vec<JobSummary> = self.jobs.into_iter().map(JobSummary::from).collect();
        // active でなければ終わっている。失敗した Job があれば Failed
        let status = if self.active {
            PackageStatus::Processing
        } else if jobs.iter().any(|j| j.status == JobStep::Failed) {
            PackageStatus::Failed
        } else {
            PackageStatus::Complete
        };
        Ok(Package {
            id,
            name: self.directory,
            package_type,
            accession: self.accession,
            access_system_id: self.access_system_id.filter(|s| !s.is_empty()),
            created_at: self.timestamp.unwrap_or_default(),
            status,
            jobs,
        })
    }
}

fn decode_one(value: Value, requested: Option<PackageType>) -> Result<Package, String> {
    if value.get("status").is_some() {
        return serde_json::from_value(value).map_err(|e| e.to_string());
    }
    let legacy: LegacyPackage = serde_json::from_value(value).map_err(|e| e.to_string())?;
    legacy.into_package(requested)
}

/// 一覧の応答を読む。`requested` は要求した種別（旧形式は種別を返さない）
pub fn packages_from_payload(
    ability: &str,
    payload: Value,
    requested: PackageType,
) -> ClientResult<Vec<Package>> {
    let list = match payload {
        Value::Object(mut obj) if obj.contains_key("objects") => {
            obj.remove("objects").unwrap_or(Value::Null)
        }
        other => other,
    };
    let Value::Array(items) = list else {
        return Err(ClientError::InvalidResponse(format!(
            "{ability}: expected a list of packages"
        )));
    };
    items
        .into_iter()
        .map(|item| {
            decode_one(item, Some(requested))
                .map_err(|e| ClientError::InvalidResponse(format!("{ability}: {e}")))
        })
        .collect()
}

/// 単体の応答を読む
pub fn package_from_payload(ability: &str, payload: Value) -> ClientResult<Package> {
    decode_one(payload, None).map_err(|e| ClientError::InvalidResponse(format!("{ability}: {e}")))
}
