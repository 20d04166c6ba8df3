//! wire メッセージ ⇔ ドメイン型の変換
//!
//! # enum 対応表
//! ドメイン → wire は `match` で網羅しているので、型を追加すると
//! コンパイルエラーで気付けます。wire → ドメインで `UNSPECIFIED` や未知の値が
//! 来た場合はパッケージ種別ならエラー、状態なら `Unknown` にします。
//!
//! # タイムスタンプ
//! - 状態 API: `seconds + nanos / 1e9` の f64
//! - レガシー形式: 整数から組み立てる小数点以下 10 桁の文字列（浮動小数点を経由しない）

use prost_types::Timestamp;

use super::proto;
use crate::client::error::{ClientError, ClientResult};
use crate::domain::{
    AppliesTo, Choice, ConfigChoice, ConfigField, Decision, JobId, JobStep, JobSummary, Package,
    PackageStatus, PackageType, TransferType, UnitId,
};

const NANOS_PER_SEC: i128 = 1_000_000_000;
const FALLBACK_LANG: &str = "en";

pub fn transfer_type_to_wire(t: TransferType) -> proto::TransferType {
    match t {
        TransferType::Standard => proto::TransferType::Standard,
        TransferType::ZipFile => proto::TransferType::ZipFile,
        TransferType::UnzippedBag => proto::TransferType::UnzippedBag,
        TransferType::ZippedBag => proto::TransferType::ZippedBag,
        TransferType::Dspace => proto::TransferType::Dspace,
        TransferType::Maildir => proto::TransferType::Maildir,
        TransferType::Trim => proto::TransferType::Trim,
        TransferType::Dataverse => proto::TransferType::Dataverse,
    }
}

pub fn package_type_to_wire(t: PackageType) -> proto::PackageType {
    match t {
        PackageType::Transfer => proto::PackageType::Transfer,
        PackageType::Sip => proto::PackageType::Sip,
        PackageType::Aic => proto::PackageType::Aic,
        PackageType::Dip => proto::PackageType::Dip,
    }
}

pub fn package_type_from_wire(value: i32) -> ClientResult<PackageType> {
    match proto::PackageType::try_from(value) {
        Ok(proto::PackageType::Transfer) => Ok(PackageType::Transfer),
        Ok(proto::PackageType::Sip) => Ok(PackageType::Sip),
        Ok(proto::PackageType::Aic) => Ok(PackageType::Aic),
        Ok(proto::PackageType::Dip) => Ok(PackageType::Dip),
        Ok(proto::PackageType::Unspecified) | Err(_) => Err(ClientError::InvalidResponse(
            format!("unmapped package type {value}"),
        )),
    }
}

pub fn package_status_from_wire(value: i32) -> PackageStatus {
    match proto::PackageStatus::try_from(value) {
        Ok(proto::PackageStatus::Processing) => PackageStatus::Processing,
        Ok(proto::PackageStatus::Done | proto::PackageStatus::CompletedSuccessfully) => {
            PackageStatus::Complete
        }
        Ok(proto::PackageStatus::Failed) => PackageStatus::Failed,
        Ok(proto::PackageStatus::Unspecified) | Err(_) => PackageStatus::Unknown,
    }
}

pub fn job_step_from_wire(value: i32) -> JobStep {
    match proto::JobStatus::try_from(value) {
        Ok(proto::JobStatus::AwaitingDecision) => JobStep::AwaitingDecision,
        Ok(proto::JobStatus::CompletedSuccessfully) => JobStep::CompletedSuccessfully,
        Ok(proto::JobStatus::ExecutingCommands) => JobStep::ExecutingCommands,
        Ok(proto::JobStatus::Failed) => JobStep::Failed,
        Ok(proto::JobStatus::Unspecified) | Err(_) => JobStep::Unknown,
    }
}

/// lang → "en" → "" の順に探す
pub fn localize(label: Option<&proto::I18n>, lang: &str) -> String {
    let Some(label) = label else {
        return String::new();
    };
    label
        .tx
        .get(lang)
        .or_else(|| label.tx.get(FALLBACK_LANG))
        .cloned()
        .unwrap_or_default()
}

/// 未設定なら 0.0
pub fn timestamp_seconds(ts: Option<&Timestamp>) -> f64 {
    ts.map_or(0.0, |ts| ts.seconds as f64 + f64::from(ts.nanos) / 1e9)
}

/// `{seconds}.{nanos:09}0`。負の時刻は全体の符号を先頭に付ける。
pub fn timestamp_legacy(ts: Option<&Timestamp>) -> String {
    let total = ts.map_or(0, |ts| {
        i128::from(ts.seconds) * NANOS_PER_SEC + i128::from(ts.nanos)
    });
    let sign = if total < 0 { "-" } else { "" };
    let abs = total.unsigned_abs();
    let whole = abs / NANOS_PER_SEC as u128;
    let frac = abs % NANOS_PER_SEC as u128;
    format!("{sign}{whole}.{frac:09}0")
}

fn invalid(what: &str, err: String) -> ClientError {
    ClientError::InvalidResponse(format!("{what}: {err}"))
}

fn job_from_wire(job: proto::Job) -> ClientResult<JobSummary> {
    let choices = job.decision.map(|decision| {
        decision
            .choice
            .into_iter()
            .map(|c| Choice {
                chain_id: c.id.to_string(),
                label: c.label,
            })
            .collect()
    });
    Ok(JobSummary {
        id: JobId::parse(&job.id).map_err(|e| invalid("job", e))?,
        status: job_step_from_wire(job.status),
        created_at: timestamp_legacy(job.created_at.as_ref()),
        link_id: job.link_id,
        group: job.group,
        link_description: job.link_description,
        choices,
    })
}

/// 承認待ちの Decision。ID と種別が読めなければ `InvalidResponse`
pub fn decision_from_wire(decision: proto::Decision) -> ClientResult<Decision> {
    Ok(Decision {
        id: JobId::parse(&decision.id).map_err(|e| invalid("decision", e))?,
        unit_id: UnitId::parse(&decision.package_id).map_err(|e| invalid("decision", e))?,
        unit_type: decision
            .package_type
            .parse()
            .map_err(|e: crate::domain::ValidationError| invalid("decision", e.0))?,
        unit_path: decision.package_path,
        choices: decision
            .choice
            .into_iter()
            .map(|c| Choice {
                chain_id: c.id.to_string(),
                label: c.label,
            })
            .collect(),
    })
}

/// `requested` は一覧取得時に指定した種別（wire 側が種別を返さない場合に使う）
pub fn package_from_wire(
    pkg: proto::Package,
    requested: Option<PackageType>,
) -> ClientResult<Package> {
    let package_type = match (package_type_from_wire(pkg.r#type), requested) {
        (Ok(t), _) => t,
        (Err(_), Some(t)) => t,
        (Err(e), None) => return Err(e),
    };
    let jobs = pkg
        .job
        .into_iter()
        .map(job_from_wire)
        .collect::<ClientResult<Vec<_>>>()?;
    Ok(Package {
        id: UnitId::parse(&pkg.id).map_err(|e| invalid("package", e))?,
        name: pkg.name,
        package_type,
        accession: pkg.accession,
        access_system_id: Some(pkg.access_system_id).filter(|s| !s.is_empty()),
        created_at: timestamp_seconds(pkg.created_at.as_ref()),
        status: package_status_from_wire(pkg.status),
        jobs,
    })
}

pub fn config_field_from_wire(field: proto::ProcessingConfigField, lang: &str) -> ConfigField {
    let choices = field
        .choice
        .into_iter()
        .map(|choice| ConfigChoice {
            label: localize(choice.label.as_ref(), lang),
            applies_to: choice
                .applies_to
                .into_iter()
                .map(|a| AppliesTo {
                    label: localize(a.label.as_ref(), lang),
                    link_id: a.link_id,
                    value: a.value,
                })
                .collect(),
            value: choice.value,
        })
        .collect();
    ConfigField {
        label: localize(field.label.as_ref(), lang),
        id: field.id,
        name: field.name,
        choices,
    }
}
