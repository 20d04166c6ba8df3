//! Package model: Transfer / SIP / AIC / DIP as reported by the orchestrator.
//!
//! # 型文字列
//! インターフェース層の type 文字列と enum の対応は表で管理します。
//! 未知の文字列は `ValidationError` になり、黙ってデフォルトに落ちることはありません。

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::decision::Choice;
use super::errors::ValidationError;
use super::ids::{JobId, UnitId};

/// Package type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PackageType {
    Transfer,
    Sip,
    Aic,
    Dip,
}

impl PackageType {
    pub const ALL: [PackageType; 4] = [
        PackageType::Transfer,
        PackageType::Sip,
        PackageType::Aic,
        PackageType::Dip,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PackageType::Transfer => "Transfer",
            PackageType::Sip => "SIP",
            PackageType::Aic => "AIC",
            PackageType::Dip => "DIP",
        }
    }
}

/// Transfer type, as accepted by `create_package` / `approve_transfer_by_path`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TransferType {
    Standard,
    ZipFile,
    UnzippedBag,
    ZippedBag,
    Dspace,
    Maildir,
    Trim,
    Dataverse,
}

impl TransferType {
    pub const ALL: [TransferType; 8] = [
        TransferType::Standard,
        TransferType::ZipFile,
        TransferType::UnzippedBag,
        TransferType::ZippedBag,
        TransferType::Dspace,
        TransferType::Maildir,
        TransferType::Trim,
        TransferType::Dataverse,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TransferType::Standard => "standard",
            TransferType::ZipFile => "zipfile",
            TransferType::UnzippedBag => "unzipped bag",
            TransferType::ZippedBag => "zipped bag",
            TransferType::Dspace => "dspace",
            TransferType::Maildir => "maildir",
            TransferType::Trim => "TRIM",
            TransferType::Dataverse => "dataverse",
        }
    }
}

macro_rules! string_table_conversions {
    ($ty:ident, $what:literal) => {
        impl FromStr for $ty {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $ty::ALL
                    .iter()
                    .copied()
                    .find(|t| t.as_str() == s)
                    .ok_or_else(|| ValidationError(format!("unsupported {} {s:?}", $what)))
            }
        }

        impl TryFrom<String> for $ty {
            type Error = ValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }

        impl From<$ty> for String {
            fn from(value: $ty) -> Self {
                value.as_str().to_string()
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

string_table_conversions!(PackageType, "package type");
string_table_conversions!(TransferType, "transfer type");

/// Package processing status.
///
/// `Unknown` はオーケストレーターが状態を返さなかった場合。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PackageStatus {
    Processing,
    Complete,
    Failed,
    Unknown,
}

/// Current step of a job as reported by the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStep {
    Unknown,
    AwaitingDecision,
    CompletedSuccessfully,
    ExecutingCommands,
    Failed,
}

/// Job summary inside a package status listing.
///
/// `created_at` は秒を 10 桁固定小数で表した文字列（レガシー形式）。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSummary {
    pub id: JobId,
    #[serde(default)]
    pub link_id: String,
    pub status: JobStep,
    pub created_at: String,
    #[serde(default)]
    pub group: String,
    #[serde(default)]
    pub link_description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<Choice>>,
}

/// Read-only projection of a package.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Package {
    pub id: UnitId,
    pub name: String,
    #[serde(rename = "type")]
    pub package_type: PackageType,
    #[serde(default)]
    pub accession: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_system_id: Option<String>,
    /// 作成時刻（UNIX 秒、小数部はナノ秒由来）
    pub created_at: f64,
    pub status: PackageStatus,
    #[serde(default)]
    pub jobs: Vec<JobSummary>,
}

impl Package {
    pub fn is_active(&self) -> bool {
        self.status == PackageStatus::Processing
    }
}

/// Source path(s) for a new package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PackagePath {
    Single(String),
    Many(Vec<String>),
}

impl PackagePath {
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            PackagePath::Single(p) => vec![p.clone()],
            PackagePath::Many(ps) => ps.clone(),
        }
    }
}

impl From<&str> for PackagePath {
    fn from(value: &str) -> Self {
        PackagePath::Single(value.to_string())
    }
}

impl From<String> for PackagePath {
    fn from(value: String) -> Self {
        PackagePath::Single(value)
    }
}

impl From<Vec<String>> for PackagePath {
    fn from(value: Vec<String>) -> Self {
        PackagePath::Many(value)
    }
}

/// Arguments of `create_package`.
///
/// ```ignore
/// let req = CreatePackage::new("name", TransferType::Standard, "/home/transfer")
///     .accession("2024-01")
///     .metadata_set_id("");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CreatePackage {
    pub name: String,
    pub transfer_type: TransferType,
    pub accession: String,
    pub access_system_id: String,
    pub path: PackagePath,
    pub metadata_set_id: String,
    pub auto_approve: bool,
    pub wait_until_complete: bool,
    pub processing_config: Option<String>,
}

impl CreatePackage {
    pub fn new(
        name: impl Into<String>,
        transfer_type: TransferType,
        path: impl Into<PackagePath>,
    ) -> Self {
        Self {
            name: name.into(),
            transfer_type,
            accession: String::new(),
            access_system_id: String::new(),
            path: path.into(),
            metadata_set_id: String::new(),
            auto_approve: true,
            wait_until_complete: false,
            processing_config: None,
        }
    }

    pub fn accession(mut self, accession: impl Into<String>) -> Self {
        self.accession = accession.into();
        self
    }

    pub fn access_system_id(mut self, id: impl Into<String>) -> Self {
        self.access_system_id = id.into();
        self
    }

    pub fn metadata_set_id(mut self, id: impl Into<String>) -> Self {
        self.metadata_set_id = id.into();
        self
    }

    pub fn auto_approve(mut self, value: bool) -> Self {
        self.auto_approve = value;
        self
    }

    pub fn wait_until_complete(mut self, value: bool) -> Self {
        self.wait_until_complete = value;
        self
    }

    pub fn processing_config(mut self, name: impl Into<String>) -> Self {
        self.processing_config = Some(name.into());
        self
    }

    /// 空文字列は「指定なし」
    pub fn metadata_set(&self) -> Option<&str> {
        if self.metadata_set_id.is_empty() {
            None
        } else {
            Some(&self.metadata_set_id)
        }
    }
}
