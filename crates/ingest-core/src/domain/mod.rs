//! Domain model (IDs, jobs, decisions, packages, errors).
//!
//! - ids: UUID ベースの型付き ID
//! - job: Job / JobBatch（Task Runner が状態を管理）
//! - decision / package / processing_config: オーケストレーターからの読み取り射影
//! - errors: ワーカー側のエラー分類

pub mod decision;
pub mod errors;
pub mod ids;
pub mod job;
pub mod package;
pub mod processing_config;

pub use decision::{Choice, Decision};
pub use errors::{ErrorKind, HandlerError, LoadError, RegistryError, ValidationError};
pub use ids::{JobId, LinkId, UnitId};
pub use job::{Job, JobBatch, JobStatus};
pub use package::{
    CreatePackage, JobStep, JobSummary, Package, PackagePath, PackageStatus, PackageType,
    TransferType,
};
pub use processing_config::{AppliesTo, ConfigChoice, ConfigField};
