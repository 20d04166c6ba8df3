//! Domain identifiers (strongly-typed IDs).
//!
//! オーケストレーター側の ID はすべて UUID です。
//! `Id<T>` というジェネリック型で共通実装を提供し、`T` はマーカー型として
//! コンパイル時の型安全性だけを担当します（PhantomData）。
//!
//! - `JobId`: Job（= Decision の ID でもある）
//! - `UnitId`: SIP / Transfer などの処理単位
//! - `LinkId`: ワークフローの chain link
//!
//! Display / serde はプレフィックスなしの UUID 文字列です（wire 互換のため）。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;
use uuid::Uuid;

/// IdMarker は各 ID 型のマーカー trait
pub trait IdMarker: Send + Sync + 'static {
    /// ログやエラーメッセージで使う種別名
    fn kind() -> &'static str;
}

/// ジェネリック ID 型
///
/// ```ignore
/// let job_id: JobId = Id::from(Uuid::new_v4());
/// let unit_id: UnitId = Id::from(Uuid::new_v4());
/// // job_id と unit_id は異なる型なので、混同できない
/// ```
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Id<T: IdMarker> {
    uuid: Uuid,
    #[serde(skip)]
    _marker: PhantomData<T>,
}

impl<T: IdMarker> Id<T> {
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self {
            uuid,
            _marker: PhantomData,
        }
    }

    /// ランダムな v4 UUID で新規作成
    pub fn generate() -> Self {
        Self::from_uuid(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.uuid
    }

    /// 文字列からパース。失敗時は種別名を含むメッセージを返す。
    pub fn parse(value: &str) -> Result<Self, String> {
        Uuid::parse_str(value)
            .map(Self::from_uuid)
            .map_err(|e| format!("invalid {} id {value:?}: {e}", T::kind()))
    }
}

impl<T: IdMarker> From<Uuid> for Id<T> {
    fn from(uuid: Uuid) -> Self {
        Self::from_uuid(uuid)
    }
}

impl<T: IdMarker> FromStr for Id<T> {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl<T: IdMarker> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.uuid)
    }
}

// ========================================
// マーカー型の定義
// ========================================

/// Job のマーカー型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Job {}

impl IdMarker for Job {
    fn kind() -> &'static str {
        "job"
    }
}

/// 処理単位（SIP / Transfer）のマーカー型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Unit {}

impl IdMarker for Unit {
    fn kind() -> &'static str {
        "unit"
    }
}

/// chain link のマーカー型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Link {}

impl IdMarker for Link {
    fn kind() -> &'static str {
        "link"
    }
}

pub type JobId = Id<Job>;
pub type UnitId = Id<Unit>;
pub type LinkId = Id<Link>;
