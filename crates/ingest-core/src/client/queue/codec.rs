//! JsonDataEncoder - ジョブキュー上の payload の JSON 表現
//!
//! - 出力はコンパクトな JSON（余計な空白なし）
//! - バイト列は埋め込まずに JSON 文字列にする（`RawBytes`）。UTF-8 でなければエラー
//! - 時刻はマイクロ秒精度 + 明示的なオフセット（`Timestamp`）
//! - decode は JSON として読めなければ生の文字列として返す

use chrono::{DateTime, Utc};
use serde::ser::Error as _;
use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::client::error::{ClientError, ClientResult};

/// ISO-8601 のマイクロ秒 + `+00:00` 形式
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f%:z";

/// JSON 文字列として出力されるバイト列
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawBytes<'a>(pub &'a [u8]);

impl Serialize for RawBytes<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let text = std::str::from_utf8(self.0)
            .map_err(|e| S::Error::custom(format!("byte payload is not UTF-8: {e}")))?;
        serializer.serialize_str(text)
    }
}

/// 固定形式で出力される時刻
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timestamp(pub DateTime<Utc>);

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0.format(TIMESTAMP_FORMAT))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonDataEncoder;

impl JsonDataEncoder {
    pub fn encode<T: Serialize + ?Sized>(&self, value: &T) -> ClientResult<Vec<u8>> {
        serde_json::to_vec(value).map_err(|e| ClientError::Encoding(e.to_string()))
    }

    pub fn decode(&self, data: &[u8]) -> Value {
        serde_json::from_slice(data)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(data).into_owned()))
    }
}
