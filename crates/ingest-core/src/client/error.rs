//! ClientError - RPC 層のエラー分類
//!
//! どちらのトランスポートもここに集約します。呼び出し側（CLI など）は
//! `Display` をそのまま利用者に見せてよい前提です。

use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

use crate::domain::ValidationError;

pub type ClientResult<T> = Result<T, ClientError>;

/// payload が辞書でない場合の Server エラー文
pub const GENERIC_SERVER_ERROR: &str = "The server failed to process the request";
/// 辞書だが message がない場合
pub const UNKNOWN_SERVER_ERROR: &str = "Unknown error message";
/// execute_package で対象が 0 件
pub const NO_JOB_FOUND: &str = "No job was found";

#[derive(Debug, Error)]
pub enum ClientError {
    /// 参照先（承認待ち Job など）が存在しない
    #[error("{0}")]
    NotFound(String),

    #[error("Deadline exceeded: {deadline:?}")]
    Timeout { deadline: Duration },

    /// 応答なしの異常終了
    #[error("{0}")]
    Transport(String),

    /// 処理は完了したが、アプリケーションエラーが返った
    #[error("{}", server_message(.message, .handler.as_deref()))]
    Server {
        message: String,
        handler: Option<String>,
    },

    #[error("{0}")]
    Validation(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("encoding error: {0}")]
    Encoding(String),

    #[error("client configuration error: {0}")]
    Config(String),
}

fn server_message(message: &str, handler: Option<&str>) -> String {
    match handler {
        Some(h) if !h.is_empty() => format!("{message} [handler={h}]"),
        _ => message.to_string(),
    }
}

impl ClientError {
    pub fn no_job_found() -> Self {
        ClientError::NotFound(NO_JOB_FOUND.to_string())
    }

    /// エラーフラグ付き payload から Server エラーを作る
    ///
    /// - 辞書でなければ汎用メッセージ
    /// - `message` がなければ "Unknown error message"
    /// - `function` があれば handler 名として付与
    pub fn from_server_payload(payload: &Value) -> Self {
        let Some(obj) = payload.as_object() else {
            return ClientError::Server {
                message: GENERIC_SERVER_ERROR.to_string(),
                handler: None,
            };
        };
        let message = match obj.get("message") {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => UNKNOWN_SERVER_ERROR.to_string(),
        };
        let handler = obj
            .get("function")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        ClientError::Server { message, handler }
    }
}

impl From<ValidationError> for ClientError {
    fn from(err: ValidationError) -> Self {
        ClientError::Validation(err.0)
    }
}

impl From<tonic::Status> for ClientError {
    fn from(status: tonic::Status) -> Self {
        use tonic::Code;

        let message = status.message().to_string();
        match status.code() {
            Code::Unavailable | Code::Cancelled | Code::Unknown | Code::DeadlineExceeded => {
                ClientError::Transport(format!("{:?}: {message}", status.code()))
            }
            Code::InvalidArgument => ClientError::Validation(message),
            Code::NotFound => ClientError::NotFound(message),
            _ => ClientError::Server {
                message,
                handler: None,
            },
        }
    }
}
