//! Errors - ワーカー側のエラー型と分類
//!
//! RPC 層のエラーは `client::error::ClientError` にあります。

use thiserror::Error;

/// ErrorKind は handler 実行エラーの分類
///
/// - Handler: handler 自身が失敗を報告した
/// - Configuration: handler が未登録 / ロード不能（dispatch 時に判明）
/// - Infrastructure: DB などの周辺リソースの障害
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Handler,
    Configuration,
    Infrastructure,
}

/// HandlerError は handler 呼び出しが「raise」したことを表す
#[derive(Debug)]
pub struct HandlerError {
    kind: ErrorKind,
    message: String,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl HandlerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Handler,
            message: message.into(),
            source: None,
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Configuration,
            message: message.into(),
            source: None,
        }
    }

    pub fn infrastructure(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Infrastructure,
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for HandlerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for HandlerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

impl From<RegistryError> for HandlerError {
    fn from(err: RegistryError) -> Self {
        HandlerError::configuration(err.to_string())
    }
}

/// RegistryError は handler の解決エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("no handler registered for task {0:?}")]
    NotFound(String),

    #[error("handler for task {task_name:?} is unavailable: {reason}")]
    Unavailable { task_name: String, reason: String },

    #[error("handler target {0:?} is already registered")]
    AlreadyRegistered(String),
}

/// LoadError は handler のロード失敗（致命的ではない）
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("handler target {0:?} is not linked into this worker")]
    NotLinked(String),

    #[error("handler target {target:?} failed to initialise: {reason}")]
    Init { target: String, reason: String },
}

/// 呼び出し引数が不正（未対応の type 文字列など）
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ValidationError(pub String);
