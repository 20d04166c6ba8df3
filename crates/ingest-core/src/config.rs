//! Settings - 設定の読み込み
//!
//! 優先順位（後勝ち）:
//! 1. 既定値（`Default` 実装）
//! 2. 設定ファイル（既定は `ingest.toml`、なくてもよい）
//! 3. 環境変数 `INGEST__<SECTION>__<KEY>`（例: `INGEST__CLIENT__SERVER`）

use std::path::Path;
use std::time::Duration;

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_FILE: &str = "ingest.toml";
pub const ENV_PREFIX: &str = "INGEST";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub worker: WorkerSettings,
    pub client: ClientSettings,
    pub log: LogSettings,
}

impl Settings {
    /// ファイル（任意）と環境変数から読み込む
    pub fn load(file: Option<&Path>) -> Result<Self, ConfigError> {
        let file_source = match file {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };
        let builder = Config::builder().add_source(file_source).add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );
        Self::build(builder)
    }

    fn build(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        builder.build()?.try_deserialize()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerSettings {
    /// 同時にバッチを取りに行くワーカー数
    pub pool_size: usize,
    /// JobSource に渡す待ち時間
    pub poll_interval_ms: u64,
}

impl WorkerSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            pool_size: 4,
            poll_interval_ms: 250,
        }
    }
}

/// RPC client の実装選択
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Gearman 互換のジョブキュー越しの同期 RPC
    Queue,
    /// gRPC
    #[default]
    Streaming,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientSettings {
    pub backend: Backend,
    /// `host:port`
    pub server: String,
    /// queue backend の同期呼び出しの期限（streaming は使わない）
    pub rpc_deadline_secs: u64,
    pub lang: String,
    pub keepalive_timeout_ms: u64,
}

impl ClientSettings {
    pub fn rpc_deadline(&self) -> Duration {
        Duration::from_secs(self.rpc_deadline_secs)
    }

    pub fn keepalive_timeout(&self) -> Duration {
        Duration::from_millis(self.keepalive_timeout_ms)
    }
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            server: "localhost:4730".to_string(),
            rpc_deadline_secs: 30,
            lang: "en".to_string(),
            keepalive_timeout_ms: 10_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// `RUST_LOG` 未設定時の EnvFilter
    pub level: String,
    pub json: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    fn from_toml(text: &str) -> Settings {
        Settings::build(Config::builder().add_source(File::from_str(text, FileFormat::Toml)))
            .unwrap()
    }

    #[test]
    fn defaults_apply_without_any_source() {
        let settings = Settings::build(Config::builder()).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.client.backend, Backend::Streaming);
        assert_eq!(settings.client.rpc_deadline(), Duration::from_secs(30));
        assert_eq!(settings.worker.pool_size, 4);
    }

    #[test]
    fn file_overrides_only_what_it_names() {
        let settings = from_toml(
            r#"
            [client]
            backend = "queue"
            server = "gearmand:4730"

            [log]
            json = true
            "#,
        );
        assert_eq!(settings.client.backend, Backend::Queue);
        assert_eq!(settings.client.server, "gearmand:4730");
        assert_eq!(settings.client.lang, "en");
        assert!(settings.log.json);
        assert_eq!(settings.log.level, "info");
    }

    #[test]
    fn unknown_backend_is_rejected() {
        let result = Settings::build(
            Config::builder().add_source(File::from_str(
                "[client]\nbackend = \"carrier-pigeon\"",
                FileFormat::Toml,
            )),
        );
        assert!(result.is_err());
    }
}
