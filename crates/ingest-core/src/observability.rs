//! Observability - ログ初期化と task ごとの集計ビュー

use std::io::IsTerminal;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LogSettings;

static LOGGING_INITIALIZED: OnceLock<()> = OnceLock::new();

/// task 1 件分の完了 / 失敗カウンタ
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskCounts {
    pub completed: usize,
    pub failed: usize,
}

impl TaskCounts {
    pub fn total(&self) -> usize {
        self.completed + self.failed
    }
}

/// tracing subscriber を 1 回だけ設定する
///
/// `RUST_LOG` があればそれを優先し、なければ `settings.level` を使います。
/// 既にグローバル subscriber がある場合（テストなど）はそのまま続行します。
pub fn init_logging(settings: &LogSettings) {
    LOGGING_INITIALIZED.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(settings.level.clone()));

        let result = if settings.json {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_target(true))
                .try_init()
        } else {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .with_target(true)
                        .with_ansi(std::io::stderr().is_terminal())
                        .with_writer(std::io::stderr),
                )
                .try_init()
        };

        if result.is_err() {
            tracing::debug!("global tracing subscriber already initialized");
        }
    });
}
