//! HandlerRegistry - task 名から handler を解決する
//!
//! # 設計
//! - 起動時に `load_all()` で 1 回だけ構築する（唯一の変更点）
//! - 構築後は不変なので、`Arc<HandlerRegistry>` を複数ワーカーからロックなしで参照できる
//! - 1 つの handler がロードできなくても他は影響を受けない
//!   （`Resolution::Unavailable` として残り、dispatch 時に設定エラーとして表面化する）

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use super::handler::{JobHandler, concurrency_of};
use super::loader::HandlerLoader;
use super::table::SUPPORTED_HANDLERS;
use crate::domain::RegistryError;

/// ロード結果
#[derive(Clone)]
pub enum Resolution {
    Loaded(Arc<dyn JobHandler>),
    Unavailable(String),
}

impl std::fmt::Debug for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Resolution::Loaded(_) => f.write_str("Loaded(..)"),
            Resolution::Unavailable(reason) => f.debug_tuple("Unavailable").field(reason).finish(),
        }
    }
}

/// task 1 件分の登録情報
#[derive(Debug, Clone)]
pub struct HandlerDescriptor {
    task_name: String,
    loader_target: String,
    resolution: Resolution,
    concurrency: usize,
}

impl HandlerDescriptor {
    pub fn task_name(&self) -> &str {
        &self.task_name
    }

    pub fn loader_target(&self) -> &str {
        &self.loader_target
    }

    pub fn resolution(&self) -> &Resolution {
        &self.resolution
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn is_available(&self) -> bool {
        matches!(self.resolution, Resolution::Loaded(_))
    }

    /// dispatch 用: ロード済み handler か、設定エラー
    pub fn handler(&self) -> Result<Arc<dyn JobHandler>, RegistryError> {
        match &self.resolution {
            Resolution::Loaded(h) => Ok(Arc::clone(h)),
            Resolution::Unavailable(reason) => Err(RegistryError::Unavailable {
                task_name: self.task_name.clone(),
                reason: reason.clone(),
            }),
        }
    }
}

/// ロード失敗を warn に落として Unavailable を返す
pub fn load(target: &str, loader: &dyn HandlerLoader) -> Resolution {
    match loader.load(target) {
        Ok(handler) => Resolution::Loaded(handler),
        Err(err) => {
            warn!(target_name = %target, error = %err, "failed to load handler");
            Resolution::Unavailable(err.to_string())
        }
    }
}

/// Registry of task handlers (task_name -> descriptor).
#[derive(Debug, Default)]
pub struct HandlerRegistry {
    descriptors: HashMap<String, HandlerDescriptor>,
}

impl HandlerRegistry {
    /// 組み込みテーブル全体をロードする
    pub fn load_all(loader: &dyn HandlerLoader) -> Self {
        Self::load_table(SUPPORTED_HANDLERS.iter().copied(), loader)
    }

    /// 任意のテーブルをロードする。キーは小文字に正規化し、重複は先勝ち。
    pub fn load_table<'a>(
        table: impl IntoIterator<Item = (&'a str, &'a str)>,
        loader: &dyn HandlerLoader,
    ) -> Self {
        let mut descriptors = HashMap::new();
        for (task_name, target) in table {
            let key = task_name.to_lowercase();
            if descriptors.contains_key(&key) {
                warn!(task_name = %key, "duplicate task name in handler table ignored");
                continue;
            }
            let resolution = load(target, loader);
            let concurrency = match &resolution {
                Resolution::Loaded(h) => concurrency_of(h.as_ref()),
                Resolution::Unavailable(_) => super::handler::DEFAULT_CONCURRENCY,
            };
            descriptors.insert(
                key.clone(),
                HandlerDescriptor {
                    task_name: key,
                    loader_target: target.to_string(),
                    resolution,
                    concurrency,
                },
            );
        }

        let registry = Self { descriptors };
        debug!(
            total = registry.len(),
            available = registry.available_count(),
            "handler registry loaded"
        );
        registry
    }

    /// 大文字小文字を区別せずに引く
    pub fn resolve(&self, task_name: &str) -> Result<&HandlerDescriptor, RegistryError> {
        self.descriptors
            .get(&task_name.to_lowercase())
            .ok_or_else(|| RegistryError::NotFound(task_name.to_string()))
    }

    pub fn handler(&self, task_name: &str) -> Result<Arc<dyn JobHandler>, RegistryError> {
        self.resolve(task_name)?.handler()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn available_count(&self) -> usize {
        self.descriptors.values().filter(|d| d.is_available()).count()
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &HandlerDescriptor> {
        self.descriptors.values()
    }
}
