//! HandlerLoader - loader_target から handler を得る
//!
//! Rust では実行時の動的 import をしないので、handler 実装は
//! ビルド時に `StaticLoader` へリンクしておきます。
//! テーブルにあってもリンクされていない target は `LoadError::NotLinked` です。
//!
//! # 学習ポイント
//! - HashMap での型消去された factory の管理
//! - factory は呼ばれるたびに新しい handler を作ってよい（ロードは 1 回だけ）

use std::collections::HashMap;
use std::sync::Arc;

use super::handler::JobHandler;
use crate::domain::{LoadError, RegistryError};

type Factory = Box<dyn Fn() -> Result<Arc<dyn JobHandler>, LoadError> + Send + Sync>;

/// HandlerLoader は target 名から handler を生成
pub trait HandlerLoader: Send + Sync {
    fn load(&self, target: &str) -> Result<Arc<dyn JobHandler>, LoadError>;
}

/// StaticLoader はビルド時に登録された factory を引く
///
/// ```ignore
/// let mut loader = StaticLoader::new();
/// loader.register("archivematica_clamscan", || Ok(Arc::new(ClamScan::from_env()?)))?;
/// loader.register_handler("cmd_test", Arc::new(CmdTest))?;
/// ```
#[derive(Default)]
pub struct StaticLoader {
    factories: HashMap<String, Factory>,
}

impl StaticLoader {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    pub fn register<F>(&mut self, target: &str, factory: F) -> Result<(), RegistryError>
    where
        F: Fn() -> Result<Arc<dyn JobHandler>, LoadError> + Send + Sync + 'static,
    {
        if self.factories.contains_key(target) {
            return Err(RegistryError::AlreadyRegistered(target.to_string()));
        }
        self.factories.insert(target.to_string(), Box::new(factory));
        Ok(())
    }

    /// 既に作成済みの handler を共有する
    pub fn register_handler(
        &mut self,
        target: &str,
        handler: Arc<dyn JobHandler>,
    ) -> Result<(), RegistryError> {
        self.register(target, move || Ok(Arc::clone(&handler)))
    }

    pub fn linked_targets(&self) -> Vec<String> {
        let mut targets: Vec<String> = self.factories.keys().cloned().collect();
        targets.sort();
        targets
    }
}

impl HandlerLoader for StaticLoader {
    fn load(&self, target: &str) -> Result<Arc<dyn JobHandler>, LoadError> {
        let factory = self
            .factories
            .get(target)
            .ok_or_else(|| LoadError::NotLinked(target.to_string()))?;
        factory()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::handler::testing::ExitWith;

    #[test]
    fn test_register_and_load() {
        let mut loader = StaticLoader::new();
        loader
            .register_handler("cmd_test", Arc::new(ExitWith(0)))
            .unwrap();

        assert!(loader.load("cmd_test").is_ok());
        assert_eq!(loader.linked_targets(), vec!["cmd_test".to_string()]);
    }

    #[test]
    fn test_double_registration() {
        let mut loader = StaticLoader::new();
        loader
            .register_handler("cmd_test", Arc::new(ExitWith(0)))
            .unwrap();
        let result = loader.register_handler("cmd_test", Arc::new(ExitWith(1)));
        assert!(matches!(result, Err(RegistryError::AlreadyRegistered(_))));
    }

    #[test]
    fn test_unlinked_target() {
        let loader = StaticLoader::new();
        let err = loader.load("fits").err().unwrap();
        assert_eq!(err, LoadError::NotLinked("fits".into()));
    }

    #[test]
    fn test_factory_failure_surfaces() {
        let mut loader = StaticLoader::new();
        loader
            .register("needs_clamd", || {
                Err(LoadError::Init {
                    target: "needs_clamd".into(),
                    reason: "socket missing".into(),
                })
            })
            .unwrap();
        assert!(matches!(
            loader.load("needs_clamd"),
            Err(LoadError::Init { .. })
        ));
    }
}
