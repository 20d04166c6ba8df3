//! Registry - handler の登録と解決
//!
//! # 二層構造
//! - **table**: 対応 task 名 → loader target の静的テーブル
//! - **loader**: target → handler（ビルド時リンク）
//! - **registry**: 起動時に一度だけ全 task を解決した不変テーブル
//! - **handler**: handler の契約と並行数の正規化

pub mod handler;
pub mod loader;
#[allow(clippy::module_inception)]
pub mod registry;
pub mod table;

// 主要な trait/型 を再エクスポート
pub use self::handler::{DEFAULT_CONCURRENCY, JobHandler, concurrency_of};
pub use self::loader::{HandlerLoader, StaticLoader};
pub use self::registry::{HandlerDescriptor, HandlerRegistry, Resolution, load};
pub use self::table::SUPPORTED_HANDLERS;
