//! Impls - ports の開発用・テスト用実装
//!
//! # 含まれる実装
//! - **InMemoryJobSource**: FIFO のバッチ配送元
//! - **InMemoryJobStore**: 保存された Job の保持
//! - **InMemoryMetrics**: task ごとのカウンタ
//! - **InMemoryDecisions**: 承認待ち Job の列挙
//!
//! 本番用の実装（オーケストレーターのキュー、DB）はこのクレートの外に置きます。

pub mod decisions;
pub mod inmem_source;
pub mod inmem_store;
pub mod metrics;

// 主要な型を再エクスポート
pub use self::decisions::InMemoryDecisions;
pub use self::inmem_source::InMemoryJobSource;
pub use self::inmem_store::InMemoryJobStore;
pub use self::metrics::InMemoryMetrics;
