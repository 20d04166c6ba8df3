//! App - アプリケーション層
//!
//! ports と registry を組み合わせてワーカーの実行ロジックを実装します。
//!
//! # 主要コンポーネント
//! - **WorkerBuilder**: ワーカーの構築とワイヤリング
//! - **TaskRunner**: 1 バッチの実行と後処理
//! - **WorkerPool / Dispatcher**: バッチの取得、handler 解決、並行数制御

pub mod builder;
pub mod task_runner;
pub mod worker_loop;

// 主要な型を再エクスポート
pub use self::builder::{BuildError, Worker, WorkerBuilder};
pub use self::task_runner::TaskRunner;
pub use self::worker_loop::{DispatchOutcome, Dispatcher, WorkerPool};
