//! Ports - 抽象化レイヤー
//!
//! このモジュールは Hexagonal Architecture の「ポート」を定義します。
//! 各 trait はこのクレートの外にある協調者（キュー、DB、メトリクス基盤、
//! オーケストレーター）へのインターフェースです。

pub mod clock;
pub mod connections;
pub mod decision_lookup;
pub mod job_source;
pub mod job_store;
pub mod metrics;

// 主要な trait を再エクスポート
pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::connections::{ConnectionGuard, NoConnections};
pub use self::decision_lookup::DecisionLookup;
pub use self::job_source::{JobSource, SourceError, TaskBatch};
pub use self::job_store::JobStore;
pub use self::metrics::{JobMetrics, NoopMetrics};
