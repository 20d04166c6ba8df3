//! ingest-core
//!
//! Core building blocks for the ingest worker and its operator client.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, job, decision, package, processing_config, errors）
//! - **ports**: 抽象化レイヤー（JobSource, JobStore, JobMetrics, Clock, ConnectionGuard, DecisionLookup）
//! - **registry**: task 名 → handler の解決（HandlerRegistry, HandlerLoader, 静的テーブル）
//! - **app**: アプリケーションロジック（builder, task_runner, worker_loop）
//! - **impls**: 実装（InMemoryJobSource など開発 / テスト用）
//! - **client**: オーケストレーターへの RPC（queue / streaming の 2 実装）
//! - **config**: 設定の読み込み（ファイル + 環境変数）
//! - **observability**: ログ初期化とメトリクスの集計型

pub mod domain;
pub mod ports;
pub mod registry;
pub mod app;
pub mod impls;
pub mod client;
pub mod config;
pub mod observability;
