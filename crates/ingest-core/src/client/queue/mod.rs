//! Queue-RPC - Gearman 互換ジョブキュー越しの同期 RPC
//!
//! - **codec**: payload の JSON 表現
//! - **transport**: 接続の port（テストでは差し替える）
//! - **gearman**: TCP 上の Gearman プロトコル
//! - **client**: `RpcClient` 実装

pub mod client;
pub mod codec;
pub mod gearman;
pub mod status;
pub mod transport;

pub use self::client::QueueRpcClient;
pub use self::codec::{JsonDataEncoder, RawBytes, Timestamp};
pub use self::gearman::{GearmanConnection, GearmanConnector};
pub use self::transport::{JobResponse, JobState, QueueConnection, QueueConnector};
