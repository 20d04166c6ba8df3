//! Streaming-RPC - gRPC AdminService クライアント
//!
//! - **proto**: prost メッセージ
//! - **stub**: tonic のクライアントスタブ
//! - **interceptor**: `user_id` / `lang` を metadata に付与
//! - **convert**: wire ⇔ ドメイン型
//! - **xml**: 承認待ち一覧のレガシー XML
//! - **client**: `RpcClient` 実装

pub mod client;
pub mod convert;
pub mod interceptor;
pub mod proto;
pub mod stub;
pub mod xml;

pub use self::client::{AdminApi, GrpcAdmin, StreamingRpcClient};
pub use self::interceptor::ContextInterceptor;
pub use self::stub::AdminServiceClient;
