//! RPC client - オーケストレーターへの操作インターフェース
//!
//! `RpcClient` trait 1 つに対して、設定で選ぶ 2 つの実装があります。
//!
//! - **queue**: ジョブキュー越しの同期呼び出し（1 呼び出し 1 接続）
//! - **streaming**: gRPC AdminService（interceptor で呼び出し元情報を付与）
//!
//! クライアントはグローバルに持たず、`connect` で作って呼び出し側が保持します。
//!
//! ```ignore
//! let client = client::connect(&settings.client, CallerContext::new(1, "en"))?;
//! client.approve_job(job_id, "approve").await?;
//! client.close().await?;
//! ```

pub mod error;
pub mod queue;
pub mod streaming;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

pub use self::error::{ClientError, ClientResult};
use crate::config::{Backend, ClientSettings};
use crate::domain::{
    ConfigField, CreatePackage, JobId, LinkId, Package, PackageType, TransferType, UnitId,
};
use crate::ports::DecisionLookup;

/// 呼び出し元（ダッシュボードのユーザー）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerContext {
    pub user_id: u64,
    pub lang: String,
}

impl CallerContext {
    pub fn new(user_id: u64, lang: impl Into<String>) -> Self {
        Self {
            user_id,
            lang: lang.into(),
        }
    }
}

#[async_trait]
pub trait RpcClient: Send + Sync {
    /// ログ用の短い名前
    fn transport_name(&self) -> &'static str;

    /// 承認待ちの Decision を 1 つ解決する
    async fn approve_job(&self, job_id: JobId, choice: &str) -> ClientResult<String>;

    /// unit の承認待ち Job をすべて同じ choice で承認する
    ///
    /// 0 件なら `NotFound`。承認は列挙順に 1 つずつ送り、途中で失敗したらそこで止まる。
    async fn execute_package(
        &self,
        lookup: &dyn DecisionLookup,
        unit_id: UnitId,
        choice: &str,
        chain_link_id: Option<LinkId>,
    ) -> ClientResult<()> {
        let jobs = lookup.awaiting_decision(unit_id, chain_link_id).await?;
        if jobs.is_empty() {
            return Err(ClientError::no_job_found());
        }
        for job_id in jobs {
            debug!(unit_id = %unit_id, job_id = %job_id, choice, "approving pending job");
            self.approve_job(job_id, choice).await?;
        }
        Ok(())
    }

    /// 承認待ち一覧（レガシー XML）
    async fn list_jobs_awaiting_approval(&self) -> ClientResult<String>;

    async fn create_package(&self, request: &CreatePackage) -> ClientResult<UnitId>;

    async fn approve_transfer_by_path(
        &self,
        path: &str,
        transfer_type: TransferType,
    ) -> ClientResult<UnitId>;

    async fn approve_partial_reingest(&self, sip_id: UnitId) -> ClientResult<()>;

    /// 処理設定フォームのフィールド（呼び出し元の言語で）
    async fn get_processing_config_fields(&self) -> ClientResult<Vec<ConfigField>>;

    async fn get_packages_status(&self, package_type: PackageType) -> ClientResult<Vec<Package>>;

    async fn get_transfers_status(&self) -> ClientResult<Vec<Package>> {
        self.get_packages_status(PackageType::Transfer).await
    }

    async fn get_sips_status(&self) -> ClientResult<Vec<Package>> {
        self.get_packages_status(PackageType::Sip).await
    }

    async fn get_package_status(&self, id: UnitId) -> ClientResult<Package>;

    /// 何度呼んでもよい
    async fn close(&self) -> ClientResult<()>;
}

/// 設定の backend に応じたクライアントを作る
///
/// streaming は遅延接続なので、tokio ランタイムの中で呼ぶこと。
pub fn connect(
    settings: &ClientSettings,
    context: CallerContext,
) -> ClientResult<Box<dyn RpcClient>> {
    if settings.server.trim().is_empty() {
        return Err(ClientError::Config("server address is empty".to_string()));
    }
    debug!(backend = ?settings.backend, server = %settings.server, "creating rpc client");
    match settings.backend {
        Backend::Queue => Ok(Box::new(queue::QueueRpcClient::new(
            settings.server.clone(),
            settings.rpc_deadline(),
            context,
            Arc::new(queue::GearmanConnector),
        ))),
        Backend::Streaming => Ok(Box::new(streaming::StreamingRpcClient::connect_lazy(
            &settings.server,
            settings.keepalive_timeout(),
            &context,
        )?)),
    }
}
