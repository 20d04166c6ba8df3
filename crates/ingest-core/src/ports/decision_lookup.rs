//! DecisionLookup port - unit ごとの承認待ち Job の列挙
//!
//! `RpcClient::execute_package` が使います。返す順序がそのまま承認順になります。

use async_trait::async_trait;

use crate::client::ClientResult;
use crate::domain::{JobId, LinkId, UnitId};

/// DecisionLookup は承認待ちの Job ID を返す
///
/// `link_id` が指定された場合はその chain link の Job に限定します。
#[async_trait]
pub trait DecisionLookup: Send + Sync {
    async fn awaiting_decision(
        &self,
        unit_id: UnitId,
        link_id: Option<LinkId>,
    ) -> ClientResult<Vec<JobId>>;
}
