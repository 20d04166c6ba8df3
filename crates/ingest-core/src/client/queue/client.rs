//! QueueRpcClient - ジョブキュー越しの同期 RPC
//!
//! 1 回の呼び出し = 接続 → SUBMIT_JOB → 完了 / 失敗 / 期限切れまで待つ → 切断。
//! 期限は接続も含めた全体にかかります。
//!
//! | 結果                          | エラー                     |
//! |-------------------------------|----------------------------|
//! | 期限切れ（Created のまま）    | `ClientError::Timeout`     |
//! | Complete 以外                 | `ClientError::Transport`   |
//! | payload に `error: true`      | `ClientError::Server`      |

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use tokio::time::Instant;
use tracing::debug;

use super::codec::JsonDataEncoder;
use super::status::{package_from_payload, packages_from_payload};
use super::transport::{JobState, QueueConnector};
use crate::client::error::{ClientError, ClientResult};
use crate::client::{CallerContext, RpcClient};
use crate::domain::{
    ConfigField, CreatePackage, JobId, Package, PackageType, TransferType, UnitId,
};

/// poll timeout より外側の期限。通常は poll timeout が先に切れる
const SUBMIT_GRACE: Duration = Duration::from_secs(1);

pub struct QueueRpcClient {
    server: String,
    deadline: Duration,
    context: CallerContext,
    connector: Arc<dyn QueueConnector>,
    encoder: JsonDataEncoder,
}

impl QueueRpcClient {
    pub fn new(
        server: impl Into<String>,
        deadline: Duration,
        context: CallerContext,
        connector: Arc<dyn QueueConnector>,
    ) -> Self {
        Self {
            server: server.into(),
            deadline,
            context,
            connector,
            encoder: JsonDataEncoder,
        }
    }

    /// ability を同期的に呼び、payload を返す
    pub async fn call(&self, ability: &str, mut data: Map<String, Value>) -> ClientResult<Value> {
        data.entry("user_id")
            .or_insert_with(|| json!(self.context.user_id));
        let body = self.encoder.encode(&data)?;

        debug!(ability = %ability, server = %self.server, "queue rpc call");
        let started = Instant::now();
        let mut conn = tokio::time::timeout(self.deadline, self.connector.connect(&self.server))
            .await
            .map_err(|_| self.timed_out())??;
        let remaining = self.deadline.saturating_sub(started.elapsed());
        let response = tokio::time::timeout(
            remaining + SUBMIT_GRACE,
            conn.submit_job(ability, &body, remaining),
        )
        .await;
        conn.shutdown().await;
        let response = response.map_err(|_| self.timed_out())??;

        match response.state {
            JobState::Complete => {}
            JobState::Created => return Err(self.timed_out()),
            JobState::Pending | JobState::Failed => {
                return Err(ClientError::Transport(format!(
                    "{ability} failed (check the logs)"
                )));
            }
        }

        let payload = self.encoder.decode(&response.result);
        if is_error_payload(&payload) {
            return Err(ClientError::from_server_payload(&payload));
        }
        Ok(payload)
    }

    async fn call_as<T: DeserializeOwned>(
        &self,
        ability: &str,
        data: Map<String, Value>,
    ) -> ClientResult<T> {
        let payload = self.call(ability, data).await?;
        serde_json::from_value(payload)
            .map_err(|e| ClientError::InvalidResponse(format!("{ability}: {e}")))
    }

    fn timed_out(&self) -> ClientError {
        ClientError::Timeout {
            deadline: self.deadline,
        }
    }

    fn lang(&self) -> Value {
        Value::String(self.context.lang.clone())
    }
}

fn is_error_payload(payload: &Value) -> bool {
    match payload.get("error") {
        Some(Value::Bool(b)) => *b,
        Some(Value::Null) | None => false,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(_) => true,
    }
}

fn args(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// `{"id": ...}` でも裸の ID 文字列でも受け付ける
fn unit_id_from(ability: &str, payload: &Value) -> ClientResult<UnitId> {
    let raw = payload
        .get("id")
        .unwrap_or(payload)
        .as_str()
        .ok_or_else(|| ClientError::InvalidResponse(format!("{ability}: missing id")))?;
    UnitId::parse(raw).map_err(|e| ClientError::InvalidResponse(format!("{ability}: {e}")))
}

#[async_trait]
impl RpcClient for QueueRpcClient {
    fn transport_name(&self) -> &'static str {
        "queue"
    }

    async fn approve_job(&self, job_id: JobId, choice: &str) -> ClientResult<String> {
        let payload = self
            .call(
                "approveJob",
                args(json!({"jobUUID": job_id, "chain": choice})),
            )
            .await?;
        Ok(match payload {
            Value::String(s) => s,
            other => other.to_string(),
        })
    }

    async fn list_jobs_awaiting_approval(&self) -> ClientResult<String> {
        match self.call("getJobsAwaitingApproval", Map::new()).await? {
            Value::String(xml) => Ok(xml),
            other => Err(ClientError::InvalidResponse(format!(
                "getJobsAwaitingApproval: expected a document, got {other}"
            ))),
        }
    }

    async fn create_package(&self, request: &CreatePackage) -> ClientResult<UnitId> {
        let mut data = args(json!({
            "name": request.name,
            "type": request.transfer_type,
            "accession": request.accession,
            "access_system_id": request.access_system_id,
            "path": request.path,
            "metadata_set_id": request.metadata_set_id,
            "auto_approve": request.auto_approve,
            "wait_until_complete": request.wait_until_complete,
        }));
        if let Some(config) = &request.processing_config {
            data.insert("processing_config".into(), json!(config));
        }
        let payload = self.call("packageCreate", data).await?;
        unit_id_from("packageCreate", &payload)
    }

    async fn approve_transfer_by_path(
        &self,
        path: &str,
        transfer_type: TransferType,
    ) -> ClientResult<UnitId> {
        let payload = self
            .call(
                "approveTransferByPath",
                args(json!({"db_transfer_path": path, "transfer_type": transfer_type})),
            )
            .await?;
        unit_id_from("approveTransferByPath", &payload)
    }

    async fn approve_partial_reingest(&self, sip_id: UnitId) -> ClientResult<()> {
        self.call("approvePartialReingest", args(json!({"sip_id": sip_id})))
            .await?;
        Ok(())
    }

    async fn get_processing_config_fields(&self) -> ClientResult<Vec<ConfigField>> {
        self.call_as(
            "getProcessingConfigFields",
            args(json!({"lang": self.lang()})),
        )
        .await
    }

    async fn get_packages_status(&self, package_type: PackageType) -> ClientResult<Vec<Package>> {
        let payload = self
            .call(
                "getUnitsStatuses",
                args(json!({"type": package_type, "lang": self.lang()})),
            )
            .await?;
        packages_from_payload("getUnitsStatuses", payload, package_type)
    }

    async fn get_package_status(&self, id: UnitId) -> ClientResult<Package> {
        let payload = self
            .call(
                "getUnitStatus",
                args(json!({"id": id, "lang": self.lang()})),
            )
            .await?;
        package_from_payload("getUnitStatus", payload)
    }

    async fn close(&self) -> ClientResult<()> {
        // 呼び出しごとに接続を閉じているので何もしない
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::queue::transport::{JobResponse, QueueConnection};
    use crate::domain::{LinkId, PackageStatus};
    use crate::impls::InMemoryDecisions;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// 呼び出しを記録し、用意した応答を順に返す
    #[derive(Default)]
    struct Scripted {
        replies: Mutex<VecDeque<ClientResult<JobResponse>>>,
        calls: Mutex<Vec<(String, Value)>>,
        shutdowns: Mutex<usize>,
    }

    impl Scripted {
        fn reply(self: &Arc<Self>, state: JobState, body: &str) -> Arc<Self> {
            self.replies
                .lock()
                .unwrap()
                .push_back(Ok(JobResponse::new(state, body.as_bytes())));
            Arc::clone(self)
        }

        fn calls(&self) -> Vec<(String, Value)> {
            self.calls.lock().unwrap().clone()
        }
    }

    struct ScriptedConnection {
        script: Arc<Scripted>,
    }

    struct ScriptedConnector(Arc<Scripted>);

    #[async_trait]
    impl QueueConnector for ScriptedConnector {
        async fn connect(&self, _server: &str) -> ClientResult<Box<dyn QueueConnection>> {
            Ok(Box::new(ScriptedConnection {
                script: Arc::clone(&self.0),
            }))
        }
    }

    #[async_trait]
    impl QueueConnection for ScriptedConnection {
        async fn submit_job(
            &mut self,
            ability: &str,
            data: &[u8],
            _poll_timeout: Duration,
        ) -> ClientResult<JobResponse> {
            let data: Value = serde_json::from_slice(data).unwrap();
            self.script
                .calls
                .lock()
                .unwrap()
                .push((ability.to_string(), data));
            self.script
                .replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(JobResponse::new(JobState::Complete, "null")))
        }

        async fn shutdown(&mut self) {
            *self.script.shutdowns.lock().unwrap() += 1;
        }
    }

    fn client(script: &Arc<Scripted>) -> QueueRpcClient {
        QueueRpcClient::new(
            "localhost:4730",
            Duration::from_secs(30),
            CallerContext::new(7, "es"),
            Arc::new(ScriptedConnector(Arc::clone(script))),
        )
    }

    #[tokio::test]
    async fn created_at_deadline_is_a_timeout_with_the_deadline() {
        let script = Arc::new(Scripted::default()).reply(JobState::Created, "");
        let err = client(&script)
            .approve_job(JobId::generate(), "c")
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Timeout { deadline } if deadline == Duration::from_secs(30)));
    }

    #[tokio::test]
    async fn failed_worker_is_a_transport_error() {
        let script = Arc::new(Scripted::default()).reply(JobState::Failed, "");
        let err = client(&script)
            .approve_partial_reingest(UnitId::generate())
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "approvePartialReingest failed (check the logs)"
        );
        assert!(matches!(err, ClientError::Transport(_)));
    }

    #[tokio::test]
    async fn error_payload_is_a_server_error() {
        let script = Arc::new(Scripted::default()).reply(
            JobState::Complete,
            r#"{"error": true, "message": "boom", "function": "h"}"#,
        );
        let err = client(&script)
            .list_jobs_awaiting_approval()
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Server { .. }));
        assert_eq!(err.to_string(), "boom [handler=h]");
    }

    #[tokio::test]
    async fn user_id_is_added_and_connection_closed() {
        let script = Arc::new(Scripted::default()).reply(JobState::Complete, "<xml/>");
        let xml = client(&script).list_jobs_awaiting_approval().await.unwrap();

        assert_eq!(xml, "<xml/>");
        let calls = script.calls();
        assert_eq!(calls[0].0, "getJobsAwaitingApproval");
        assert_eq!(calls[0].1, json!({"user_id": 7}));
        assert_eq!(*script.shutdowns.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn caller_supplied_user_id_is_kept() {
        let script = Arc::new(Scripted::default());
        let c = client(&script);
        c.call("approveJob", args(json!({"user_id": 99}))).await.unwrap();
        assert_eq!(script.calls()[0].1["user_id"], json!(99));
    }

    #[tokio::test]
    async fn create_package_payload() {
        let id = UnitId::generate();
        let script = Arc::new(Scripted::default())
            .reply(JobState::Complete, &format!(r#"{{"id": "{id}"}}"#));

        let req = CreatePackage::new(
            "demo",
            TransferType::ZippedBag,
            vec!["/a".to_string(), "/b".to_string()],
        )
        .accession("acc-1")
        .processing_config("automated");
        let got = client(&script).create_package(&req).await.unwrap();

        assert_eq!(got, id);
        let (ability, data) = &script.calls()[0];
        assert_eq!(ability, "packageCreate");
        assert_eq!(data["type"], json!("zipped bag"));
        assert_eq!(data["path"], json!(["/a", "/b"]));
        assert_eq!(data["auto_approve"], json!(true));
        assert_eq!(data["wait_until_complete"], json!(false));
        assert_eq!(data["processing_config"], json!("automated"));
        assert_eq!(data["metadata_set_id"], json!(""));
    }

    #[tokio::test]
    async fn packages_status_reads_the_legacy_dashboard_shape() {
        let id = UnitId::generate();
        let body = json!({"objects": [{
            "id": id, "uuid": id, "timestamp": 1560819661.5,
            "active": true, "directory": "t1", "jobs": []
        }]});
        let script = Arc::new(Scripted::default()).reply(JobState::Complete, &body.to_string());

        let c = client(&script);
        let packages = c.get_transfers_status().await.unwrap();

        assert_eq!(packages.len(), 1);
        assert_eq!(packages[0].id, id);
        assert_eq!(packages[0].name, "t1");
        assert_eq!(packages[0].package_type, PackageType::Transfer);
        assert!(packages[0].is_active());
        assert_eq!(script.calls()[0].1["type"], json!("Transfer"));
        assert_eq!(script.calls()[0].1["lang"], json!("es"));
    }

    #[tokio::test]
    async fn packages_status_reads_the_current_shape() {
        let body = json!([{
            "id": UnitId::generate(), "name": "s1", "type": "SIP", "created_at": 1.5,
            "status": "complete", "jobs": []
        }]);
        let script = Arc::new(Scripted::default()).reply(JobState::Complete, &body.to_string());

        let packages = client(&script).get_sips_status().await.unwrap();

        assert_eq!(packages[0].status, PackageStatus::Complete);
        assert_eq!(packages[0].package_type, PackageType::Sip);
    }

    /// 接続が返ってこない（パケットが黙って捨てられる）サーバー
    struct Unreachable;

    #[async_trait]
    impl QueueConnector for Unreachable {
        async fn connect(&self, _server: &str) -> ClientResult<Box<dyn QueueConnection>> {
            std::future::pending().await
        }
    }

    /// 接続はできるが submit が戻らない
    struct Stalled(Arc<Mutex<usize>>);

    struct StalledConnection(Arc<Mutex<usize>>);

    #[async_trait]
    impl QueueConnector for Stalled {
        async fn connect(&self, _server: &str) -> ClientResult<Box<dyn QueueConnection>> {
            Ok(Box::new(StalledConnection(Arc::clone(&self.0))))
        }
    }

    #[async_trait]
    impl QueueConnection for StalledConnection {
        async fn submit_job(
            &mut self,
            _ability: &str,
            _data: &[u8],
            _poll_timeout: Duration,
        ) -> ClientResult<JobResponse> {
            std::future::pending().await
        }

        async fn shutdown(&mut self) {
            *self.0.lock().unwrap() += 1;
        }
    }

    #[tokio::test]
    async fn connect_that_never_completes_is_a_timeout() {
        let deadline = Duration::from_millis(50);
        let c = QueueRpcClient::new(
            "10.255.255.1:4730",
            deadline,
            CallerContext::new(1, "en"),
            Arc::new(Unreachable),
        );

        let call = c.approve_job(JobId::generate(), "c");
        let err = tokio::time::timeout(Duration::from_secs(5), call)
            .await
            .unwrap()
            .unwrap_err();

        assert!(matches!(err, ClientError::Timeout { deadline: d } if d == deadline));
    }

    #[tokio::test]
    async fn stalled_submit_is_a_timeout_and_still_disconnects() {
        let shutdowns = Arc::new(Mutex::new(0));
        let c = QueueRpcClient::new(
            "localhost:4730",
            Duration::from_millis(50),
            CallerContext::new(1, "en"),
            Arc::new(Stalled(Arc::clone(&shutdowns))),
        );

        let err = tokio::time::timeout(Duration::from_secs(5), c.list_jobs_awaiting_approval())
            .await
            .unwrap()
            .unwrap_err();

        assert!(matches!(err, ClientError::Timeout { .. }));
        assert_eq!(*shutdowns.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn execute_package_approves_each_pending_job_in_order() {
        let unit = UnitId::generate();
        let link = LinkId::generate();
        let (j1, j2) = (JobId::generate(), JobId::generate());
        let decisions = InMemoryDecisions::new();
        decisions.add(unit, link, j1);
        decisions.add(unit, link, j2);

        let script = Arc::new(Scripted::default());
        client(&script)
            .execute_package(&decisions, unit, "C", None)
            .await
            .unwrap();

        let calls = script.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].1["jobUUID"], json!(j1.to_string()));
        assert_eq!(calls[1].1["jobUUID"], json!(j2.to_string()));
        assert!(calls.iter().all(|(a, d)| a == "approveJob" && d["chain"] == "C"));
    }

    #[tokio::test]
    async fn execute_package_without_pending_jobs_is_not_found() {
        let script = Arc::new(Scripted::default());
        let err = client(&script)
            .execute_package(&InMemoryDecisions::new(), UnitId::generate(), "C", None)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::NotFound(_)));
        assert_eq!(err.to_string(), "No job was found");
        assert!(script.calls().is_empty());
    }
}
