//! StreamingRpcClient - AdminService 越しの RPC
//!
//! `AdminApi` が tonic スタブとの境界です。本番は `GrpcAdmin`（遅延接続の
//! Channel + ContextInterceptor）、テストでは偽物を差し込みます。
//!
//! 期限は既定では付けません。gRPC の deadline 伝播に任せ、
//! 呼び出し側が `with_deadline` で指定したときだけ `grpc-timeout` を送ります。

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tonic::service::interceptor::InterceptedService;
use tonic::transport::{Channel, Endpoint};
use tonic::{Request, Status};
use tracing::debug;

use super::convert::{
    config_field_from_wire, decision_from_wire, package_from_wire, package_type_to_wire,
    transfer_type_to_wire,
};
use super::interceptor::ContextInterceptor;
use super::proto;
use super::stub::AdminServiceClient;
use super::xml::decisions_to_xml;
use crate::client::error::{ClientError, ClientResult};
use crate::client::{CallerContext, RpcClient};
use crate::domain::{
    ConfigField, CreatePackage, JobId, Package, PackageType, TransferType, UnitId,
};

/// AdminService の unary メソッド一覧
#[async_trait]
pub trait AdminApi: Send + Sync {
    async fn approve_job(
        &self,
        req: proto::ApproveJobRequest,
    ) -> Result<proto::ApproveJobResponse, Status>;

    async fn list_decisions(
        &self,
        req: proto::ListDecisionsRequest,
    ) -> Result<proto::ListDecisionsResponse, Status>;

    async fn create_package(
        &self,
        req: proto::CreatePackageRequest,
    ) -> Result<proto::CreatePackageResponse, Status>;

    async fn approve_transfer_by_path(
        &self,
        req: proto::ApproveTransferByPathRequest,
    ) -> Result<proto::ApproveTransferByPathResponse, Status>;

    async fn approve_partial_reingest(
        &self,
        req: proto::ApprovePartialReingestRequest,
    ) -> Result<proto::ApprovePartialReingestResponse, Status>;

    async fn list_processing_configuration_fields(
        &self,
        req: proto::ListProcessingConfigurationFieldsRequest,
    ) -> Result<proto::ListProcessingConfigurationFieldsResponse, Status>;

    async fn list_packages(
        &self,
        req: proto::ListPackagesRequest,
    ) -> Result<proto::ListPackagesResponse, Status>;

    async fn read_package(
        &self,
        req: proto::ReadPackageRequest,
    ) -> Result<proto::ReadPackageResponse, Status>;
}

type Stub = AdminServiceClient<InterceptedService<Channel, ContextInterceptor>>;

/// tonic Channel を使う本番実装
#[derive(Clone)]
pub struct GrpcAdmin {
    stub: Stub,
    deadline: Option<Duration>,
}

impl GrpcAdmin {
    /// 接続は最初の呼び出しまで遅延する
    pub fn connect_lazy(
        server: &str,
        keepalive_timeout: Duration,
        context: &CallerContext,
    ) -> ClientResult<Self> {
        let uri = if server.starts_with("http://") || server.starts_with("https://") {
            server.to_string()
        } else {
            format!("http://{server}")
        };
        let channel = Endpoint::from_shared(uri)
            .map_err(|e| ClientError::Config(format!("invalid server address {server:?}: {e}")))?
            .keep_alive_timeout(keepalive_timeout)
            .connect_lazy();
        let interceptor = ContextInterceptor::for_caller(context)?;
        Ok(Self {
            stub: AdminServiceClient::with_interceptor(channel, interceptor),
            deadline: None,
        })
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    fn request<T>(&self, message: T) -> Request<T> {
        let mut req = Request::new(message);
        if let Some(deadline) = self.deadline {
            req.set_timeout(deadline);
        }
        req
    }
}

#[async_trait]
impl AdminApi for GrpcAdmin {
    async fn approve_job(
        &self,
        req: proto::ApproveJobRequest,
    ) -> Result<proto::ApproveJobResponse, Status> {
        debug!(method = "ApproveJob", "admin rpc call");
        let mut stub = self.stub.clone();
        Ok(stub.approve_job(self.request(req)).await?.into_inner())
    }

    async fn list_decisions(
        &self,
        req: proto::ListDecisionsRequest,
    ) -> Result<proto::ListDecisionsResponse, Status> {
        debug!(method = "ListDecisions", "admin rpc call");
        let mut stub = self.stub.clone();
        Ok(stub.list_decisions(self.request(req)).await?.into_inner())
    }

    async fn create_package(
        &self,
        req: proto::CreatePackageRequest,
    ) -> Result<proto::CreatePackageResponse, Status> {
        debug!(method = "CreatePackage", "admin rpc call");
        let mut stub = self.stub.clone();
        Ok(stub.create_package(self.request(req)).await?.into_inner())
    }

    async fn approve_transfer_by_path(
        &self,
        req: proto::ApproveTransferByPathRequest,
    ) -> Result<proto::ApproveTransferByPathResponse, Status> {
        debug!(method = "ApproveTransferByPath", "admin rpc call");
        let mut stub = self.stub.clone();
        Ok(stub
            .approve_transfer_by_path(self.request(req))
            .await?
            .into_inner())
    }

    async fn approve_partial_reingest(
        &self,
        req: proto::ApprovePartialReingestRequest,
    ) -> Result<proto::ApprovePartialReingestResponse, Status> {
        debug!(method = "ApprovePartialReingest", "admin rpc call");
        let mut stub = self.stub.clone();
        Ok(stub
            .approve_partial_reingest(self.request(req))
            .await?
            .into_inner())
    }

    async fn list_processing_configuration_fields(
        &self,
        req: proto::ListProcessingConfigurationFieldsRequest,
    ) -> Result<proto::ListProcessingConfigurationFieldsResponse, Status> {
        debug!(method = "ListProcessingConfigurationFields", "admin rpc call");
        let mut stub = self.stub.clone();
        Ok(stub
            .list_processing_configuration_fields(self.request(req))
            .await?
            .into_inner())
    }

    async fn list_packages(
        &self,
        req: proto::ListPackagesRequest,
    ) -> Result<proto::ListPackagesResponse, Status> {
        debug!(method = "ListPackages", "admin rpc call");
        let mut stub = self.stub.clone();
        Ok(stub.list_packages(self.request(req)).await?.into_inner())
    }

    async fn read_package(
        &self,
        req: proto::ReadPackageRequest,
    ) -> Result<proto::ReadPackageResponse, Status> {
        debug!(method = "ReadPackage", "admin rpc call");
        let mut stub = self.stub.clone();
        Ok(stub.read_package(self.request(req)).await?.into_inner())
    }
}

pub struct StreamingRpcClient<A> {
    admin: Mutex<Option<Arc<A>>>,
    lang: String,
}

impl StreamingRpcClient<GrpcAdmin> {
    pub fn connect_lazy(
        server: &str,
        keepalive_timeout: Duration,
        context: &CallerContext,
    ) -> ClientResult<Self> {
        let admin = GrpcAdmin::connect_lazy(server, keepalive_timeout, context)?;
        Ok(Self::new(admin, context.lang.clone()))
    }
}

impl<A: AdminApi> StreamingRpcClient<A> {
    pub fn new(admin: A, lang: impl Into<String>) -> Self {
        Self {
            admin: Mutex::new(Some(Arc::new(admin))),
            lang: lang.into(),
        }
    }

    /// close 後は Transport エラー
    fn admin(&self) -> ClientResult<Arc<A>> {
        self.admin
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or_else(|| ClientError::Transport("client is closed".to_string()))
    }
}

fn unit_id(method: &str, raw: &str) -> ClientResult<UnitId> {
    UnitId::parse(raw).map_err(|e| ClientError::InvalidResponse(format!("{method}: {e}")))
}

#[async_trait]
impl<A: AdminApi + 'static> RpcClient for StreamingRpcClient<A> {
    fn transport_name(&self) -> &'static str {
        "streaming"
    }

    async fn approve_job(&self, job_id: JobId, choice: &str) -> ClientResult<String> {
        self.admin()?
            .approve_job(proto::ApproveJobRequest {
                job_id: job_id.to_string(),
                choice: choice.to_string(),
            })
            .await?;
        Ok(format!("approving: {job_id} {choice}"))
    }

    async fn list_jobs_awaiting_approval(&self) -> ClientResult<String> {
        let resp = self
            .admin()?
            .list_decisions(proto::ListDecisionsRequest {})
            .await?;
        let decisions = resp
            .decision
            .into_iter()
            .map(decision_from_wire)
            .collect::<ClientResult<Vec<_>>>()?;
        decisions_to_xml(&decisions)
    }

    async fn create_package(&self, request: &CreatePackage) -> ClientResult<UnitId> {
        let req = proto::CreatePackageRequest {
            name: request.name.clone(),
            r#type: transfer_type_to_wire(request.transfer_type) as i32,
            accession: request.accession.clone(),
            access_system_id: request.access_system_id.clone(),
            path: request.path.to_vec(),
            metadata_set_id: request.metadata_set().map(str::to_string),
            processing_config: request.processing_config.clone().unwrap_or_default(),
            auto_approve: Some(request.auto_approve),
        };
        let resp = self.admin()?.create_package(req).await?;
        unit_id("CreatePackage", &resp.id)
    }

    async fn approve_transfer_by_path(
        &self,
        path: &str,
        transfer_type: TransferType,
    ) -> ClientResult<UnitId> {
        let resp = self
            .admin()?
            .approve_transfer_by_path(proto::ApproveTransferByPathRequest {
                directory: path.to_string(),
                r#type: transfer_type_to_wire(transfer_type) as i32,
            })
            .await?;
        unit_id("ApproveTransferByPath", &resp.id)
    }

    async fn approve_partial_reingest(&self, sip_id: UnitId) -> ClientResult<()> {
        self.admin()?
            .approve_partial_reingest(proto::ApprovePartialReingestRequest {
                id: sip_id.to_string(),
            })
            .await?;
        Ok(())
    }

    async fn get_processing_config_fields(&self) -> ClientResult<Vec<ConfigField>> {
        let resp = self
            .admin()?
            .list_processing_configuration_fields(proto::ListProcessingConfigurationFieldsRequest {})
            .await?;
        Ok(resp
            .field
            .into_iter()
            .map(|f| config_field_from_wire(f, &self.lang))
            .collect())
    }

    async fn get_packages_status(&self, package_type: PackageType) -> ClientResult<Vec<Package>> {
        let resp = self
            .admin()?
            .list_packages(proto::ListPackagesRequest {
                r#type: package_type_to_wire(package_type) as i32,
            })
            .await?;
        resp.package
            .into_iter()
            .map(|p| package_from_wire(p, Some(package_type)))
            .collect()
    }

    async fn get_package_status(&self, id: UnitId) -> ClientResult<Package> {
        let resp = self
            .admin()?
            .read_package(proto::ReadPackageRequest { id: id.to_string() })
            .await?;
        let pkg = resp
            .package
            .ok_or_else(|| ClientError::NotFound(format!("package {id}")))?;
        package_from_wire(pkg, None)
    }

    async fn close(&self) -> ClientResult<()> {
        // Channel は最後の参照が落ちた時点で閉じる
        self.admin
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{LinkId, PackageStatus};
    use crate::impls::InMemoryDecisions;

    /// リクエストを記録し、固定の応答を返す
    #[derive(Default)]
    struct FakeAdmin {
        approvals: Mutex<Vec<proto::ApproveJobRequest>>,
        created: Mutex<Vec<proto::CreatePackageRequest>>,
        listed: Mutex<Vec<proto::ListPackagesRequest>>,
        decisions: Vec<proto::Decision>,
        packages: Vec<proto::Package>,
        created_id: String,
        fail_with: Option<tonic::Code>,
    }

    impl FakeAdmin {
        fn check(&self) -> Result<(), Status> {
            match self.fail_with {
                Some(code) => Err(Status::new(code, "nope")),
                None => Ok(()),
            }
        }
    }

    #[async_trait]
    impl AdminApi for Arc<FakeAdmin> {
        async fn approve_job(
            &self,
            req: proto::ApproveJobRequest,
        ) -> Result<proto::ApproveJobResponse, Status> {
            self.check()?;
            self.approvals.lock().unwrap().push(req);
            Ok(proto::ApproveJobResponse {})
        }

        async fn list_decisions(
            &self,
            _req: proto::ListDecisionsRequest,
        ) -> Result<proto::ListDecisionsResponse, Status> {
            self.check()?;
            Ok(proto::ListDecisionsResponse {
                decision: self.decisions.clone(),
            })
        }

        async fn create_package(
            &self,
            req: proto::CreatePackageRequest,
        ) -> Result<proto::CreatePackageResponse, Status> {
            self.check()?;
            self.created.lock().unwrap().push(req);
            Ok(proto::CreatePackageResponse {
                id: self.created_id.clone(),
            })
        }

        async fn approve_transfer_by_path(
            &self,
            _req: proto::ApproveTransferByPathRequest,
        ) -> Result<proto::ApproveTransferByPathResponse, Status> {
            self.check()?;
            Ok(proto::ApproveTransferByPathResponse {
                id: self.created_id.clone(),
            })
        }

        async fn approve_partial_reingest(
            &self,
            _req: proto::ApprovePartialReingestRequest,
        ) -> Result<proto::ApprovePartialReingestResponse, Status> {
            self.check()?;
            Ok(proto::ApprovePartialReingestResponse {})
        }

        async fn list_processing_configuration_fields(
            &self,
            _req: proto::ListProcessingConfigurationFieldsRequest,
        ) -> Result<proto::ListProcessingConfigurationFieldsResponse, Status> {
            self.check()?;
            Ok(proto::ListProcessingConfigurationFieldsResponse {
                field: vec![proto::ProcessingConfigField {
                    id: "f".into(),
                    name: "n".into(),
                    label: Some(proto::I18n {
                        tx: [("en".to_string(), "Label".to_string())].into(),
                    }),
                    choice: vec![],
                }],
            })
        }

        async fn list_packages(
            &self,
            req: proto::ListPackagesRequest,
        ) -> Result<proto::ListPackagesResponse, Status> {
            self.check()?;
            self.listed.lock().unwrap().push(req);
            Ok(proto::ListPackagesResponse {
                package: self.packages.clone(),
            })
        }

        async fn read_package(
            &self,
            req: proto::ReadPackageRequest,
        ) -> Result<proto::ReadPackageResponse, Status> {
            self.check()?;
            Ok(proto::ReadPackageResponse {
                package: self.packages.iter().find(|p| p.id == req.id).cloned(),
            })
        }
    }

    fn client(fake: &Arc<FakeAdmin>) -> StreamingRpcClient<Arc<FakeAdmin>> {
        StreamingRpcClient::new(Arc::clone(fake), "fr")
    }

    fn wire_package(id: UnitId) -> proto::Package {
        proto::Package {
            id: id.to_string(),
            name: "sip-1".into(),
            r#type: proto::PackageType::Sip as i32,
            status: proto::PackageStatus::Done as i32,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn approve_job_reports_what_it_approved() {
        let fake = Arc::new(FakeAdmin::default());
        let job = JobId::generate();

        let out = client(&fake).approve_job(job, "yes").await.unwrap();

        assert_eq!(out, format!("approving: {job} yes"));
        let approvals = fake.approvals.lock().unwrap();
        assert_eq!(approvals[0].job_id, job.to_string());
        assert_eq!(approvals[0].choice, "yes");
    }

    #[tokio::test]
    async fn create_package_sends_the_declared_transfer_type() {
        let id = UnitId::generate();
        let fake = Arc::new(FakeAdmin {
            created_id: id.to_string(),
            ..Default::default()
        });

        let req = CreatePackage::new("bag", TransferType::ZippedBag, "/home/bag.zip")
            .auto_approve(false);
        let got = client(&fake).create_package(&req).await.unwrap();

        assert_eq!(got, id);
        let created = fake.created.lock().unwrap();
        let sent = &created[0];
        assert_eq!(sent.r#type(), proto::TransferType::ZippedBag);
        assert_eq!(sent.path, vec!["/home/bag.zip".to_string()]);
        assert_eq!(sent.metadata_set_id, None);
        assert_eq!(sent.auto_approve, Some(false));
        assert_eq!(sent.processing_config, "");
    }

    #[tokio::test]
    async fn create_package_attaches_non_empty_metadata_set() {
        let fake = Arc::new(FakeAdmin {
            created_id: UnitId::generate().to_string(),
            ..Default::default()
        });
        let req = CreatePackage::new(
            "multi",
            TransferType::Standard,
            vec!["/a".to_string(), "/b".to_string()],
        )
        .metadata_set_id("ms-1")
        .processing_config("automated");

        client(&fake).create_package(&req).await.unwrap();

        let created = fake.created.lock().unwrap();
        assert_eq!(created[0].metadata_set_id.as_deref(), Some("ms-1"));
        assert_eq!(created[0].path.len(), 2);
        assert_eq!(created[0].processing_config, "automated");
    }

    #[tokio::test]
    async fn garbage_id_from_server_is_an_invalid_response() {
        let fake = Arc::new(FakeAdmin {
            created_id: "not-a-uuid".into(),
            ..Default::default()
        });
        let err = client(&fake)
            .approve_transfer_by_path("/t", TransferType::Standard)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn packages_status_maps_the_requested_type() {
        let id = UnitId::generate();
        let fake = Arc::new(FakeAdmin {
            packages: vec![wire_package(id)],
            ..Default::default()
        });

        let packages = client(&fake).get_sips_status().await.unwrap();

        assert_eq!(packages[0].id, id);
        assert_eq!(packages[0].status, PackageStatus::Complete);
        assert_eq!(
            fake.listed.lock().unwrap()[0].r#type(),
            proto::PackageType::Sip
        );
    }

    #[tokio::test]
    async fn package_status_is_shaped_or_not_found() {
        let id = UnitId::generate();
        let fake = Arc::new(FakeAdmin {
            packages: vec![wire_package(id)],
            ..Default::default()
        });
        let c = client(&fake);

        let pkg = c.get_package_status(id).await.unwrap();
        assert_eq!(pkg.package_type, PackageType::Sip);
        assert_eq!(pkg.name, "sip-1");

        let err = c.get_package_status(UnitId::generate()).await.unwrap_err();
        assert!(matches!(err, ClientError::NotFound(_)));
    }

    #[tokio::test]
    async fn config_fields_fall_back_to_english() {
        let fake = Arc::new(FakeAdmin::default());
        let fields = client(&fake).get_processing_config_fields().await.unwrap();
        assert_eq!(fields[0].label, "Label");
    }

    #[tokio::test]
    async fn decisions_render_as_xml() {
        let fake = Arc::new(FakeAdmin {
            decisions: vec![proto::Decision {
                id: JobId::generate().to_string(),
                package_id: UnitId::generate().to_string(),
                package_type: "SIP".into(),
                ..Default::default()
            }],
            ..Default::default()
        });
        let xml = client(&fake).list_jobs_awaiting_approval().await.unwrap();
        assert!(xml.contains("<type>SIP</type>"));
    }

    #[tokio::test]
    async fn status_codes_become_client_errors() {
        let fake = Arc::new(FakeAdmin {
            fail_with: Some(tonic::Code::Unavailable),
            ..Default::default()
        });
        let err = client(&fake)
            .approve_partial_reingest(UnitId::generate())
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Transport(_)));
    }

    #[tokio::test]
    async fn close_is_idempotent_and_final() {
        let fake = Arc::new(FakeAdmin::default());
        let c = client(&fake);

        c.close().await.unwrap();
        c.close().await.unwrap();

        let err = c.list_jobs_awaiting_approval().await.unwrap_err();
        assert!(matches!(err, ClientError::Transport(_)));
    }

    #[tokio::test]
    async fn execute_package_uses_approve_job() {
        let unit = UnitId::generate();
        let link = LinkId::generate();
        let job = JobId::generate();
        let decisions = InMemoryDecisions::new();
        decisions.add(unit, link, job);
        decisions.add(unit, LinkId::generate(), JobId::generate());

        let fake = Arc::new(FakeAdmin::default());
        client(&fake)
            .execute_package(&decisions, unit, "C", Some(link))
            .await
            .unwrap();

        let approvals = fake.approvals.lock().unwrap();
        assert_eq!(approvals.len(), 1);
        assert_eq!(approvals[0].job_id, job.to_string());
    }

    #[test]
    fn bad_server_address_is_a_config_error() {
        let err = GrpcAdmin::connect_lazy(
            "http://bad host",
            Duration::from_secs(1),
            &CallerContext::new(1, "en"),
        )
        .err()
        .unwrap();
        assert!(matches!(err, ClientError::Config(_)));
    }

    #[tokio::test]
    async fn deadline_is_only_sent_when_the_caller_sets_one() {
        let admin = GrpcAdmin::connect_lazy(
            "localhost:50051",
            Duration::from_secs(1),
            &CallerContext::new(1, "en"),
        )
        .unwrap();
        let req = admin.request(proto::ListDecisionsRequest {});
        assert!(req.metadata().get("grpc-timeout").is_none());

        let admin = admin.with_deadline(Duration::from_secs(5));
        let req = admin.request(proto::ListDecisionsRequest {});
        assert!(req.metadata().get("grpc-timeout").is_some());
    }
}
