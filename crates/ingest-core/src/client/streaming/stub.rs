//! AdminService の tonic クライアント
//!
//! tonic-build が生成するコードと同じ形を手で書いています（全メソッド unary）。

use tonic::codegen::{Body, Bytes, GrpcMethod, InterceptedService, StdError, http};

use super::proto::{self, SERVICE};

#[derive(Debug, Clone)]
pub struct AdminServiceClient<T> {
    inner: tonic::client::Grpc<T>,
}

macro_rules! unary {
    ($(#[$doc:meta])* $name:ident, $method:literal, $req:ty => $resp:ty) => {
        $(#[$doc])*
        pub async fn $name(
            &mut self,
            request: impl tonic::IntoRequest<$req>,
        ) -> Result<tonic::Response<$resp>, tonic::Status> {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::unknown(format!("Service was not ready: {}", e.into()))
            })?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static(concat!(
                "/archivematica.ccp.admin.v1beta1.AdminService/",
                $method
            ));
            let mut req = request.into_request();
            req.extensions_mut()
                .insert(GrpcMethod::new(SERVICE, $method));
            self.inner.unary(req, path, codec).await
        }
    };
}

impl<T> AdminServiceClient<T>
where
    T: tonic::client::GrpcService<tonic::body::BoxBody>,
    T::Error: Into<StdError>,
    T::ResponseBody: Body<Data = Bytes> + Send + 'static,
    <T::ResponseBody as Body>::Error: Into<StdError> + Send,
{
    pub fn new(inner: T) -> Self {
        Self {
            inner: tonic::client::Grpc::new(inner),
        }
    }

    pub fn with_interceptor<F>(
        inner: T,
        interceptor: F,
    ) -> AdminServiceClient<InterceptedService<T, F>>
    where
        F: tonic::service::Interceptor,
        T::ResponseBody: Default,
        T: tonic::codegen::Service<
                http::Request<tonic::body::BoxBody>,
                Response = http::Response<
                    <T as tonic::client::GrpcService<tonic::body::BoxBody>>::ResponseBody,
                >,
            >,
        <T as tonic::codegen::Service<http::Request<tonic::body::BoxBody>>>::Error:
            Into<StdError> + Send + Sync,
    {
        AdminServiceClient::new(InterceptedService::new(inner, interceptor))
    }

    unary!(
        /// Deprecated on the server, kept for older dashboards.
        approve_job, "ApproveJob",
        proto::ApproveJobRequest => proto::ApproveJobResponse
    );
    unary!(
        list_decisions, "ListDecisions",
        proto::ListDecisionsRequest => proto::ListDecisionsResponse
    );
    unary!(
        create_package, "CreatePackage",
        proto::CreatePackageRequest => proto::CreatePackageResponse
    );
    unary!(
        approve_transfer_by_path, "ApproveTransferByPath",
        proto::ApproveTransferByPathRequest => proto::ApproveTransferByPathResponse
    );
    unary!(
        approve_partial_reingest, "ApprovePartialReingest",
        proto::ApprovePartialReingestRequest => proto::ApprovePartialReingestResponse
    );
    unary!(
        list_processing_configuration_fields, "ListProcessingConfigurationFields",
        proto::ListProcessingConfigurationFieldsRequest
            => proto::ListProcessingConfigurationFieldsResponse
    );
    unary!(
        list_packages, "ListPackages",
        proto::ListPackagesRequest => proto::ListPackagesResponse
    );
    unary!(
        read_package, "ReadPackage",
        proto::ReadPackageRequest => proto::ReadPackageResponse
    );
}
