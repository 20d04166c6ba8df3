//! `archivematica.ccp.admin.v1beta1` のメッセージ定義
//!
//! protoc を使わずに prost の derive で直接書いています。タグ番号は
//! サーバー側の .proto と一致させること。

use std::collections::HashMap;

/// gRPC サービス名
pub const SERVICE: &str = "archivematica.ccp.admin.v1beta1.AdminService";

// ========================================
// enums
// ========================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum PackageType {
    Unspecified = 0,
    Transfer = 1,
    Sip = 2,
    Dip = 3,
    Aic = 4,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum TransferType {
    Unspecified = 0,
    Standard = 1,
    ZipFile = 2,
    UnzippedBag = 3,
    ZippedBag = 4,
    Dspace = 5,
    Maildir = 6,
    Trim = 7,
    Dataverse = 8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum PackageStatus {
    Unspecified = 0,
    Processing = 1,
    Done = 2,
    CompletedSuccessfully = 3,
    Failed = 4,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum JobStatus {
    Unspecified = 0,
    AwaitingDecision = 1,
    CompletedSuccessfully = 2,
    ExecutingCommands = 3,
    Failed = 4,
}

// ========================================
// shared messages
// ========================================

/// 言語コード → 翻訳
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct I18n {
    #[prost(map = "string, string", tag = "1")]
    pub tx: HashMap<String, String>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Decision {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(string, tag = "2")]
    pub name: String,
    #[prost(message, repeated, tag = "3")]
    pub choice: Vec<decision::Choice>,
    #[prost(string, tag = "4")]
    pub package_id: String,
    #[prost(string, tag = "5")]
    pub package_path: String,
    #[prost(string, tag = "6")]
    pub package_type: String,
    #[prost(string, tag = "7")]
    pub job_id: String,
}

pub mod decision {
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Choice {
        #[prost(int32, tag = "1")]
        pub id: i32,
        #[prost(string, tag = "2")]
        pub label: String,
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Job {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(string, tag = "2")]
    pub package_id: String,
    #[prost(string, tag = "3")]
    pub directory: String,
    #[prost(string, tag = "4")]
    pub link_id: String,
    #[prost(string, tag = "5")]
    pub link_description: String,
    #[prost(bool, tag = "6")]
    pub hidden: bool,
    #[prost(string, tag = "7")]
    pub group: String,
    #[prost(enumeration = "JobStatus", tag = "8")]
    pub status: i32,
    #[prost(message, optional, tag = "9")]
    pub created_at: Option<::prost_types::Timestamp>,
    #[prost(message, optional, tag = "10")]
    pub decision: Option<Decision>,
    #[prost(enumeration = "PackageType", tag = "11")]
    pub package_type: i32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Package {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(string, tag = "2")]
    pub name: String,
    #[prost(enumeration = "PackageType", tag = "3")]
    pub r#type: i32,
    #[prost(enumeration = "PackageStatus", tag = "4")]
    pub status: i32,
    #[prost(message, optional, tag = "5")]
    pub created_at: Option<::prost_types::Timestamp>,
    #[prost(message, repeated, tag = "6")]
    pub job: Vec<Job>,
    #[prost(string, tag = "7")]
    pub access_system_id: String,
    #[prost(string, tag = "8")]
    pub accession: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProcessingConfigField {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(string, tag = "2")]
    pub name: String,
    #[prost(message, optional, tag = "3")]
    pub label: Option<I18n>,
    #[prost(message, repeated, tag = "4")]
    pub choice: Vec<processing_config_field::Choice>,
}

pub mod processing_config_field {
    use super::I18n;

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Choice {
        #[prost(string, tag = "1")]
        pub value: String,
        #[prost(message, optional, tag = "2")]
        pub label: Option<I18n>,
        #[prost(message, repeated, tag = "3")]
        pub applies_to: Vec<choice::AppliesTo>,
    }

    pub mod choice {
        use super::I18n;

        #[derive(Clone, PartialEq, ::prost::Message)]
        pub struct AppliesTo {
            #[prost(string, tag = "1")]
            pub link_id: String,
            #[prost(string, tag = "2")]
            pub value: String,
            #[prost(message, optional, tag = "3")]
            pub label: Option<I18n>,
        }
    }
}

// ========================================
// requests / responses
// ========================================

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ApproveJobRequest {
    #[prost(string, tag = "1")]
    pub job_id: String,
    #[prost(string, tag = "2")]
    pub choice: String,
}

#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct ApproveJobResponse {}

#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct ListDecisionsRequest {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ListDecisionsResponse {
    #[prost(message, repeated, tag = "1")]
    pub decision: Vec<Decision>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CreatePackageRequest {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(enumeration = "TransferType", tag = "2")]
    pub r#type: i32,
    #[prost(string, tag = "3")]
    pub accession: String,
    #[prost(string, tag = "4")]
    pub access_system_id: String,
    #[prost(string, repeated, tag = "5")]
    pub path: Vec<String>,
    /// google.protobuf.StringValue
    #[prost(message, optional, tag = "6")]
    pub metadata_set_id: Option<String>,
    #[prost(string, tag = "7")]
    pub processing_config: String,
    /// google.protobuf.BoolValue
    #[prost(message, optional, tag = "8")]
    pub auto_approve: Option<bool>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CreatePackageResponse {
    #[prost(string, tag = "1")]
    pub id: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ApproveTransferByPathRequest {
    #[prost(string, tag = "1")]
    pub directory: String,
    #[prost(enumeration = "TransferType", tag = "2")]
    pub r#type: i32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ApproveTransferByPathResponse {
    #[prost(string, tag = "1")]
    pub id: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ApprovePartialReingestRequest {
    #[prost(string, tag = "1")]
    pub id: String,
}

#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct ApprovePartialReingestResponse {}

#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct ListProcessingConfigurationFieldsRequest {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ListProcessingConfigurationFieldsResponse {
    #[prost(message, repeated, tag = "1")]
    pub field: Vec<ProcessingConfigField>,
}

#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct ListPackagesRequest {
    #[prost(enumeration = "PackageType", tag = "1")]
    pub r#type: i32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ListPackagesResponse {
    #[prost(message, repeated, tag = "1")]
    pub package: Vec<Package>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ReadPackageRequest {
    #[prost(string, tag = "1")]
    pub id: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ReadPackageResponse {
    #[prost(message, optional, tag = "1")]
    pub package: Option<Package>,
}
