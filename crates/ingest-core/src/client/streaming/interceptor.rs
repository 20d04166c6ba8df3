//! ContextInterceptor - 呼び出し元の情報を全リクエストの metadata に追加する
//!
//! tonic の `Interceptor` は `InterceptedService` 経由で unary / server streaming /
//! client streaming / bidi の全形状に同じように適用されます。
//! 既存の metadata（`grpc-timeout` を含む）は消さずに `append` します。

use tonic::metadata::{AsciiMetadataKey, AsciiMetadataValue};
use tonic::service::Interceptor;
use tonic::{Request, Status};

use crate::client::CallerContext;
use crate::client::error::{ClientError, ClientResult};

#[derive(Debug, Clone)]
pub struct ContextInterceptor {
    pairs: Vec<(AsciiMetadataKey, AsciiMetadataValue)>,
}

impl ContextInterceptor {
    /// 任意の (key, value) 組から作る。不正な key / value は設定エラー。
    pub fn new<'a>(pairs: impl IntoIterator<Item = (&'a str, String)>) -> ClientResult<Self> {
        let pairs = pairs
            .into_iter()
            .map(|(key, value)| {
                let k = AsciiMetadataKey::from_bytes(key.as_bytes())
                    .map_err(|e| ClientError::Config(format!("invalid metadata key {key:?}: {e}")))?;
                let v = AsciiMetadataValue::try_from(value.as_str()).map_err(|e| {
                    ClientError::Config(format!("invalid metadata value for {key}: {e}"))
                })?;
                Ok((k, v))
            })
            .collect::<ClientResult<Vec<_>>>()?;
        Ok(Self { pairs })
    }

    /// `user_id` と `lang`
    pub fn for_caller(context: &CallerContext) -> ClientResult<Self> {
        Self::new([
            ("user_id", context.user_id.to_string()),
            ("lang", context.lang.clone()),
        ])
    }
}

impl Interceptor for ContextInterceptor {
    fn call(&mut self, mut request: Request<()>) -> Result<Request<()>, Status> {
        let metadata = request.metadata_mut();
        for (key, value) in &self.pairs {
            metadata.append(key.clone(), value.clone());
        }
        Ok(request)
    }
}
