//! JobHandler trait - バッチを処理する handler の契約
//!
//! # 契約
//! - `call()` は JobBatch 全体を受け取り、Job ごとに exit code を設定する
//! - `Err` を返すとバッチ全体が失敗扱いになる（Task Runner が後処理する）
//! - `concurrent_instances()` は任意。宣言値は検証されずそのまま渡ってくるので、
//!   `concurrency_of()` で正規化してから使う

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::{HandlerError, JobBatch};

/// 宣言がない / 不正なときの並行数
pub const DEFAULT_CONCURRENCY: usize = 1;

/// JobHandler は 1 つの task を実装する
///
/// ```ignore
/// struct Echo;
///
/// #[async_trait]
/// impl JobHandler for Echo {
///     async fn call(&self, jobs: &mut JobBatch) -> Result<(), HandlerError> {
///         for job in jobs.iter_mut() {
///             job.write_output(&job.arguments.join(" "));
///             job.set_exit_code(0);
///         }
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait JobHandler: Send + Sync {
    async fn call(&self, jobs: &mut JobBatch) -> Result<(), HandlerError>;

    /// 1 プロセス内で同時に走らせてよいバッチ数の宣言
    fn concurrent_instances(&self) -> Option<Value> {
        None
    }
}

/// handler が宣言した並行数を返す。
///
/// 宣言なし、数値として解釈できない、0 以下のいずれも `DEFAULT_CONCURRENCY`。
/// 数字だけの文字列（`"4"`）は数値として扱い、小数は切り捨てる。
pub fn concurrency_of(handler: &dyn JobHandler) -> usize {
    let declared = match handler.concurrent_instances() {
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    match declared {
        Some(n) if n > 0 => usize::try_from(n).unwrap_or(DEFAULT_CONCURRENCY),
        _ => DEFAULT_CONCURRENCY,
    }
}


#[cfg(test)]
mod tests {
    use super::testing::Declares;
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case::undeclared(None, 1)]
    #[case::declared(Some(json!(4)), 4)]
    #[case::numeric_string(Some(json!("3")), 3)]
    #[case::non_numeric(Some(json!("x")), 1)]
    #[case::negative(Some(json!(-2)), 1)]
    #[case::zero(Some(json!(0)), 1)]
    #[case::float_truncates(Some(json!(2.5)), 2)]
    #[case::wrong_type(Some(json!([4])), 1)]
    fn concurrency_is_clamped_to_a_positive_integer(
        #[case] declared: Option<Value>,
        #[case] expected: usize,
    ) {
        assert_eq!(concurrency_of(&Declares(declared)), expected);
    }
}
