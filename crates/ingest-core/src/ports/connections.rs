//! ConnectionGuard port - バッチ境界での接続リサイクル
//!
//! handler 内で使う DB 接続はバッチをまたいで生き残る保証がありません。
//! Task Runner はバッチの前後で `close_stale()` を呼びます。

/// ConnectionGuard は古くなった接続を閉じる
pub trait ConnectionGuard: Send + Sync {
    fn close_stale(&self);
}

/// 接続を持たないプロセス向け
#[derive(Debug, Clone, Copy, Default)]
pub struct NoConnections;

impl ConnectionGuard for NoConnections {
    fn close_stale(&self) {}
}
