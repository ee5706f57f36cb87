use serde::Serialize;
use thiserror::Error;
use utils_common::CodecError;

/// 筛选路径错误 - 全部属于客户端错误
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FilterError {
    #[error("无效的筛选路径: 长度 {len} 不是偶数")]
    InvalidPath { len: usize },
    #[error("未知的筛选维度: {0}")]
    UnknownDimension(String),
    #[error("路径段解码失败: {0}")]
    Decode(String),
    #[error("路径 {route} 不在栏目 {root} 之下")]
    OutsideSection { root: String, route: String },
}

/// 快照加载错误，与“零结果”不同
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SnapshotError {
    #[error("快照读取失败: {0}")]
    Fetch(String),
    #[error("快照解析失败: {0}")]
    Parse(String),
    #[error("快照尚未加载")]
    NotLoaded,
}

impl SnapshotError {
    /// 是否可以重试（缓存保持为空，下次调用会重新读取）
    pub fn is_retryable(&self) -> bool {
        matches!(self, SnapshotError::Fetch(_) | SnapshotError::NotLoaded)
    }
}

/// 处理一次筛选请求时的错误
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error(transparent)]
    Path(#[from] FilterError),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

impl ResolveError {
    pub fn is_client_error(&self) -> bool {
        matches!(self, ResolveError::Path(_))
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            ResolveError::Path(_) => false,
            ResolveError::Snapshot(e) => e.is_retryable(),
        }
    }
}

/// 预计算构建错误
#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Path(#[from] FilterError),
    #[error("压缩页面包失败: {0}")]
    Codec(#[from] CodecError),
    #[error("写入预计算页面失败: {0}")]
    Io(#[from] std::io::Error),
    #[error("序列化预计算页面失败: {0}")]
    Json(#[from] serde_json::Error),
}

/// 交给 JS 调用方的结构化错误
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ErrorReport {
    pub kind: &'static str,
    pub retryable: bool,
    pub message: String,
}

impl ErrorReport {
    /// 请求参数本身无法解析
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            kind: "invalid_request",
            retryable: false,
            message: message.into(),
        }
    }
}

impl From<&ResolveError> for ErrorReport {
    fn from(err: &ResolveError) -> Self {
        let kind = match err {
            ResolveError::Path(_) => "invalid_path",
            ResolveError::Snapshot(SnapshotError::Fetch(_)) => "snapshot_fetch",
            ResolveError::Snapshot(SnapshotError::Parse(_)) => "snapshot_parse",
            ResolveError::Snapshot(SnapshotError::NotLoaded) => "snapshot_not_loaded",
        };
        Self {
            kind,
            retryable: err.is_retryable(),
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_errors_are_client_errors() {
        let err = ResolveError::from(FilterError::InvalidPath { len: 3 });
        assert!(err.is_client_error());
        assert!(!err.is_retryable());
    }

    #[test]
    fn fetch_failure_is_retryable_server_side() {
        let err = ResolveError::from(SnapshotError::Fetch("connection reset".into()));
        assert!(!err.is_client_error());
        assert!(err.is_retryable());
        assert!(!SnapshotError::Parse("eof".into()).is_retryable());
    }

    #[test]
    fn report_separates_client_and_retryable_errors() {
        let path = ErrorReport::from(&ResolveError::from(FilterError::UnknownDimension("authors".into())));
        assert_eq!(path.kind, "invalid_path");
        assert!(!path.retryable);
        assert!(path.message.contains("authors"));

        let not_loaded = ErrorReport::from(&ResolveError::from(SnapshotError::NotLoaded));
        assert_eq!(not_loaded.kind, "snapshot_not_loaded");
        assert!(not_loaded.retryable);

        let parse = ErrorReport::from(&ResolveError::from(SnapshotError::Parse("eof".into())));
        assert_eq!(parse.kind, "snapshot_parse");
        assert!(!parse.retryable);

        assert_eq!(
            serde_json::to_value(&not_loaded).unwrap(),
            serde_json::json!({"kind": "snapshot_not_loaded", "retryable": true, "message": "快照尚未加载"})
        );
    }
}
