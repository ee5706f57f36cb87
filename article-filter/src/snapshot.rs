//! 数据集快照
//!
//! 快照是不含正文的文章数组（压缩 JSON）。按需路径在首次使用时读取一次，
//! 之后只读复用。并发的首次读取会合并成一次：`OnceCell::get_or_try_init`
//! 让其他调用方阻塞等待同一个结果。读取失败时缓存保持为空，下次调用重试。

use crate::error::SnapshotError;
use once_cell::sync::OnceCell;
use std::path::PathBuf;
use std::sync::Arc;
use utils_common::Article;

/// 快照来源
pub trait SnapshotSource {
    fn fetch(&self) -> Result<Vec<Article>, SnapshotError>;
}

/// 解析快照 JSON
pub fn parse_snapshot(data: &[u8]) -> Result<Vec<Article>, SnapshotError> {
    serde_json::from_slice(data).map_err(|e| SnapshotError::Parse(e.to_string()))
}

/// 序列化为压缩（无空白）的快照 JSON
pub fn encode_snapshot(articles: &[Article]) -> Result<String, serde_json::Error> {
    serde_json::to_string(articles)
}

/// 内存中的快照字节
pub struct JsonSnapshot<'a> {
    data: &'a [u8],
}

impl<'a> JsonSnapshot<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }
}

impl SnapshotSource for JsonSnapshot<'_> {
    fn fetch(&self) -> Result<Vec<Article>, SnapshotError> {
        parse_snapshot(self.data)
    }
}

/// 磁盘上的快照文件 (blogs.json)
pub struct FileSnapshot {
    path: PathBuf,
}

impl FileSnapshot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SnapshotSource for FileSnapshot {
    fn fetch(&self) -> Result<Vec<Article>, SnapshotError> {
        let data = std::fs::read(&self.path)
            .map_err(|e| SnapshotError::Fetch(format!("{}: {}", self.path.display(), e)))?;
        parse_snapshot(&data)
    }
}

/// 只初始化一次的快照缓存，可以放在 `static` 中
pub struct SnapshotCache {
    cell: OnceCell<Arc<Vec<Article>>>,
}

impl SnapshotCache {
    pub const fn new() -> Self {
        Self {
            cell: OnceCell::new(),
        }
    }

    /// 已加载则直接返回，否则从 `source` 读取
    pub fn get_or_load<S: SnapshotSource + ?Sized>(
        &self,
        source: &S,
    ) -> Result<Arc<Vec<Article>>, SnapshotError> {
        self.cell
            .get_or_try_init(|| {
                let articles = source.fetch()?;
                log::info!("✓ 已加载 {} 篇文章的快照", articles.len());
                Ok::<_, SnapshotError>(Arc::new(articles))
            })
            .cloned()
    }

    pub fn get(&self) -> Result<Arc<Vec<Article>>, SnapshotError> {
        self.cell.get().cloned().ok_or(SnapshotError::NotLoaded)
    }

    pub fn is_loaded(&self) -> bool {
        self.cell.get().is_some()
    }
}

impl Default for SnapshotCache {
    fn default() -> Self {
        Self::new()
    }
}

/// 数据集快照提供者：来源 + 缓存
pub struct SnapshotProvider<S> {
    source: S,
    cache: SnapshotCache,
}

impl<S: SnapshotSource> SnapshotProvider<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            cache: SnapshotCache::new(),
        }
    }

    pub fn snapshot(&self) -> Result<Arc<Vec<Article>>, SnapshotError> {
        self.cache.get_or_load(&self.source).map_err(|e| {
            log::warn!("快照读取失败: {}", e);
            e
        })
    }

    pub fn is_loaded(&self) -> bool {
        self.cache.is_loaded()
    }
}
