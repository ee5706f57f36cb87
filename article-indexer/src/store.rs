use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use utils_common::StoredArticle;
use walkdir::WalkDir;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("无法读写 {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("无法解析 {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("遍历存储目录时出错: {0}")]
    Walk(#[from] walkdir::Error),
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> StoreError + '_ {
    move |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// 文章存储 - 每篇文章一个 `<文章ID>.json` 文件，以外部文章ID为键
#[derive(Debug, Clone)]
pub struct ArticleStore {
    dir: PathBuf,
}

impl ArticleStore {
    /// 打开存储目录，不存在时创建
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(io_error(&dir))?;
        Ok(Self { dir })
    }

    fn file_for(&self, id: u64) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }

    /// 新建或覆盖，返回是否为新建
    pub fn upsert(&self, article: &StoredArticle) -> Result<bool, StoreError> {
        let path = self.file_for(article.shopify_article_id);
        let created = !path.exists();

        let data = serde_json::to_vec_pretty(article).map_err(|source| StoreError::Json {
            path: path.clone(),
            source,
        })?;

        // 先写临时文件再改名，读取方不会看到写了一半的记录
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, data).map_err(io_error(&tmp))?;
        fs::rename(&tmp, &path).map_err(io_error(&path))?;

        Ok(created)
    }

    /// 删除，返回记录是否存在
    pub fn delete(&self, id: u64) -> Result<bool, StoreError> {
        let path = self.file_for(id);
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(io_error(&path)(e)),
        }
    }

    pub fn get(&self, id: u64) -> Result<Option<StoredArticle>, StoreError> {
        let path = self.file_for(id);
        if !path.exists() {
            return Ok(None);
        }
        read_article(&path).map(Some)
    }

    /// 读取全部文章，按发布时间降序（无发布时间的排在最后，同一时间按ID）
    pub fn load_all(&self) -> Result<Vec<StoredArticle>, StoreError> {
        let mut articles = Vec::new();

        for entry in WalkDir::new(&self.dir).max_depth(1) {
            let entry = entry?;
            let is_record = entry.file_type().is_file()
                && entry.path().extension().is_some_and(|ext| ext == "json");
            if is_record {
                articles.push(read_article(entry.path())?);
            }
        }

        articles.sort_by(newest_first);
        tracing::debug!("从 {} 读取了 {} 篇文章", self.dir.display(), articles.len());
        Ok(articles)
    }
}

fn read_article(path: &Path) -> Result<StoredArticle, StoreError> {
    let data = fs::read(path).map_err(io_error(path))?;
    serde_json::from_slice(&data).map_err(|source| StoreError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn newest_first(a: &StoredArticle, b: &StoredArticle) -> Ordering {
    match (a.published_at, b.published_at) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
    .then(a.shopify_article_id.cmp(&b.shopify_article_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn stored(id: u64, day: Option<u32>) -> StoredArticle {
        StoredArticle {
            shopify_blog_id: 1,
            shopify_article_id: id,
            title: format!("記事 {}", id),
            content: Some("<p>本文</p>".into()),
            excerpt: None,
            author: Some("Unknown".into()),
            published_at: day.and_then(|d| Utc.with_ymd_and_hms(2024, 1, d, 10, 0, 0).single()),
            url: format!("https://example.com/blogs/{}", id),
            image_url: None,
            languages: vec!["Python".into()],
            hierarchies: vec![],
            themes: vec![],
            occupations: vec![],
            tags: vec![],
        }
    }

    #[test]
    fn upsert_then_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArticleStore::open(dir.path().join("store")).unwrap();

        assert!(store.upsert(&stored(1001, Some(15))).unwrap());
        let mut updated = stored(1001, Some(15));
        updated.title = "更新後".into();
        assert!(!store.upsert(&updated).unwrap());

        assert_eq!(store.get(1001).unwrap().unwrap().title, "更新後");
        assert_eq!(store.load_all().unwrap().len(), 1);
    }

    #[test]
    fn delete_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArticleStore::open(dir.path()).unwrap();
        store.upsert(&stored(7, None)).unwrap();

        assert!(store.delete(7).unwrap());
        assert!(!store.delete(7).unwrap());
        assert!(store.get(7).unwrap().is_none());
    }

    #[test]
    fn load_all_orders_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArticleStore::open(dir.path()).unwrap();
        for (id, day) in [(1, Some(5)), (2, None), (3, Some(20)), (4, Some(20))] {
            store.upsert(&stored(id, day)).unwrap();
        }
        fs::write(dir.path().join("README.txt"), "not a record").unwrap();

        let ids: Vec<u64> = store
            .load_all()
            .unwrap()
            .iter()
            .map(|a| a.shopify_article_id)
            .collect();
        assert_eq!(ids, [3, 4, 1, 2]);
    }

    #[test]
    fn corrupt_record_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArticleStore::open(dir.path()).unwrap();
        fs::write(dir.path().join("9.json"), "{").unwrap();
        assert!(matches!(store.load_all(), Err(StoreError::Json { .. })));
    }
}
