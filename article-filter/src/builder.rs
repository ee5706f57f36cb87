use crate::codec::{self, FilterPath};
use crate::error::{BuildError, FilterError};
use crate::models::{FacetPage, PrecomputedPages};
use crate::static_patterns::StaticPatternCatalog;
use std::fs;
use std::path::{Path, PathBuf};
use utils_common::Article;

/// 预计算页面构建器
///
/// 目录中的每个条目互不依赖：所有条目读取同一份只读文章列表，
/// 各自写入自己的结果，因此按条目分块并行构建。
pub struct PrecomputeBuilder {
    articles: Vec<Article>,
    workers: usize,
}

impl PrecomputeBuilder {
    pub fn new() -> Self {
        Self {
            articles: Vec::new(),
            workers: std::thread::available_parallelism().map_or(1, |n| n.get()),
        }
    }

    /// 设置并行线程数（至少为 1）
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// 添加文章
    pub fn add_article(&mut self, article: Article) {
        self.articles.push(article);
    }

    pub fn article_count(&self) -> usize {
        self.articles.len()
    }

    /// 为目录中的每个条目生成页面
    pub fn build(&self, catalog: &StaticPatternCatalog) -> Result<PrecomputedPages, BuildError> {
        if self.articles.is_empty() {
            log::warn!("⚠️ 文章数据为 0 件，所有预计算页面都将为空");
        }

        let patterns = catalog.patterns();
        let chunk_size = patterns.len().div_ceil(self.workers).max(1);
        log::info!(
            "开始构建预计算页面，模式数: {}，文章数: {}，线程数: {}",
            patterns.len(),
            self.articles.len(),
            patterns.len().div_ceil(chunk_size)
        );

        let articles = self.articles.as_slice();
        let chunks: Vec<Result<Vec<FacetPage>, FilterError>> = std::thread::scope(|scope| {
            let handles: Vec<_> = patterns
                .chunks(chunk_size)
                .map(|chunk| scope.spawn(move || render_chunk(articles, chunk)))
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join().unwrap_or_else(|panic| std::panic::resume_unwind(panic)))
                .collect()
        });

        let mut pages = PrecomputedPages::new();
        for chunk in chunks {
            for page in chunk? {
                pages.insert(page);
            }
        }

        log::info!("预计算页面构建完成: {} 页", pages.len());
        Ok(pages)
    }

    /// 构建并保存为压缩页面包，返回写入的字节数
    pub fn save_bundle(&self, catalog: &StaticPatternCatalog, path: &Path) -> Result<usize, BuildError> {
        let pages = self.build(catalog)?;
        write_bundle(&pages, path)
    }
}

impl Default for PrecomputeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn render_chunk(articles: &[Article], chunk: &[FilterPath]) -> Result<Vec<FacetPage>, FilterError> {
    chunk
        .iter()
        .map(|pattern| {
            let filters = codec::decode(pattern.tokens())?;
            Ok(FacetPage::evaluate(articles, &filters))
        })
        .collect()
}

/// 写入压缩页面包
pub fn write_bundle(pages: &PrecomputedPages, path: &Path) -> Result<usize, BuildError> {
    let data = pages.to_bundle()?;
    fs::write(path, &data)?;
    log::info!("页面包已写入: {}，大小: {} 字节", path.display(), data.len());
    Ok(data.len())
}

/// 页面文件位置：`<dir>/<编码后的路径段>/index.json`
pub fn page_file(dir: &Path, path: &FilterPath) -> PathBuf {
    let mut file = dir.to_path_buf();
    for token in path.tokens() {
        file.push(urlencoding::encode(token).as_ref());
    }
    file.push("index.json");
    file
}

/// 每个页面写成一个 JSON 文件，返回写入的文件数
pub fn write_pages(pages: &PrecomputedPages, dir: &Path) -> Result<usize, BuildError> {
    let mut written = 0;
    for page in pages.iter() {
        let file = page_file(dir, &page.path);
        if let Some(parent) = file.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&file, serde_json::to_vec(page)?)?;
        written += 1;
    }
    log::info!("已写入 {} 个预计算页面到 {}", written, dir.display());
    Ok(written)
}
