//! 静态导出
//!
//! 存储 -> 快照 (data/blogs.json) + 分面主数据 (data/facets.json)
//! + 预计算页面 (<栏目>/<路径>/index.json 和 data/pages.bin)。

use crate::config::Config;
use crate::html::excerpt_text;
use crate::store::ArticleStore;
use anyhow::Context;
use article_filter::builder::{self, PrecomputeBuilder};
use article_filter::snapshot::encode_snapshot;
use article_filter::StaticPatternCatalog;
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use utils_common::{Article, Taxonomy};

pub const SNAPSHOT_FILE: &str = "blogs.json";
pub const FACETS_FILE: &str = "facets.json";
pub const BUNDLE_FILE: &str = "pages.bin";

/// 导出结果
#[derive(Debug, Serialize)]
pub struct BuildReport {
    pub articles: usize,
    pub pages: usize,
    pub bundle_bytes: usize,
    pub snapshot_path: PathBuf,
    pub facets_path: PathBuf,
    pub bundle_path: PathBuf,
    pub pages_dir: PathBuf,
}

/// 存储记录 -> 快照文章，摘要转为纯文本
pub fn snapshot_articles(store: &ArticleStore) -> anyhow::Result<Vec<Article>> {
    let articles = store
        .load_all()
        .context("读取文章存储失败")?
        .iter()
        .map(|stored| {
            let mut article = stored.to_snapshot();
            article.excerpt = excerpt_text(stored.excerpt.as_deref());
            article
        })
        .collect();
    Ok(articles)
}

/// 执行完整导出
pub fn build_site(config: &Config, workers: Option<usize>) -> anyhow::Result<BuildReport> {
    let store = ArticleStore::open(&config.paths.store_dir)?;
    let articles = snapshot_articles(&store)?;
    tracing::info!("📚 从存储读取了 {} 篇文章", articles.len());

    let data_dir = config.paths.data_dir();
    fs::create_dir_all(&data_dir).with_context(|| format!("无法创建 {}", data_dir.display()))?;

    let snapshot_path = data_dir.join(SNAPSHOT_FILE);
    fs::write(&snapshot_path, encode_snapshot(&articles)?)
        .with_context(|| format!("无法写入 {}", snapshot_path.display()))?;
    tracing::info!("✅ 快照已写入: {}", snapshot_path.display());

    let taxonomy = Taxonomy::observed(&articles);
    for (dim, values) in taxonomy.iter() {
        tracing::info!("  {}: {} 个取值", dim, values.len());
    }
    let facets_path = data_dir.join(FACETS_FILE);
    fs::write(&facets_path, serde_json::to_string_pretty(&taxonomy)?)
        .with_context(|| format!("无法写入 {}", facets_path.display()))?;

    let mut precompute = PrecomputeBuilder::new();
    if let Some(workers) = workers {
        precompute = precompute.with_workers(workers);
    }
    let article_count = articles.len();
    for article in articles {
        precompute.add_article(article);
    }
    let pages = precompute.build(StaticPatternCatalog::standard())?;

    let pages_dir = config.paths.pages_dir(&config.site.section_root);
    let written = builder::write_pages(&pages, &pages_dir)?;
    let bundle_path = data_dir.join(BUNDLE_FILE);
    let bundle_bytes = builder::write_bundle(&pages, &bundle_path)?;

    Ok(BuildReport {
        articles: article_count,
        pages: written,
        bundle_bytes,
        snapshot_path,
        facets_path,
        bundle_path,
        pages_dir,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PathsConfig, SiteConfig, WebhookConfig};
    use article_filter::snapshot::parse_snapshot;
    use article_filter::{FilterPath, PrecomputedPages};
    use utils_common::StoredArticle;

    fn config(root: &std::path::Path) -> Config {
        Config {
            site: SiteConfig {
                section_root: "/blogs".into(),
                store_domain: "shop.example.jp".into(),
            },
            paths: PathsConfig {
                store_dir: root.join("store"),
                output_dir: root.join("public"),
            },
            webhook: WebhookConfig {
                secret_env: "ARTICLE_INDEXER_TEST_UNSET_SECRET".into(),
            },
        }
    }

    fn stored(id: u64, languages: &[&str], themes: &[&str]) -> StoredArticle {
        StoredArticle {
            shopify_blog_id: 1,
            shopify_article_id: id,
            title: format!("記事 {}", id),
            content: Some("<p>本文はスナップショットに入らない</p>".into()),
            excerpt: Some("<p>概要 <b>テキスト</b></p>".into()),
            author: Some("Unknown".into()),
            published_at: None,
            url: format!("https://shop.example.jp/blogs/{}", id),
            image_url: None,
            languages: languages.iter().map(|v| v.to_string()).collect(),
            hierarchies: vec![],
            themes: themes.iter().map(|v| v.to_string()).collect(),
            occupations: vec![],
            tags: vec![],
        }
    }

    #[test]
    fn build_site_writes_all_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        let store = ArticleStore::open(&config.paths.store_dir).unwrap();
        store.upsert(&stored(1, &["Python"], &["AI"])).unwrap();
        store.upsert(&stored(2, &["Python", "Go"], &["DX"])).unwrap();

        let report = build_site(&config, Some(2)).unwrap();
        assert_eq!(report.articles, 2);
        assert_eq!(report.pages, StaticPatternCatalog::standard().len());

        let snapshot = parse_snapshot(&fs::read(&report.snapshot_path).unwrap()).unwrap();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].excerpt.as_deref(), Some("概要 テキスト"));
        let raw = fs::read_to_string(&report.snapshot_path).unwrap();
        assert!(!raw.contains("本文"));
        assert!(!raw.contains('\n'));

        let facets: Taxonomy = serde_json::from_slice(&fs::read(&report.facets_path).unwrap()).unwrap();
        assert_eq!(facets.values(utils_common::Dimension::Languages), ["Go", "Python"]);

        let pages = PrecomputedPages::from_bundle(&fs::read(&report.bundle_path).unwrap()).unwrap();
        let python = FilterPath::new(vec!["languages".into(), "Python".into()]);
        assert_eq!(pages.get(&python).unwrap().total, 2);
        assert!(builder::page_file(&report.pages_dir, &python).exists());
        assert!(report.pages_dir.join("index.json").exists());
    }

    #[test]
    fn empty_store_still_builds() {
        let dir = tempfile::tempdir().unwrap();
        let report = build_site(&config(dir.path()), None).unwrap();
        assert_eq!(report.articles, 0);
        assert_eq!(fs::read_to_string(&report.snapshot_path).unwrap(), "[]");
    }
}
