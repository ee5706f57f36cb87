use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub site: SiteConfig,
    pub paths: PathsConfig,
    pub webhook: WebhookConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SiteConfig {
    /// 栏目根路由
    pub section_root: String,
    /// 文章链接使用的店铺域名
    pub store_domain: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PathsConfig {
    /// 每篇文章一个 JSON 文件的存储目录
    pub store_dir: PathBuf,
    /// 静态输出目录（快照、分面主数据、预计算页面）
    pub output_dir: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WebhookConfig {
    /// 保存签名密钥的环境变量名
    pub secret_env: String,
}

impl WebhookConfig {
    /// 读取签名密钥，未设置或为空时返回 None
    pub fn secret(&self) -> Option<String> {
        std::env::var(&self.secret_env).ok().filter(|s| !s.is_empty())
    }
}

impl PathsConfig {
    /// 快照和主数据所在目录 (`<output>/data`)
    pub fn data_dir(&self) -> PathBuf {
        self.output_dir.join("data")
    }

    /// 预计算页面目录 (`<output>/<栏目>`)
    pub fn pages_dir(&self, section_root: &str) -> PathBuf {
        self.output_dir.join(section_root.trim_matches('/'))
    }
}

/// 内置默认配置
const DEFAULT_CONFIG: &str = r#"
[site]
section_root = "/blogs"
store_domain = "example.myshopify.com"

[paths]
store_dir = "data/store"
output_dir = "public"

[webhook]
secret_env = "SHOPIFY_WEBHOOK_SECRET"
"#;

/// 加载配置：指定了路径就读取该文件，否则使用内置默认配置
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    if let Some(path) = path {
        tracing::info!("Loading config from: {}", path.display());
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        return Ok(config);
    }

    tracing::info!("Using default embedded configuration");
    let config: Config = toml::from_str(DEFAULT_CONFIG)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_loads() {
        let config = load_config(None).unwrap();
        assert_eq!(config.site.section_root, "/blogs");
        assert_eq!(config.paths.store_dir, PathBuf::from("data/store"));
        assert_eq!(config.paths.data_dir(), PathBuf::from("public/data"));
        assert_eq!(config.paths.pages_dir(&config.site.section_root), PathBuf::from("public/blogs"));
        assert_eq!(config.webhook.secret_env, "SHOPIFY_WEBHOOK_SECRET");
    }

    #[test]
    fn test_config_file_overrides_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("indexer.toml");
        std::fs::write(
            &path,
            r#"
[site]
section_root = "/articles/"
store_domain = "shop.example.jp"

[paths]
store_dir = "/var/lib/articles"
output_dir = "dist"

[webhook]
secret_env = "ARTICLE_INDEXER_TEST_UNSET_SECRET"
"#,
        )
        .unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.site.store_domain, "shop.example.jp");
        assert_eq!(config.paths.pages_dir(&config.site.section_root), PathBuf::from("dist/articles"));
        assert_eq!(config.webhook.secret(), None);
    }
}
