//! CMS webhook 接收
//!
//! 每个事件先用 HMAC-SHA256 校验请求体签名，校验失败时不会修改存储。
//! 日志和响应中都不出现计算出的签名值。

use crate::store::{ArticleStore, StoreError};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::str::FromStr;
use thiserror::Error;
use utils_common::{Dimension, StoredArticle};

type HmacSha256 = Hmac<Sha256>;

/// 携带签名的请求头
pub const HMAC_HEADER: &str = "x-shopify-hmac-sha256";

/// webhook 事件类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topic {
    Create,
    Update,
    Delete,
}

impl FromStr for Topic {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create" => Ok(Topic::Create),
            "update" => Ok(Topic::Update),
            "delete" => Ok(Topic::Delete),
            other => Err(format!("未知的事件类型: {}", other)),
        }
    }
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Invalid signature")]
    Unauthorized,
    #[error("Webhook secret is not configured")]
    MissingSecret,
    #[error("Invalid payload: {0}")]
    Payload(#[from] serde_json::Error),
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl IngestError {
    /// 对应的 HTTP 状态码
    pub fn status(&self) -> u16 {
        match self {
            IngestError::Unauthorized | IngestError::MissingSecret => 401,
            IngestError::Payload(_) => 400,
            IngestError::Store(_) => 500,
        }
    }
}

/// 处理结果，序列化后作为响应体
#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum Outcome {
    Saved { success: bool, title: String, created: bool },
    Deleted { success: bool, id: u64, existed: bool },
}

#[derive(Debug, Deserialize)]
struct WebhookImage {
    src: Option<String>,
}

/// create / update 事件的文章负载
#[derive(Debug, Deserialize)]
pub struct WebhookArticle {
    pub id: u64,
    pub blog_id: u64,
    pub title: String,
    #[serde(default)]
    pub body_html: Option<String>,
    #[serde(default)]
    pub summary_html: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    pub handle: String,
    #[serde(default)]
    pub tags: Option<String>,
    #[serde(default)]
    image: Option<WebhookImage>,
}

/// delete 事件只带ID
#[derive(Debug, Deserialize)]
struct DeletedArticle {
    id: u64,
}

/// 取出 `前缀:值` 形式的标签值
pub fn extract_tags_by_prefix(tags: &[String], prefix: &str) -> Vec<String> {
    let marker = format!("{}:", prefix);
    tags.iter()
        .filter_map(|tag| tag.strip_prefix(&marker))
        .map(|value| value.trim().to_string())
        .collect()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

impl WebhookArticle {
    /// 转换为存储记录
    pub fn into_stored(self, store_domain: &str) -> StoredArticle {
        let tags: Vec<String> = match self.tags.as_deref() {
            Some(raw) if !raw.is_empty() => raw.split(", ").map(str::to_string).collect(),
            _ => Vec::new(),
        };
        let facet = |dim: Dimension| extract_tags_by_prefix(&tags, dim.tag_prefix());

        StoredArticle {
            shopify_blog_id: self.blog_id,
            shopify_article_id: self.id,
            url: format!("https://{}/blogs/{}", store_domain, self.handle),
            content: non_empty(self.body_html),
            excerpt: non_empty(self.summary_html),
            author: non_empty(self.author).or_else(|| Some("Unknown".to_string())),
            published_at: self.published_at,
            image_url: self.image.and_then(|image| image.src),
            languages: facet(Dimension::Languages),
            hierarchies: facet(Dimension::Hierarchies),
            themes: facet(Dimension::Themes),
            occupations: facet(Dimension::Occupations),
            title: self.title,
            tags,
        }
    }
}

/// 校验签名：header 为 base64 编码的 HMAC-SHA256(body)，常量时间比较
pub fn verify_signature(body: &[u8], signature: &str, secret: &str) -> bool {
    let Ok(expected) = STANDARD.decode(signature.trim()) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

/// webhook 处理器
pub struct Ingestor<'a> {
    store: &'a ArticleStore,
    secret: Option<String>,
    store_domain: String,
}

impl<'a> Ingestor<'a> {
    pub fn new(store: &'a ArticleStore, secret: Option<String>, store_domain: impl Into<String>) -> Self {
        Self {
            store,
            secret,
            store_domain: store_domain.into(),
        }
    }

    /// 处理一个事件；`signature` 是请求头 [`HMAC_HEADER`] 的值
    pub fn handle(&self, topic: Topic, body: &[u8], signature: Option<&str>) -> Result<Outcome, IngestError> {
        let Some(secret) = self.secret.as_deref() else {
            tracing::error!("❌ webhook 签名密钥未配置");
            return Err(IngestError::MissingSecret);
        };
        let Some(signature) = signature else {
            tracing::error!("❌ 缺少 {} 请求头", HMAC_HEADER);
            return Err(IngestError::Unauthorized);
        };
        if !verify_signature(body, signature, secret) {
            tracing::error!("❌ webhook 签名不一致");
            return Err(IngestError::Unauthorized);
        }

        match topic {
            Topic::Create | Topic::Update => {
                let payload: WebhookArticle = serde_json::from_slice(body)?;
                let article = payload.into_stored(&self.store_domain);
                let created = self.store.upsert(&article)?;
                tracing::info!("✅ 已保存文章 {}: {}", article.shopify_article_id, article.title);
                Ok(Outcome::Saved {
                    success: true,
                    title: article.title,
                    created,
                })
            }
            Topic::Delete => {
                let payload: DeletedArticle = serde_json::from_slice(body)?;
                let existed = self.store.delete(payload.id)?;
                tracing::info!("🗑️ 已删除文章 {} (存在: {})", payload.id, existed);
                Ok(Outcome::Deleted {
                    success: true,
                    id: payload.id,
                    existed,
                })
            }
        }
    }
}
