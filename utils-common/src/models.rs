use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 筛选维度 - 四个固定的分类轴
///
/// 变体的声明顺序就是规范顺序 (languages, hierarchies, themes, occupations)，
/// `Ord` 依赖这个顺序。
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    /// 编程语言
    Languages,
    /// 对象层级（新入社員 等）
    Hierarchies,
    /// 主题
    Themes,
    /// 职种
    Occupations,
}

impl Dimension {
    /// 规范顺序下的全部维度
    pub const ALL: [Dimension; 4] = [
        Dimension::Languages,
        Dimension::Hierarchies,
        Dimension::Themes,
        Dimension::Occupations,
    ];

    /// 标题展示顺序：语言、主题、层级、职种
    pub const DISPLAY_ORDER: [Dimension; 4] = [
        Dimension::Languages,
        Dimension::Themes,
        Dimension::Hierarchies,
        Dimension::Occupations,
    ];

    /// 路径中使用的维度名
    pub const fn as_str(&self) -> &'static str {
        match self {
            Dimension::Languages => "languages",
            Dimension::Hierarchies => "hierarchies",
            Dimension::Themes => "themes",
            Dimension::Occupations => "occupations",
        }
    }

    /// CMS 标签前缀，例如 `言語:Python`
    pub const fn tag_prefix(&self) -> &'static str {
        match self {
            Dimension::Languages => "言語",
            Dimension::Hierarchies => "階層",
            Dimension::Themes => "テーマ",
            Dimension::Occupations => "職種",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dimension {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Dimension::ALL
            .into_iter()
            .find(|dim| dim.as_str() == s)
            .ok_or_else(|| s.to_string())
    }
}

/// 快照中的文章 - 客户端和预计算共用的轻量记录（不含正文）
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Article {
    /// 外部文章ID
    pub id: u64,
    pub title: String,
    /// 纯文本摘要
    #[serde(default)]
    pub excerpt: Option<String>,
    pub url: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    /// 缺失（None）与空列表不同：缺失的维度无法通过该维度的任何筛选
    #[serde(default)]
    pub languages: Option<Vec<String>>,
    #[serde(default)]
    pub hierarchies: Option<Vec<String>>,
    #[serde(default)]
    pub themes: Option<Vec<String>>,
    #[serde(default)]
    pub occupations: Option<Vec<String>>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Article {
    /// 按维度取值
    pub fn facet(&self, dim: Dimension) -> Option<&[String]> {
        let values = match dim {
            Dimension::Languages => &self.languages,
            Dimension::Hierarchies => &self.hierarchies,
            Dimension::Themes => &self.themes,
            Dimension::Occupations => &self.occupations,
        };
        values.as_deref()
    }

    /// 卡片上展示的标签：前3个语言 + 前2个主题
    pub fn display_tags(&self) -> Vec<&str> {
        let languages = self.facet(Dimension::Languages).unwrap_or_default();
        let themes = self.facet(Dimension::Themes).unwrap_or_default();
        languages
            .iter()
            .take(3)
            .chain(themes.iter().take(2))
            .map(String::as_str)
            .collect()
    }
}

/// 存储层中的完整文章记录（包含正文），以外部文章ID为键
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct StoredArticle {
    pub shopify_blog_id: u64,
    pub shopify_article_id: u64,
    pub title: String,
    /// 正文 HTML，快照中不包含
    #[serde(default)]
    pub content: Option<String>,
    /// 摘要 HTML
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    pub url: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub hierarchies: Vec<String>,
    #[serde(default)]
    pub themes: Vec<String>,
    #[serde(default)]
    pub occupations: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl StoredArticle {
    /// 转换为快照记录，去掉正文
    pub fn to_snapshot(&self) -> Article {
        Article {
            id: self.shopify_article_id,
            title: self.title.clone(),
            excerpt: self.excerpt.clone(),
            url: self.url.clone(),
            image_url: self.image_url.clone(),
            author: self.author.clone(),
            published_at: self.published_at,
            languages: Some(self.languages.clone()),
            hierarchies: Some(self.hierarchies.clone()),
            themes: Some(self.themes.clone()),
            occupations: Some(self.occupations.clone()),
            tags: self.tags.clone(),
        }
    }
}
