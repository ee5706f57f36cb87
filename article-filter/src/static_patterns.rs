use crate::codec::FilterPath;
use once_cell::sync::Lazy;
use std::collections::HashSet;
use utils_common::{Dimension, Taxonomy};

/// 与主题交叉预计算的热门语言
pub const POPULAR_LANGUAGES: [&str; 5] = ["JavaScript", "Python", "TypeScript", "Java", "PHP"];

/// 与语言交叉预计算的热门主题
pub const POPULAR_THEMES: [&str; 4] = ["DX", "AI", "業務効率化", "Web開発"];

static STANDARD: Lazy<StaticPatternCatalog> =
    Lazy::new(|| StaticPatternCatalog::new(&Taxonomy::standard()));

/// 静态模式目录 - 预计算交付的筛选组合
///
/// 包含：空路径、分类表中每个单独的 (维度, 值)、热门语言 × 热门主题。
/// 不会包含三个或以上维度的组合。
///
/// 成员判断是对 token 序列的精确比较，不做规范化：非规范顺序的路径会
/// 走按需计算，结果相同，只是没有预计算的速度。
#[derive(Debug, Clone)]
pub struct StaticPatternCatalog {
    patterns: Vec<FilterPath>,
    keys: HashSet<String>,
}

impl StaticPatternCatalog {
    pub fn new(taxonomy: &Taxonomy) -> Self {
        let mut patterns = vec![FilterPath::default()];

        for (dim, values) in taxonomy.iter() {
            for value in values {
                patterns.push(FilterPath::new(vec![dim.as_str().to_string(), value.clone()]));
            }
        }

        for language in POPULAR_LANGUAGES {
            for theme in POPULAR_THEMES {
                patterns.push(FilterPath::new(vec![
                    Dimension::Languages.as_str().to_string(),
                    language.to_string(),
                    Dimension::Themes.as_str().to_string(),
                    theme.to_string(),
                ]));
            }
        }

        let keys = patterns.iter().map(FilterPath::key).collect();
        log::debug!("静态模式数: {}", patterns.len());

        Self { patterns, keys }
    }

    /// 基于标准分类表的全局目录，首次使用时构建
    pub fn standard() -> &'static Self {
        &STANDARD
    }

    /// 该路径是否预计算（精确匹配）
    pub fn is_precomputed<S: AsRef<str>>(&self, path: &[S]) -> bool {
        let key = path.iter().map(|token| token.as_ref()).collect::<Vec<&str>>().join("/");
        self.keys.contains(&key)
    }

    /// 构建时的工作列表
    pub fn patterns(&self) -> &[FilterPath] {
        &self.patterns
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}
