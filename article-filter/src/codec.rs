//! 筛选路径编解码
//!
//! 路径是平铺的 token 序列：`维度/值/维度/值/...`。
//! [`encode`] 按规范维度顺序 (languages, hierarchies, themes, occupations)
//! 输出，维度内部保持取值首次出现的顺序。同一个 [`FilterSet`] 只对应一条
//! 规范路径，静态模式的精确匹配依赖这一点。

use crate::error::FilterError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utils_common::Dimension;

/// 无筛选条件时的页面标题
pub const ALL_ARTICLES_TITLE: &str = "すべての記事";

/// 页面说明的后缀
const DESCRIPTION_SUFFIX: &str = "に関するプログラミング学習記事の一覧ページです。";

type Selection = BTreeMap<Dimension, Vec<String>>;

/// 结构化的筛选条件：维度 -> 非空、无重复的取值列表（按首次出现排列）
///
/// 缺失的维度表示该维度不做约束。反序列化时丢弃空维度和重复取值。
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(from = "Selection", into = "Selection")]
pub struct FilterSet {
    selected: Selection,
}

impl From<Selection> for FilterSet {
    fn from(selection: Selection) -> Self {
        selection
            .into_iter()
            .flat_map(|(dim, values)| values.into_iter().map(move |value| (dim, value)))
            .collect()
    }
}

impl From<FilterSet> for Selection {
    fn from(filters: FilterSet) -> Self {
        filters.selected
    }
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// 选中的取值总数
    pub fn selected_count(&self) -> usize {
        self.selected.values().map(Vec::len).sum()
    }

    /// 在维度末尾追加一个取值，已存在时返回 false
    pub fn insert(&mut self, dim: Dimension, value: impl Into<String>) -> bool {
        let value = value.into();
        let values = self.selected.entry(dim).or_default();
        if values.contains(&value) {
            return false;
        }
        values.push(value);
        true
    }

    /// 移除一个取值，维度变空时一并移除
    pub fn remove(&mut self, dim: Dimension, value: &str) -> bool {
        let Some(values) = self.selected.get_mut(&dim) else {
            return false;
        };
        let before = values.len();
        values.retain(|v| v != value);
        let removed = values.len() != before;
        if values.is_empty() {
            self.selected.remove(&dim);
        }
        removed
    }

    pub fn contains(&self, dim: Dimension, value: &str) -> bool {
        self.selected.get(&dim).is_some_and(|values| values.iter().any(|v| v == value))
    }

    pub fn values(&self, dim: Dimension) -> Option<&[String]> {
        self.selected.get(&dim).map(Vec::as_slice)
    }

    /// 按规范顺序迭代已约束的维度
    pub fn iter(&self) -> impl Iterator<Item = (Dimension, &[String])> {
        self.selected.iter().map(|(dim, values)| (*dim, values.as_slice()))
    }

    /// 切换某个取值的选中状态，返回新的筛选条件；新取值追加在末尾
    pub fn toggled(&self, dim: Dimension, value: &str) -> Self {
        let mut next = self.clone();
        if !next.remove(dim, value) {
            next.insert(dim, value);
        }
        next
    }

    /// 页面标题，例如 `Python × AI`
    pub fn title(&self) -> String {
        if self.is_empty() {
            return ALL_ARTICLES_TITLE.to_string();
        }

        Dimension::DISPLAY_ORDER
            .iter()
            .filter_map(|dim| self.selected.get(dim))
            .map(|values| values.join(", "))
            .collect::<Vec<_>>()
            .join(" × ")
    }

    /// 页面说明，例如 `Python × AIに関するプログラミング学習記事の一覧ページです。`
    pub fn description(&self) -> String {
        format!("{}{}", self.title(), DESCRIPTION_SUFFIX)
    }
}

impl<S: Into<String>> FromIterator<(Dimension, S)> for FilterSet {
    fn from_iter<I: IntoIterator<Item = (Dimension, S)>>(iter: I) -> Self {
        let mut filters = FilterSet::new();
        for (dim, value) in iter {
            filters.insert(dim, value);
        }
        filters
    }
}

/// 平铺的筛选路径 token 序列（已解码）
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct FilterPath(Vec<String>);

impl FilterPath {
    pub fn new(tokens: Vec<String>) -> Self {
        Self(tokens)
    }

    /// 从 URL 路径段构建，逐段做百分号解码
    pub fn from_segments<S: AsRef<str>>(segments: &[S]) -> Result<Self, FilterError> {
        segments
            .iter()
            .map(|segment| {
                urlencoding::decode(segment.as_ref())
                    .map(|decoded| decoded.into_owned())
                    .map_err(|e| FilterError::Decode(e.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }

    /// 解析完整路由，例如 `/blogs/languages/Python/`
    pub fn parse_route(route: &str, section_root: &str) -> Result<Self, FilterError> {
        let root = section_root.trim_end_matches('/');
        let rest = route.strip_prefix(root).ok_or_else(|| FilterError::OutsideSection {
            root: root.to_string(),
            route: route.to_string(),
        })?;
        if !rest.is_empty() && !rest.starts_with('/') {
            return Err(FilterError::OutsideSection {
                root: root.to_string(),
                route: route.to_string(),
            });
        }

        let segments: Vec<&str> = rest.split('/').filter(|s| !s.is_empty()).collect();
        Self::from_segments(&segments)
    }

    pub fn tokens(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// 用 `/` 连接的精确键，静态模式目录以此比较
    pub fn key(&self) -> String {
        self.0.join("/")
    }

    /// 生成导航路由，每段做百分号编码；空路径得到栏目根 `/blogs/`
    pub fn to_route(&self, section_root: &str) -> String {
        let root = section_root.trim_end_matches('/');
        if self.0.is_empty() {
            return format!("{}/", root);
        }
        let encoded: Vec<String> = self
            .0
            .iter()
            .map(|token| urlencoding::encode(token).into_owned())
            .collect();
        format!("{}/{}", root, encoded.join("/"))
    }
}

impl From<Vec<String>> for FilterPath {
    fn from(tokens: Vec<String>) -> Self {
        Self(tokens)
    }
}

/// 按 (维度, 值) 两两分组解码；奇数长度返回 `InvalidPath`
pub fn decode<S: AsRef<str>>(path: &[S]) -> Result<FilterSet, FilterError> {
    if path.len() % 2 != 0 {
        return Err(FilterError::InvalidPath { len: path.len() });
    }

    let mut filters = FilterSet::new();
    for pair in path.chunks_exact(2) {
        let dim = pair[0]
            .as_ref()
            .parse::<Dimension>()
            .map_err(FilterError::UnknownDimension)?;
        filters.insert(dim, pair[1].as_ref());
    }
    Ok(filters)
}

/// 编码为规范路径
pub fn encode(filters: &FilterSet) -> FilterPath {
    let mut tokens = Vec::with_capacity(filters.selected_count() * 2);
    for (dim, values) in filters.iter() {
        for value in values {
            tokens.push(dim.as_str().to_string());
            tokens.push(value.clone());
        }
    }
    FilterPath(tokens)
}

/// 筛选条件变化后要跳转的路由
pub fn to_route_path(filters: &FilterSet, section_root: &str) -> String {
    encode(filters).to_route(section_root)
}
