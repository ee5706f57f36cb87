use crate::codec::{self, FilterPath, FilterSet};
use crate::facets::{self, FacetCounts};
use crate::filter;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utils_common::compression::{self, CodecError};
use utils_common::Article;

/// 预计算页面包的格式版本
pub const BUNDLE_VERSION: [u8; 2] = [1, 0];

/// 一个筛选组合的完整结果 - 预计算和按需计算产出同一结构
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FacetPage {
    /// 规范路径
    pub path: FilterPath,
    pub title: String,
    pub description: String,
    pub filters: FilterSet,
    /// 命中文章总数
    pub total: usize,
    pub articles: Vec<Article>,
    pub counts: FacetCounts,
}

impl FacetPage {
    /// 对完整数据集运行筛选和计数
    ///
    /// 构建时和请求时都调用这里，两条路径的语义因此一致。
    pub fn evaluate(articles: &[Article], filters: &FilterSet) -> Self {
        let matched: Vec<Article> = filter::apply(articles, filters).into_iter().cloned().collect();
        Self {
            path: codec::encode(filters),
            title: filters.title(),
            description: filters.description(),
            filters: filters.clone(),
            total: matched.len(),
            articles: matched,
            counts: facets::count(articles, filters),
        }
    }
}

/// 预计算页面集合，以规范路径键 (`languages/Python`，空路径为 "") 索引
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct PrecomputedPages {
    pages: BTreeMap<String, FacetPage>,
}

impl PrecomputedPages {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, page: FacetPage) {
        self.pages.insert(page.path.key(), page);
    }

    pub fn get(&self, path: &FilterPath) -> Option<&FacetPage> {
        self.pages.get(&path.key())
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FacetPage> {
        self.pages.values()
    }

    /// 压缩为页面包
    pub fn to_bundle(&self) -> Result<Vec<u8>, CodecError> {
        compression::to_compressed(self, BUNDLE_VERSION)
    }

    /// 从页面包恢复
    pub fn from_bundle(data: &[u8]) -> Result<Self, CodecError> {
        compression::from_compressed(data, BUNDLE_VERSION[0])
    }
}
