use crate::codec::{self, FilterPath};
use crate::error::ResolveError;
use crate::models::{FacetPage, PrecomputedPages};
use crate::snapshot::{SnapshotProvider, SnapshotSource};
use crate::static_patterns::StaticPatternCatalog;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// 交付方式
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMode {
    /// 构建时生成的固定页面
    Precomputed,
    /// 针对缓存快照即时计算
    OnDemand,
}

/// 根据静态模式目录选择交付方式
#[derive(Debug, Clone, Copy)]
pub struct DeliverySelector<'a> {
    catalog: &'a StaticPatternCatalog,
}

impl<'a> DeliverySelector<'a> {
    pub fn new(catalog: &'a StaticPatternCatalog) -> Self {
        Self { catalog }
    }

    pub fn route(&self, path: &FilterPath) -> DeliveryMode {
        if self.catalog.is_precomputed(path.tokens()) {
            DeliveryMode::Precomputed
        } else {
            DeliveryMode::OnDemand
        }
    }
}

impl Default for DeliverySelector<'static> {
    fn default() -> Self {
        Self::new(StaticPatternCatalog::standard())
    }
}

/// 一次请求的结果
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution<'a> {
    pub mode: DeliveryMode,
    pub page: Cow<'a, FacetPage>,
}

/// 栏目：预计算页面 + 按需快照
pub struct Site<'a, S> {
    section_root: String,
    selector: DeliverySelector<'a>,
    pages: PrecomputedPages,
    snapshot: SnapshotProvider<S>,
}

impl<'a, S: SnapshotSource> Site<'a, S> {
    pub fn new(
        section_root: impl Into<String>,
        selector: DeliverySelector<'a>,
        pages: PrecomputedPages,
        snapshot: SnapshotProvider<S>,
    ) -> Self {
        Self {
            section_root: section_root.into(),
            selector,
            pages,
            snapshot,
        }
    }

    pub fn section_root(&self) -> &str {
        &self.section_root
    }

    /// 解析路由并交付页面，例如 `/blogs/languages/Python/`
    pub fn resolve_route(&self, route: &str) -> Result<Resolution<'_>, ResolveError> {
        let path = FilterPath::parse_route(route, &self.section_root)?;
        self.resolve(&path)
    }

    /// 已解码的路径 -> 页面
    pub fn resolve(&self, path: &FilterPath) -> Result<Resolution<'_>, ResolveError> {
        let filters = codec::decode(path.tokens())?;

        if self.selector.route(path) == DeliveryMode::Precomputed {
            if let Some(page) = self.pages.get(path) {
                return Ok(Resolution {
                    mode: DeliveryMode::Precomputed,
                    page: Cow::Borrowed(page),
                });
            }
            log::warn!("预计算页面缺失，改为按需计算: /{}", path.key());
        }

        let articles = self.snapshot.snapshot()?;
        let page = FacetPage::evaluate(&articles, &filters);
        log::debug!("按需计算 /{}: {} 件", path.key(), page.total);

        Ok(Resolution {
            mode: DeliveryMode::OnDemand,
            page: Cow::Owned(page),
        })
    }
}
