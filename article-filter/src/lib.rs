use serde::Serialize;
use utils_common::Dimension;
use wasm_bindgen::prelude::*;
use web_sys::console;

// 导出模块
pub mod builder;
pub mod codec;
pub mod delivery;
pub mod error;
pub mod facets;
pub mod filter;
pub mod models;
pub mod snapshot;
pub mod static_patterns;

pub use codec::{decode, encode, to_route_path, FilterPath, FilterSet};
pub use delivery::{DeliveryMode, DeliverySelector, Resolution, Site};
pub use error::{BuildError, ErrorReport, FilterError, ResolveError, SnapshotError};
pub use facets::{count, FacetCount, FacetCounts};
pub use filter::{apply, matches};
pub use models::{FacetPage, PrecomputedPages};
pub use snapshot::{SnapshotCache, SnapshotProvider, SnapshotSource};
pub use static_patterns::StaticPatternCatalog;

#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

// 客户端会话内的全局快照
static SNAPSHOT: SnapshotCache = SnapshotCache::new();

/// 初始化函数 - 设置错误处理和日志
#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);
}

/// 版本信息
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// 按需查询的返回值
#[derive(Serialize)]
struct QueryResult<'a> {
    mode: DeliveryMode,
    /// 规范路由，非规范输入时可用来跳转
    route: String,
    page: &'a FacetPage,
}

/// 切换筛选后的返回值
#[derive(Serialize)]
struct ToggleResult {
    filters: FilterSet,
    route: String,
}

fn js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// 结构化错误 `{kind, retryable, message}`，调用方据此决定是否重试
fn js_report(report: &ErrorReport) -> JsValue {
    serde_wasm_bindgen::to_value(report).unwrap_or_else(|_| JsValue::from_str(&report.message))
}

fn evaluate_segments(segments: &[String]) -> Result<(FilterPath, FacetPage), ResolveError> {
    let path = FilterPath::from_segments(segments)?;
    let filters = codec::decode(path.tokens())?;
    let articles = SNAPSHOT.get()?;
    Ok((path, FacetPage::evaluate(&articles, &filters)))
}

/// 分面筛选 JS 接口 - 按需路径在浏览器中使用
#[wasm_bindgen]
pub struct FacetFilterJS;

#[wasm_bindgen]
impl FacetFilterJS {
    /// 加载 blogs.json 的内容；已加载时直接返回，失败后可以再次调用
    #[wasm_bindgen]
    pub fn init(snapshot_json: &[u8]) -> Result<usize, JsValue> {
        console_error_panic_hook::set_once();

        SNAPSHOT
            .get_or_load(&snapshot::JsonSnapshot::new(snapshot_json))
            .map(|articles| articles.len())
            .map_err(|e| {
                console::log_1(&JsValue::from_str(&format!("初始化快照失败: {}", e)));
                js_error(e)
            })
    }

    /// 快照是否已加载
    #[wasm_bindgen]
    pub fn is_loaded() -> bool {
        SNAPSHOT.is_loaded()
    }

    /// 按路径段（未解码）查询，例如 `["languages","Python","themes","AI"]`
    #[wasm_bindgen]
    pub fn query(segments_json: &str, section_root: &str) -> Result<JsValue, JsValue> {
        let segments: Vec<String> = serde_json::from_str(segments_json)
            .map_err(|e| js_report(&ErrorReport::invalid_request(format!("解析路径段失败: {}", e))))?;

        let (path, page) = evaluate_segments(&segments).map_err(|e| js_report(&ErrorReport::from(&e)))?;
        let result = QueryResult {
            mode: DeliverySelector::default().route(&path),
            route: page.path.to_route(section_root),
            page: &page,
        };

        serde_wasm_bindgen::to_value(&result)
            .map_err(|e| JsValue::from_str(&format!("序列化结果失败: {}", e)))
    }

    /// 切换某个取值，返回新的筛选条件和要跳转的路由
    #[wasm_bindgen]
    pub fn toggle(filters_json: &str, dimension: &str, value: &str, section_root: &str) -> Result<JsValue, JsValue> {
        let filters: FilterSet = serde_json::from_str(filters_json)
            .map_err(|e| JsValue::from_str(&format!("解析筛选条件失败: {}", e)))?;
        let dim: Dimension = dimension
            .parse()
            .map_err(|name: String| js_error(FilterError::UnknownDimension(name)))?;

        let next = filters.toggled(dim, value);
        let result = ToggleResult {
            route: to_route_path(&next, section_root),
            filters: next,
        };

        serde_wasm_bindgen::to_value(&result)
            .map_err(|e| JsValue::from_str(&format!("序列化结果失败: {}", e)))
    }

    /// 该路由是否已预计算
    #[wasm_bindgen]
    pub fn is_precomputed(route: &str, section_root: &str) -> Result<bool, JsValue> {
        let path = FilterPath::parse_route(route, section_root).map_err(js_error)?;
        Ok(DeliverySelector::default().route(&path) == DeliveryMode::Precomputed)
    }
}
