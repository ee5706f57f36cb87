use crate::models::{Article, Dimension};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

const LANGUAGES: &[&str] = &[
    "HTML",
    "CSS",
    "JavaScript",
    "TypeScript",
    "Python",
    "Java",
    "PHP",
    "Ruby",
    "Go",
    "Rust",
];

const HIERARCHIES: &[&str] = &["新入社員", "新卒社員", "中途社員", "内定者"];

const THEMES: &[&str] = &[
    "DX",
    "AI",
    "ITリテラシー",
    "業務効率化",
    "クラウド",
    "セキュリティ",
    "データ分析",
    "Web開発",
];

const OCCUPATIONS: &[&str] = &[
    "デザイナー",
    "プログラマー",
    "SE",
    "マーケター",
    "PM",
    "データサイエンティスト",
];

/// 分类表 - 维度到已知取值的映射
///
/// 按维度的规范顺序迭代。序列化为 `{"languages": [...], ...}`。
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(transparent)]
pub struct Taxonomy {
    values: BTreeMap<Dimension, Vec<String>>,
}

impl Taxonomy {
    /// 站点固定的主数据
    pub fn standard() -> Self {
        let values = Dimension::ALL
            .into_iter()
            .map(|dim| {
                let known = match dim {
                    Dimension::Languages => LANGUAGES,
                    Dimension::Hierarchies => HIERARCHIES,
                    Dimension::Themes => THEMES,
                    Dimension::Occupations => OCCUPATIONS,
                };
                (dim, known.iter().map(|v| v.to_string()).collect())
            })
            .collect();
        Self { values }
    }

    /// 从文章中收集实际出现的取值（排序、去重），用于导出 facets.json
    pub fn observed<'a>(articles: impl IntoIterator<Item = &'a Article>) -> Self {
        let mut seen: BTreeMap<Dimension, BTreeSet<String>> =
            Dimension::ALL.into_iter().map(|dim| (dim, BTreeSet::new())).collect();

        for article in articles {
            for dim in Dimension::ALL {
                if let (Some(values), Some(set)) = (article.facet(dim), seen.get_mut(&dim)) {
                    set.extend(values.iter().cloned());
                }
            }
        }

        let values = seen
            .into_iter()
            .map(|(dim, set)| (dim, set.into_iter().collect()))
            .collect();
        Self { values }
    }

    /// 某个维度的取值
    pub fn values(&self, dim: Dimension) -> &[String] {
        self.values.get(&dim).map(Vec::as_slice).unwrap_or_default()
    }

    /// 按规范顺序迭代 (维度, 取值列表)
    pub fn iter(&self) -> impl Iterator<Item = (Dimension, &[String])> {
        self.values.iter().map(|(dim, values)| (*dim, values.as_slice()))
    }
}
