use crate::codec::FilterSet;
use crate::filter;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use utils_common::{Article, Dimension};

/// 单个取值的计数
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct FacetCount {
    pub value: String,
    pub count: usize,
}

/// 各维度的 (取值, 计数) 列表，按计数降序
///
/// 四个维度总是存在，没有观察到取值的维度为空列表。
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(transparent)]
pub struct FacetCounts {
    counts: BTreeMap<Dimension, Vec<FacetCount>>,
}

impl Default for FacetCounts {
    fn default() -> Self {
        Self {
            counts: Dimension::ALL.into_iter().map(|dim| (dim, Vec::new())).collect(),
        }
    }
}

impl FacetCounts {
    pub fn get(&self, dim: Dimension) -> &[FacetCount] {
        self.counts.get(&dim).map(Vec::as_slice).unwrap_or_default()
    }

    /// 某个取值的计数，未出现为 0
    pub fn count_of(&self, dim: Dimension, value: &str) -> usize {
        self.get(dim)
            .iter()
            .find(|facet| facet.value == value)
            .map_or(0, |facet| facet.count)
    }

    /// 导航中显示的前 `limit` 项，以及被折叠的项数
    pub fn visible(&self, dim: Dimension, limit: usize) -> (&[FacetCount], usize) {
        let all = self.get(dim);
        let shown = all.len().min(limit);
        (&all[..shown], all.len() - shown)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Dimension, &[FacetCount])> {
        self.counts.iter().map(|(dim, counts)| (*dim, counts.as_slice()))
    }
}

/// 计算分面计数
///
/// 文章满足完整的筛选条件时才参与计数（包括正在统计的维度自身的约束），
/// 然后对它在每个维度上的每个取值加一。计数相同的取值保持首次出现的顺序。
pub fn count(articles: &[Article], filters: &FilterSet) -> FacetCounts {
    let mut tallies: BTreeMap<Dimension, Tally> =
        Dimension::ALL.into_iter().map(|dim| (dim, Tally::default())).collect();

    for article in articles {
        if !(filters.is_empty() || filter::matches(article, filters)) {
            continue;
        }
        for (dim, tally) in tallies.iter_mut() {
            for value in article.facet(*dim).unwrap_or_default() {
                tally.add(value);
            }
        }
    }

    FacetCounts {
        counts: tallies
            .into_iter()
            .map(|(dim, tally)| (dim, tally.into_sorted()))
            .collect(),
    }
}

/// 按首次出现顺序累计
#[derive(Default)]
struct Tally {
    order: Vec<FacetCount>,
    index: HashMap<String, usize>,
}

impl Tally {
    fn add(&mut self, value: &str) {
        match self.index.get(value) {
            Some(&pos) => self.order[pos].count += 1,
            None => {
                self.index.insert(value.to_string(), self.order.len());
                self.order.push(FacetCount {
                    value: value.to_string(),
                    count: 1,
                });
            }
        }
    }

    fn into_sorted(mut self) -> Vec<FacetCount> {
        // sort_by 是稳定排序
        self.order.sort_by(|a, b| b.count.cmp(&a.count));
        self.order
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::decode;

    fn article(id: u64, languages: &[&str], themes: &[&str]) -> Article {
        Article {
            id,
            title: format!("article {}", id),
            excerpt: None,
            url: format!("/blogs/{}", id),
            image_url: None,
            author: None,
            published_at: None,
            languages: Some(languages.iter().map(|v| v.to_string()).collect()),
            hierarchies: None,
            themes: Some(themes.iter().map(|v| v.to_string()).collect()),
            occupations: None,
            tags: vec![],
        }
    }

    fn pairs(counts: &[FacetCount]) -> Vec<(&str, usize)> {
        counts.iter().map(|c| (c.value.as_str(), c.count)).collect()
    }

    fn scenario() -> Vec<Article> {
        vec![
            article(1, &["Python"], &["AI"]),
            article(2, &["Python"], &["DX"]),
            article(3, &["Java"], &["AI"]),
        ]
    }

    #[test]
    fn counts_under_full_selection() {
        let filters = decode(&["languages", "Python"]).unwrap();
        let counts = count(&scenario(), &filters);
        assert_eq!(pairs(counts.get(Dimension::Languages)), [("Python", 2)]);
        assert_eq!(pairs(counts.get(Dimension::Themes)), [("AI", 1), ("DX", 1)]);
        assert!(counts.get(Dimension::Hierarchies).is_empty());
        assert_eq!(counts.count_of(Dimension::Languages, "Java"), 0);
    }

    #[test]
    fn empty_selection_counts_everything() {
        let counts = count(&scenario(), &FilterSet::new());
        assert_eq!(pairs(counts.get(Dimension::Languages)), [("Python", 2), ("Java", 1)]);
        assert_eq!(pairs(counts.get(Dimension::Themes)), [("AI", 2), ("DX", 1)]);
    }

    #[test]
    fn conservation_for_empty_selection() {
        let articles = vec![
            article(1, &["HTML", "CSS"], &["Web開発"]),
            article(2, &[], &["AI", "データ分析"]),
            article(3, &["TypeScript", "JavaScript"], &[]),
            article(4, &["Go"], &["DX"]),
        ];
        let counts = count(&articles, &FilterSet::new());
        for dim in [Dimension::Languages, Dimension::Themes] {
            let total: usize = counts.get(dim).iter().map(|c| c.count).sum();
            let carried: usize = articles
                .iter()
                .map(|a| a.facet(dim).map_or(0, <[String]>::len))
                .sum();
            assert_eq!(total, carried);
            let with_any = articles
                .iter()
                .filter(|a| a.facet(dim).is_some_and(|v| !v.is_empty()))
                .count();
            assert!(total >= with_any);
        }
    }

    #[test]
    fn ties_keep_first_observed_order() {
        let articles = vec![
            article(1, &["Rust"], &[]),
            article(2, &["Go"], &[]),
            article(3, &["Ruby", "Go"], &[]),
            article(4, &["PHP"], &[]),
        ];
        let counts = count(&articles, &FilterSet::new());
        assert_eq!(
            pairs(counts.get(Dimension::Languages)),
            [("Go", 2), ("Rust", 1), ("Ruby", 1), ("PHP", 1)]
        );
    }

    #[test]
    fn visible_truncates_with_overflow() {
        let languages: Vec<String> = (0..12).map(|i| format!("lang{}", i)).collect();
        let refs: Vec<&str> = languages.iter().map(String::as_str).collect();
        let counts = count(&[article(1, &refs, &[])], &FilterSet::new());
        let (shown, hidden) = counts.visible(Dimension::Languages, 10);
        assert_eq!(shown.len(), 10);
        assert_eq!(hidden, 2);
        assert_eq!(counts.visible(Dimension::Themes, 10), (&[][..], 0));
    }
}
