use crate::codec::FilterSet;
use utils_common::Article;

/// 文章是否满足筛选条件
///
/// 维度之间是 AND，维度内部是 OR（取值集合有交集即可）。
/// 文章缺少某个维度的取值列表时，该维度上的任何筛选都不通过。
pub fn matches(article: &Article, filters: &FilterSet) -> bool {
    filters.iter().all(|(dim, selected)| match article.facet(dim) {
        Some(values) => values.iter().any(|value| selected.contains(value)),
        None => false,
    })
}

/// 返回满足条件的文章，保持输入顺序
pub fn apply<'a>(articles: &'a [Article], filters: &FilterSet) -> Vec<&'a Article> {
    if filters.is_empty() {
        return articles.iter().collect();
    }
    articles.iter().filter(|article| matches(article, filters)).collect()
}
