//! 结果汇总
//!
//! 成功结果按提交顺序（而非完成顺序）排列，默认选中第一个。

use serde::Serialize;

use crate::models::{GeneratedPost, GenerationOutcome};
use crate::orchestrator::progress::item_error_message;

/// 一个成功结果及其原始条目编号（0 起始）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultEntry {
    pub index: usize,
    pub post: GeneratedPost,
}

/// 结果集
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultSet {
    entries: Vec<ResultEntry>,
    selected: usize,
    warnings: Vec<String>,
}

impl ResultSet {
    pub fn entries(&self) -> &[ResultEntry] {
        &self.entries
    }

    pub fn posts(&self) -> impl Iterator<Item = &GeneratedPost> {
        self.entries.iter().map(|entry| &entry.post)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    /// 当前选中的结果
    pub fn current(&self) -> Option<&GeneratedPost> {
        self.entries.get(self.selected).map(|entry| &entry.post)
    }

    /// 用户重新选择版本；越界时不改变选择
    pub fn select(&mut self, index: usize) -> bool {
        if index < self.entries.len() {
            self.selected = index;
            true
        } else {
            false
        }
    }

    /// 失败条目的诊断信息
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// 平均质量评分；结果集为空或没有评分时返回 `None`
    pub fn average_quality(&self) -> Option<f64> {
        let scores: Vec<f64> = self.posts().filter_map(|post| post.quality_score).collect();
        if scores.is_empty() {
            return None;
        }
        Some(scores.iter().sum::<f64>() / scores.len() as f64)
    }
}

/// 汇总每个条目的终态结果
pub fn finalize(mut outcomes: Vec<(usize, GenerationOutcome)>) -> ResultSet {
    outcomes.sort_by_key(|(index, _)| *index);

    let mut entries = Vec::new();
    let mut warnings = Vec::new();

    for (index, outcome) in outcomes {
        match outcome {
            GenerationOutcome::Success { payload } => entries.push(ResultEntry {
                index,
                post: payload,
            }),
            GenerationOutcome::Failure { reason, .. } => {
                warnings.push(item_error_message(index, &reason))
            }
        }
    }

    ResultSet {
        entries,
        selected: 0,
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(title: &str, score: Option<f64>) -> GeneratedPost {
        GeneratedPost {
            title: title.to_string(),
            content: format!("{} 본문", title),
            quality_score: score,
            model: None,
        }
    }

    #[test]
    fn test_orders_by_submission_index() {
        // 完成顺序: 5, 1, 3
        let outcomes = vec![
            (4, GenerationOutcome::success(post("v5", None))),
            (0, GenerationOutcome::success(post("v1", None))),
            (3, GenerationOutcome::permanent("HTTP 400")),
            (2, GenerationOutcome::success(post("v3", None))),
        ];

        let set = finalize(outcomes);
        let titles: Vec<&str> = set.posts().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["v1", "v3", "v5"]);
        assert_eq!(set.entries()[1].index, 2);
        assert_eq!(set.selected(), 0);
        assert_eq!(set.current().unwrap().title, "v1");
        assert_eq!(set.warnings(), &["[第 4 篇] HTTP 400".to_string()]);
    }

    #[test]
    fn test_select() {
        let mut set = finalize(vec![
            (0, GenerationOutcome::success(post("a", None))),
            (1, GenerationOutcome::success(post("b", None))),
        ]);
        assert!(set.select(1));
        assert_eq!(set.current().unwrap().title, "b");
        assert!(!set.select(2));
        assert_eq!(set.selected(), 1);
    }

    #[test]
    fn test_average_quality() {
        let set = finalize(vec![
            (0, GenerationOutcome::success(post("a", Some(80.0)))),
            (1, GenerationOutcome::success(post("b", None))),
            (2, GenerationOutcome::success(post("c", Some(90.0)))),
        ]);
        assert_eq!(set.average_quality(), Some(85.0));
    }

    #[test]
    fn test_average_quality_empty_set() {
        let set = finalize(vec![(0, GenerationOutcome::permanent("x"))]);
        assert!(set.is_empty());
        assert_eq!(set.average_quality(), None);
        assert!(set.current().is_none());
    }
}
