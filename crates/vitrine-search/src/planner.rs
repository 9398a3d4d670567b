//! Query planning.

use regex::Regex;
use serde::Serialize;
use vitrine_core::text::fold;
use vitrine_core::{Error, Result};

/// Results returned when the caller gives no limit.
pub const DEFAULT_LIMIT: usize = 8;
/// Largest accepted limit.
pub const MAX_LIMIT: usize = 24;

/// A sanitized query ready for retrieval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryPlan {
    /// Sanitized query text.
    pub term: String,
    /// Diacritic-free lowercase copy of `term`.
    pub folded: String,
    /// Maximum price, when the query carries a "giá N" hint.
    pub ceiling: Option<i64>,
    /// Number of results to return, in `1..=MAX_LIMIT`.
    pub limit: usize,
}

/// Turns raw query text into a [`QueryPlan`].
#[derive(Debug, Clone)]
pub struct QueryPlanner {
    price_hint: Regex,
}

impl QueryPlanner {
    pub fn new() -> Result<Self> {
        let price_hint = Regex::new(r"gia\s*(\d{3,})")
            .map_err(|e| Error::config(format!("invalid price hint pattern: {e}")))?;
        Ok(Self { price_hint })
    }

    /// Plan `query`. Wildcard characters (`%`, `_`) are removed; a query
    /// that is empty afterwards is rejected.
    pub fn plan(&self, query: &str, limit: Option<usize>) -> Result<QueryPlan> {
        let term: String = query.chars().filter(|c| !matches!(c, '%' | '_')).collect();
        let term = term.trim().to_string();
        if term.is_empty() {
            return Err(Error::invalid_input("query is empty"));
        }

        let folded = fold(&term);
        let ceiling = self
            .price_hint
            .captures(&folded)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<i64>().ok());

        Ok(QueryPlan {
            term,
            folded,
            ceiling,
            limit: limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vitrine_core::ErrorKind;

    fn planner() -> QueryPlanner {
        QueryPlanner::new().unwrap()
    }

    #[test]
    fn test_sanitize_and_fold() {
        let plan = planner().plan("  Áo_Sơ mi%  ", None).unwrap();
        assert_eq!(plan.term, "ÁoSơ mi");
        assert_eq!(plan.folded, "aoso mi");
        assert_eq!(plan.limit, DEFAULT_LIMIT);
        assert_eq!(plan.ceiling, None);
    }

    #[test]
    fn test_empty_query_rejected() {
        for query in ["", "   ", "%%", " _ % "] {
            let err = planner().plan(query, None).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidInput);
        }
    }

    #[test]
    fn test_limit_clamped() {
        assert_eq!(planner().plan("áo", Some(0)).unwrap().limit, 1);
        assert_eq!(planner().plan("áo", Some(100)).unwrap().limit, MAX_LIMIT);
        assert_eq!(planner().plan("áo", Some(5)).unwrap().limit, 5);
    }

    #[test]
    fn test_price_ceiling() {
        assert_eq!(
            planner().plan("áo polo giá 300000", None).unwrap().ceiling,
            Some(300_000)
        );
        assert_eq!(
            planner().plan("quần GIÁ300000", None).unwrap().ceiling,
            Some(300_000)
        );
    }

    #[test]
    fn test_price_hint_needs_three_digits() {
        assert_eq!(planner().plan("giá 99", None).unwrap().ceiling, None);
    }

    #[test]
    fn test_price_overflow_is_ignored() {
        let plan = planner()
            .plan("giá 99999999999999999999999", None)
            .unwrap();
        assert_eq!(plan.ceiling, None);
    }
}
