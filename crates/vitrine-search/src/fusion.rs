//! Rank-based score fusion.
//!
//! Each source proposes a score per product from its rank; a product seen by
//! both sources keeps the larger proposal. The board remembers the order in
//! which ids first appeared (vector hits, then lexical hits) and uses it to
//! break score ties.

use std::collections::HashMap;

use vitrine_core::VectorHit;

/// Score for the best vector hit; each rank below it costs one point.
pub const VECTOR_BASE: i64 = 1000;
/// Score for the best lexical hit; each rank below it costs two points.
pub const LEXICAL_BASE: i64 = 500;
const LEXICAL_STEP: i64 = 2;

/// Fused scores in first-appearance order.
#[derive(Debug, Clone, Default)]
pub struct ScoreBoard {
    scores: HashMap<String, i64>,
    order: Vec<String>,
}

impl ScoreBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fuse vector hits and lexical ids into a board.
    pub fn fuse(vector_hits: &[VectorHit], lexical_ids: &[String]) -> Self {
        let mut board = Self::new();
        for hit in vector_hits {
            board.propose(&hit.product_id, VECTOR_BASE - hit.rank as i64);
        }
        for (rank, id) in lexical_ids.iter().enumerate() {
            board.propose(id, LEXICAL_BASE - LEXICAL_STEP * rank as i64);
        }
        board
    }

    /// Record `score` for `id`, keeping the maximum of all proposals.
    pub fn propose(&mut self, id: &str, score: i64) {
        match self.scores.get_mut(id) {
            Some(current) => *current = (*current).max(score),
            None => {
                self.scores.insert(id.to_string(), score);
                self.order.push(id.to_string());
            }
        }
    }

    pub fn score(&self, id: &str) -> Option<i64> {
        self.scores.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// All ids with scores, best first; ties keep first-appearance order.
    pub fn ranked(&self) -> Vec<(String, i64)> {
        let mut ranked: Vec<(String, i64)> = self
            .order
            .iter()
            .map(|id| (id.clone(), self.scores.get(id).copied().unwrap_or_default()))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked
    }

    /// The best `n` ids.
    pub fn top_ids(&self, n: usize) -> Vec<String> {
        self.ranked().into_iter().take(n).map(|(id, _)| id).collect()
    }
}
