//! The retrieval engine.
//!
//! One search runs two branches concurrently: a lexical substring match and
//! an embed-then-nearest-neighbor lookup. Both must succeed; the first error
//! cancels the other branch and fails the request.

use std::collections::HashMap;
use std::sync::Arc;

use log::debug;
use vitrine_core::{
    LexicalStore, Product, ProductStore, Result, SearchResult, VectorHit, VectorStore,
};
use vitrine_vector::{EmbeddingProvider, embed_checked};

use crate::boost::BoostTable;
use crate::fusion::ScoreBoard;
use crate::planner::{QueryPlan, QueryPlanner};

/// Rows requested from each retrieval branch.
pub const CANDIDATE_CAP: usize = 20;

/// Hybrid lexical + vector product search.
pub struct RetrievalEngine {
    planner: QueryPlanner,
    boosts: BoostTable,
    provider: Arc<dyn EmbeddingProvider>,
    lexical: Arc<dyn LexicalStore>,
    vectors: Arc<dyn VectorStore>,
    products: Arc<dyn ProductStore>,
}

impl RetrievalEngine {
    /// Create an engine with the standard planner and boost table.
    pub fn new(
        provider: Arc<dyn EmbeddingProvider>,
        lexical: Arc<dyn LexicalStore>,
        vectors: Arc<dyn VectorStore>,
        products: Arc<dyn ProductStore>,
    ) -> Result<Self> {
        Ok(Self {
            planner: QueryPlanner::new()?,
            boosts: BoostTable::standard()?,
            provider,
            lexical,
            vectors,
            products,
        })
    }

    /// Replace the boost table.
    pub fn with_boosts(mut self, boosts: BoostTable) -> Self {
        self.boosts = boosts;
        self
    }

    pub fn planner(&self) -> &QueryPlanner {
        &self.planner
    }

    /// Plan and run `query`. `limit` defaults to 8 and is clamped to 1..=24.
    pub async fn search(&self, query: &str, limit: Option<usize>) -> Result<Vec<SearchResult>> {
        let plan = self.planner.plan(query, limit)?;
        self.execute(&plan).await
    }

    /// Run an already planned query.
    pub async fn execute(&self, plan: &QueryPlan) -> Result<Vec<SearchResult>> {
        self.provider.validate()?;

        let (lexical, vector) =
            tokio::try_join!(self.lexical_branch(plan), self.vector_branch(plan))?;
        let lexical_ids: Vec<String> = lexical.into_iter().map(|p| p.id).collect();
        debug!(
            "'{}': {} vector hits, {} lexical hits",
            plan.term,
            vector.len(),
            lexical_ids.len()
        );

        let board = ScoreBoard::fuse(&vector, &lexical_ids);
        if board.is_empty() {
            return Ok(Vec::new());
        }

        let ranked = board.ranked();
        let wanted: Vec<String> = ranked
            .iter()
            .take((2 * plan.limit).max(CANDIDATE_CAP))
            .map(|(id, _)| id.clone())
            .collect();
        let mut rows: HashMap<String, Product> = self
            .products
            .fetch_by_ids(&wanted)
            .await
            .map_err(|e| e.into_upstream("product store"))?
            .into_iter()
            .map(|p| (p.id.clone(), p))
            .collect();

        // Candidates follow board order so the stable sort below breaks
        // ties by first appearance.
        let mut candidates: Vec<SearchResult> = ranked
            .into_iter()
            .filter_map(|(id, score)| {
                rows.remove(&id).map(|product| SearchResult {
                    fused_score: score + self.boosts.bonus(&plan.folded, &product),
                    product,
                })
            })
            .collect();
        candidates.sort_by(|a, b| b.fused_score.cmp(&a.fused_score));

        if let Some(ceiling) = plan.ceiling {
            candidates.retain(|c| c.product.price <= ceiling);
        }
        candidates.truncate(plan.limit);
        debug!("'{}': returning {} results", plan.term, candidates.len());
        Ok(candidates)
    }

    async fn lexical_branch(&self, plan: &QueryPlan) -> Result<Vec<Product>> {
        self.lexical
            .find_by_text_match(&plan.term, &plan.folded, CANDIDATE_CAP)
            .await
            .map_err(|e| e.into_upstream("lexical store"))
    }

    async fn vector_branch(&self, plan: &QueryPlan) -> Result<Vec<VectorHit>> {
        let embedding = embed_checked(self.provider.as_ref(), &plan.term).await?;
        self.vectors
            .nearest_neighbors(&embedding, CANDIDATE_CAP)
            .await
            .map_err(|e| e.into_upstream("vector store"))
    }
}
