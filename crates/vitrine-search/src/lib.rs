//! Hybrid retrieval for Vitrine.
//!
//! ```text
//!   query ─► QueryPlanner ─► ┬─ lexical match ─────────────┬─► ScoreBoard ─► fetch ─► boost ─► sort ─► ceiling ─► top K
//!                            └─ embed ─► nearest neighbors ┘
//! ```
//!
//! # Modules
//!
//! - [`planner`]: Query sanitizing, folding, price ceiling extraction
//! - [`fusion`]: Rank-to-score fusion with first-appearance tie breaking
//! - [`boost`]: Query-intent bonus table
//! - [`engine`]: [`RetrievalEngine`], the end-to-end search pipeline

pub mod boost;
pub mod engine;
pub mod fusion;
pub mod planner;

pub use boost::{Bonus, BonusTarget, BoostRule, BoostTable};
pub use engine::{CANDIDATE_CAP, RetrievalEngine};
pub use fusion::ScoreBoard;
pub use planner::{DEFAULT_LIMIT, MAX_LIMIT, QueryPlan, QueryPlanner};
