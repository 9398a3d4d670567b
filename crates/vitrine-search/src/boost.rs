//! Query-intent boosting.
//!
//! A fixed table maps a query pattern to flat bonuses for candidates whose
//! attributes match. Patterns run against folded text. Bonuses within a rule
//! are independent and additive; each applies at most once per candidate.

use regex::Regex;
use vitrine_core::text::fold;
use vitrine_core::{Error, Product, Result};

/// Which product attribute a bonus inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BonusTarget {
    /// Any occasion tag.
    Occasion,
    /// Any style tag.
    Style,
    /// The title.
    Title,
}

/// Points awarded when the target attribute matches `pattern`.
#[derive(Debug, Clone)]
pub struct Bonus {
    pub target: BonusTarget,
    pub pattern: Regex,
    pub points: i64,
}

impl Bonus {
    pub fn new(target: BonusTarget, pattern: &str, points: i64) -> Result<Self> {
        Ok(Self {
            target,
            pattern: compile(pattern)?,
            points,
        })
    }

    fn applies_to(&self, product: &Product) -> bool {
        match self.target {
            BonusTarget::Occasion => {
                product.occasion.iter().any(|o| self.pattern.is_match(&fold(o)))
            }
            BonusTarget::Style => product.style.iter().any(|s| self.pattern.is_match(&fold(s))),
            BonusTarget::Title => self.pattern.is_match(&fold(&product.title)),
        }
    }
}

/// A query pattern and the bonuses it unlocks.
#[derive(Debug, Clone)]
pub struct BoostRule {
    pub query_pattern: Regex,
    pub bonuses: Vec<Bonus>,
}

impl BoostRule {
    pub fn new(query_pattern: &str, bonuses: Vec<Bonus>) -> Result<Self> {
        Ok(Self {
            query_pattern: compile(query_pattern)?,
            bonuses,
        })
    }
}

/// Ordered boost rules.
#[derive(Debug, Clone)]
pub struct BoostTable {
    rules: Vec<BoostRule>,
}

impl BoostTable {
    pub fn new(rules: Vec<BoostRule>) -> Self {
        Self { rules }
    }

    /// The built-in table: office/commute intent.
    pub fn standard() -> Result<Self> {
        Ok(Self::new(vec![BoostRule::new(
            r"cong so|di lam|office|van phong",
            vec![
                Bonus::new(BonusTarget::Occasion, r"di lam|cong so|van phong|office|work", 220)?,
                Bonus::new(BonusTarget::Style, r"^(smart-casual|formal)$", 180)?,
                Bonus::new(BonusTarget::Title, r"so mi|(?:^|[^-\w])shirt\b", 100)?,
            ],
        )?]))
    }

    /// Total bonus for `product` under the folded query.
    pub fn bonus(&self, folded_query: &str, product: &Product) -> i64 {
        self.rules
            .iter()
            .filter(|rule| rule.query_pattern.is_match(folded_query))
            .flat_map(|rule| &rule.bonuses)
            .filter(|bonus| bonus.applies_to(product))
            .map(|bonus| bonus.points)
            .sum()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern)
        .map_err(|e| Error::config(format!("invalid boost pattern '{pattern}': {e}")))
}
