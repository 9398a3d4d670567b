//! Regex attribute rules and inference.
//!
//! Rules run in a fixed priority order over
//! `lowercase(title + " " + tags.join(" "))`. Every matching rule adds its
//! styles and occasions; `category` and `fit` are taken from the first
//! matching rule that sets them and are never overridden afterwards.
//!
//! Inference is a pure fold: each rule consumes the accumulator and returns
//! the next one, so there is no shared or global state.

use regex::Regex;
use vitrine_core::{Error, Result};

/// Style applied when no rule yields one.
pub const DEFAULT_STYLE: &str = "casual";
/// Catch-all occasion applied when no rule yields one.
pub const DEFAULT_OCCASION: &str = "hằng ngày";
/// Category for unclassified products.
pub const DEFAULT_CATEGORY: &str = "khac";
/// Fit when no rule sets one.
pub const DEFAULT_FIT: &str = "regular";

/// A pattern-to-tags mapping.
#[derive(Debug, Clone)]
pub struct AttributeRule {
    pattern: Regex,
    styles: Vec<String>,
    occasions: Vec<String>,
    category: Option<String>,
    fit: Option<String>,
}

impl AttributeRule {
    /// Create a rule matching `pattern` (case-sensitive; the haystack is
    /// already lowercased).
    pub fn new(pattern: &str) -> Result<Self> {
        let pattern = Regex::new(pattern)
            .map_err(|e| Error::config(format!("invalid attribute rule '{pattern}': {e}")))?;
        Ok(Self {
            pattern,
            styles: Vec::new(),
            occasions: Vec::new(),
            category: None,
            fit: None,
        })
    }

    /// Set the styles this rule contributes.
    pub fn with_styles(mut self, styles: &[&str]) -> Self {
        self.styles = styles.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Set the occasions this rule contributes.
    pub fn with_occasions(mut self, occasions: &[&str]) -> Self {
        self.occasions = occasions.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Set the category this rule proposes.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Set the fit this rule proposes.
    pub fn with_fit(mut self, fit: impl Into<String>) -> Self {
        self.fit = Some(fit.into());
        self
    }

    /// Whether the rule fires for `haystack`.
    pub fn matches(&self, haystack: &str) -> bool {
        self.pattern.is_match(haystack)
    }
}

/// Accumulator threaded through the rule fold.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Accumulator {
    styles: Vec<String>,
    occasions: Vec<String>,
    category: Option<String>,
    fit: Option<String>,
}

impl Accumulator {
    fn absorb(self, rule: &AttributeRule) -> Self {
        Self {
            styles: union(self.styles, &rule.styles),
            occasions: union(self.occasions, &rule.occasions),
            category: self.category.or_else(|| rule.category.clone()),
            fit: self.fit.or_else(|| rule.fit.clone()),
        }
    }

    fn finish(self) -> Attributes {
        Attributes {
            styles: non_empty_or(self.styles, DEFAULT_STYLE),
            occasions: non_empty_or(self.occasions, DEFAULT_OCCASION),
            category: self
                .category
                .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            fit: self.fit.unwrap_or_else(|| DEFAULT_FIT.to_string()),
        }
    }
}

fn union(mut acc: Vec<String>, extra: &[String]) -> Vec<String> {
    for item in extra {
        if !acc.contains(item) {
            acc.push(item.clone());
        }
    }
    acc
}

fn non_empty_or(values: Vec<String>, default: &str) -> Vec<String> {
    if values.is_empty() {
        vec![default.to_string()]
    } else {
        values
    }
}

/// Inferred attributes with defaults applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attributes {
    pub styles: Vec<String>,
    pub occasions: Vec<String>,
    pub category: String,
    pub fit: String,
}

/// Fold `rules` over the lowercased title and tags.
pub fn infer_attributes(rules: &[AttributeRule], title: &str, tags: &[String]) -> Attributes {
    let haystack = format!("{} {}", title, tags.join(" ")).to_lowercase();
    rules
        .iter()
        .filter(|rule| rule.matches(&haystack))
        .fold(Accumulator::default(), Accumulator::absorb)
        .finish()
}

/// An ordered list of attribute rules.
#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Vec<AttributeRule>,
}

impl RuleSet {
    /// Wrap rules in priority order.
    pub fn new(rules: Vec<AttributeRule>) -> Self {
        Self { rules }
    }

    /// The built-in fashion catalog rules.
    ///
    /// Garment rules come first (they carry categories), then intent
    /// rules, then fit rules. `shirt` only counts when no hyphenated prefix
    /// such as `t-` is attached.
    pub fn standard() -> Result<Self> {
        let rules = vec![
            AttributeRule::new(r"\b(blazer|vest|suit)\b")?
                .with_styles(&["formal", "smart-casual"])
                .with_occasions(&["đi làm", "sự kiện"])
                .with_category("blazer"),
            AttributeRule::new(r"áo thun|ao thun|t-shirt|\btee\b")?
                .with_styles(&["casual", "basic"])
                .with_occasions(&["dạo phố"])
                .with_category("ao-thun"),
            AttributeRule::new(r"sơ mi|so mi|(?:^|[^-\w])shirt\b")?
                .with_styles(&["smart-casual"])
                .with_occasions(&["đi làm"])
                .with_category("so-mi"),
            AttributeRule::new(r"\bpolo\b")?
                .with_styles(&["smart-casual", "casual"])
                .with_occasions(&["đi làm", "dạo phố"])
                .with_category("polo"),
            AttributeRule::new(r"quần tây|quan tay|quần âu|quan au|trousers|\bslacks\b")?
                .with_styles(&["formal", "smart-casual"])
                .with_occasions(&["đi làm"])
                .with_category("quan-tay"),
            AttributeRule::new(r"\bjeans?\b|denim")?
                .with_styles(&["casual", "streetwear"])
                .with_occasions(&["dạo phố"])
                .with_category("quan-jean"),
            AttributeRule::new(r"quần short|quan short|quần đùi|quan dui|\bshorts\b")?
                .with_styles(&["casual"])
                .with_occasions(&["du lịch"])
                .with_category("quan-short"),
            AttributeRule::new(r"váy|đầm|\bvay\b|\bdam\b|\bdress\b")?
                .with_styles(&["feminine"])
                .with_occasions(&["dự tiệc", "hẹn hò"])
                .with_category("vay-dam"),
            AttributeRule::new(r"hoodie|sweater|cardigan|áo len|ao len|áo nỉ|\bao ni\b")?
                .with_styles(&["casual", "streetwear"])
                .with_occasions(&["dạo phố"])
                .with_category("ao-len"),
            AttributeRule::new(r"khoác|khoac|jacket|bomber|\bcoat\b")?
                .with_styles(&["casual"])
                .with_occasions(&["du lịch", "dạo phố"])
                .with_category("ao-khoac"),
            AttributeRule::new(r"thể thao|the thao|\bgym\b|\bsport|running|jogger")?
                .with_styles(&["sporty"])
                .with_occasions(&["thể thao"])
                .with_category("do-the-thao"),
            AttributeRule::new(r"công sở|cong so|văn phòng|van phong|\boffice\b")?
                .with_styles(&["smart-casual"])
                .with_occasions(&["đi làm"]),
            AttributeRule::new(r"dự tiệc|du tiec|\bparty\b|sang trọng|sang trong")?
                .with_styles(&["formal"])
                .with_occasions(&["dự tiệc"]),
            AttributeRule::new(r"oversize|form rộng|form rong|\bbaggy\b")?.with_fit("oversize"),
            AttributeRule::new(r"\bslim\b|ôm body|om body|skinny")?.with_fit("slim"),
            AttributeRule::new(r"relaxed|suông|\bsuong\b|\bloose\b")?.with_fit("relaxed"),
        ];
        Ok(Self::new(rules))
    }

    /// Infer attributes for one product.
    pub fn infer(&self, title: &str, tags: &[String]) -> Attributes {
        infer_attributes(&self.rules, title, tags)
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the set has no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================
