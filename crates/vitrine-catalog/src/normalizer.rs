//! Raw catalog record normalization.
//!
//! Raw records arrive in several shapes (flat scraper output, records with a
//! nested `normalized` or `metadata` object, camelCase exports). Each
//! canonical field is resolved through an ordered list of dotted fallback
//! paths; the first path holding a usable value wins.
//!
//! A record without a title, a URL, or a numeric price is dropped (`None`).
//! Dropping is not an error: one bad record never fails a batch.

use log::debug;
use serde_json::Value;
use vitrine_core::{Product, Result, Variant};

use crate::chunks::build_search_booster;
use crate::html::strip_html;
use crate::rules::RuleSet;

/// Prices above this are assumed to be expressed in hundredths.
const PRICE_SCALE_THRESHOLD: f64 = 9_999_999.0;

/// Ordered fallback paths for every canonical field.
pub struct FieldPaths;

impl FieldPaths {
    pub const ID: &'static [&'static str] = &["id", "product_id", "normalized.id", "metadata.id"];
    pub const TITLE: &'static [&'static str] =
        &["title", "name", "normalized.title", "metadata.title"];
    pub const PRICE: &'static [&'static str] =
        &["price", "sale_price", "normalized.price", "metadata.price"];
    pub const URL: &'static [&'static str] = &[
        "url",
        "link",
        "product_url",
        "normalized.url",
        "metadata.url",
    ];
    pub const IMAGE: &'static [&'static str] =
        &["image", "thumbnail", "normalized.image", "metadata.image"];
    pub const GALLERY: &'static [&'static str] =
        &["gallery", "images", "normalized.gallery", "metadata.images"];
    pub const STYLE: &'static [&'static str] =
        &["style", "styles", "normalized.style", "metadata.style"];
    pub const OCCASION: &'static [&'static str] = &[
        "occasion",
        "occasions",
        "normalized.occasion",
        "metadata.occasion",
    ];
    pub const MATCH_WITH: &'static [&'static str] =
        &["match_with", "matchWith", "normalized.match_with"];
    pub const WHY_RECOMMEND: &'static [&'static str] = &[
        "why_recommend",
        "whyRecommend",
        "normalized.why_recommend",
    ];
    pub const DESCRIPTION: &'static [&'static str] = &[
        "description",
        "description_text",
        "normalized.description",
        "metadata.description",
    ];
    pub const TAGS: &'static [&'static str] =
        &["tags", "keywords", "normalized.tags", "metadata.tags"];
    pub const VARIANTS: &'static [&'static str] = &["variants", "normalized.variants"];
    pub const RETURN_POLICY: &'static [&'static str] =
        &["return_policy", "policy", "metadata.return_policy"];
}

/// Converts raw records into canonical [`Product`]s.
#[derive(Debug, Clone)]
pub struct Normalizer {
    rules: RuleSet,
}

impl Normalizer {
    /// Create a normalizer with the standard attribute rules.
    pub fn new() -> Result<Self> {
        Ok(Self::with_rules(RuleSet::standard()?))
    }

    /// Create a normalizer with a custom rule set.
    pub fn with_rules(rules: RuleSet) -> Self {
        Self { rules }
    }

    /// Normalize one raw record, or `None` if it lacks a title, URL or
    /// numeric price.
    pub fn normalize(&self, record: &Value) -> Option<Product> {
        let Some(title) = resolve_with(record, FieldPaths::TITLE, as_text) else {
            debug!("dropping record without title");
            return None;
        };
        let Some(url) = resolve_with(record, FieldPaths::URL, as_text) else {
            debug!("dropping '{title}': no url");
            return None;
        };
        let Some(raw_price) = resolve_with(record, FieldPaths::PRICE, as_price) else {
            debug!("dropping '{title}': no numeric price");
            return None;
        };

        // Raw ids collide across sources; the URL does not.
        let id = derive_id(&url);
        let source_id = resolve_with(record, FieldPaths::ID, as_text);
        let gallery = resolve_list(record, FieldPaths::GALLERY);
        let image = resolve_with(record, FieldPaths::IMAGE, as_text).or_else(|| {
            gallery
                .iter()
                .find(|u| u.starts_with("http://") || u.starts_with("https://"))
                .cloned()
        });
        let tags = resolve_list(record, FieldPaths::TAGS);
        let description_text = resolve_with(record, FieldPaths::DESCRIPTION, as_text)
            .map(|d| strip_html(&d, true))
            .unwrap_or_default();

        let attrs = self.rules.infer(&title, &tags);
        let explicit_styles = resolve_list(record, FieldPaths::STYLE);
        let explicit_occasions = resolve_list(record, FieldPaths::OCCASION);

        let mut product = Product {
            id,
            source_id,
            title,
            price: normalize_price(raw_price),
            url,
            image,
            gallery,
            style: prefer_explicit(explicit_styles, attrs.styles),
            occasion: prefer_explicit(explicit_occasions, attrs.occasions),
            match_with: resolve_list(record, FieldPaths::MATCH_WITH),
            why_recommend: resolve_with(record, FieldPaths::WHY_RECOMMEND, as_text),
            description_text,
            tags,
            variants: resolve_variants(record),
            return_policy: resolve_with(record, FieldPaths::RETURN_POLICY, as_text),
            search_booster: String::new(),
            category_guess: attrs.category,
            fit_guess: attrs.fit,
        };
        product.search_booster = build_search_booster(&product);
        Some(product)
    }
}

/// Apply the price scaling rule to a raw price.
pub fn normalize_price(raw: f64) -> i64 {
    if raw > PRICE_SCALE_THRESHOLD {
        (raw / 100.0).round() as i64
    } else {
        raw.round() as i64
    }
}

/// Coerce a string-or-array value into a list of non-blank strings.
pub fn to_array(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => vec![s.trim().to_string()],
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn lookup<'a>(record: &'a Value, dotted: &str) -> Option<&'a Value> {
    dotted
        .split('.')
        .try_fold(record, |node, key| node.get(key))
        .filter(|v| !v.is_null())
}

fn resolve_with<T>(
    record: &Value,
    paths: &[&str],
    extract: impl Fn(&Value) -> Option<T>,
) -> Option<T> {
    paths
        .iter()
        .filter_map(|path| lookup(record, path))
        .find_map(extract)
}

fn resolve_list(record: &Value, paths: &[&str]) -> Vec<String> {
    resolve_with(record, paths, |v| {
        let list = to_array(v);
        (!list.is_empty()).then_some(list)
    })
    .unwrap_or_default()
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn as_price(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_price_text(s),
        _ => None,
    }
}

/// Read a price written as text, e.g. `"350.000đ"` or `"199000.50"`.
///
/// A final `.` or `,` followed by one or two digits starts a fraction; every
/// other separator groups thousands.
fn parse_price_text(text: &str) -> Option<f64> {
    let kept: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | ','))
        .collect();
    let kept = kept.trim_matches(['.', ',']);
    let (whole, fraction) = match kept.rfind(['.', ',']) {
        Some(i) if (1..=2).contains(&(kept.len() - i - 1)) => (&kept[..i], &kept[i + 1..]),
        _ => (kept, ""),
    };

    let digits: String = whole.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    let mut value = digits.parse::<f64>().ok()?;
    if !fraction.is_empty() {
        value += fraction.parse::<f64>().ok()? / 10f64.powi(fraction.len() as i32);
    }
    Some(value)
}

fn prefer_explicit(explicit: Vec<String>, inferred: Vec<String>) -> Vec<String> {
    if explicit.is_empty() {
        inferred
    } else {
        explicit
    }
}

fn resolve_variants(record: &Value) -> Vec<Variant> {
    let Some(items) = FieldPaths::VARIANTS
        .iter()
        .filter_map(|path| lookup(record, path))
        .find_map(Value::as_array)
    else {
        return Vec::new();
    };

    items
        .iter()
        .filter(|item| item.is_object())
        .map(|item| Variant {
            sku: item.get("sku").and_then(as_text),
            id: item.get("id").and_then(as_text),
            color: item.get("color").and_then(as_text),
            size: item.get("size").and_then(as_text),
            price: item.get("price").and_then(as_price).map(normalize_price),
        })
        .collect()
}

/// Product id: `p-` plus 16 hex chars of the URL hash.
fn derive_id(url: &str) -> String {
    let hash = blake3::hash(url.as_bytes());
    format!("p-{}", &hash.to_hex().as_str()[..16])
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn normalizer() -> Normalizer {
        Normalizer::new().unwrap()
    }

    #[test]
    fn test_rejects_missing_required_fields() {
        let n = normalizer();
        assert!(n.normalize(&json!({"url": "https://s/a", "price": 1})).is_none());
        assert!(n.normalize(&json!({"title": "Áo", "price": 1})).is_none());
        assert!(n.normalize(&json!({"title": "Áo", "url": "https://s/a"})).is_none());
        assert!(
            n.normalize(&json!({"title": "Áo", "url": "https://s/a", "price": "liên hệ"}))
                .is_none()
        );
        assert!(
            n.normalize(&json!({"title": "   ", "url": "https://s/a", "price": 1}))
                .is_none()
        );
    }

    #[test]
    fn test_price_rule() {
        assert_eq!(normalize_price(15_000_000.0), 150_000);
        assert_eq!(normalize_price(350_000.0), 350_000);
        assert_eq!(normalize_price(9_999_999.0), 9_999_999);
        assert_eq!(normalize_price(199_000.4), 199_000);
    }

    #[test]
    fn test_price_string_keeps_digits() {
        let product = normalizer()
            .normalize(&json!({"title": "Áo", "url": "https://s/a", "price": "350.000đ"}))
            .unwrap();
        assert_eq!(product.price, 350_000);
    }

    #[test]
    fn test_price_string_with_decimals() {
        assert_eq!(parse_price_text("199000.50"), Some(199_000.5));
        assert_eq!(parse_price_text("199.000,5 VND"), Some(199_000.5));
        assert_eq!(parse_price_text("1,299,000"), Some(1_299_000.0));
        assert_eq!(parse_price_text("590.000đ"), Some(590_000.0));
        assert_eq!(parse_price_text("liên hệ"), None);
        assert_eq!(parse_price_text(".,"), None);

        let product = normalizer()
            .normalize(&json!({"title": "Áo", "url": "https://s/a", "price": "199000.50"}))
            .unwrap();
        assert_eq!(product.price, 199_001);
    }

    #[test]
    fn test_same_raw_id_on_different_urls() {
        let n = normalizer();
        let a = n
            .normalize(&json!({"id": 1, "title": "Áo A", "url": "https://s/a", "price": 1}))
            .unwrap();
        let b = n
            .normalize(&json!({"id": 1, "title": "Áo B", "url": "https://s/b", "price": 1}))
            .unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(a.source_id, b.source_id);
    }

    #[test]
    fn test_variant_prices_follow_product_rule() {
        let product = normalizer()
            .normalize(&json!({
                "title": "Áo polo",
                "url": "https://s/polo",
                "price": 15_000_000,
                "variants": [
                    {"sku": "P-1", "color": "Đen", "size": "m", "price": 15_000_000},
                    {"sku": "P-2", "price": "n/a"},
                    "not-an-object"
                ]
            }))
            .unwrap();
        assert_eq!(product.price, 150_000);
        assert_eq!(product.variants.len(), 2);
        assert_eq!(product.variants[0].price, Some(150_000));
        assert_eq!(product.variants[1].price, None);
    }

    #[test]
    fn test_fallback_paths() {
        let product = normalizer()
            .normalize(&json!({
                "name": "",
                "normalized": {"title": "Quần tây", "url": "https://s/qt"},
                "metadata": {"price": 420000, "images": ["ftp://x", "https://cdn/q.jpg"]},
                "matchWith": "áo sơ mi"
            }))
            .unwrap();
        assert_eq!(product.title, "Quần tây");
        assert_eq!(product.url, "https://s/qt");
        assert_eq!(product.price, 420_000);
        assert_eq!(product.image.as_deref(), Some("https://cdn/q.jpg"));
        assert_eq!(product.match_with, vec!["áo sơ mi".to_string()]);
    }

    #[test]
    fn test_id_is_derived_from_url() {
        let n = normalizer();
        let with_id = n
            .normalize(&json!({"id": 42, "title": "Áo", "url": "https://s/a", "price": 1}))
            .unwrap();
        assert!(with_id.id.starts_with("p-"));
        assert_eq!(with_id.source_id.as_deref(), Some("42"));

        let a = n
            .normalize(&json!({"title": "Áo", "url": "https://s/b", "price": 1}))
            .unwrap();
        let b = n
            .normalize(&json!({"title": "Áo khác", "url": "https://s/b", "price": 2}))
            .unwrap();
        assert_eq!(a.id, b.id);
        assert!(a.id.starts_with("p-"));
        assert_eq!(a.id.len(), 18);
    }

    #[test]
    fn test_explicit_styles_override_inferred() {
        let n = normalizer();
        let inferred = n
            .normalize(&json!({"title": "Áo sơ mi", "url": "https://s/a", "price": 1}))
            .unwrap();
        assert_eq!(inferred.style, vec!["smart-casual".to_string()]);
        assert_eq!(inferred.category_guess, "so-mi");

        let explicit = n
            .normalize(&json!({
                "title": "Áo sơ mi",
                "url": "https://s/a",
                "price": 1,
                "style": ["minimal"],
                "occasion": []
            }))
            .unwrap();
        assert_eq!(explicit.style, vec!["minimal".to_string()]);
        assert_eq!(explicit.occasion, vec!["đi làm".to_string()]);
    }

    #[test]
    fn test_description_html_is_stripped() {
        let product = normalizer()
            .normalize(&json!({
                "title": "Đầm",
                "url": "https://s/d",
                "price": 1,
                "description": "<p>Vải lụa.</p><p>Dáng suông</p>"
            }))
            .unwrap();
        assert_eq!(product.description_text, "Vải lụa.\nDáng suông");
    }

    #[test]
    fn test_to_array() {
        assert_eq!(to_array(&json!("a")), vec!["a".to_string()]);
        assert_eq!(
            to_array(&json!(["a", 1, " ", null, "b"])),
            vec!["a".to_string(), "b".to_string()]
        );
        assert!(to_array(&json!("  ")).is_empty());
        assert!(to_array(&json!({"a": 1})).is_empty());
    }

    #[test]
    fn test_search_booster_is_populated() {
        let product = normalizer()
            .normalize(&json!({"title": "Áo Polo", "url": "https://s/p", "price": 1}))
            .unwrap();
        assert!(product.search_booster.contains("ao polo"));
    }
}
