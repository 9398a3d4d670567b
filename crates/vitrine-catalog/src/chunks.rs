//! Chunk construction and the lexical search booster.
//!
//! Every product yields exactly four chunks in [`ChunkKind::ALL`] order.
//! Each chunk is capped independently so one verbose field cannot crowd out
//! the others in the embedding.

use std::collections::HashSet;

use vitrine_core::text::{collapse_whitespace, fold, truncate_chars};
use vitrine_core::{ChunkKind, EmbeddingChunk, Product, SEARCH_BOOSTER_MAX_CHARS, Variant};

use crate::html::strip_html;

const OVERVIEW_MAX_CHARS: usize = 1200;
const FEATURES_MAX_CHARS: usize = 1500;
const FEATURES_MAX_SENTENCES: usize = 6;
const VARIANTS_MAX_CHARS: usize = 4000;
const VARIANTS_MAX_LINES: usize = 60;
const POLICY_MAX_CHARS: usize = 1500;

const BOOSTER_SEPARATOR: &str = " | ";

/// Policy text used when a product carries none.
pub const DEFAULT_POLICY: &str = "Đổi trả miễn phí trong 7 ngày với sản phẩm còn nguyên tem mác. \
     Hỗ trợ đổi size một lần. Hoàn tiền qua phương thức thanh toán ban đầu.";

/// Features line used when the description yields no sentences.
pub const FEATURES_PLACEHOLDER: &str = "Chưa có mô tả chi tiết cho sản phẩm này.";

/// Folded color name to display name.
const COLOR_NAMES: &[(&str, &str)] = &[
    ("den", "đen"),
    ("black", "đen"),
    ("trang", "trắng"),
    ("white", "trắng"),
    ("navy", "xanh navy"),
    ("xanh navy", "xanh navy"),
    ("xam", "xám"),
    ("grey", "xám"),
    ("gray", "xám"),
    ("be", "be"),
    ("beige", "be"),
    ("kem", "kem"),
    ("cream", "kem"),
    ("nau", "nâu"),
    ("brown", "nâu"),
    ("do", "đỏ"),
    ("red", "đỏ"),
    ("hong", "hồng"),
    ("pink", "hồng"),
    ("vang", "vàng"),
    ("yellow", "vàng"),
    ("xanh la", "xanh lá"),
    ("green", "xanh lá"),
    ("xanh duong", "xanh dương"),
    ("blue", "xanh dương"),
];

/// A chunk before embedding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkDraft {
    pub kind: ChunkKind,
    pub content: String,
}

impl ChunkDraft {
    /// Attach an embedding, producing a storable chunk.
    pub fn into_chunk(self, product_id: &str, embedding: Vec<f32>) -> EmbeddingChunk {
        EmbeddingChunk {
            product_id: product_id.to_string(),
            kind: self.kind,
            content: self.content,
            embedding,
        }
    }
}

/// Build the four chunks for a product.
pub fn build_chunks(product: &Product) -> Vec<ChunkDraft> {
    ChunkKind::ALL
        .iter()
        .map(|&kind| {
            let content = match kind {
                ChunkKind::Overview => overview(product),
                ChunkKind::Features => features(product),
                ChunkKind::Variants => variants(product),
                ChunkKind::Policy => policy(product),
            };
            ChunkDraft { kind, content }
        })
        .collect()
}

fn overview(product: &Product) -> String {
    let mut lines = vec![
        format!("Sản phẩm: {}", product.title),
        format!(
            "Loại: {} | Dáng: {}",
            product.category_guess, product.fit_guess
        ),
        format!("Giá: {} VND", product.price),
    ];
    if !product.occasion.is_empty() {
        lines.push(format!("Dịp: {}", product.occasion.join(", ")));
    }
    if !product.style.is_empty() {
        lines.push(format!("Phong cách: {}", product.style.join(", ")));
    }
    if let Some(why) = &product.why_recommend {
        lines.push(format!("Gợi ý: {why}"));
    }
    lines.push(format!("Link: {}", product.url));
    truncate_chars(&lines.join("\n"), OVERVIEW_MAX_CHARS)
}

fn features(product: &Product) -> String {
    let sentences: Vec<&str> = product
        .description_text
        .split(['.', '•', '\n', '\r'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .take(FEATURES_MAX_SENTENCES)
        .collect();

    let body = if sentences.is_empty() {
        FEATURES_PLACEHOLDER.to_string()
    } else {
        sentences
            .iter()
            .map(|s| format!("- {s}"))
            .collect::<Vec<_>>()
            .join("\n")
    };
    truncate_chars(&format!("Đặc điểm:\n{body}"), FEATURES_MAX_CHARS)
}

fn variants(product: &Product) -> String {
    let colors = distinct(
        product
            .variants
            .iter()
            .filter_map(|v| v.color.as_deref())
            .map(normalize_color),
    );
    let sizes = distinct(
        product
            .variants
            .iter()
            .filter_map(|v| v.size.as_deref())
            .map(normalize_size),
    );

    let mut lines = vec![
        format!("Màu: {}", join_or_dash(&colors)),
        format!("Size: {}", join_or_dash(&sizes)),
    ];
    lines.extend(
        product
            .variants
            .iter()
            .take(VARIANTS_MAX_LINES)
            .map(variant_line),
    );
    truncate_chars(&lines.join("\n"), VARIANTS_MAX_CHARS)
}

fn variant_line(variant: &Variant) -> String {
    let sku = variant
        .sku
        .as_deref()
        .or(variant.id.as_deref())
        .unwrap_or("-");
    let color = variant
        .color
        .as_deref()
        .map(normalize_color)
        .unwrap_or_else(|| "-".to_string());
    let size = variant
        .size
        .as_deref()
        .map(normalize_size)
        .unwrap_or_else(|| "-".to_string());
    let price = variant
        .price
        .map(|p| p.to_string())
        .unwrap_or_else(|| "-".to_string());
    format!("{sku} | {color} | {size} | {price}")
}

fn policy(product: &Product) -> String {
    let text = product
        .return_policy
        .as_deref()
        .map(|raw| strip_html(raw, false))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| DEFAULT_POLICY.to_string());
    truncate_chars(&format!("Chính sách đổi trả: {text}"), POLICY_MAX_CHARS)
}

fn normalize_color(raw: &str) -> String {
    let folded = collapse_whitespace(&fold(raw));
    COLOR_NAMES
        .iter()
        .find(|(key, _)| *key == folded)
        .map(|(_, name)| name.to_string())
        .unwrap_or_else(|| raw.trim().to_lowercase())
}

fn normalize_size(raw: &str) -> String {
    raw.trim().to_uppercase()
}

fn distinct(items: impl Iterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .filter(|item| !item.is_empty() && seen.insert(item.clone()))
        .collect()
}

fn join_or_dash(items: &[String]) -> String {
    if items.is_empty() {
        "-".to_string()
    } else {
        items.join(", ")
    }
}

/// Build the deduplicated token bag used for lexical matching.
///
/// Tokens are kept in first-seen order. A token that would push the result
/// past [`SEARCH_BOOSTER_MAX_CHARS`] ends the bag; if the very first token is
/// already too long it is cut at a char boundary.
pub fn build_search_booster(product: &Product) -> String {
    let mut tokens: Vec<String> = Vec::new();
    let mut push_pair = |raw: &str| {
        let lowered = collapse_whitespace(&raw.to_lowercase());
        let folded = fold(&lowered);
        tokens.push(lowered);
        tokens.push(folded);
    };

    push_pair(&product.title);
    for tag in &product.tags {
        push_pair(tag);
    }
    for value in product.style.iter().chain(&product.occasion) {
        push_pair(value);
    }
    for variant in &product.variants {
        if let Some(color) = &variant.color {
            tokens.push(collapse_whitespace(&fold(color)));
        }
        if let Some(size) = &variant.size {
            tokens.push(format!("size {}", fold(size.trim())));
        }
    }

    let mut seen = HashSet::new();
    let mut booster = String::new();
    let mut len = 0;
    for token in tokens {
        if token.is_empty() || !seen.insert(token.clone()) {
            continue;
        }
        let sep = if booster.is_empty() { 0 } else { BOOSTER_SEPARATOR.len() };
        let token_len = token.chars().count();
        if len + sep + token_len > SEARCH_BOOSTER_MAX_CHARS {
            if booster.is_empty() {
                booster = truncate_chars(&token, SEARCH_BOOSTER_MAX_CHARS);
            }
            break;
        }
        if sep > 0 {
            booster.push_str(BOOSTER_SEPARATOR);
        }
        booster.push_str(&token);
        len += sep + token_len;
    }
    booster
}

// ============================================================================
// Tests
// ============================================================================
