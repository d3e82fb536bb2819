// Category-label normalization for the two source formats.
//
// The declaration sheet and the purchase ledger spell categories in
// different, equally inconsistent ways, so each gets its own normalizer.
// The two are deliberately independent; do not merge them.
use crate::types::Category;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

// Naive substring search on "I" would classify "Cat-III" as Cat-I, so the
// declaration normalizer checks the longest Roman numerals first. The match
// order below reclassifies data if changed; treat it as fixed.
static STANDALONE_I: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bI\b").unwrap());
static CAT_THEN_I: Lazy<Regex> = Lazy::new(|| Regex::new(r"CAT.*I").unwrap());

static PURCHASE_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"CAT\s*-?\s*([IVX]+)").unwrap());

static PURCHASE_LOOKUP: Lazy<HashMap<&'static str, Category>> = Lazy::new(|| {
    HashMap::from([
        ("CATI", Category::CatI),
        ("CATII", Category::CatII),
        ("CATIII", Category::CatIII),
        ("CATIV", Category::CatIV),
        ("CATEGORYI", Category::CatI),
        ("CATEGORYII", Category::CatII),
        ("CATEGORYIII", Category::CatIII),
        ("CATEGORYIV", Category::CatIV),
        ("I", Category::CatI),
        ("II", Category::CatII),
        ("III", Category::CatIII),
        ("IV", Category::CatIV),
    ])
});

/// Classify a free-text category label from the declaration sheet, or
/// discard it.
///
/// Case-insensitive substring matching with strict precedence; the first
/// rule that matches wins regardless of where in the string it occurs:
///
/// 1. contains `IV` (covers `CAT-IV`, `CAT IV`, `CATEGORY IV`)
/// 2. contains `III`
/// 3. contains `II`
/// 4. explicit `CAT-I` / `CAT I` / `CATEGORY I`, or `I` together with the
///    word `CONTAINER`
/// 5. keyword fallbacks: RIGID, FLEXIBLE, MULTI, COMPOSTABLE
/// 6. a standalone word `I`, or any `CAT...I` sequence
///
/// Anything else returns `None` and the row is excluded from aggregation.
pub fn normalize_category(label: &str) -> Option<Category> {
    let text = label.trim().to_uppercase();
    if text.is_empty() {
        return None;
    }
    if text.contains("IV") {
        return Some(Category::CatIV);
    }
    if text.contains("III") {
        return Some(Category::CatIII);
    }
    if text.contains("II") {
        return Some(Category::CatII);
    }
    if text.contains("CAT-I")
        || text.contains("CAT I")
        || text.contains("CATEGORY I")
        || (text.contains('I') && text.contains("CONTAINER"))
    {
        return Some(Category::CatI);
    }
    if text.contains("RIGID") {
        return Some(Category::CatI);
    }
    if text.contains("FLEXIBLE") {
        return Some(Category::CatII);
    }
    if text.contains("MULTI") {
        return Some(Category::CatIII);
    }
    if text.contains("COMPOSTABLE") {
        return Some(Category::CatIV);
    }
    if STANDALONE_I.is_match(&text) || CAT_THEN_I.is_match(&text) {
        return Some(Category::CatI);
    }
    None
}

/// Classify a category label from the purchase ledger, or discard it.
///
/// The ledger format is more uniform than the declaration sheet: first try
/// to extract a `CAT <numeral>` token, then strip whitespace and hyphens
/// and consult an exact lookup table.
pub fn normalize_purchase_category(label: &str) -> Option<Category> {
    let text = label.trim().to_uppercase();
    if text.is_empty() {
        return None;
    }
    if let Some(caps) = PURCHASE_TOKEN.captures(&text) {
        if let Some(cat) = Category::from_numeral(&caps[1]) {
            return Some(cat);
        }
    }
    let stripped: String = text
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect();
    PURCHASE_LOOKUP.get(stripped.as_str()).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn longest_numeral_wins() {
        assert_eq!(normalize_category("Cat III Flexible"), Some(Category::CatIII));
        assert_eq!(normalize_category("Category IV"), Some(Category::CatIV));
        assert_eq!(normalize_category("CAT-II"), Some(Category::CatII));
        assert_eq!(normalize_category("cat iv"), Some(Category::CatIV));
    }

    #[test]
    fn explicit_cat_one_forms() {
        assert_eq!(normalize_category("Cat-I"), Some(Category::CatI));
        assert_eq!(normalize_category("CAT I"), Some(Category::CatI));
        assert_eq!(normalize_category("Category I"), Some(Category::CatI));
        assert_eq!(
            normalize_category("Cat I (Containers)"),
            Some(Category::CatI)
        );
    }

    #[test]
    fn keyword_fallbacks() {
        assert_eq!(normalize_category("Rigid"), Some(Category::CatI));
        assert_eq!(normalize_category("Flexible packaging"), Some(Category::CatII));
        assert_eq!(normalize_category("Multi-layered"), Some(Category::CatIII));
        assert_eq!(normalize_category("Compostable plastic"), Some(Category::CatIV));
    }

    #[test]
    fn standalone_numeral_one() {
        assert_eq!(normalize_category("Plastic I"), Some(Category::CatI));
        assert_eq!(normalize_category("cat. 1-I"), Some(Category::CatI));
    }

    #[test]
    fn unmatched_labels_are_discarded() {
        assert_eq!(normalize_category("unrelated text"), None);
        assert_eq!(normalize_category(""), None);
        assert_eq!(normalize_category("   "), None);
        assert_eq!(normalize_category("metal"), None);
    }

    #[test]
    fn purchase_token_extraction() {
        assert_eq!(
            normalize_purchase_category("Cat IV"),
            Some(Category::CatIV)
        );
        assert_eq!(
            normalize_purchase_category("CAT-III"),
            Some(Category::CatIII)
        );
        assert_eq!(normalize_purchase_category("cat ii"), Some(Category::CatII));
    }

    #[test]
    fn purchase_lookup_after_stripping() {
        assert_eq!(normalize_purchase_category("CATI"), Some(Category::CatI));
        assert_eq!(
            normalize_purchase_category("Category - II"),
            Some(Category::CatII)
        );
        assert_eq!(normalize_purchase_category("III"), Some(Category::CatIII));
        assert_eq!(normalize_purchase_category("HDPE"), None);
    }
}
