#![allow(clippy::unwrap_used)]

use super::*;
use crate::models::{Category, CategoryRule, CategorySet};

fn make_rule(pattern: &str, key: &str) -> CategoryRule {
    CategoryRule::new_contains(pattern.to_string(), key.to_string())
}

fn make_regex_rule(pattern: &str, key: &str) -> CategoryRule {
    CategoryRule::new_regex(pattern.to_string(), key.to_string())
}

fn classify(rules: &[CategoryRule], desc: &str) -> Option<String> {
    let (c, _) = RuleClassifier::new(rules);
    c.classify(desc)
}

// ── RuleClassifier ────────────────────────────────────────────

#[test]
fn test_contains_match() {
    let rules = vec![make_rule("ryokan", "accommodation"), make_rule("shinkansen", "transport")];
    assert_eq!(classify(&rules, "Kyoto RYOKAN night 2").as_deref(), Some("accommodation"));
    assert_eq!(classify(&rules, "Shinkansen Tokyo-Osaka").as_deref(), Some("transport"));
}

#[test]
fn test_contains_case_insensitive() {
    let rules = vec![make_rule("Gelato", "food")];
    assert_eq!(classify(&rules, "gelato").as_deref(), Some("food"));
    assert_eq!(classify(&rules, "GELATO STAND").as_deref(), Some("food"));
}

#[test]
fn test_no_match() {
    let rules = vec![make_rule("ryokan", "accommodation")];
    assert_eq!(classify(&rules, "Pharmacy"), None);
}

#[test]
fn test_first_match_wins() {
    let rules = vec![make_rule("pass", "transport"), make_rule("museum pass", "attractions")];
    assert_eq!(classify(&rules, "Museum Pass Paris").as_deref(), Some("transport"));
}

#[test]
fn test_regex_rule_case_insensitive() {
    let rules = vec![make_regex_rule(r"^SNCF\s", "transport")];
    assert_eq!(classify(&rules, "SNCF Paris-Lyon").as_deref(), Some("transport"));
    assert_eq!(classify(&rules, "sncf billet").as_deref(), Some("transport"));
    assert_eq!(classify(&rules, "Ticket SNCF"), None);
}

#[test]
fn test_invalid_regex_reported_and_skipped() {
    let rules = vec![make_regex_rule(r"[broken", "food"), make_rule("broken", "shopping")];
    let (c, bad) = RuleClassifier::new(&rules);
    assert_eq!(bad, vec!["[broken".to_string()]);
    assert_eq!(c.classify("broken umbrella").as_deref(), Some("shopping"));
}

#[test]
fn test_empty_rules() {
    assert_eq!(classify(&[], "anything"), None);
}

// ── KeywordClassifier ─────────────────────────────────────────

#[test]
fn test_keywords_cover_default_categories() {
    let k = KeywordClassifier;
    assert_eq!(k.classify("Hilton Hotel Rome").as_deref(), Some("accommodation"));
    assert_eq!(k.classify("Airport taxi").as_deref(), Some("transport"));
    assert_eq!(k.classify("Trattoria restaurant").as_deref(), Some("food"));
    assert_eq!(k.classify("Vatican Museum tickets").as_deref(), Some("attractions"));
    assert_eq!(k.classify("Souvenir magnets").as_deref(), Some("shopping"));
    assert_eq!(k.classify("Travel insurance"), None);
}

#[test]
fn test_keywords_match_whole_words() {
    let k = KeywordClassifier;
    // "parking" is transport, "park" alone is an attraction.
    assert_eq!(k.classify("Hotel parking").as_deref(), Some("accommodation"));
    assert_eq!(k.classify("Parking garage").as_deref(), Some("transport"));
    assert_eq!(k.classify("Central Park boat").as_deref(), Some("attractions"));
    // "bar" must not match inside "barcelona".
    assert_eq!(k.classify("Barcelona"), None);
}

#[test]
fn test_keywords_multi_word_and_dotted() {
    let k = KeywordClassifier;
    assert_eq!(k.classify("Booking.com reservation").as_deref(), Some("accommodation"));
    assert_eq!(k.classify("Duty free perfume").as_deref(), Some("shopping"));
    assert_eq!(k.classify("Car rental deposit").as_deref(), Some("transport"));
}

// ── ClassifierChain ───────────────────────────────────────────

#[test]
fn test_chain_prefers_user_rules() {
    let rules = vec![make_rule("hotel", "buffer")];
    let (chain, _) = ClassifierChain::with_rules(&rules);
    assert_eq!(chain.classify("Hotel minibar").as_deref(), Some("buffer"));
}

#[test]
fn test_chain_falls_back_to_keywords() {
    let (chain, _) = ClassifierChain::with_rules(&[]);
    assert_eq!(chain.classify("Night bus").as_deref(), Some("transport"));
    assert_eq!(chain.classify("Mystery charge"), None);
}

#[test]
fn test_classify_within_defaults_to_buffer() {
    let (chain, _) = ClassifierChain::with_rules(&[]);
    let set = CategorySet::default();
    assert_eq!(chain.classify_within("Mystery charge", &set), "buffer");
    assert_eq!(chain.classify_within("Train to Milan", &set), "transport");
}

#[test]
fn test_classify_within_skips_unknown_keys() {
    let set = CategorySet::new(vec![
        Category::new("food", "Food", 60.0),
        Category::buffer("extra", "Extra", 40.0),
    ])
    .unwrap();
    let rules = vec![make_rule("pizza", "snacks")];
    let (chain, _) = ClassifierChain::with_rules(&rules);
    // The rule's key is not in this set, so the keyword answer is used.
    assert_eq!(chain.classify_within("Pizza al taglio", &set), "food");
    assert_eq!(chain.classify_within("Taxi", &set), "extra");
}

// ── suggest_rule ──────────────────────────────────────────────

#[test]
fn test_suggest_rule_basic() {
    assert_eq!(suggest_rule("LE PETIT CAFE #123"), "le petit");
}

#[test]
fn test_suggest_rule_single_word() {
    assert_eq!(suggest_rule("EUROSTAR"), "eurostar");
}

#[test]
fn test_suggest_rule_strips_noise() {
    let s = suggest_rule("SQ*GELATERIA 0042");
    assert_eq!(s, "sq gelateria");
}

#[test]
fn test_suggest_rule_only_noise() {
    let s = suggest_rule("12345 #");
    assert!(!s.is_empty());
}

#[test]
fn test_regex_rule_perl_classes() {
    let rules = vec![
        make_regex_rule(r"^gate\s*\d+", "transport"),
        make_regex_rule(r"\bdorm\w*", "accommodation"),
    ];
    let (c, bad) = RuleClassifier::new(&rules);
    assert!(bad.is_empty(), "rejected: {bad:?}");
    assert_eq!(c.classify("Gate 12 parking").as_deref(), Some("transport"));
    assert_eq!(c.classify("Hostel dormitory bed").as_deref(), Some("accommodation"));
    assert_eq!(c.classify("Airport gate"), None);
}
