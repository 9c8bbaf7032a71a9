use regex::RegexBuilder;
use tracing::warn;

use crate::models::CategoryRule;

/// Something that can guess a category key from an expense description.
pub(crate) trait Classifier {
    fn classify(&self, description: &str) -> Option<String>;
}

/// User-defined rules, checked in the order given (highest priority first).
pub(crate) struct RuleClassifier {
    rules: Vec<CompiledRule>,
}

enum Matcher {
    Contains(String),
    Regex(regex::Regex),
}

struct CompiledRule {
    matcher: Matcher,
    category_key: String,
}

impl RuleClassifier {
    /// Compile `rules`. Regex rules that fail to compile are skipped and
    /// their patterns returned alongside the classifier.
    pub(crate) fn new(rules: &[CategoryRule]) -> (Self, Vec<String>) {
        let mut bad_patterns = Vec::new();
        let compiled = rules
            .iter()
            .filter_map(|r| {
                let matcher = if r.is_regex {
                    match RegexBuilder::new(&r.pattern).case_insensitive(true).build() {
                        Ok(re) => Matcher::Regex(re),
                        Err(e) => {
                            warn!(pattern = %r.pattern, error = %e, "skipping invalid regex rule");
                            bad_patterns.push(r.pattern.clone());
                            return None;
                        }
                    }
                } else {
                    Matcher::Contains(r.pattern.to_lowercase())
                };
                Some(CompiledRule {
                    matcher,
                    category_key: r.category_key.clone(),
                })
            })
            .collect();

        (Self { rules: compiled }, bad_patterns)
    }
}

impl Classifier for RuleClassifier {
    fn classify(&self, description: &str) -> Option<String> {
        let desc_lower = description.to_lowercase();

        self.rules
            .iter()
            .find(|rule| match &rule.matcher {
                Matcher::Contains(pattern) => desc_lower.contains(pattern.as_str()),
                Matcher::Regex(re) => re.is_match(description),
            })
            .map(|rule| rule.category_key.clone())
    }
}

/// Built-in travel vocabulary mapped onto the default category keys.
pub(crate) struct KeywordClassifier;

const KEYWORDS: &[(&str, &[&str])] = &[
    (
        "accommodation",
        &["hotel", "hostel", "airbnb", "motel", "inn", "resort", "lodge", "booking.com", "guesthouse"],
    ),
    (
        "transport",
        &["taxi", "uber", "lyft", "train", "rail", "bus", "metro", "subway", "flight", "airline", "ferry", "fuel", "gas station", "parking", "car rental"],
    ),
    (
        "food",
        &["restaurant", "cafe", "coffee", "bistro", "bar", "pub", "bakery", "grocery", "supermarket", "pizza", "sushi", "lunch", "dinner", "breakfast"],
    ),
    (
        "attractions",
        &["museum", "tour", "ticket", "park", "gallery", "zoo", "aquarium", "show", "concert", "excursion", "castle"],
    ),
    (
        "shopping",
        &["souvenir", "shop", "store", "market", "mall", "boutique", "duty free", "outlet"],
    ),
];

impl Classifier for KeywordClassifier {
    fn classify(&self, description: &str) -> Option<String> {
        let words: Vec<String> = description
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric() && c != '.')
            .filter(|w| !w.is_empty())
            .map(str::to_string)
            .collect();
        let joined = words.join(" ");

        KEYWORDS
            .iter()
            .find(|(_, keywords)| {
                keywords.iter().any(|kw| {
                    if kw.contains(' ') || kw.contains('.') {
                        joined.contains(kw)
                    } else {
                        words.iter().any(|w| w == kw)
                    }
                })
            })
            .map(|(key, _)| key.to_string())
    }
}

/// Ask each classifier in turn; the first answer wins.
pub(crate) struct ClassifierChain {
    links: Vec<Box<dyn Classifier>>,
}

impl ClassifierChain {
    pub(crate) fn new(links: Vec<Box<dyn Classifier>>) -> Self {
        Self { links }
    }

    /// User rules first, then the built-in keywords.
    pub(crate) fn with_rules(rules: &[CategoryRule]) -> (Self, Vec<String>) {
        let (rule_classifier, bad_patterns) = RuleClassifier::new(rules);
        let chain = Self::new(vec![Box::new(rule_classifier), Box::new(KeywordClassifier)]);
        (chain, bad_patterns)
    }

    /// Pick a key that exists in `known`, falling back to its buffer.
    pub(crate) fn classify_within(
        &self,
        description: &str,
        known: &crate::models::CategorySet,
    ) -> String {
        self.links
            .iter()
            .filter_map(|c| c.classify(description))
            .find(|key| known.contains(key))
            .unwrap_or_else(|| known.buffer().key.clone())
    }
}

impl Classifier for ClassifierChain {
    fn classify(&self, description: &str) -> Option<String> {
        self.links.iter().find_map(|c| c.classify(description))
    }
}

/// Suggest a rule pattern for a description that nothing matched.
pub(crate) fn suggest_rule(description: &str) -> String {
    let cleaned = description
        .to_uppercase()
        .replace(|c: char| c.is_ascii_digit(), "")
        .replace('#', "")
        .replace('*', " ")
        .trim()
        .to_string();

    let words: Vec<&str> = cleaned.split_whitespace().collect();
    let pattern = match words.as_slice() {
        [first, second, ..] => format!("{first} {second}"),
        [only] => only.to_string(),
        [] => description.trim().to_string(),
    };

    pattern.to_lowercase()
}

#[cfg(test)]
mod tests;
