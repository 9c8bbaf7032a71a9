/// User-defined auto-categorization rule: descriptions matching `pattern`
/// are filed under `category_key`.
#[derive(Debug, Clone)]
pub struct CategoryRule {
    pub id: Option<i64>,
    pub pattern: String,
    pub category_key: String,
    pub is_regex: bool,
    pub priority: i32,
}

impl CategoryRule {
    pub fn new_contains(pattern: String, category_key: String) -> Self {
        Self {
            id: None,
            pattern,
            category_key,
            is_regex: false,
            priority: 0,
        }
    }

    pub fn new_regex(pattern: String, category_key: String) -> Self {
        Self {
            id: None,
            pattern,
            category_key,
            is_regex: true,
            priority: 0,
        }
    }
}
