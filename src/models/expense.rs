use anyhow::Result;
use rust_decimal::Decimal;

#[derive(Debug, Clone, PartialEq)]
pub struct Expense {
    pub id: Option<i64>,
    pub trip_id: i64,
    /// Format: "YYYY-MM-DD"
    pub date: String,
    pub description: String,
    pub amount: Decimal,
    pub category_key: String,
    pub notes: String,
    pub created_at: String,
}

impl Expense {
    /// Build a new expense dated today. Amounts must be strictly positive.
    pub fn new(
        trip_id: i64,
        description: String,
        amount: Decimal,
        category_key: String,
    ) -> Result<Self> {
        if amount <= Decimal::ZERO {
            anyhow::bail!("Expense amount must be greater than zero, got {amount}");
        }
        let now = chrono::Local::now();
        Ok(Self {
            id: None,
            trip_id,
            date: now.format("%Y-%m-%d").to_string(),
            description,
            amount,
            category_key,
            notes: String::new(),
            created_at: chrono::Utc::now().to_rfc3339(),
        })
    }

    pub fn with_date(mut self, date: String) -> Self {
        self.date = date;
        self
    }
}
