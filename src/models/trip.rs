use chrono::NaiveDate;
use rust_decimal::Decimal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TripType {
    Leisure,
    Business,
    Backpacking,
    Luxury,
    Family,
}

impl TripType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Leisure => "Leisure",
            Self::Business => "Business",
            Self::Backpacking => "Backpacking",
            Self::Luxury => "Luxury",
            Self::Family => "Family",
        }
    }

    /// Lenient parse; anything unrecognized is a leisure trip.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "business" | "work" => Self::Business,
            "backpacking" | "backpacker" | "budget" => Self::Backpacking,
            "luxury" => Self::Luxury,
            "family" => Self::Family,
            _ => Self::Leisure,
        }
    }

    pub fn all() -> &'static [TripType] {
        &[
            Self::Leisure,
            Self::Business,
            Self::Backpacking,
            Self::Luxury,
            Self::Family,
        ]
    }
}

impl std::fmt::Display for TripType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Trip {
    pub id: Option<i64>,
    pub name: String,
    pub destination: String,
    pub trip_type: TripType,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub travelers: u32,
    pub currency: String,
    pub total_budget: Decimal,
    pub created_at: String,
}

impl Trip {
    pub fn new(name: String, destination: String, trip_type: TripType, currency: String) -> Self {
        Self {
            id: None,
            name,
            destination,
            trip_type,
            start_date: None,
            end_date: None,
            travelers: 1,
            currency,
            total_budget: Decimal::ZERO,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Inclusive length of the trip in days. `None` until both dates are set
    /// and the end is not before the start.
    pub fn days(&self) -> Option<u32> {
        let (start, end) = (self.start_date?, self.end_date?);
        let span = (end - start).num_days();
        if span < 0 {
            return None;
        }
        u32::try_from(span + 1).ok()
    }

    pub fn date_range_label(&self) -> String {
        match (self.start_date, self.end_date) {
            (Some(s), Some(e)) => format!("{s} → {e}"),
            (Some(s), None) => format!("from {s}"),
            (None, Some(e)) => format!("until {e}"),
            (None, None) => "no dates".to_string(),
        }
    }

    /// Find a trip by name (case-insensitive) in a slice.
    pub fn find_by_name<'a>(trips: &'a [Trip], name: &str) -> Option<&'a Trip> {
        let lower = name.to_lowercase();
        trips.iter().find(|t| t.name.to_lowercase() == lower)
    }
}

impl std::fmt::Display for Trip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.destination)
    }
}
