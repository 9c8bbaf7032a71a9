mod category;
mod category_rule;
mod expense;
mod trip;

pub use category::{Category, CategorySet};
pub use category_rule::CategoryRule;
pub use expense::Expense;
pub use trip::{Trip, TripType};
