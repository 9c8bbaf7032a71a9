pub(crate) mod expenses;
pub(crate) mod planner;
pub(crate) mod trips;
