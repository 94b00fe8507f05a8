pub mod history;
pub mod query;
