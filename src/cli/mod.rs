pub mod context;
pub mod documents;
pub mod output;
pub mod query;
pub mod session;
