pub mod error;
pub mod ledger;
pub mod plot;
pub mod reader;
pub mod summary;
