//! CSV ingestion: fetching a source, naming its table, loading it into
//! SQLite and reporting the outcome to the webhook.

pub mod batch;
pub mod engine;
pub mod error;
pub mod fetch;
pub mod notifier;
pub mod store;
pub mod table_name;
