pub mod backends;
pub mod conversation;
pub mod doc_search;
pub mod errors;
pub mod ids;
pub mod models;
pub mod query;
pub mod stream;

pub use doc_search::{doc_search, DocSearch, DocSearchResponse, ErrorPolicy};
