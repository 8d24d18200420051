use std::sync::Arc;

use docchat::DocSearch;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub doc_search: Arc<DocSearch>,
}

impl AppState {
    pub fn new(doc_search: DocSearch) -> Self {
        Self {
            doc_search: Arc::new(doc_search),
        }
    }
}
