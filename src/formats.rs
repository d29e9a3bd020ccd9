use serde::{Deserialize, Serialize};

/// One successfully fetched HTML page: its URL and the visible text
/// extracted from it. Produced by `crawl`, consumed by `ingest`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageRecord {
    pub url: String,
    pub text: String,
}

/// Chunk id written to the vector store, derived from the position of the
/// page within a crawl run and the position of the chunk within the page.
pub fn chunk_id(page_index: usize, chunk_index: usize) -> String {
    format!("doc_{page_index}_{chunk_index}")
}
