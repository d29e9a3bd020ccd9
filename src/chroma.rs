use anyhow::Context as _;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

pub const DEFAULT_COLLECTION: &str = "college_website";

/// One retrieved chunk. `query` returns hits in descending relevance order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryHit {
    pub document: String,
    pub source: String,
}

/// Seam between the ingestion/answer flows and the vector database.
///
/// Implementations own embedding and similarity search; callers only append
/// chunks and run similarity queries. Failures are fatal for the calling
/// operation; there are no retries at this layer.
#[async_trait]
pub trait VectorStore: Send + Sync {
    async fn add(&self, id: &str, document: &str, source: &str) -> anyhow::Result<()>;
    async fn query(&self, text: &str, n_results: usize) -> anyhow::Result<Vec<QueryHit>>;
}

/// Vector store backed by a Chroma server's HTTP API.
#[derive(Debug, Clone)]
pub struct ChromaStore {
    client: reqwest::Client,
    base_url: String,
    collection_id: String,
}

impl ChromaStore {
    /// Resolves (or creates) the named collection and returns a store bound
    /// to it.
    pub async fn connect(
        client: reqwest::Client,
        base_url: &str,
        collection: &str,
    ) -> anyhow::Result<Self> {
        let base_url = base_url.trim_end_matches('/').to_owned();
        let endpoint = format!("{base_url}/api/v1/collections");

        let response = client
            .post(&endpoint)
            .json(&json!({ "name": collection, "get_or_create": true }))
            .send()
            .await
            .with_context(|| format!("POST {endpoint}"))?;

        let status = response.status();
        let raw = response
            .text()
            .await
            .context("read collection response body")?;
        if !status.is_success() {
            anyhow::bail!("vector store error ({status}): {raw}");
        }

        #[derive(Deserialize)]
        struct Collection {
            id: String,
        }
        let parsed: Collection =
            serde_json::from_str(&raw).context("parse collection response")?;

        Ok(Self {
            client,
            base_url,
            collection_id: parsed.id,
        })
    }

    fn collection_endpoint(&self, operation: &str) -> String {
        format!(
            "{}/api/v1/collections/{}/{operation}",
            self.base_url, self.collection_id
        )
    }
}

#[async_trait]
impl VectorStore for ChromaStore {
    async fn add(&self, id: &str, document: &str, source: &str) -> anyhow::Result<()> {
        let endpoint = self.collection_endpoint("add");
        let body = json!({
            "ids": [id],
            "documents": [document],
            "metadatas": [{ "source": source }],
        });

        let response = self
            .client
            .post(&endpoint)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("POST {endpoint}"))?;

        let status = response.status();
        if !status.is_success() {
            let raw = response.text().await.unwrap_or_default();
            anyhow::bail!("vector store add failed ({status}): {raw}");
        }
        Ok(())
    }

    async fn query(&self, text: &str, n_results: usize) -> anyhow::Result<Vec<QueryHit>> {
        let endpoint = self.collection_endpoint("query");
        let body = json!({
            "query_texts": [text],
            "n_results": n_results,
            "include": ["documents", "metadatas"],
        });

        let response = self
            .client
            .post(&endpoint)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("POST {endpoint}"))?;

        let status = response.status();
        let raw = response.text().await.context("read query response body")?;
        if !status.is_success() {
            anyhow::bail!("vector store query failed ({status}): {raw}");
        }

        #[derive(Deserialize)]
        struct QueryResponse {
            documents: Vec<Vec<String>>,
            metadatas: Vec<Vec<ChunkMetadata>>,
        }
        #[derive(Deserialize)]
        struct ChunkMetadata {
            source: String,
        }

        let parsed: QueryResponse =
            serde_json::from_str(&raw).context("parse query response")?;
        let documents = parsed.documents.into_iter().next().unwrap_or_default();
        let metadatas = parsed.metadatas.into_iter().next().unwrap_or_default();
        anyhow::ensure!(
            documents.len() == metadatas.len(),
            "vector store returned {} documents but {} metadata entries",
            documents.len(),
            metadatas.len()
        );

        Ok(documents
            .into_iter()
            .zip(metadatas)
            .map(|(document, metadata)| QueryHit {
                document,
                source: metadata.source,
            })
            .collect())
    }
}
