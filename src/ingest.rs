use std::fs::OpenOptions;
use std::io::{BufRead as _, BufReader};
use std::path::Path;
use std::time::Duration;

use anyhow::Context as _;

use crate::chroma::{ChromaStore, VectorStore};
use crate::chunk::TextSplitter;
use crate::cli::IngestArgs;
use crate::formats::{PageRecord, chunk_id};

pub async fn run(args: IngestArgs) -> anyhow::Result<()> {
    let pages = read_pages(Path::new(&args.pages))?;
    let splitter = TextSplitter::new(args.chunk_size, args.chunk_overlap)?;

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .context("build vector store http client")?;
    let store = ChromaStore::connect(client, &args.chroma_url, &args.collection)
        .await
        .context("connect vector store")?;

    ingest(&store, &splitter, &pages).await
}

/// Splits every page into chunks and appends them to the vector store.
///
/// Each chunk is written with its own `add` call, so an interrupted run
/// leaves a partial but internally consistent store. A failed write aborts
/// the ingestion.
pub async fn ingest(
    store: &dyn VectorStore,
    splitter: &TextSplitter,
    pages: &[PageRecord],
) -> anyhow::Result<()> {
    let mut chunk_total = 0usize;

    for (page_index, page) in pages.iter().enumerate() {
        let chunks = splitter.split(&page.text);
        for (chunk_index, chunk) in chunks.iter().enumerate() {
            let id = chunk_id(page_index, chunk_index);
            store
                .add(&id, chunk, &page.url)
                .await
                .with_context(|| format!("store chunk {id} from {}", page.url))?;
        }
        tracing::debug!(url = %page.url, chunks = chunks.len(), "page ingested");
        chunk_total += chunks.len();
    }

    tracing::info!(pages = pages.len(), chunks = chunk_total, "ingest finished");
    Ok(())
}

pub fn read_pages(path: &Path) -> anyhow::Result<Vec<PageRecord>> {
    let file = OpenOptions::new()
        .read(true)
        .open(path)
        .with_context(|| format!("open pages file: {}", path.display()))?;
    let reader = BufReader::new(file);

    let mut pages = Vec::new();
    for line in reader.lines() {
        let line = line.context("read pages jsonl line")?;
        if line.trim().is_empty() {
            continue;
        }
        let page: PageRecord = serde_json::from_str(&line).context("parse page record")?;
        pages.push(page);
    }
    Ok(pages)
}
