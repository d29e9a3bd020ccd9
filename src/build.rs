use std::path::PathBuf;

use anyhow::Context as _;

use crate::cli::{BuildArgs, CrawlArgs, IngestArgs};

/// Runs the full pipeline: crawl the site into a workspace directory, then
/// chunk and ingest the crawled pages into the vector store.
pub async fn run(args: BuildArgs) -> anyhow::Result<()> {
    let workspace_dir = PathBuf::from(&args.out);
    if workspace_dir.exists() {
        anyhow::bail!(
            "workspace output directory already exists: {}",
            workspace_dir.display()
        );
    }
    std::fs::create_dir_all(&workspace_dir)
        .with_context(|| format!("create workspace dir: {}", workspace_dir.display()))?;

    let pages_path = workspace_dir.join("pages.jsonl");

    tracing::info!(url = %args.url, out = %workspace_dir.display(), "build: crawl");
    crate::crawl::run(CrawlArgs {
        url: args.url.clone(),
        out: pages_path.to_string_lossy().to_string(),
        max_depth: args.max_depth,
        timeout_secs: args.timeout_secs,
        delay_ms: args.delay_ms,
        skip_urls: args.skip_urls.clone(),
    })
    .await
    .context("crawl")?;

    tracing::info!("build: ingest");
    crate::ingest::run(IngestArgs {
        pages: pages_path.to_string_lossy().to_string(),
        chroma_url: args.chroma_url.clone(),
        collection: args.collection.clone(),
        chunk_size: args.chunk_size,
        chunk_overlap: args.chunk_overlap,
    })
    .await
    .context("ingest")?;

    Ok(())
}
