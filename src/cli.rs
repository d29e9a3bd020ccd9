use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    Build(BuildArgs),
    Crawl(CrawlArgs),
    Ingest(IngestArgs),
    Ask(AskArgs),
}

#[derive(Debug, Args)]
pub struct CrawlArgs {
    /// Seed URL (must be http/https).
    #[arg(long)]
    pub url: String,

    /// Output file for crawled pages (JSONL).
    #[arg(long)]
    pub out: String,

    /// Maximum link depth to traverse.
    #[arg(long, default_value_t = 5)]
    pub max_depth: u32,

    /// Per-request timeout.
    #[arg(long, default_value_t = 10)]
    pub timeout_secs: u64,

    /// Delay after each fetched page (politeness).
    #[arg(long, default_value_t = 0)]
    pub delay_ms: u64,

    /// Additional exact URLs to skip (repeatable).
    #[arg(long = "skip-url")]
    pub skip_urls: Vec<String>,
}

#[derive(Debug, Args)]
pub struct IngestArgs {
    /// Input file with crawled pages (JSONL, created by `crawl`).
    #[arg(long)]
    pub pages: String,

    /// Base URL of the Chroma server.
    #[arg(long, default_value = "http://localhost:8000")]
    pub chroma_url: String,

    /// Vector store collection name.
    #[arg(long, default_value = crate::chroma::DEFAULT_COLLECTION)]
    pub collection: String,

    /// Target chunk size in characters.
    #[arg(long, default_value_t = crate::chunk::DEFAULT_CHUNK_SIZE)]
    pub chunk_size: usize,

    /// Overlap between consecutive chunks in characters.
    #[arg(long, default_value_t = crate::chunk::DEFAULT_CHUNK_OVERLAP)]
    pub chunk_overlap: usize,
}

#[derive(Debug, Args)]
pub struct AskArgs {
    /// Question to answer from the indexed site.
    pub query: String,

    /// Base URL of the Chroma server.
    #[arg(long, default_value = "http://localhost:8000")]
    pub chroma_url: String,

    /// Vector store collection name.
    #[arg(long, default_value = crate::chroma::DEFAULT_COLLECTION)]
    pub collection: String,

    /// Generative model name.
    #[arg(long, default_value = crate::gemini::DEFAULT_MODEL)]
    pub model: String,

    /// Base URL of the generative model API.
    #[arg(long, default_value = crate::gemini::DEFAULT_BASE_URL)]
    pub gemini_url: String,

    /// Number of chunks to retrieve as context.
    #[arg(long, default_value_t = crate::answer::DEFAULT_TOP_K)]
    pub top_k: usize,

    /// Chat without retrieval (no context from the vector store).
    #[arg(long)]
    pub casual: bool,
}

#[derive(Debug, Args)]
pub struct BuildArgs {
    /// Seed URL (must be http/https).
    #[arg(long)]
    pub url: String,

    /// Output directory for the crawl workspace.
    #[arg(long)]
    pub out: String,

    /// Maximum link depth to traverse.
    #[arg(long, default_value_t = 5)]
    pub max_depth: u32,

    /// Per-request timeout.
    #[arg(long, default_value_t = 10)]
    pub timeout_secs: u64,

    /// Delay after each fetched page (politeness).
    #[arg(long, default_value_t = 0)]
    pub delay_ms: u64,

    /// Additional exact URLs to skip (repeatable).
    #[arg(long = "skip-url")]
    pub skip_urls: Vec<String>,

    /// Base URL of the Chroma server.
    #[arg(long, default_value = "http://localhost:8000")]
    pub chroma_url: String,

    /// Vector store collection name.
    #[arg(long, default_value = crate::chroma::DEFAULT_COLLECTION)]
    pub collection: String,

    /// Target chunk size in characters.
    #[arg(long, default_value_t = crate::chunk::DEFAULT_CHUNK_SIZE)]
    pub chunk_size: usize,

    /// Overlap between consecutive chunks in characters.
    #[arg(long, default_value_t = crate::chunk::DEFAULT_CHUNK_OVERLAP)]
    pub chunk_overlap: usize,
}
