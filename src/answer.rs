use std::io::Write as _;
use std::time::Duration;

use anyhow::Context as _;
use tokio::sync::mpsc;

use crate::chroma::{ChromaStore, VectorStore};
use crate::cli::AskArgs;
use crate::gemini::{self, GeminiClient};

pub const DEFAULT_TOP_K: usize = 5;

pub const SYSTEM_INSTRUCTION: &str = "You are an assistant for visitors of a specific \
    website. When answering questions, refer to the provided context. If the query cannot \
    be answered from the context, simply state that you do not know.";

/// Instruction for the no-retrieval chat path.
pub const CASUAL_INSTRUCTION: &str = "You are the chat assistant of a website. Respond \
    casually to general inputs. If a question needs information you do not have, politely \
    say that you cannot provide it.";

/// Returned when the store has nothing relevant to the query.
pub const FALLBACK_ANSWER: &str = "I can only answer questions about the indexed website.";

/// A streamed answer: text fragments plus the URLs the context came from.
///
/// Drain `fragments` to completion, then call `finish` to surface any error
/// the producer hit mid-stream.
pub struct AnswerStream {
    pub fragments: mpsc::Receiver<String>,
    pub sources: Vec<String>,
    producer: Option<tokio::task::JoinHandle<anyhow::Result<()>>>,
}

impl AnswerStream {
    pub async fn finish(&mut self) -> anyhow::Result<()> {
        match self.producer.take() {
            Some(handle) => handle.await.context("join generation task")?,
            None => Ok(()),
        }
    }
}

/// Answers queries by retrieving stored chunks and delegating generation to
/// the model client. Both collaborators are injected at construction.
pub struct Responder<S> {
    store: S,
    gemini: GeminiClient,
    top_k: usize,
}

impl<S: VectorStore> Responder<S> {
    pub fn new(store: S, gemini: GeminiClient, top_k: usize) -> Self {
        Self {
            store,
            gemini,
            top_k,
        }
    }

    /// Retrieval-augmented answer: the top matching chunks become the prompt
    /// context, and their source URLs are reported alongside the stream.
    pub async fn answer(&self, query: &str) -> anyhow::Result<AnswerStream> {
        let hits = self
            .store
            .query(query, self.top_k)
            .await
            .context("query vector store")?;

        let (sender, receiver) = mpsc::channel(16);

        if hits.is_empty() {
            let _ = sender.send(FALLBACK_ANSWER.to_owned()).await;
            return Ok(AnswerStream {
                fragments: receiver,
                sources: Vec::new(),
                producer: None,
            });
        }

        let sources: Vec<String> = hits.iter().map(|hit| hit.source.clone()).collect();
        let context: String = hits
            .iter()
            .map(|hit| hit.document.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        let prompt = format!("{SYSTEM_INSTRUCTION}\nQuery: {query}\nContext: {context}");

        let gemini = self.gemini.clone();
        let producer = tokio::spawn(async move {
            gemini
                .stream_generate(SYSTEM_INSTRUCTION, &prompt, sender)
                .await
        });

        Ok(AnswerStream {
            fragments: receiver,
            sources,
            producer: Some(producer),
        })
    }

    /// Plain chat without retrieval; no sources are reported.
    pub async fn converse(&self, query: &str) -> anyhow::Result<AnswerStream> {
        let (sender, receiver) = mpsc::channel(16);

        let gemini = self.gemini.clone();
        let query = query.to_owned();
        let producer = tokio::spawn(async move {
            gemini
                .stream_generate(CASUAL_INSTRUCTION, &query, sender)
                .await
        });

        Ok(AnswerStream {
            fragments: receiver,
            sources: Vec::new(),
            producer: Some(producer),
        })
    }
}

pub async fn run(args: AskArgs) -> anyhow::Result<()> {
    let api_key = gemini::api_key_from_env()?;

    let store_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .context("build vector store http client")?;
    let store = ChromaStore::connect(store_client, &args.chroma_url, &args.collection)
        .await
        .context("connect vector store")?;

    // Generation streams are long-lived; only connection setup is bounded.
    let gemini_client = reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .build()
        .context("build model http client")?;
    let gemini = GeminiClient::new(gemini_client, &args.gemini_url, &args.model, api_key);

    let responder = Responder::new(store, gemini, args.top_k);
    let mut stream = if args.casual {
        responder.converse(&args.query).await?
    } else {
        responder.answer(&args.query).await?
    };

    let mut stdout = std::io::stdout();
    while let Some(fragment) = stream.fragments.recv().await {
        stdout
            .write_all(fragment.as_bytes())
            .context("write answer fragment")?;
        stdout.flush().context("flush answer fragment")?;
    }
    stream.finish().await?;
    println!();

    if !stream.sources.is_empty() {
        println!();
        println!("Sources:");
        for source in &stream.sources {
            println!("- {source}");
        }
    }

    Ok(())
}
