use std::collections::HashSet;
use std::fs::OpenOptions;
use std::io::{BufWriter, Write as _};
use std::path::Path;
use std::time::Duration;

use anyhow::Context as _;
use reqwest::header::{ACCEPT, CONTENT_TYPE, USER_AGENT};
use scraper::{Html, Selector};
use url::Url;

use crate::cli::CrawlArgs;
use crate::extract;
use crate::filter::LinkFilter;
use crate::formats::PageRecord;

#[derive(Debug, Clone, Default)]
pub struct CrawlOptions {
    /// Delay after each fetched page.
    pub delay: Duration,
    /// Exact URLs to skip in addition to the built-in deny list.
    pub skip_urls: Vec<String>,
}

pub async fn run(args: CrawlArgs) -> anyhow::Result<()> {
    let seed = parse_seed_url(&args.url)?;
    let client = build_client(Duration::from_secs(args.timeout_secs))?;
    let options = CrawlOptions {
        delay: Duration::from_millis(args.delay_ms),
        skip_urls: args.skip_urls.clone(),
    };

    let pages = scrape(&client, &seed, args.max_depth, &options).await;
    tracing::info!(pages = pages.len(), "crawl finished");

    write_pages(Path::new(&args.out), &pages)?;
    Ok(())
}

pub fn parse_seed_url(raw: &str) -> anyhow::Result<Url> {
    let seed = Url::parse(raw).context("parse --url")?;
    if seed.scheme() != "http" && seed.scheme() != "https" {
        anyhow::bail!("--url must be http/https: {seed}");
    }
    Ok(seed)
}

pub fn build_client(timeout: Duration) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
        .context("build crawl http client")
}

/// Depth-bounded traversal from `seed`, returning pages in visitation order.
///
/// The traversal is depth-first with links followed in document order, driven
/// by an explicit LIFO stack of `(url, depth)` pairs so arbitrarily deep
/// sites cannot exhaust the call stack. Each URL is marked visited before its
/// fetch starts, so cycles terminate. Any per-URL failure (transport error,
/// non-2xx status, wrong content type) only prunes that branch; the crawl
/// itself cannot fail.
pub async fn scrape(
    client: &reqwest::Client,
    seed: &Url,
    max_depth: u32,
    options: &CrawlOptions,
) -> Vec<PageRecord> {
    let filter = LinkFilter::new(seed, &options.skip_urls);
    let mut visited: HashSet<String> = HashSet::new();
    let mut records = Vec::new();
    let mut stack: Vec<(Url, u32)> = vec![(seed.clone(), 0)];

    while let Some((url, depth)) = stack.pop() {
        if depth > max_depth {
            continue;
        }
        if !filter.passes_prefetch(&url, &visited) {
            tracing::debug!(url = %url, "skip: filtered before fetch");
            continue;
        }
        visited.insert(url.as_str().to_owned());

        tracing::info!(url = %url, depth, "fetch");
        let html = match fetch_html(client, &url).await {
            Ok(Some(html)) => html,
            Ok(None) => continue,
            Err(err) => {
                tracing::warn!(?err, url = %url, "fetch failed; skipping url");
                continue;
            }
        };

        let text = extract::extract_text(&html);
        records.push(PageRecord {
            url: url.as_str().to_owned(),
            text,
        });

        // Reverse push order keeps the first link on the page on top of the
        // stack, preserving recursive depth-first visitation order.
        for next_url in page_links(&html, seed).into_iter().rev() {
            if filter.is_eligible(&next_url, &visited) {
                stack.push((next_url, depth.saturating_add(1)));
            }
        }

        if !options.delay.is_zero() {
            tokio::time::sleep(options.delay).await;
        }
    }

    records
}

/// Fetches one URL, returning `Ok(None)` for responses that are not HTML.
async fn fetch_html(client: &reqwest::Client, url: &Url) -> anyhow::Result<Option<String>> {
    let response = client
        .get(url.clone())
        .header(USER_AGENT, "sitechat/0.1")
        .header(ACCEPT, "text/html,application/xhtml+xml;q=0.9,*/*;q=0.8")
        .send()
        .await
        .with_context(|| format!("GET {url}"))?;

    let status = response.status();
    if !status.is_success() {
        anyhow::bail!("unexpected status {status}");
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_ascii_lowercase();
    if !content_type.starts_with("text/html") {
        tracing::debug!(url = %url, content_type, "skip: non-html content");
        return Ok(None);
    }

    let html = response.text().await.context("read response body")?;
    Ok(Some(html))
}

/// Anchor hrefs of a page, resolved to absolute URLs against the seed.
fn page_links(html: &str, seed: &Url) -> Vec<Url> {
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    let document = Html::parse_document(html);
    let mut links = Vec::new();
    for element in document.select(&selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let Ok(resolved) = seed.join(href) else {
            continue;
        };
        if resolved.scheme() != "http" && resolved.scheme() != "https" {
            continue;
        }
        links.push(resolved);
    }
    links
}

pub fn write_pages(path: &Path, pages: &[PageRecord]) -> anyhow::Result<()> {
    let file = OpenOptions::new()
        .create_new(true)
        .write(true)
        .open(path)
        .with_context(|| format!("create pages file: {}", path.display()))?;
    let mut writer = BufWriter::new(file);

    for page in pages {
        serde_json::to_writer(&mut writer, page).context("write page record json")?;
        writer
            .write_all(b"\n")
            .context("write page record newline")?;
    }

    writer.flush().context("flush pages file")?;
    Ok(())
}
