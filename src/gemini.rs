use anyhow::Context as _;
use futures_util::StreamExt as _;
use tokio::sync::mpsc;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-1.5-pro";
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Reads the API credential from the environment. Required before any
/// generation work starts; absence is a startup error.
pub fn api_key_from_env() -> anyhow::Result<String> {
    std::env::var(API_KEY_ENV).map_err(|_| anyhow::anyhow!("{API_KEY_ENV} is not set"))
}

pub fn stream_endpoint(base_url: &str, model: &str) -> String {
    let base_url = base_url.trim_end_matches('/');
    format!("{base_url}/v1beta/models/{model}:streamGenerateContent?alt=sse")
}

/// Client for the Gemini streaming generation endpoint.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(client: reqwest::Client, base_url: &str, model: &str, api_key: String) -> Self {
        Self {
            client,
            endpoint: stream_endpoint(base_url, model),
            api_key,
        }
    }

    /// Runs one generation call, forwarding each text fragment into
    /// `fragments` as it arrives. Returns once the model closes the stream.
    /// Stops early without error if the receiving side goes away.
    pub async fn stream_generate(
        &self,
        instruction: &str,
        input: &str,
        fragments: mpsc::Sender<String>,
    ) -> anyhow::Result<()> {
        let body = serde_json::json!({
            "system_instruction": { "parts": [{ "text": instruction }] },
            "contents": [{ "role": "user", "parts": [{ "text": input }] }],
        });

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("POST {}", self.endpoint))?;

        let status = response.status();
        if !status.is_success() {
            let raw = response.text().await.context("read Gemini error body")?;
            let message = parse_error_message(&raw).unwrap_or(raw);
            anyhow::bail!("Gemini API error ({status}): {message}");
        }

        let mut stream = response.bytes_stream();
        let mut buffer: Vec<u8> = Vec::new();
        while let Some(piece) = stream.next().await {
            let piece = piece.context("read Gemini response stream")?;
            buffer.extend_from_slice(&piece);

            while let Some(boundary) = buffer.iter().position(|byte| *byte == b'\n') {
                let line: Vec<u8> = buffer.drain(..=boundary).collect();
                let line = String::from_utf8_lossy(&line);
                for text in event_texts(line.trim_end()) {
                    if fragments.send(text).await.is_err() {
                        return Ok(());
                    }
                }
            }
        }

        if !buffer.is_empty() {
            let line = String::from_utf8_lossy(&buffer);
            for text in event_texts(line.trim_end()) {
                if fragments.send(text).await.is_err() {
                    return Ok(());
                }
            }
        }

        Ok(())
    }
}

/// Text fragments carried by one server-sent-event line. Lines that are not
/// `data:` payloads (comments, blank keep-alives) yield nothing.
fn event_texts(line: &str) -> Vec<String> {
    let Some(data) = line.strip_prefix("data:") else {
        return Vec::new();
    };
    let data = data.trim();
    if data.is_empty() || data == "[DONE]" {
        return Vec::new();
    }

    let Ok(event) = serde_json::from_str::<serde_json::Value>(data) else {
        tracing::debug!(data, "unparseable stream event");
        return Vec::new();
    };

    let Some(parts) = event
        .pointer("/candidates/0/content/parts")
        .and_then(|value| value.as_array())
    else {
        return Vec::new();
    };

    parts
        .iter()
        .filter_map(|part| part.get("text").and_then(|value| value.as_str()))
        .map(str::to_owned)
        .collect()
}

fn parse_error_message(raw_json: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(raw_json).ok()?;
    let message = value.get("error")?.get("message")?.as_str()?.to_owned();
    Some(message)
}
