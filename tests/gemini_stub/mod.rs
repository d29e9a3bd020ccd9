use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use serde_json::Value;

/// In-process stand-in for the Gemini streaming endpoint.
///
/// Streams back one SSE `data:` event per configured fragment and records
/// each request body so tests can assert on the prompt that was sent.
pub struct GeminiStub {
    pub base_url: String,
    pub requests: Arc<Mutex<Vec<Value>>>,
    shutdown_tx: Option<mpsc::Sender<()>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl GeminiStub {
    pub fn spawn(fragments: Vec<String>) -> Self {
        let server = tiny_http::Server::http("127.0.0.1:0").expect("start gemini stub server");
        let addr = server.server_addr();
        let base_url = format!("http://{addr}");

        let requests: Arc<Mutex<Vec<Value>>> = Arc::new(Mutex::new(Vec::new()));
        let requests_handle = Arc::clone(&requests);

        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        let handle = thread::spawn(move || {
            loop {
                if shutdown_rx.try_recv().is_ok() {
                    break;
                }

                let mut request = match server.recv_timeout(Duration::from_millis(50)) {
                    Ok(Some(req)) => req,
                    Ok(None) => continue,
                    Err(_) => break,
                };

                if !request.url().contains(":streamGenerateContent") {
                    let _ = request.respond(
                        tiny_http::Response::from_string("not found").with_status_code(404),
                    );
                    continue;
                }

                let mut body = String::new();
                if request.as_reader().read_to_string(&mut body).is_err() {
                    let _ = request.respond(
                        tiny_http::Response::from_string("invalid request body")
                            .with_status_code(400),
                    );
                    continue;
                }
                let parsed: Value = serde_json::from_str(&body).unwrap_or(Value::Null);
                requests_handle
                    .lock()
                    .expect("lock captured requests")
                    .push(parsed);

                let mut sse = String::new();
                for fragment in &fragments {
                    let event = serde_json::json!({
                        "candidates": [{ "content": { "parts": [{ "text": fragment }] } }]
                    });
                    sse.push_str(&format!("data: {event}\n\n"));
                }

                let response = tiny_http::Response::from_string(sse).with_header(
                    tiny_http::Header::from_bytes(&b"Content-Type"[..], &b"text/event-stream"[..])
                        .expect("content type header"),
                );
                let _ = request.respond(response);
            }
        });

        Self {
            base_url,
            requests,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        }
    }

    pub fn captured(&self) -> Vec<Value> {
        self.requests
            .lock()
            .expect("lock captured requests")
            .clone()
    }
}

impl Drop for GeminiStub {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
