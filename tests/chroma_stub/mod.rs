use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use serde_json::Value;

pub const COLLECTION_ID: &str = "c0ffee-collection";

/// One captured request: URL path and parsed JSON body.
pub type CapturedRequest = (String, Value);

/// In-process stand-in for a Chroma server.
///
/// Answers the collection lookup with a fixed id, acknowledges `add` calls,
/// replies to `query` calls with the configured response, and records every
/// request body for later assertions.
pub struct ChromaStub {
    pub base_url: String,
    pub requests: Arc<Mutex<Vec<CapturedRequest>>>,
    shutdown_tx: Option<mpsc::Sender<()>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl ChromaStub {
    pub fn spawn(query_response: Value) -> Self {
        let server = tiny_http::Server::http("127.0.0.1:0").expect("start chroma stub server");
        let addr = server.server_addr();
        let base_url = format!("http://{addr}");

        let requests: Arc<Mutex<Vec<CapturedRequest>>> = Arc::new(Mutex::new(Vec::new()));
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

                let path = request.url().to_string();
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
                    .push((path.clone(), parsed));

                let response_body = if path == "/api/v1/collections" {
                    serde_json::json!({ "id": COLLECTION_ID, "name": "stub" }).to_string()
                } else if path == format!("/api/v1/collections/{COLLECTION_ID}/add") {
                    "true".to_string()
                } else if path == format!("/api/v1/collections/{COLLECTION_ID}/query") {
                    query_response.to_string()
                } else {
                    let _ = request.respond(
                        tiny_http::Response::from_string("not found").with_status_code(404),
                    );
                    continue;
                };

                let response = tiny_http::Response::from_string(response_body).with_header(
                    tiny_http::Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..])
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

    pub fn captured(&self) -> Vec<CapturedRequest> {
        self.requests
            .lock()
            .expect("lock captured requests")
            .clone()
    }
}

impl Drop for ChromaStub {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
