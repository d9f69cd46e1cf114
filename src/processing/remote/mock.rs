//! Mock HTTP client for testing.
//!
//! Responses are registered against a key that matches either a fragment of
//! the request URL or the file name of the uploaded part. Each key holds a
//! queue; the last response of a queue is repeated for further calls.
//!
//! # Example
//! ```ignore
//! let mock = MockHttpClient::new();
//! mock.add_response("/to/png", HttpResponse::new(200, body));
//! mock.add_response("broken.jpg", HttpResponse::new(401, Bytes::new()));
//! ```

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::oneshot;

use super::client::{HttpClient, HttpResponse, MultipartRequest};
use crate::utils::TransportError;

enum MockResponse {
    Immediate(Result<HttpResponse, TransportError>),
    /// Held until the paired sender fires (or is dropped)
    Gated {
        response: Result<HttpResponse, TransportError>,
        gate: Option<oneshot::Receiver<()>>,
    },
}

#[derive(Clone, Default)]
pub struct MockHttpClient {
    responses: Arc<Mutex<Vec<(String, VecDeque<MockResponse>)>>>,
    calls: Arc<Mutex<Vec<MultipartRequest>>>,
    in_flight: Arc<AtomicUsize>,
}

impl MockHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_response(&self, key: &str, response: HttpResponse) {
        self.push(key, MockResponse::Immediate(Ok(response)));
    }

    pub fn add_transport_error(&self, key: &str, message: &str) {
        self.push(key, MockResponse::Immediate(Err(TransportError(message.to_string()))));
    }

    /// Registers a response that is only delivered once the returned sender fires.
    pub fn add_gated_response(&self, key: &str, response: HttpResponse) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.push(
            key,
            MockResponse::Gated {
                response: Ok(response),
                gate: Some(rx),
            },
        );
        tx
    }

    /// Requests received so far, in arrival order
    pub fn calls(&self) -> Vec<MultipartRequest> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Requests currently waiting on a gate
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    fn push(&self, key: &str, response: MockResponse) {
        let mut responses = self.responses.lock();
        match responses.iter_mut().find(|(k, _)| k == key) {
            Some((_, queue)) => queue.push_back(response),
            None => responses.push((key.to_string(), VecDeque::from([response]))),
        }
    }

    fn take(&self, request: &MultipartRequest) -> Option<MockResponse> {
        let mut responses = self.responses.lock();
        // File-name keys are more specific than URL fragments
        let index = responses
            .iter()
            .position(|(key, _)| request.file_name() == Some(key.as_str()))
            .or_else(|| responses.iter().position(|(key, _)| request.url.contains(key.as_str())))?;

        let queue = &mut responses[index].1;
        if queue.len() > 1 {
            return queue.pop_front();
        }
        match queue.front() {
            Some(MockResponse::Immediate(result)) => Some(MockResponse::Immediate(result.clone())),
            // A gate can only be consumed once
            Some(MockResponse::Gated { .. }) => queue.pop_front(),
            None => None,
        }
    }
}

#[async_trait]
impl HttpClient for MockHttpClient {
    async fn post_multipart(&self, request: MultipartRequest) -> Result<HttpResponse, TransportError> {
        let response = self.take(&request);
        let url = request.url.clone();
        self.calls.lock().push(request);

        match response {
            Some(MockResponse::Immediate(result)) => result,
            Some(MockResponse::Gated { response, gate }) => {
                self.in_flight.fetch_add(1, Ordering::SeqCst);
                if let Some(gate) = gate {
                    let _ = gate.await;
                }
                self.in_flight.fetch_sub(1, Ordering::SeqCst);
                response
            }
            None => Err(TransportError(format!("no mock response for {url}"))),
        }
    }
}
