//! Recording transport for tests

use crate::mcp::protocol::JsonRpcError;
use crate::pubchem::request::PubChemRequest;
use crate::pubchem::transport::{Payload, PubChemTransport};
use crate::types::PubChemError;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Mutex;

#[derive(Debug, Clone)]
pub enum MockReply {
    Json(Value),
    Text(String),
    NotFound,
    Fail(u16),
    Timeout,
    Protocol(JsonRpcError),
}

/// Answers each request with the reply of the first route whose fragment
/// occurs in the request path. Unrouted requests fail with HTTP 500.
#[derive(Default)]
pub struct MockTransport {
    routes: Vec<(String, MockReply)>,
    calls: Mutex<Vec<PubChemRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(mut self, fragment: &str, reply: MockReply) -> Self {
        self.routes.push((fragment.to_string(), reply));
        self
    }

    pub fn calls(&self) -> Vec<PubChemRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn paths(&self) -> Vec<String> {
        self.calls().iter().map(PubChemRequest::path).collect()
    }
}

#[async_trait]
impl PubChemTransport for MockTransport {
    async fn send(&self, request: &PubChemRequest) -> Result<Payload, PubChemError> {
        self.calls.lock().unwrap().push(request.clone());

        let path = request.path();
        let reply = self
            .routes
            .iter()
            .find(|(fragment, _)| path.contains(fragment.as_str()))
            .map(|(_, reply)| reply.clone());

        match reply {
            Some(MockReply::Json(value)) => Ok(Payload::Json(value)),
            Some(MockReply::Text(text)) => Ok(Payload::Text(text)),
            Some(MockReply::NotFound) => Err(PubChemError::Upstream {
                status: 404,
                message: "No CID found".to_string(),
            }),
            Some(MockReply::Fail(status)) => Err(PubChemError::Upstream {
                status,
                message: "Server busy".to_string(),
            }),
            Some(MockReply::Timeout) => Err(PubChemError::Timeout(30)),
            Some(MockReply::Protocol(error)) => Err(PubChemError::Protocol(error)),
            None => Err(PubChemError::Upstream {
                status: 500,
                message: format!("no mock route for {}", path),
            }),
        }
    }
}
