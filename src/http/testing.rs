//! Scripted transport for controller tests

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::RequestError;
use crate::http::transport::{Transport, TransportRequest, TransportResponse};

struct Scripted {
    delay: Duration,
    outcome: Result<TransportResponse, RequestError>,
}

/// Answers requests in the order they arrive, each after its own delay
#[derive(Default)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<TransportRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, delay_ms: u64, status: u16, body: Value) -> Self {
        self.push(delay_ms, Ok(TransportResponse { status, body }))
    }

    pub fn fail(self, delay_ms: u64, error: RequestError) -> Self {
        self.push(delay_ms, Err(error))
    }

    fn push(self, delay_ms: u64, outcome: Result<TransportResponse, RequestError>) -> Self {
        self.script.lock().unwrap().push_back(Scripted {
            delay: Duration::from_millis(delay_ms),
            outcome,
        });
        self
    }

    pub fn requests(&self) -> Vec<TransportRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn query_value(&self, index: usize, key: &str) -> Option<String> {
        self.requests()
            .get(index)?
            .query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, RequestError> {
        self.requests.lock().unwrap().push(request);
        let next = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .expect("no scripted response left");
        tokio::time::sleep(next.delay).await;
        next.outcome
    }
}
