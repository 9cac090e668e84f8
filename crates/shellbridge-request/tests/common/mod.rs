//! Shared fixtures for request pipeline integration tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use shellbridge_core::{ModeSignals, resolve};
use shellbridge_request::{
    HttpTransport, RequestPipeline, TransportError, TransportRequest, TransportResponse,
};
use shellbridge_session::SessionStore;

/// Transport returning scripted outcomes and recording every request.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    outcomes: Mutex<VecDeque<Result<TransportResponse, TransportError>>>,
    sent: Mutex<Vec<TransportRequest>>,
}

#[allow(dead_code)]
impl ScriptedTransport {
    pub fn with_outcomes(
        outcomes: impl IntoIterator<Item = Result<TransportResponse, TransportError>>,
    ) -> Arc<Self> {
        Arc::new(Self {
            outcomes: Mutex::new(outcomes.into_iter().collect()),
            sent: Mutex::new(Vec::new()),
        })
    }

    pub fn responding(status: u16, body: &str) -> Arc<Self> {
        Self::with_outcomes([Ok(TransportResponse {
            status,
            body: body.as_bytes().to_vec(),
        })])
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Self::with_outcomes([Err(TransportError(message.to_string()))])
    }

    pub fn sent(&self) -> Vec<TransportRequest> {
        self.sent.lock().expect("sent lock should work").clone()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        self.sent.lock().expect("sent lock should work").push(request);
        self.outcomes
            .lock()
            .expect("outcome lock should work")
            .pop_front()
            .unwrap_or_else(|| Err(TransportError("no scripted outcome".to_string())))
    }
}

/// Pipeline in connected mode against `https://api.example.com`.
pub fn connected_pipeline(
    transport: Arc<ScriptedTransport>,
    session: SessionStore,
) -> RequestPipeline {
    let config = resolve(&ModeSignals::production(Some("https://api.example.com")));
    RequestPipeline::new(config, session, transport)
}
