//! Recording requester used by the façade's unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;
use tokio::time::Instant;
use volume::{ApiRequest, RequestError, Requester};

/// One request seen by [`ScriptedRequester`], with the (tokio) time it arrived.
#[derive(Debug, Clone)]
pub(crate) struct RecordedCall {
    pub request: ApiRequest,
    pub at: Instant,
}

/// Replays a fixed script of responses in order and records every request.
///
/// Running past the end of the script yields a transport error so a test
/// that issues unexpected calls fails loudly.
pub(crate) struct ScriptedRequester {
    script: Mutex<VecDeque<Result<Value, RequestError>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedRequester {
    pub fn new(script: Vec<Result<Value, RequestError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Requester for ScriptedRequester {
    async fn request(&self, request: ApiRequest) -> Result<Value, RequestError> {
        self.calls.lock().unwrap().push(RecordedCall {
            request,
            at: Instant::now(),
        });
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(RequestError::Transport {
                    message: "script exhausted".into(),
                })
            })
    }
}
