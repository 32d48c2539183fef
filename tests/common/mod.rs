//! Shared test doubles: a scriptable in-memory HAL and a WebSocket HAL server.

#![allow(dead_code)]

use futures_util::{SinkExt, StreamExt};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use vibrator_hal::{
    ApiError, CallbackScheduler, Capabilities, CompletionCallback, CompositeEffect, Effect,
    EffectStrength, ErrorCode, HalConnector, HalError, HalResult, HalWrapper, Request, Response,
    ResponseMeta,
};

pub const MOCK_EFFECT_DURATION: Duration = Duration::from_millis(20);
pub const MOCK_PRIMITIVE_DURATION_MS: u64 = 10;

/// Knobs and records shared by a [`MockConnector`] and every [`MockHal`] it opens
#[derive(Default)]
pub struct MockState {
    connects: AtomicUsize,
    failing_connects: AtomicUsize,
    connect_delay: Mutex<Duration>,
    outcomes: Mutex<VecDeque<HalError>>,
    calls: Mutex<Vec<(usize, &'static str)>>,
    gate: Mutex<Option<Arc<Notify>>>,
}

impl MockState {
    /// Number of connection attempts so far
    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn fail_next_connects(&self, count: usize) {
        self.failing_connects.store(count, Ordering::SeqCst);
    }

    pub fn set_connect_delay(&self, delay: Duration) {
        *self.connect_delay.lock().unwrap() = delay;
    }

    /// Make the next HAL call (on any session) fail with `err`
    pub fn push_failure(&self, err: HalError) {
        self.outcomes.lock().unwrap().push_back(err);
    }

    /// `(session id, method)` for every HAL call made
    pub fn calls(&self) -> Vec<(usize, &'static str)> {
        self.calls.lock().unwrap().clone()
    }

    /// Block the next HAL call until the returned notify fires
    pub fn hold_next_call(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.gate.lock().unwrap() = Some(gate.clone());
        gate
    }
}

pub struct MockHal {
    pub id: usize,
    state: Arc<MockState>,
}

impl MockHal {
    async fn record(&self, name: &'static str) -> HalResult<()> {
        self.state.calls.lock().unwrap().push((self.id, name));
        let gate = self.state.gate.lock().unwrap().take();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        let outcome = self.state.outcomes.lock().unwrap().pop_front();
        match outcome {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl HalWrapper for MockHal {
    async fn ping(&self) -> HalResult<()> {
        self.record("ping").await
    }

    async fn on(&self, _timeout: Duration) -> HalResult<()> {
        self.record("on").await
    }

    async fn off(&self) -> HalResult<()> {
        self.record("off").await
    }

    async fn set_amplitude(&self, _amplitude: i32) -> HalResult<()> {
        self.record("set_amplitude").await
    }

    async fn set_external_control(&self, _enabled: bool) -> HalResult<()> {
        self.record("set_external_control").await
    }

    async fn always_on_enable(
        &self,
        _id: i32,
        _effect: Effect,
        _strength: EffectStrength,
    ) -> HalResult<()> {
        self.record("always_on_enable").await
    }

    async fn always_on_disable(&self, _id: i32) -> HalResult<()> {
        self.record("always_on_disable").await
    }

    async fn get_capabilities(&self) -> HalResult<Capabilities> {
        self.record("get_capabilities").await?;
        Ok(Capabilities::AMPLITUDE_CONTROL
            | Capabilities::EXTERNAL_CONTROL
            | Capabilities::COMPOSE_EFFECTS)
    }

    async fn get_supported_effects(&self) -> HalResult<Vec<Effect>> {
        self.record("get_supported_effects").await?;
        Ok(vec![Effect::Click, Effect::Tick])
    }

    async fn perform_effect(&self, _effect: Effect, _strength: EffectStrength) -> HalResult<Duration> {
        self.record("perform_effect").await?;
        Ok(MOCK_EFFECT_DURATION)
    }

    async fn perform_composed_effect(&self, primitives: &[CompositeEffect]) -> HalResult<Duration> {
        self.record("perform_composed_effect").await?;
        let total_ms: u64 = primitives
            .iter()
            .map(|p| p.delay_ms.max(0) as u64 + MOCK_PRIMITIVE_DURATION_MS)
            .sum();
        Ok(Duration::from_millis(total_ms))
    }
}

pub struct MockConnector {
    pub state: Arc<MockState>,
}

impl MockConnector {
    pub fn new() -> (Self, Arc<MockState>) {
        let state = Arc::new(MockState::default());
        (
            Self {
                state: state.clone(),
            },
            state,
        )
    }
}

impl HalConnector for MockConnector {
    type Hal = MockHal;

    async fn connect(&self, _scheduler: Arc<CallbackScheduler>) -> HalResult<MockHal> {
        let delay = *self.state.connect_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let id = self.state.connects.fetch_add(1, Ordering::SeqCst) + 1;
        let should_fail = self
            .state
            .failing_connects
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if should_fail {
            return Err(HalError::Unavailable("vibrator service not found".to_string()));
        }
        Ok(MockHal {
            id,
            state: self.state.clone(),
        })
    }
}

/// Callback that counts how often it fired
pub fn counting_callback() -> (Arc<AtomicUsize>, CompletionCallback) {
    let count = Arc::new(AtomicUsize::new(0));
    let cb_count = count.clone();
    let callback: CompletionCallback = Arc::new(move || {
        cb_count.fetch_add(1, Ordering::SeqCst);
    });
    (count, callback)
}

/// Successful answer to `request`
pub fn ok_response(request: &Request, data: Option<serde_json::Value>) -> Response {
    Response {
        meta: ResponseMeta {
            id: request.id(),
            method: Some(request.method()),
        },
        data,
        errors: None,
    }
}

/// Error answer to `request`
pub fn error_response(request: &Request, code: ErrorCode, detail: &str) -> Response {
    Response {
        meta: ResponseMeta {
            id: request.id(),
            method: Some(request.method()),
        },
        data: None,
        errors: Some(vec![ApiError {
            code,
            detail: detail.to_string(),
        }]),
    }
}

/// What the test server does with one request
pub enum Reply {
    Respond(Response),
    Ignore,
    Close,
}

/// In-process WebSocket HAL service
pub struct TestServer {
    pub url: String,
    connections: Arc<AtomicUsize>,
    task: JoinHandle<()>,
}

impl TestServer {
    pub async fn start<H>(handler: H) -> Self
    where
        H: Fn(&Request) -> Reply + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("ws://{}", listener.local_addr().unwrap());
        let handler = Arc::new(handler);
        let connections = Arc::new(AtomicUsize::new(0));

        let accepted = connections.clone();
        let task = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                accepted.fetch_add(1, Ordering::SeqCst);
                let handler = handler.clone();
                tokio::spawn(async move {
                    let Ok(mut ws) = tokio_tungstenite::accept_async(stream).await else {
                        return;
                    };
                    while let Some(Ok(msg)) = ws.next().await {
                        let Message::Text(text) = msg else {
                            continue;
                        };
                        let request: Request = serde_json::from_str(&text).unwrap();
                        match handler(&request) {
                            Reply::Respond(response) => {
                                let json = serde_json::to_string(&response).unwrap();
                                if ws.send(Message::Text(json)).await.is_err() {
                                    break;
                                }
                            }
                            Reply::Ignore => {}
                            Reply::Close => break,
                        }
                    }
                });
            }
        });

        Self {
            url,
            connections,
            task,
        }
    }

    /// Number of WebSocket clients accepted so far
    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}
