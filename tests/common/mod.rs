//! Shared test utilities and fixtures
//!
//! Oracles and mock servers used by the integration suite.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use aether_engine::{Engine, EngineSettings, MergeStart};
use aether_providers::gemini::{GeminiOracle, GeminiSettings};
use aether_providers::retry::RetryConfig;
use aether_providers::{ApiKey, Oracle, OracleError, OracleFut, OracleVerdict};
use aether_types::{InstanceId, KindId, Position, TokenKind};
use tokio::sync::Semaphore;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// What a [`StubOracle`] answers.
#[derive(Debug, Clone)]
pub enum Answer {
    Discover(TokenKind),
    Nothing,
    Fail,
}

/// Oracle with a fixed answer that only responds once the test opens its gate.
pub struct StubOracle {
    answer: Answer,
    gate: Semaphore,
    calls: AtomicUsize,
}

impl StubOracle {
    pub fn answering(answer: Answer) -> Arc<Self> {
        Arc::new(Self {
            answer,
            gate: Semaphore::new(Semaphore::MAX_PERMITS),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn held(answer: Answer) -> Arc<Self> {
        Arc::new(Self {
            answer,
            gate: Semaphore::new(0),
            calls: AtomicUsize::new(0),
        })
    }

    /// Let `count` waiting calls answer.
    pub fn open(&self, count: usize) {
        self.gate.add_permits(count);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Oracle for StubOracle {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn combine<'a>(&'a self, _a: &'a TokenKind, _b: &'a TokenKind) -> OracleFut<'a> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.gate
                .acquire()
                .await
                .map_err(|e| OracleError::Unavailable(e.to_string()))?
                .forget();
            match &self.answer {
                Answer::Discover(kind) => Ok(OracleVerdict::Discovered(kind.clone())),
                Answer::Nothing => Ok(OracleVerdict::NoCombination),
                Answer::Fail => Err(OracleError::Transport {
                    attempts: 1,
                    message: "connection refused".to_string(),
                }),
            }
        })
    }
}

pub fn mud_pie() -> TokenKind {
    TokenKind::new(
        KindId::from_display_name("Mud Pie").unwrap(),
        "Mud Pie",
        "🥧",
        "#92400e",
        "Not for eating.",
    )
}

pub fn engine(oracle: Arc<dyn Oracle>) -> Engine {
    Engine::new(oracle, EngineSettings::default())
}

pub fn kind(id: &'static str) -> KindId {
    KindId::known(id)
}

pub fn surface_kinds(engine: &Engine) -> Vec<String> {
    engine
        .instances()
        .iter()
        .map(|instance| instance.kind.as_str().to_string())
        .collect()
}

/// Produce `mud` through the seeded recipe, then put a second `mud` and a
/// `fire` on the surface. `mud + fire` has no recipe.
///
/// Returns `(mud, fire)` at (100, 100) and (140, 120).
pub fn uncached_pair(engine: &mut Engine) -> (InstanceId, InstanceId) {
    let earth = engine.place(&kind("earth"), Position::new(500.0, 500.0)).unwrap();
    let water = engine.place(&kind("water"), Position::new(520.0, 500.0)).unwrap();
    let Some(MergeStart::Combined { instance, .. }) = engine.resolve(earth, water) else {
        panic!("earth + water is a seeded recipe");
    };
    engine.move_instance(instance, Position::new(100.0, 100.0));
    let fire = engine.place(&kind("fire"), Position::new(140.0, 120.0)).unwrap();
    engine.take_cues();
    (instance, fire)
}

// ============================================================================
// Gemini mock
// ============================================================================

pub async fn start_gemini_mock() -> MockServer {
    MockServer::start().await
}

/// Mount a `generateContent` response whose text part is `payload` serialized.
pub async fn mount_gemini_answer(server: &MockServer, payload: serde_json::Value) {
    let body = serde_json::json!({
        "candidates": [{
            "content": { "parts": [{ "text": payload.to_string() }] },
            "finishReason": "STOP"
        }]
    });

    Mock::given(method("POST"))
        .and(path("/models/gemini-2.5-flash:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

pub async fn mount_gemini_status(server: &MockServer, status: u16) {
    Mock::given(method("POST"))
        .and(path("/models/gemini-2.5-flash:generateContent"))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

pub fn gemini_oracle(server: &MockServer) -> Arc<dyn Oracle> {
    let settings = GeminiSettings::new(ApiKey::new("test-key").unwrap())
        .with_base_url(server.uri())
        .with_retry(RetryConfig::default().with_max_retries(0));
    Arc::new(GeminiOracle::new(settings).unwrap())
}
