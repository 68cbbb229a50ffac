// src/serve/http.rs
//
// Synchronous HTTP surface for the decision server.
//
// One dedicated thread serves requests over the shared, read-only decision
// core. Prometheus counters are exposed on /metrics; liveness and readiness
// are backed by atomics so an embedding process can flip them cheaply.

use std::io::Read;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::{SystemTime, UNIX_EPOCH};

use prometheus::{Encoder, IntCounter, IntGauge, Opts, Registry, TextEncoder};
use serde::Deserialize;
use serde_json::json;
use tiny_http::{Header, Method, Response, Server};

use crate::error::{Error, Result};
use crate::rl::policy::PolicyAdapter;
use crate::serve::{ComparisonEngine, DecisionServer};
use crate::types::Action;

/// Liveness / readiness flags shared with the embedding process.
#[derive(Debug, Clone)]
pub struct HealthState {
    healthy: Arc<AtomicBool>,
    ready: Arc<AtomicBool>,
}

impl Default for HealthState {
    fn default() -> Self {
        Self::new()
    }
}

impl HealthState {
    pub fn new() -> Self {
        Self {
            healthy: Arc::new(AtomicBool::new(true)),
            ready: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::Release);
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::Release);
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    pub fn is_healthy(&self) -> bool {
        self.healthy.load(Ordering::Acquire)
    }
}

/// Request counters for the serving surface.
#[derive(Clone)]
pub struct ServeMetrics {
    registry: Registry,
    predict_total: IntCounter,
    explain_total: IntCounter,
    evaluate_total: IntCounter,
    status_total: IntCounter,
    errors_total: IntCounter,
    last_request_ms: IntGauge,
}

impl Default for ServeMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ServeMetrics {
    pub fn new() -> Self {
        let registry = Registry::new();
        let predict_total =
            IntCounter::with_opts(Opts::new("aegis_predict_total", "Predict requests"))
                .expect("predict counter");
        let explain_total =
            IntCounter::with_opts(Opts::new("aegis_explain_total", "Explain requests"))
                .expect("explain counter");
        let evaluate_total =
            IntCounter::with_opts(Opts::new("aegis_evaluate_total", "Evaluate requests"))
                .expect("evaluate counter");
        let status_total =
            IntCounter::with_opts(Opts::new("aegis_model_status_total", "Status requests"))
                .expect("status counter");
        let errors_total =
            IntCounter::with_opts(Opts::new("aegis_errors_total", "Failed requests"))
                .expect("errors counter");
        let last_request_ms = IntGauge::with_opts(Opts::new(
            "aegis_last_request_ms",
            "Last request timestamp ms",
        ))
        .expect("request gauge");

        registry
            .register(Box::new(predict_total.clone()))
            .expect("reg predict");
        registry
            .register(Box::new(explain_total.clone()))
            .expect("reg explain");
        registry
            .register(Box::new(evaluate_total.clone()))
            .expect("reg evaluate");
        registry
            .register(Box::new(status_total.clone()))
            .expect("reg status");
        registry
            .register(Box::new(errors_total.clone()))
            .expect("reg errors");
        registry
            .register(Box::new(last_request_ms.clone()))
            .expect("reg gauge");

        Self {
            registry,
            predict_total,
            explain_total,
            evaluate_total,
            status_total,
            errors_total,
            last_request_ms,
        }
    }

    pub fn gather(&self) -> String {
        let mf = self.registry.gather();
        let mut buf = Vec::new();
        let encoder = TextEncoder::new();
        let _ = encoder.encode(&mf, &mut buf);
        String::from_utf8(buf).unwrap_or_default()
    }

    fn touch(&self) {
        let now_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0);
        self.last_request_ms.set(now_ms);
    }
}

#[derive(Debug, Deserialize)]
struct PredictRequest {
    observation: Vec<f64>,
    #[allow(dead_code)]
    session_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EvaluateRequest {
    observations: Vec<Vec<f64>>,
    actions: Vec<Vec<i64>>,
}

/// HTTP status for an error, per the serving contract: malformed input is
/// the caller's fault (422), a missing artifact is a degraded dependency
/// (503).
fn error_status(err: &Error) -> u16 {
    match err {
        Error::Configuration(_) => 400,
        Error::Validation(_) | Error::DimensionMismatch { .. } => 422,
        Error::ResourceUnavailable | Error::Transport(_) => 503,
    }
}

fn error_body(err: &Error) -> String {
    let kind = match err {
        Error::Configuration(_) => "configuration",
        Error::Validation(_) | Error::DimensionMismatch { .. } => "validation",
        Error::ResourceUnavailable => "resource_unavailable",
        Error::Transport(_) => "transport_unavailable",
    };
    json!({ "error": err.to_string(), "kind": kind }).to_string()
}

fn json_ok<T: serde::Serialize>(value: &T) -> (u16, String) {
    match serde_json::to_string(value) {
        Ok(body) => (200, body),
        Err(e) => (500, json!({ "error": e.to_string() }).to_string()),
    }
}

fn or_error(result: Result<(u16, String)>) -> (u16, String) {
    result.unwrap_or_else(|err| (error_status(&err), error_body(&err)))
}

/// Route one request to the decision core. Pure with respect to transport
/// so the dispatch table is testable without sockets.
fn route(
    server: &DecisionServer,
    compare: &ComparisonEngine,
    metrics: &ServeMetrics,
    health: &HealthState,
    method: &Method,
    url: &str,
    body: &str,
) -> (u16, String) {
    metrics.touch();

    let (status, payload) = match (method, url) {
        (Method::Get, "/") => json_ok(&json!({
            "service": "aegis decision server",
            "status": "running",
            "model_loaded": server.adapter().is_model_loaded(),
        })),
        (Method::Get, "/health") => {
            if health.is_healthy() {
                (200, "ok".to_string())
            } else {
                (503, "unhealthy".to_string())
            }
        }
        (Method::Get, "/ready") => {
            if health.is_ready() {
                (200, "ready".to_string())
            } else {
                (503, "not_ready".to_string())
            }
        }
        (Method::Get, "/metrics") => (200, metrics.gather()),
        (Method::Get, "/model/status") => {
            metrics.status_total.inc();
            json_ok(&server.model_status())
        }
        (Method::Post, "/predict") => {
            metrics.predict_total.inc();
            or_error(parse_body::<PredictRequest>(body).and_then(|req| {
                server.predict(&req.observation).map(|p| json_ok(&p))
            }))
        }
        (Method::Post, "/explain") => {
            metrics.explain_total.inc();
            or_error(parse_body::<PredictRequest>(body).and_then(|req| {
                server.explain(&req.observation).map(|e| json_ok(&e))
            }))
        }
        (Method::Post, "/evaluate") => {
            metrics.evaluate_total.inc();
            or_error(parse_body::<EvaluateRequest>(body).and_then(|req| {
                let space = server.adapter().action_space();
                let actions = req
                    .actions
                    .iter()
                    .map(|wire| space.decode(wire))
                    .collect::<Result<Vec<Action>>>()?;
                compare
                    .compare(&req.observations, &actions)
                    .map(|report| json_ok(&report))
            }))
        }
        _ => (404, json!({ "error": "not found" }).to_string()),
    };

    if status >= 400 {
        metrics.errors_total.inc();
    }
    (status, payload)
}

fn parse_body<T: for<'de> Deserialize<'de>>(body: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|e| Error::Validation(format!("malformed request: {e}")))
}

/// Serve requests on `addr` until the process exits. Blocks the calling
/// thread; use `start_decision_server` to run detached.
pub fn run_decision_server(
    addr: &str,
    adapter: Arc<PolicyAdapter>,
    metrics: ServeMetrics,
    health: HealthState,
) -> Result<()> {
    let server = Server::http(addr)
        .map_err(|e| Error::Transport(format!("cannot bind {addr}: {e}")))?;
    let decision = DecisionServer::new(Arc::clone(&adapter));
    let comparison = ComparisonEngine::new(adapter);

    for mut request in server.incoming_requests() {
        let mut body = String::new();
        let _ = request.as_reader().read_to_string(&mut body);

        let (status, payload) = route(
            &decision,
            &comparison,
            &metrics,
            &health,
            request.method(),
            request.url(),
            &body,
        );

        let content_type = if request.url() == "/metrics" {
            &b"text/plain; version=0.0.4"[..]
        } else {
            &b"application/json"[..]
        };
        let response = Response::from_string(payload)
            .with_status_code(status)
            .with_header(
                Header::from_bytes(&b"Content-Type"[..], content_type).expect("content type"),
            );
        let _ = request.respond(response);
    }
    Ok(())
}

/// Spawn the server on a background thread.
pub fn start_decision_server(
    addr: &str,
    adapter: Arc<PolicyAdapter>,
    metrics: ServeMetrics,
    health: HealthState,
) {
    let addr = addr.to_string();
    std::thread::spawn(move || {
        if let Err(err) = run_decision_server(&addr, adapter, metrics, health) {
            eprintln!("decision server stopped: {err}");
        }
    });
}
