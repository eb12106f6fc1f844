use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use lazy_static::lazy_static;

lazy_static! {
    /// Process-wide Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // Client metrics
    pub static ref CCR_SENT_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("dcca_ccr_sent_total", "Credit-Control requests sent"),
        &["request_type"]
    ).unwrap();

    pub static ref CCA_RECEIVED_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("dcca_cca_received_total", "Credit-Control answers received"),
        &["result_code"]
    ).unwrap();

    pub static ref ANSWER_TIMEOUTS_TOTAL: IntCounter = IntCounter::with_opts(
        Opts::new("dcca_answer_timeouts_total", "Requests whose answer did not arrive in time")
    ).unwrap();

    pub static ref ACTIVE_SESSIONS: IntGauge = IntGauge::with_opts(
        Opts::new("dcca_active_sessions", "Credit-control sessions currently held")
    ).unwrap();

    // Server metrics
    pub static ref CCR_HANDLED_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("dcca_ccr_handled_total", "Credit-Control requests answered"),
        &["request_type", "result_code"]
    ).unwrap();

    pub static ref REQUESTS_IGNORED_TOTAL: IntCounter = IntCounter::with_opts(
        Opts::new("dcca_requests_ignored_total", "Requests dropped without an answer")
    ).unwrap();

    pub static ref ACTIVE_CONNECTIONS: IntGauge = IntGauge::with_opts(
        Opts::new("dcca_active_connections", "Connected Diameter peers")
    ).unwrap();
}

/// Register all metrics with the registry. Repeated calls are no-ops.
pub fn register_metrics() {
    let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(CCR_SENT_TOTAL.clone()),
        Box::new(CCA_RECEIVED_TOTAL.clone()),
        Box::new(ANSWER_TIMEOUTS_TOTAL.clone()),
        Box::new(ACTIVE_SESSIONS.clone()),
        Box::new(CCR_HANDLED_TOTAL.clone()),
        Box::new(REQUESTS_IGNORED_TOTAL.clone()),
        Box::new(ACTIVE_CONNECTIONS.clone()),
    ];
    for collector in collectors {
        // AlreadyReg on the second call
        let _ = REGISTRY.register(collector);
    }
}

/// Gather metrics in Prometheus text format
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = vec![];
    if encoder.encode(&metric_families, &mut buffer).is_err() {
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}
