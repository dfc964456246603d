//! Prometheus metrics for parlord.
//!
//! Tracks session lifecycle, room churn, command throughput, and broadcast
//! fan-out. Exposed on the `/metrics` HTTP endpoint (see [`crate::http`]);
//! recording helpers are no-ops until [`init`] runs, so library consumers
//! and unit tests pay nothing.

use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use std::sync::OnceLock;

/// Global Prometheus registry for all metrics.
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

pub fn registry() -> &'static Registry {
    REGISTRY.get_or_init(Registry::new)
}

// ========================================================================
// Counters (monotonic increasing)
// ========================================================================

/// Total chat messages broadcast to rooms.
pub static MESSAGES_SENT: OnceLock<IntCounter> = OnceLock::new();

/// Total connections rejected at admission (server full).
pub static SESSIONS_REJECTED: OnceLock<IntCounter> = OnceLock::new();

/// Commands processed by type.
pub static COMMAND_COUNTER: OnceLock<IntCounterVec> = OnceLock::new();

/// Command errors by command and error kind.
pub static COMMAND_ERRORS: OnceLock<IntCounterVec> = OnceLock::new();

// ========================================================================
// Gauges (can increase/decrease)
// ========================================================================

/// Currently connected sessions.
pub static CONNECTED_SESSIONS: OnceLock<IntGauge> = OnceLock::new();

/// Currently active rooms.
pub static ACTIVE_ROOMS: OnceLock<IntGauge> = OnceLock::new();

// ========================================================================
// Histograms
// ========================================================================

/// Recipients per room broadcast.
pub static MESSAGE_FANOUT: OnceLock<Histogram> = OnceLock::new();

/// Initialize the Prometheus metrics registry.
///
/// Must be called once at server startup before any metrics are recorded.
pub fn init() {
    let r = registry();

    macro_rules! register {
        ($metric:ident, $init:expr) => {
            let m = $init.expect(concat!(stringify!($metric), " creation failed"));
            if let Err(e) = r.register(Box::new(m.clone())) {
                tracing::warn!(error = %e, concat!("Failed to register metric ", stringify!($metric)));
            }
            let _ = $metric.set(m);
        };
    }

    register!(
        MESSAGES_SENT,
        IntCounter::new("chat_messages_sent_total", "Chat messages broadcast to rooms")
    );
    register!(
        SESSIONS_REJECTED,
        IntCounter::new(
            "chat_sessions_rejected_total",
            "Connections rejected at admission"
        )
    );
    register!(
        COMMAND_COUNTER,
        IntCounterVec::new(
            Opts::new("chat_command_total", "Commands processed by type"),
            &["command"]
        )
    );
    register!(
        COMMAND_ERRORS,
        IntCounterVec::new(
            Opts::new("chat_command_errors_total", "Command errors by type"),
            &["command", "error"]
        )
    );
    register!(
        CONNECTED_SESSIONS,
        IntGauge::new("chat_connected_sessions", "Currently connected sessions")
    );
    register!(
        ACTIVE_ROOMS,
        IntGauge::new("chat_active_rooms", "Currently active rooms")
    );
    register!(
        MESSAGE_FANOUT,
        Histogram::with_opts(
            HistogramOpts::new("chat_message_fanout", "Recipients per room broadcast")
                .buckets(vec![0.0, 1.0, 2.0, 5.0, 10.0, 20.0, 40.0])
        )
    );
}

/// Gather all metrics and encode them in Prometheus text format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = registry().gather();
    let mut buffer = vec![];
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode Prometheus metrics");
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

// ============================================================================
// Recording helpers
// ============================================================================

#[inline]
pub fn record_command(command: &str) {
    if let Some(c) = COMMAND_COUNTER.get() {
        c.with_label_values(&[command]).inc();
    }
}

#[inline]
pub fn record_command_error(command: &str, error: &str) {
    if let Some(c) = COMMAND_ERRORS.get() {
        c.with_label_values(&[command, error]).inc();
    }
}

#[inline]
pub fn record_fanout(recipients: usize) {
    if let Some(h) = MESSAGE_FANOUT.get() {
        h.observe(recipients as f64);
    }
}

#[inline]
pub fn message_sent() {
    if let Some(c) = MESSAGES_SENT.get() {
        c.inc();
    }
}

#[inline]
pub fn session_rejected() {
    if let Some(c) = SESSIONS_REJECTED.get() {
        c.inc();
    }
}

#[inline]
pub fn session_connected() {
    if let Some(g) = CONNECTED_SESSIONS.get() {
        g.inc();
    }
}

#[inline]
pub fn session_closed() {
    if let Some(g) = CONNECTED_SESSIONS.get() {
        g.dec();
    }
}

#[inline]
pub fn room_opened() {
    if let Some(g) = ACTIVE_ROOMS.get() {
        g.inc();
    }
}

#[inline]
pub fn room_closed() {
    if let Some(g) = ACTIVE_ROOMS.get() {
        g.dec();
    }
}
