//! Prometheus metrics for plugbot.
//!
//! Exposed on the `/metrics` endpoint when `[metrics] port` is set.
//!
//! - `plugbot_dispatch_total{outcome}` - messages by terminal dispatch state
//! - `plugbot_command_total{path}` - handler runs by command path
//! - `plugbot_command_duration_seconds{path}` - handler latency
//! - `plugbot_handler_faults_total{path,error}` - failed or panicked handlers
//! - `plugbot_plugins_loaded` - currently loaded plugins
//! - `plugbot_plugin_ops_total{op,result}` - load / unload / reload results
//! - `plugbot_saves_total{plugin,result}` - save hook results
//! - `plugbot_autosave_runs_total{result}` - autosave passes
//! - `plugbot_pending_waits` - outstanding follow-up waits
//!
//! Recording before [`init`] is a no-op, which keeps unit tests free of
//! global setup.

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};
use std::sync::OnceLock;

/// Global Prometheus registry for all metrics.
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

pub fn registry() -> &'static Registry {
    REGISTRY.get_or_init(Registry::new)
}

// ========================================================================
// Counters
// ========================================================================

/// Messages by terminal dispatch state.
pub static DISPATCH_OUTCOMES: OnceLock<IntCounterVec> = OnceLock::new();

/// Handler runs by command path.
pub static COMMAND_COUNTER: OnceLock<IntCounterVec> = OnceLock::new();

/// Handlers that returned an error or panicked.
pub static HANDLER_FAULTS: OnceLock<IntCounterVec> = OnceLock::new();

/// Registry operations by result.
pub static PLUGIN_OPS: OnceLock<IntCounterVec> = OnceLock::new();

/// Save hook runs by plugin and result.
pub static SAVES: OnceLock<IntCounterVec> = OnceLock::new();

/// Autosave passes by result (`clean` or `partial`).
pub static AUTOSAVE_RUNS: OnceLock<IntCounterVec> = OnceLock::new();

// ========================================================================
// Gauges
// ========================================================================

pub static PLUGINS_LOADED: OnceLock<IntGauge> = OnceLock::new();

pub static PENDING_WAITS: OnceLock<IntGauge> = OnceLock::new();

// ========================================================================
// Histograms
// ========================================================================

/// Handler latency by command path.
pub static COMMAND_LATENCY: OnceLock<HistogramVec> = OnceLock::new();

/// Initialize the Prometheus metrics registry.
///
/// Call once at startup before serving `/metrics`.
pub fn init() {
    let r = registry();

    macro_rules! register {
        ($metric:ident, $init:expr) => {
            match $init {
                Ok(m) => {
                    if let Err(e) = r.register(Box::new(m.clone())) {
                        tracing::warn!(error = %e, concat!("Failed to register metric ", stringify!($metric)));
                    }
                    let _ = $metric.set(m);
                }
                Err(e) => {
                    tracing::error!(error = %e, concat!("Failed to create metric ", stringify!($metric)));
                }
            }
        };
    }

    register!(DISPATCH_OUTCOMES, IntCounterVec::new(Opts::new("plugbot_dispatch_total", "Messages by dispatch outcome"), &["outcome"]));
    register!(COMMAND_COUNTER, IntCounterVec::new(Opts::new("plugbot_command_total", "Command handler runs by path"), &["path"]));
    register!(COMMAND_LATENCY, HistogramVec::new(
        HistogramOpts::new("plugbot_command_duration_seconds", "Command handler latency by path")
            .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 30.0]),
        &["path"]));
    register!(HANDLER_FAULTS, IntCounterVec::new(Opts::new("plugbot_handler_faults_total", "Failed or panicked command handlers"), &["path", "error"]));
    register!(PLUGIN_OPS, IntCounterVec::new(Opts::new("plugbot_plugin_ops_total", "Plugin registry operations"), &["op", "result"]));
    register!(SAVES, IntCounterVec::new(Opts::new("plugbot_saves_total", "Plugin save hook runs"), &["plugin", "result"]));
    register!(AUTOSAVE_RUNS, IntCounterVec::new(Opts::new("plugbot_autosave_runs_total", "Autosave passes"), &["result"]));
    register!(PLUGINS_LOADED, IntGauge::new("plugbot_plugins_loaded", "Currently loaded plugins"));
    register!(PENDING_WAITS, IntGauge::new("plugbot_pending_waits", "Outstanding follow-up waits"));
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
    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Prometheus metrics were not valid UTF-8");
            String::new()
        }
    }
}

// ============================================================================
// Update helpers
// ============================================================================

#[inline]
fn inc(metric: &OnceLock<IntCounterVec>, labels: &[&str]) {
    if let Some(c) = metric.get() {
        c.with_label_values(labels).inc();
    }
}

#[inline]
fn set_gauge(metric: &OnceLock<IntGauge>, value: usize) {
    if let Some(g) = metric.get() {
        g.set(i64::try_from(value).unwrap_or(i64::MAX));
    }
}

/// Record the terminal state of one dispatch.
#[inline]
pub fn record_dispatch(outcome: &str) {
    inc(&DISPATCH_OUTCOMES, &[outcome]);
}

/// Record a handler run with latency.
#[inline]
pub fn record_command(path: &str, duration_secs: f64) {
    inc(&COMMAND_COUNTER, &[path]);
    if let Some(h) = COMMAND_LATENCY.get() {
        h.with_label_values(&[path]).observe(duration_secs);
    }
}

#[inline]
pub fn record_handler_fault(path: &str, error: &str) {
    inc(&HANDLER_FAULTS, &[path, error]);
}

#[inline]
pub fn record_plugin_op(op: &str, result: &str) {
    inc(&PLUGIN_OPS, &[op, result]);
}

#[inline]
pub fn record_save(plugin: &str, ok: bool) {
    inc(&SAVES, &[plugin, if ok { "ok" } else { "failed" }]);
}

#[inline]
pub fn record_autosave(clean: bool) {
    inc(&AUTOSAVE_RUNS, &[if clean { "clean" } else { "partial" }]);
}

#[inline]
pub fn set_plugins_loaded(count: usize) {
    set_gauge(&PLUGINS_LOADED, count);
}

#[inline]
pub fn set_pending_waits(count: usize) {
    set_gauge(&PENDING_WAITS, count);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_lifecycle() {
        init();

        record_command("roll", 0.001);
        record_dispatch("dispatched");
        set_plugins_loaded(2);

        let output = gather_metrics();
        assert!(output.contains("plugbot_command_total"));
        assert!(output.contains("plugbot_dispatch_total"));
        assert!(output.contains("plugbot_plugins_loaded"));
    }
}
