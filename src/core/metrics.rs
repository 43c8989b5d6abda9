use std::sync::OnceLock;
use std::time::Duration;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::core::config::Settings;

static PROM_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

pub(crate) fn init(settings: &Settings) -> anyhow::Result<()> {
    if !settings.telemetry().prometheus_enabled {
        return Ok(());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    let _ = PROM_HANDLE.set(handle);
    Ok(())
}

pub(crate) fn render() -> Option<String> {
    PROM_HANDLE.get().map(|handle| handle.render())
}

pub(crate) fn record_store_call(operation: &'static str, outcome: &'static str, elapsed: Duration) {
    metrics::counter!(
        "edumon_store_requests_total",
        "operation" => operation,
        "outcome" => outcome
    )
    .increment(1);
    metrics::histogram!("edumon_store_request_duration_seconds", "operation" => operation)
        .record(elapsed.as_secs_f64());
}

pub(crate) fn record_action(action: &'static str, outcome: &'static str) {
    metrics::counter!("edumon_submission_actions_total", "action" => action, "outcome" => outcome)
        .increment(1);
}
