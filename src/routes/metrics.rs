use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

/// Install the global Prometheus recorder and describe the job metrics.
///
/// Can only succeed once per process.
pub fn install_recorder() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;

    metrics::describe_counter!("image_jobs_total", "Jobs accepted, by requested kind");
    metrics::describe_counter!(
        "image_jobs_failed_total",
        "Jobs aborted while producing variants, by requested kind"
    );
    metrics::describe_counter!(
        "image_variants_created_total",
        "Variant images stored, by image kind"
    );
    metrics::describe_histogram!(
        "image_job_processing_seconds",
        "Time to produce and store every variant of a job"
    );

    Ok(handle)
}

/// GET /metrics: Prometheus text exposition format.
pub async fn prometheus_metrics(State(handle): State<Arc<PrometheusHandle>>) -> impl IntoResponse {
    handle.render()
}
