use error_stack::ResultExt;
use lazy_static::lazy_static;
use prometheus::{
    self, register_histogram_vec, register_int_counter_vec, Encoder, HistogramVec, IntCounterVec,
    TextEncoder,
};

// Define latency buckets for histograms
const LATENCY_BUCKETS: &[f64] = &[
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

// Registration only fails for duplicate or malformed metric names, both fixed at compile time.
#[allow(clippy::unwrap_used)]
lazy_static! {
    pub static ref CHECKOUT_API_CALLS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "CHECKOUT_API_CALLS_TOTAL",
        "Total number of Checkout API calls",
        &["flow", "method"]
    )
    .unwrap();
    pub static ref CHECKOUT_API_CALL_ERRORS: IntCounterVec = register_int_counter_vec!(
        "CHECKOUT_API_CALL_ERRORS",
        "Total number of failed Checkout API calls",
        &["flow", "error"]
    )
    .unwrap();
    pub static ref CHECKOUT_API_CALL_LATENCY: HistogramVec = register_histogram_vec!(
        "CHECKOUT_API_CALL_LATENCY_SECONDS",
        "Latency of Checkout API calls",
        &["flow"],
        LATENCY_BUCKETS.to_vec()
    )
    .unwrap();
    pub static ref STATUS_POLLS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "STATUS_POLLS_TOTAL",
        "Total number of payment status polls",
        &["result"]
    )
    .unwrap();
}

pub async fn metrics_handler() -> error_stack::Result<String, MetricsError> {
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    encoder
        .encode(&metric_families, &mut buffer)
        .change_context(MetricsError::EncodingError)?;
    String::from_utf8(buffer).change_context(MetricsError::Utf8Error)
}

#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    #[error("Error encoding metrics")]
    EncodingError,
    #[error("Error converting metrics to utf8")]
    Utf8Error,
}
