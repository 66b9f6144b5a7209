use once_cell::sync::Lazy;
use prometheus::{register_int_counter_vec, Encoder, IntCounterVec, TextEncoder};

// Prometheus metrics (default registry)
pub static REMOTE_FAILURES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "console_remote_failures_total",
        "Backend calls that failed and were not surfaced as errors",
        &["operation"]
    )
    .expect("register remote_failures_total")
});

pub static LOGIN_ATTEMPTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "console_login_attempts_total",
        "Password sign-in attempts by outcome",
        &["outcome"]
    )
    .expect("register login_attempts_total")
});

pub static RECORD_MUTATIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "console_record_mutations_total",
        "Successful record mutations by collection and kind",
        &["collection", "kind"]
    )
    .expect("register record_mutations_total")
});

pub fn record_remote_failure(operation: &str) {
    REMOTE_FAILURES_TOTAL.with_label_values(&[operation]).inc();
}

pub fn record_login_attempt(success: bool) {
    let outcome = if success { "success" } else { "failure" };
    LOGIN_ATTEMPTS_TOTAL.with_label_values(&[outcome]).inc();
}

pub fn record_mutation(collection: &str, kind: &str) {
    RECORD_MUTATIONS_TOTAL.with_label_values(&[collection, kind]).inc();
}

/// Render the default registry in the Prometheus text format.
/// Returns `Err` with a message when encoding fails.
pub fn encode_metrics() -> Result<String, String> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| format!("metrics encode error: {e}"))?;
    Ok(String::from_utf8(buffer).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_show_up_in_text_output() {
        record_remote_failure("list");
        record_login_attempt(false);
        record_mutation("projects", "insert");
        let text = encode_metrics().unwrap();
        assert!(text.contains("console_remote_failures_total"));
        assert!(text.contains("operation=\"list\""));
        assert!(text.contains("console_login_attempts_total"));
        assert!(text.contains("console_record_mutations_total"));
    }
}
