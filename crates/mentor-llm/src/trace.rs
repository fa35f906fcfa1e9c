//! Best-effort trace sinks for generation calls.
//!
//! Recording never blocks and never fails the traced call: the HTTP sink
//! ships records from a detached task and drops delivery errors.

use std::sync::Arc;
use std::time::Duration;

use mentor_config::TraceSettings;
use serde::Serialize;
use tracing::debug;

/// One traced call: what went in, what came out, how long it took.
#[derive(Debug, Clone, Serialize)]
pub struct TraceRecord {
    pub name: String,
    pub input: serde_json::Value,
    pub output: serde_json::Value,
    pub latency_ms: u64,
    pub metadata: serde_json::Value,
}

/// Receiver for trace records.
pub trait TraceSink: Send + Sync {
    fn record(&self, record: TraceRecord);
}

/// Discards every record.
#[derive(Debug, Default)]
pub struct NoopTraceSink;

impl TraceSink for NoopTraceSink {
    fn record(&self, _record: TraceRecord) {}
}

/// Emits records as `tracing` debug events.
#[derive(Debug, Default)]
pub struct LogTraceSink;

impl TraceSink for LogTraceSink {
    fn record(&self, record: TraceRecord) {
        debug!(
            name = %record.name,
            latency_ms = record.latency_ms,
            metadata = %record.metadata,
            "trace"
        );
    }
}

/// Posts records as JSON to an HTTP collector.
pub struct HttpTraceSink {
    client: reqwest::Client,
    endpoint: String,
    project: String,
}

#[derive(Serialize)]
struct TracePayload<'a> {
    project: &'a str,
    #[serde(flatten)]
    record: &'a TraceRecord,
}

impl HttpTraceSink {
    pub fn new(endpoint: impl Into<String>, project: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(5))
                .build()
                .unwrap_or_default(),
            endpoint: endpoint.into(),
            project: project.into(),
        }
    }
}

impl TraceSink for HttpTraceSink {
    fn record(&self, record: TraceRecord) {
        // Outside a runtime there is nowhere to ship from; drop the record.
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            return;
        };

        let client = self.client.clone();
        let endpoint = self.endpoint.clone();
        let project = self.project.clone();

        handle.spawn(async move {
            let payload = TracePayload { project: &project, record: &record };
            if let Err(e) = client.post(&endpoint).json(&payload).send().await {
                debug!("Trace delivery to {} failed: {}", endpoint, e);
            }
        });
    }
}

/// Picks the sink described by the settings.
pub fn trace_sink_from_settings(settings: &TraceSettings) -> Arc<dyn TraceSink> {
    match (settings.enabled, settings.endpoint.as_deref()) {
        (false, _) => Arc::new(NoopTraceSink),
        (true, Some(endpoint)) => Arc::new(HttpTraceSink::new(endpoint, settings.project.as_str())),
        (true, None) => Arc::new(LogTraceSink),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> TraceRecord {
        TraceRecord {
            name: "generate".into(),
            input: json!("hi"),
            output: json!("hello"),
            latency_ms: 3,
            metadata: json!({ "mode": "offline" }),
        }
    }

    #[test]
    fn http_sink_without_runtime_is_silent() {
        HttpTraceSink::new("http://127.0.0.1:9/runs", "test").record(sample());
    }

    #[tokio::test]
    async fn http_sink_ignores_unreachable_endpoint() {
        HttpTraceSink::new("http://127.0.0.1:9/runs", "test").record(sample());
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    #[test]
    fn payload_flattens_record() {
        let record = sample();
        let value = serde_json::to_value(TracePayload { project: "p", record: &record }).unwrap();
        assert_eq!(value["project"], "p");
        assert_eq!(value["latency_ms"], 3);
    }

    #[test]
    fn disabled_settings_select_noop() {
        let sink = trace_sink_from_settings(&TraceSettings::default());
        sink.record(sample());
    }
}
