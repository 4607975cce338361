//! Webhook Processing Pipeline
//!
//! Runs one inbound request through resolve → validate → format → deliver
//! and always finishes with a committed trace and a stats update, whichever
//! stage ended the request.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use axum::body::Bytes;
use axum::http::StatusCode;
use futures::FutureExt;
use serde_json::Value;
use subtle::ConstantTimeEq;
use tracing::{info, instrument, warn, Instrument};
use uuid::Uuid;

use super::delivery::{DeliveryErrorKind, DeliveryOutcome, MessageSender};
use super::formatter::MessageFormatter;
use super::source::WebhookSource;
use super::types::{ProcessResponse, ProcessResult, RequestMetadata, WebhookError};
use super::validation::PayloadValidator;
use crate::request_log::{RequestLogger, RequestTrace, Stage};
use crate::stats::StatsAggregator;

/// How far a request got, for stats.
#[derive(Debug, Default, Clone, Copy)]
struct Progress {
    validated: Option<bool>,
    delivered: Option<bool>,
}

/// Per-request orchestrator. Cheap to clone; all collaborators are shared.
#[derive(Clone)]
pub struct WebhookProcessor {
    source: Arc<dyn WebhookSource>,
    validator: Arc<dyn PayloadValidator>,
    formatter: MessageFormatter,
    sender: Arc<dyn MessageSender>,
    logger: RequestLogger,
    stats: StatsAggregator,
    expose_internal: bool,
    max_payload_size: usize,
}

impl WebhookProcessor {
    pub fn new(
        source: Arc<dyn WebhookSource>,
        validator: Arc<dyn PayloadValidator>,
        formatter: MessageFormatter,
        sender: Arc<dyn MessageSender>,
        logger: RequestLogger,
        stats: StatsAggregator,
        expose_internal: bool,
    ) -> Self {
        Self {
            source,
            validator,
            formatter,
            sender,
            logger,
            stats,
            expose_internal,
            max_payload_size: usize::MAX,
        }
    }

    /// Reject payloads larger than `bytes` at the validation stage.
    #[must_use]
    pub const fn with_max_payload_size(mut self, bytes: usize) -> Self {
        self.max_payload_size = bytes;
        self
    }

    pub const fn logger(&self) -> &RequestLogger {
        &self.logger
    }

    pub const fn stats(&self) -> &StatsAggregator {
        &self.stats
    }

    pub const fn formatter(&self) -> &MessageFormatter {
        &self.formatter
    }

    /// Process one inbound webhook request.
    ///
    /// Never fails: every outcome, including a panic inside a stage, becomes
    /// a [`ProcessResult`]. The pipeline runs in its own task, so the trace
    /// and stats are still written if the caller stops waiting.
    #[instrument(skip(self, public_id, raw, metadata), fields(public_id = %public_id, correlation_id))]
    pub async fn process(&self, public_id: &str, raw: Bytes, metadata: RequestMetadata) -> ProcessResult {
        let started = Instant::now();
        let trace = self.logger.begin(public_id, metadata);
        let correlation_id = trace.correlation_id;
        tracing::Span::current().record("correlation_id", tracing::field::display(correlation_id));

        let processor = self.clone();
        let public_id = public_id.to_string();
        let handle = tokio::spawn(
            async move { processor.run(public_id, raw, trace, started).await }.in_current_span(),
        );

        match handle.await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(%correlation_id, error = %e, "Webhook pipeline task failed");
                WebhookError::InternalFault(e.to_string()).to_response(correlation_id, self.expose_internal)
            }
        }
    }

    async fn run(&self, public_id: String, raw: Bytes, mut trace: RequestTrace, started: Instant) -> ProcessResult {
        let token = trace.metadata.token.clone();
        let mut progress = Progress::default();

        let staged = AssertUnwindSafe(self.run_stages(
            &public_id,
            &raw,
            token.as_deref(),
            &mut trace,
            &mut progress,
        ))
        .catch_unwind()
        .await;

        let result = staged.unwrap_or_else(|panic| {
            Err(WebhookError::InternalFault(format!(
                "pipeline panicked: {}",
                panic_message(panic.as_ref())
            )))
        });

        self.finalize(trace, progress, started, result).await
    }

    async fn run_stages(
        &self,
        public_id: &str,
        raw: &[u8],
        token: Option<&str>,
        trace: &mut RequestTrace,
        progress: &mut Progress,
    ) -> Result<DeliveryOutcome, WebhookError> {
        // Resolve
        let config = match self.source.find_by_public_id(public_id).await {
            Ok(Some(config)) => config,
            Ok(None) => {
                trace.record(Stage::ConfigResolved, false, Some("no webhook with this id".into()));
                return Err(WebhookError::ConfigNotFoundOrDisabled);
            }
            Err(e) => {
                trace.record(Stage::ConfigResolved, false, Some(e.to_string()));
                return Err(WebhookError::InternalFault(e.to_string()));
            }
        };
        trace.webhook_id = Some(config.id);

        if config.disabled {
            trace.record(Stage::ConfigResolved, false, Some("webhook is disabled".into()));
            return Err(WebhookError::ConfigNotFoundOrDisabled);
        }
        if config.protected && !token_matches(config.secret_token.as_deref(), token) {
            trace.record(Stage::ConfigResolved, false, Some("missing or invalid token".into()));
            return Err(WebhookError::Unauthorized);
        }
        trace.record(Stage::ConfigResolved, true, None);

        // Validate
        let (payload, violations) = if trace.metadata.content_length > self.max_payload_size {
            (
                Value::Null,
                vec![format!("payload exceeds the {} byte limit", self.max_payload_size)],
            )
        } else {
            match serde_json::from_slice::<Value>(raw) {
                Ok(payload) => {
                    let violations = config
                        .payload_schema
                        .as_ref()
                        .map(|schema| self.validator.validate(&payload, schema))
                        .unwrap_or_default();
                    (payload, violations)
                }
                Err(e) => (Value::Null, vec![format!("payload is not valid JSON: {e}")]),
            }
        };
        progress.validated = Some(violations.is_empty());
        if !violations.is_empty() {
            trace.record(Stage::Validated, false, Some(violations.join("; ")));
            return Err(WebhookError::PayloadInvalid(violations));
        }
        trace.record(Stage::Validated, true, None);

        // Format
        let formatted = self.formatter.format_message(&config, &payload);
        if !formatted.success {
            trace.record(Stage::Formatted, false, Some(formatted.errors.join("; ")));
            return Err(WebhookError::TemplateRenderFailure(formatted.errors));
        }
        let Some(text) = formatted.text else {
            trace.record(Stage::Formatted, false, Some("formatter returned no text".into()));
            return Err(WebhookError::InternalFault("formatter returned no text".into()));
        };
        trace.record(
            Stage::Formatted,
            true,
            Some(format!("{} characters, parse mode {}", text.char_len(), text.mode())),
        );

        // Deliver
        let outcome = match self.sender.send_message(&config.target, &text).await {
            Ok(outcome) => outcome,
            Err(e) => {
                trace.record(Stage::Delivered, false, Some(e.to_string()));
                return Err(WebhookError::InternalFault(e.to_string()));
            }
        };
        progress.delivered = Some(outcome.success);
        let mut detail = format!(
            "status={} latency_ms={}",
            outcome
                .status_code
                .map_or_else(|| "none".to_string(), |s| s.to_string()),
            outcome.latency_ms
        );
        if let (false, Some(text)) = (outcome.success, outcome.response_text.as_deref()) {
            detail.push_str(" response=");
            detail.push_str(text);
        }
        trace.record(Stage::Delivered, outcome.success, Some(detail));

        if outcome.success {
            Ok(outcome)
        } else {
            Err(delivery_error(&outcome))
        }
    }

    async fn finalize(
        &self,
        mut trace: RequestTrace,
        progress: Progress,
        started: Instant,
        result: Result<DeliveryOutcome, WebhookError>,
    ) -> ProcessResult {
        let elapsed_ms = started.elapsed().as_millis() as u64;

        let (response, outcome) = match result {
            Ok(_) => (
                ProcessResult {
                    status: StatusCode::OK,
                    body: ProcessResponse {
                        ok: true,
                        request_id: trace.correlation_id,
                        error: None,
                        message: Some("Message delivered".to_string()),
                        details: Vec::new(),
                    },
                },
                "ok",
            ),
            Err(e) => {
                if matches!(e, WebhookError::InternalFault(_)) {
                    tracing::error!(correlation_id = %trace.correlation_id, error = %e, "Webhook pipeline fault");
                }
                (e.to_response(trace.correlation_id, self.expose_internal), e.code())
            }
        };

        let status_code = response.status.as_u16();
        trace.finish(status_code, elapsed_ms, outcome);
        self.logger.commit(&trace).await;
        self.stats
            .update_stats(
                trace.webhook_id,
                status_code,
                elapsed_ms,
                progress.validated != Some(false),
                progress.delivered,
            )
            .await;

        info!(
            correlation_id = %trace.correlation_id,
            webhook_id = ?trace.webhook_id,
            status = status_code,
            elapsed_ms,
            outcome,
            "Webhook request completed"
        );

        response
    }

    /// Rebuild the cached template after the webhook's configuration changed.
    #[instrument(skip(self))]
    pub async fn template_changed(&self, webhook_id: Uuid) -> Result<(), WebhookError> {
        let templates = self.formatter.templates();
        let config = match self.source.find_by_id(webhook_id).await {
            Ok(Some(config)) => config,
            Ok(None) => {
                templates.invalidate(webhook_id);
                return Err(WebhookError::ConfigNotFoundOrDisabled);
            }
            Err(e) => {
                templates.invalidate(webhook_id);
                return Err(WebhookError::InternalFault(e.to_string()));
            }
        };

        if config.disabled {
            templates.invalidate(webhook_id);
            return Ok(());
        }

        templates.refresh_template(&config).map_err(|e| {
            warn!(%webhook_id, error = %e, "Updated template does not compile");
            WebhookError::TemplateRenderFailure(e.diagnostics)
        })?;
        Ok(())
    }
}

fn token_matches(expected: Option<&str>, presented: Option<&str>) -> bool {
    match (expected, presented) {
        (Some(expected), Some(presented)) if !expected.is_empty() => {
            expected.as_bytes().ct_eq(presented.as_bytes()).into()
        }
        _ => false,
    }
}

fn delivery_error(outcome: &DeliveryOutcome) -> WebhookError {
    match outcome.error_kind {
        Some(DeliveryErrorKind::Timeout) => WebhookError::DeliveryTimeout,
        Some(DeliveryErrorKind::Rejected) => WebhookError::DeliveryRejected {
            status: outcome.status_code.unwrap_or_default(),
            description: outcome.description().unwrap_or_default(),
        },
        Some(DeliveryErrorKind::Network) | None => WebhookError::DeliveryNetworkError(
            outcome
                .response_text
                .clone()
                .unwrap_or_else(|| "no response".to_string()),
        ),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use chrono::Utc;
    use serde_json::json;

    use super::*;
    use crate::request_log::{InMemoryTraceSink, TraceSink};
    use crate::stats::InMemoryStatsStore;
    use crate::webhooks::delivery::DeliveryError;
    use crate::webhooks::escape::{EscapedText, ParseMode};
    use crate::webhooks::source::InMemoryWebhookSource;
    use crate::webhooks::templates::TemplateCache;
    use crate::webhooks::types::{DeliveryTarget, WebhookConfig};
    use crate::webhooks::validation::JsonSchemaValidator;

    #[derive(Clone, Copy)]
    enum Reply {
        Ok,
        /// Succeeds after a delay longer than the caller is willing to wait.
        Slow,
        Rejected,
        Timeout,
        Panic,
    }

    struct RecordingSender {
        reply: Reply,
        calls: AtomicUsize,
        sent: Mutex<Vec<String>>,
    }

    impl RecordingSender {
        fn new(reply: Reply) -> Arc<Self> {
            Arc::new(Self {
                reply,
                calls: AtomicUsize::new(0),
                sent: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl MessageSender for RecordingSender {
        async fn send_message(
            &self,
            _target: &DeliveryTarget,
            text: &EscapedText,
        ) -> Result<DeliveryOutcome, DeliveryError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.sent.lock().unwrap().push(text.as_str().to_string());
            if matches!(self.reply, Reply::Slow) {
                tokio::time::sleep(Duration::from_millis(300)).await;
            }
            let outcome = match self.reply {
                Reply::Ok | Reply::Slow => DeliveryOutcome {
                    status_code: Some(200),
                    success: true,
                    response_text: Some(r#"{"ok":true}"#.into()),
                    error_kind: None,
                    latency_ms: 3,
                },
                Reply::Rejected => DeliveryOutcome {
                    status_code: Some(400),
                    success: false,
                    response_text: Some(
                        r#"{"ok":false,"description":"Bad Request: chat not found"}"#.into(),
                    ),
                    error_kind: Some(DeliveryErrorKind::Rejected),
                    latency_ms: 3,
                },
                Reply::Timeout => DeliveryOutcome {
                    status_code: None,
                    success: false,
                    response_text: None,
                    error_kind: Some(DeliveryErrorKind::Timeout),
                    latency_ms: 2000,
                },
                Reply::Panic => panic!("sender blew up"),
            };
            Ok(outcome)
        }
    }

    struct Harness {
        processor: WebhookProcessor,
        source: InMemoryWebhookSource,
        sink: InMemoryTraceSink,
        sender: Arc<RecordingSender>,
    }

    fn harness(reply: Reply) -> Harness {
        let source = InMemoryWebhookSource::new();
        let sink = InMemoryTraceSink::new();
        let sender = RecordingSender::new(reply);
        let processor = WebhookProcessor::new(
            Arc::new(source.clone()),
            Arc::new(JsonSchemaValidator),
            MessageFormatter::new(Arc::new(TemplateCache::new())),
            sender.clone(),
            RequestLogger::new(Arc::new(sink.clone())),
            StatsAggregator::new(Arc::new(InMemoryStatsStore::new())),
            false,
        );
        Harness {
            processor,
            source,
            sink,
            sender,
        }
    }

    fn body(raw: &'static str) -> Bytes {
        Bytes::from_static(raw.as_bytes())
    }

    fn webhook(public_id: &str, template: &str) -> WebhookConfig {
        WebhookConfig {
            id: Uuid::new_v4(),
            public_id: public_id.into(),
            template: template.into(),
            parse_mode: ParseMode::MarkdownV2,
            target: DeliveryTarget {
                bot_token: "123:abc".into(),
                chat_id: "42".into(),
                message_thread_id: None,
            },
            protected: false,
            secret_token: None,
            disabled: false,
            payload_schema: None,
            updated_at: Utc::now(),
        }
    }

    async fn today(h: &Harness, id: Option<Uuid>) -> crate::stats::DailyStat {
        h.processor
            .stats()
            .daily(Utc::now().date_naive(), id)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn delivers_rendered_message() {
        let h = harness(Reply::Ok);
        let cfg = webhook("hook", "Event: {{ event }}");
        h.source.upsert(cfg.clone());

        let result = h
            .processor
            .process("hook", body(r#"{"event":"test"}"#), RequestMetadata::default())
            .await;

        assert_eq!(result.status, StatusCode::OK);
        assert!(result.body.ok);
        assert_eq!(h.sender.calls(), 1);
        assert_eq!(h.sender.sent.lock().unwrap()[0], "Event: test");

        let trace = h.sink.get(result.body.request_id).await.unwrap().unwrap();
        assert_eq!(
            trace.stages(),
            vec![
                Stage::Received,
                Stage::ConfigResolved,
                Stage::Validated,
                Stage::Formatted,
                Stage::Delivered,
                Stage::Completed
            ]
        );
        let stat = today(&h, Some(cfg.id)).await;
        assert_eq!((stat.request_count, stat.success_count), (1, 1));
    }

    #[tokio::test]
    async fn unknown_webhook_is_not_found() {
        let h = harness(Reply::Ok);

        let result = h.processor.process("missing", body("{}"), RequestMetadata::default()).await;

        assert_eq!(result.status, StatusCode::NOT_FOUND);
        assert_eq!(h.sender.calls(), 0);
        assert_eq!(h.sink.len(), 1);
        assert_eq!(today(&h, None).await.request_count, 1);
    }

    #[tokio::test]
    async fn disabled_webhook_never_delivers() {
        let h = harness(Reply::Ok);
        let mut cfg = webhook("off", "hi");
        cfg.disabled = true;
        h.source.upsert(cfg.clone());

        let result = h.processor.process("off", body("{}"), RequestMetadata::default()).await;

        assert_eq!(result.status, StatusCode::NOT_FOUND);
        assert_eq!(result.body.error.as_deref(), Some("WEBHOOK_NOT_FOUND"));
        assert_eq!(h.sender.calls(), 0);
        let stat = today(&h, Some(cfg.id)).await;
        assert_eq!((stat.request_count, stat.validation_failures), (1, 0));
    }

    #[tokio::test]
    async fn broken_template_fails_without_delivery() {
        let h = harness(Reply::Ok);
        let cfg = webhook("broken", "{% if %}");
        h.source.upsert(cfg.clone());

        let result = h.processor.process("broken", body("{}"), RequestMetadata::default()).await;

        assert_eq!(result.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(result.body.error.as_deref(), Some("TEMPLATE_RENDER_FAILURE"));
        assert!(!result.body.details.is_empty());
        assert_eq!(h.sender.calls(), 0);

        let trace = h.sink.get(result.body.request_id).await.unwrap().unwrap();
        assert!(trace.is_finished());
        assert_eq!(trace.stages().last(), Some(&Stage::Completed));
        assert_eq!(today(&h, Some(cfg.id)).await.request_count, 1);
    }

    #[tokio::test]
    async fn schema_violation_is_rejected() {
        let h = harness(Reply::Ok);
        let mut cfg = webhook("strict", "{{ event }}");
        cfg.payload_schema = Some(json!({"type": "object", "required": ["event"]}));
        h.source.upsert(cfg.clone());

        let result = h.processor.process("strict", body(r#"{"other":1}"#), RequestMetadata::default()).await;

        assert_eq!(result.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(result.body.error.as_deref(), Some("PAYLOAD_INVALID"));
        assert_eq!(h.sender.calls(), 0);
        assert_eq!(today(&h, Some(cfg.id)).await.validation_failures, 1);
    }

    #[tokio::test]
    async fn malformed_json_is_a_violation() {
        let h = harness(Reply::Ok);
        h.source.upsert(webhook("hook", "x"));

        let result = h.processor.process("hook", body("{not json"), RequestMetadata::default()).await;

        assert_eq!(result.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(result.body.details[0].contains("not valid JSON"));
    }

    #[tokio::test]
    async fn oversized_payload_fails_validation() {
        let mut h = harness(Reply::Ok);
        h.processor = h.processor.clone().with_max_payload_size(8);
        let cfg = webhook("hook", "x");
        h.source.upsert(cfg.clone());

        let metadata = RequestMetadata {
            content_length: 9,
            ..RequestMetadata::default()
        };
        let result = h.processor.process("hook", Bytes::new(), metadata).await;

        assert_eq!(result.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(result.body.details[0].contains("8 byte limit"));
        assert_eq!(h.sender.calls(), 0);
        assert_eq!(today(&h, Some(cfg.id)).await.validation_failures, 1);
    }

    #[tokio::test]
    async fn protected_webhook_requires_token() {
        let h = harness(Reply::Ok);
        let mut cfg = webhook("locked", "hi");
        cfg.protected = true;
        cfg.secret_token = Some("s3cret".into());
        h.source.upsert(cfg);

        let denied = h.processor.process("locked", body("{}"), RequestMetadata::default()).await;
        assert_eq!(denied.status, StatusCode::UNAUTHORIZED);

        let wrong = RequestMetadata {
            token: Some("nope".into()),
            ..RequestMetadata::default()
        };
        assert_eq!(
            h.processor.process("locked", body("{}"), wrong).await.status,
            StatusCode::UNAUTHORIZED
        );

        let right = RequestMetadata {
            token: Some("s3cret".into()),
            ..RequestMetadata::default()
        };
        assert_eq!(h.processor.process("locked", body("{}"), right).await.status, StatusCode::OK);
        assert_eq!(h.sender.calls(), 1);
    }

    #[tokio::test]
    async fn delivery_failures_map_to_gateway_errors() {
        let h = harness(Reply::Rejected);
        let cfg = webhook("hook", "hi");
        h.source.upsert(cfg.clone());

        let result = h.processor.process("hook", body("{}"), RequestMetadata::default()).await;
        assert_eq!(result.status, StatusCode::BAD_GATEWAY);
        assert!(result.body.message.unwrap().contains("chat not found"));
        assert_eq!(today(&h, Some(cfg.id)).await.delivery_failures, 1);

        let h = harness(Reply::Timeout);
        h.source.upsert(webhook("hook", "hi"));
        let result = h.processor.process("hook", body("{}"), RequestMetadata::default()).await;
        assert_eq!(result.status, StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(h.sender.calls(), 1);
    }

    #[tokio::test]
    async fn panic_in_stage_becomes_internal_fault() {
        let h = harness(Reply::Panic);
        let cfg = webhook("hook", "hi");
        h.source.upsert(cfg.clone());

        let result = h.processor.process("hook", body("{}"), RequestMetadata::default()).await;

        assert_eq!(result.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(result.body.message.as_deref(), Some("Internal server error"));
        let trace = h.sink.get(result.body.request_id).await.unwrap().unwrap();
        assert_eq!(trace.completion.unwrap().outcome, "INTERNAL_ERROR");
        assert_eq!(today(&h, Some(cfg.id)).await.request_count, 1);
    }

    #[tokio::test]
    async fn request_is_recorded_when_caller_goes_away() {
        let h = harness(Reply::Slow);
        let cfg = webhook("hook", "hi");
        h.source.upsert(cfg.clone());

        let abandoned = tokio::time::timeout(
            Duration::from_millis(50),
            h.processor.process("hook", body("{}"), RequestMetadata::default()),
        )
        .await;
        assert!(abandoned.is_err());

        tokio::time::timeout(Duration::from_secs(5), async {
            while today(&h, Some(cfg.id)).await.request_count == 0 {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("stats were never updated");

        assert_eq!(h.sender.calls(), 1);
        assert_eq!(today(&h, Some(cfg.id)).await.success_count, 1);
        let traces = h.sink.for_public_id("hook");
        assert_eq!(traces.len(), 1);
        assert_eq!(traces[0].stages().last(), Some(&Stage::Completed));
    }

    #[tokio::test]
    async fn template_change_rebuilds_cache() {
        let h = harness(Reply::Ok);
        let mut cfg = webhook("hook", "v1 {{ event }}");
        h.source.upsert(cfg.clone());
        h.processor
            .process("hook", body(r#"{"event":"a"}"#), RequestMetadata::default())
            .await;

        cfg.template = "v2 {{ event }}".into();
        h.source.upsert(cfg.clone());
        h.processor.template_changed(cfg.id).await.unwrap();
        h.processor
            .process("hook", body(r#"{"event":"b"}"#), RequestMetadata::default())
            .await;

        assert_eq!(h.sender.sent.lock().unwrap()[1], "v2 b");

        cfg.template = "{% for %}".into();
        h.source.upsert(cfg.clone());
        assert!(matches!(
            h.processor.template_changed(cfg.id).await,
            Err(WebhookError::TemplateRenderFailure(_))
        ));
        assert!(!h.processor.formatter().templates().contains(cfg.id));

        assert_eq!(
            h.processor.template_changed(Uuid::new_v4()).await,
            Err(WebhookError::ConfigNotFoundOrDisabled)
        );
    }
}
