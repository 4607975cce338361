//! Message Formatter
//!
//! Renders a webhook's template against a payload and escapes the whole
//! rendered output for the webhook's parse mode.

use std::sync::Arc;

use serde_json::Value;

use super::context::json_to_context;
use super::escape::{escape, EscapedText};
use super::templates::TemplateCache;
use super::types::WebhookConfig;

/// Bot API limit for `sendMessage` text, in characters.
pub const MAX_MESSAGE_CHARS: usize = 4096;

/// Outcome of formatting: escaped text on success, diagnostics otherwise.
#[derive(Debug, Clone)]
pub struct FormattedMessage {
    pub success: bool,
    pub text: Option<EscapedText>,
    pub errors: Vec<String>,
}

impl FormattedMessage {
    fn ok(text: EscapedText) -> Self {
        Self {
            success: true,
            text: Some(text),
            errors: Vec::new(),
        }
    }

    fn failed(errors: Vec<String>) -> Self {
        Self {
            success: false,
            text: None,
            errors,
        }
    }
}

/// Renders messages through the shared template cache.
#[derive(Clone)]
pub struct MessageFormatter {
    templates: Arc<TemplateCache>,
}

impl MessageFormatter {
    pub const fn new(templates: Arc<TemplateCache>) -> Self {
        Self { templates }
    }

    pub fn templates(&self) -> &Arc<TemplateCache> {
        &self.templates
    }

    /// Render and escape a message for `config`.
    pub fn format_message(&self, config: &WebhookConfig, payload: &Value) -> FormattedMessage {
        let template = match self.templates.get_template(config) {
            Ok(t) => t,
            Err(e) => return FormattedMessage::failed(e.diagnostics),
        };

        let rendered = match template.render(json_to_context(payload)) {
            Ok(text) => text,
            Err(e) => return FormattedMessage::failed(e.diagnostics),
        };

        if rendered.trim().is_empty() {
            return FormattedMessage::failed(vec!["rendered message is empty".to_string()]);
        }

        let text = escape(config.parse_mode, &rendered);
        let len = text.char_len();
        if len > MAX_MESSAGE_CHARS {
            return FormattedMessage::failed(vec![format!(
                "rendered message is {len} characters, limit is {MAX_MESSAGE_CHARS}"
            )]);
        }

        FormattedMessage::ok(text)
    }
}
