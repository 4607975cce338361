//! Per-Webhook Template Cache
//!
//! Caches compiled templates per webhook using `DashMap`. Entries are
//! immutable `Arc` snapshots: a refresh builds a new snapshot and swaps the
//! pointer, so readers only ever see a whole old or a whole new template.
//!
//! Per-webhook generation counters prevent a compile of stale source from
//! overwriting a newer invalidation.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use minijinja::{Environment, Value};
use thiserror::Error;
use uuid::Uuid;

use super::types::WebhookConfig;

const TEMPLATE_NAME: &str = "message";

/// Template compile or render failure, carrying engine diagnostics.
#[derive(Error, Debug, Clone)]
#[error("{}", .diagnostics.join("; "))]
pub struct TemplateError {
    pub diagnostics: Vec<String>,
}

impl From<minijinja::Error> for TemplateError {
    fn from(err: minijinja::Error) -> Self {
        let mut diagnostics = vec![err.to_string()];
        let mut source = std::error::Error::source(&err);
        while let Some(inner) = source {
            diagnostics.push(inner.to_string());
            source = inner.source();
        }
        Self { diagnostics }
    }
}

/// A compiled message template.
pub struct CompiledTemplate {
    env: Environment<'static>,
    built_from: DateTime<Utc>,
}

impl std::fmt::Debug for CompiledTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledTemplate")
            .field("built_from", &self.built_from)
            .finish_non_exhaustive()
    }
}

impl CompiledTemplate {
    /// Compile `source`. Syntax errors surface here, not at render time.
    pub fn compile(source: &str, built_from: DateTime<Utc>) -> Result<Self, TemplateError> {
        let mut env = Environment::new();
        env.add_template_owned(TEMPLATE_NAME, source.to_owned())?;
        Ok(Self { env, built_from })
    }

    pub fn render(&self, ctx: Value) -> Result<String, TemplateError> {
        let template = self.env.get_template(TEMPLATE_NAME)?;
        Ok(template.render(ctx)?)
    }

    /// `updated_at` of the configuration this template was compiled from.
    pub const fn built_from(&self) -> DateTime<Utc> {
        self.built_from
    }
}

/// Thread-safe cache of per-webhook compiled templates.
pub struct TemplateCache {
    entries: DashMap<Uuid, Arc<CompiledTemplate>>,
    generations: DashMap<Uuid, Arc<AtomicU64>>,
}

impl Default for TemplateCache {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateCache {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            generations: DashMap::new(),
        }
    }

    fn webhook_generation(&self, webhook_id: Uuid) -> Arc<AtomicU64> {
        self.generations
            .entry(webhook_id)
            .or_insert_with(|| Arc::new(AtomicU64::new(0)))
            .clone()
    }

    /// Get the compiled template for a webhook, compiling it if absent or
    /// older than the given configuration.
    ///
    /// A compile failure caches nothing, so the next call tries again.
    pub fn get_template(&self, config: &WebhookConfig) -> Result<Arc<CompiledTemplate>, TemplateError> {
        if let Some(entry) = self.entries.get(&config.id) {
            if entry.built_from >= config.updated_at {
                return Ok(Arc::clone(&entry));
            }
        }

        let generation = self.webhook_generation(config.id);
        let before = generation.load(Ordering::Acquire);

        let compiled = Arc::new(CompiledTemplate::compile(&config.template, config.updated_at)?);

        // Skip the insert if this webhook was invalidated while compiling.
        if generation.load(Ordering::Acquire) == before {
            self.entries.insert(config.id, Arc::clone(&compiled));
        }

        Ok(compiled)
    }

    /// Recompile from `config` and replace the cached entry.
    ///
    /// On failure the previous entry is dropped: it was built from source
    /// that is no longer current.
    #[tracing::instrument(skip(self, config), fields(webhook_id = %config.id))]
    pub fn refresh_template(&self, config: &WebhookConfig) -> Result<Arc<CompiledTemplate>, TemplateError> {
        self.webhook_generation(config.id).fetch_add(1, Ordering::AcqRel);

        match CompiledTemplate::compile(&config.template, config.updated_at) {
            Ok(compiled) => {
                let compiled = Arc::new(compiled);
                self.entries.insert(config.id, Arc::clone(&compiled));
                tracing::debug!("Template refreshed");
                Ok(compiled)
            }
            Err(e) => {
                self.entries.remove(&config.id);
                tracing::warn!(error = %e, "Template refresh failed to compile");
                Err(e)
            }
        }
    }

    /// Drop the cached template for a webhook.
    pub fn invalidate(&self, webhook_id: Uuid) {
        self.webhook_generation(webhook_id)
            .fetch_add(1, Ordering::Release);
        self.entries.remove(&webhook_id);
    }

    pub fn contains(&self, webhook_id: Uuid) -> bool {
        self.entries.contains_key(&webhook_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
