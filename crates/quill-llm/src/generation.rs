//! The model-call primitive.
//!
//! A [`Generation`] snapshots the conversation at creation and schedules
//! the pipeline as its own task: render, resolve, cache lookup, trace
//! replay, live call, cache/trace population. Only the live call holds a
//! worker permit; resolving the conversation (which may await another
//! generation's pending result) and cache/trace hits never occupy a
//! worker slot. The caller gets lazy text immediately and only waits
//! when something forces it.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::StreamExt;
use uuid::Uuid;

use quill_core::message::RenderedMessage;
use quill_core::printer::render;
use quill_core::records::PromptRecords;
use quill_core::role::MessageRole;
use quill_futures::{CallFuture, FutureError, StringFuture, WorkerPool};

use crate::args::{GenArgs, GenParams};
use crate::cache::ResponseCache;
use crate::response::CompletionResponse;
use crate::server::ModelServer;
use crate::tool::ToolSchema;
use crate::trace::{TraceEvent, TraceStore};

/// Cache and trace collaborators consulted around the live call.
///
/// Both are optional; a lookup failure is an ordinary miss.
#[derive(Clone, Default)]
pub struct GenerationHooks {
    /// Response cache for deterministic calls.
    pub cache: Option<Arc<dyn ResponseCache>>,
    /// Call trace for recording and replay.
    pub trace: Option<Arc<dyn TraceStore>>,
    /// Replay requires the call-site name to match, not just the args.
    pub strict_trace: bool,
    /// Cache responses even when temperature is nonzero.
    pub cache_nonzero_temperature: bool,
}

/// A scheduled model call.
///
/// Cheap to clone; all clones observe the same memoized result.
#[derive(Clone)]
pub struct Generation {
    id: Uuid,
    name: String,
    call: CallFuture,
}

impl Generation {
    /// Snapshot `records` and schedule the call.
    ///
    /// Work starts immediately; the live server call is bounded by the
    /// pool. `timeout` fails just this call when it elapses.
    #[must_use]
    pub fn spawn(
        pool: &WorkerPool,
        name: impl Into<String>,
        server: Arc<dyn ModelServer>,
        records: PromptRecords,
        params: GenParams,
        tools: Vec<ToolSchema>,
        hooks: GenerationHooks,
        timeout: Option<Duration>,
    ) -> Self {
        let id = Uuid::new_v4();
        let name = name.into();
        let label = name.clone();
        let task_name = name.clone();
        let pool = pool.clone();
        let call = CallFuture::spawn_unbounded(name.as_str(), timeout, async move {
            run_pipeline(id, task_name, pool, server, records, params, tools, hooks)
                .await
                .map_err(|e| FutureError::call_failed(&label, e))
        });
        Self { id, name, call }
    }

    /// Generation identity.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Call-site name, also the trace identity.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The response as lazy text.
    #[must_use]
    pub fn as_text(&self) -> StringFuture {
        StringFuture::from_call(self.call.clone())
    }

    /// The response as an assistant message with lazy content.
    #[must_use]
    pub fn as_message(&self) -> RenderedMessage {
        RenderedMessage::new(MessageRole::assistant(), self.as_text())
    }

    /// Force the response.
    pub async fn resolve(&self) -> quill_futures::Result<String> {
        self.call.resolve().await
    }
}

impl std::fmt::Debug for Generation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Generation")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish()
    }
}

async fn run_pipeline(
    gen_id: Uuid,
    name: String,
    pool: WorkerPool,
    server: Arc<dyn ModelServer>,
    records: PromptRecords,
    params: GenParams,
    tools: Vec<ToolSchema>,
    hooks: GenerationHooks,
) -> crate::errors::Result<String> {
    let convo = render(&records)?;
    let messages = convo.resolve(MessageRole::user()).await?;
    let args = GenArgs {
        messages,
        params,
        tools,
    };
    let key = args.cache_key()?;
    let cacheable = args.params.temperature == 0.0 || hooks.cache_nonzero_temperature;

    if cacheable {
        if let Some(cache) = &hooks.cache {
            match cache.find(&key) {
                Ok(Some(hit)) => {
                    tracing::debug!(%gen_id, name, "cache hit");
                    return Ok(hit.content);
                }
                Ok(None) => {}
                Err(e) => tracing::warn!(%gen_id, error = %e, "cache lookup failed, continuing"),
            }
        }
    }

    if let Some(trace) = &hooks.trace {
        if let Some(hit) = trace.replay(&name, &key, hooks.strict_trace) {
            tracing::debug!(%gen_id, name, "trace replay hit");
            return Ok(hit.content);
        }
    }

    // Only the live call holds a worker permit.
    let _permit = pool.acquire().await;
    let response = if args.params.stream {
        let mut stream = server.stream(&args).await?;
        let mut content = String::new();
        while let Some(chunk) = stream.next().await {
            content.push_str(&chunk?.delta);
        }
        CompletionResponse::text(content)
    } else {
        server.complete(&args).await?
    };
    tracing::debug!(%gen_id, name, server = server.name(), "live call resolved");

    if cacheable {
        if let Some(cache) = &hooks.cache {
            if let Err(e) = cache.insert(&key, &response) {
                tracing::warn!(%gen_id, error = %e, "cache insert failed");
            }
        }
    }
    if let Some(trace) = &hooks.trace {
        trace.record(TraceEvent {
            gen_id,
            name,
            args_key: key,
            response: response.clone(),
            timestamp: Utc::now(),
        });
    }

    Ok(response.content)
}
