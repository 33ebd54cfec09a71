//! The model server trait, the scripted mock, and the server registry.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use futures::stream::BoxStream;
use parking_lot::Mutex;

use crate::args::GenArgs;
use crate::errors::{LlmError, Result};
use crate::response::{CompletionChunk, CompletionResponse};

/// An async model backend.
#[async_trait]
pub trait ModelServer: Send + Sync {
    /// Registry name.
    fn name(&self) -> &str;

    /// One full completion.
    async fn complete(&self, args: &GenArgs) -> Result<CompletionResponse>;

    /// Streamed completion. The default wraps [`ModelServer::complete`]
    /// in a single chunk for backends without native streaming.
    async fn stream(&self, args: &GenArgs) -> Result<BoxStream<'static, Result<CompletionChunk>>> {
        let response = self.complete(args).await?;
        Ok(Box::pin(futures::stream::once(async move {
            Ok(CompletionChunk {
                delta: response.content,
            })
        })))
    }
}

impl std::fmt::Debug for dyn ModelServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelServer")
            .field("name", &self.name())
            .finish()
    }
}

/// A scripted in-process server for tests.
///
/// Replies are consumed in order; once the script runs out, the server
/// echoes the last message. Latency is simulated with a tokio sleep, so
/// paused-clock tests can assert on concurrency.
pub struct MockServer {
    name: String,
    latency: Duration,
    script: Mutex<VecDeque<String>>,
    calls: AtomicUsize,
}

impl MockServer {
    /// A mock named `mock` with no latency or script.
    #[must_use]
    pub fn new() -> Self {
        Self {
            name: "mock".to_string(),
            latency: Duration::ZERO,
            script: Mutex::new(VecDeque::new()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Override the registry name.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Simulated per-call latency.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Queue replies returned in order.
    #[must_use]
    pub fn with_replies<I, S>(self, replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.script.lock().extend(replies.into_iter().map(Into::into));
        self
    }

    /// Number of completed calls.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn reply_for(&self, args: &GenArgs) -> String {
        if let Some(scripted) = self.script.lock().pop_front() {
            return scripted;
        }
        let last = args.messages.last().map_or("", |m| m.content.as_str());
        format!("echo: {last}")
    }
}

impl Default for MockServer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ModelServer for MockServer {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, args: &GenArgs) -> Result<CompletionResponse> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let _ = self.calls.fetch_add(1, Ordering::SeqCst);
        let mut response = CompletionResponse::text(self.reply_for(args));
        response.model = args.params.model.clone();
        response.finish_reason = Some("stop".to_string());
        Ok(response)
    }

    async fn stream(&self, args: &GenArgs) -> Result<BoxStream<'static, Result<CompletionChunk>>> {
        let full = self.complete(args).await?;
        let pieces: Vec<String> = full
            .content
            .split_inclusive(' ')
            .map(str::to_string)
            .collect();
        Ok(Box::pin(async_stream::try_stream! {
            for delta in pieces {
                yield CompletionChunk { delta };
            }
        }))
    }
}

/// Named server registry.
///
/// Lookups without a name fall back to the settings default.
#[derive(Default)]
pub struct ServerManager {
    servers: DashMap<String, Arc<dyn ModelServer>>,
}

impl ServerManager {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a server under its own name, replacing any previous one.
    pub fn register(&self, server: Arc<dyn ModelServer>) {
        let name = server.name().to_string();
        if self.servers.insert(name.clone(), server).is_some() {
            tracing::debug!(name, "replaced registered server");
        }
    }

    /// Look up a server, falling back to `server.defaultServer`.
    pub fn get(&self, name: Option<&str>) -> Result<Arc<dyn ModelServer>> {
        let default;
        let name = match name {
            Some(name) => name,
            None => {
                default = quill_settings::get_settings().server.default_server.clone();
                &default
            }
        };
        self.servers
            .get(name)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| LlmError::UnknownServer(name.to_string()))
    }
}
