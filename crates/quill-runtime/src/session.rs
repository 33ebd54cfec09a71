//! Session wiring.
//!
//! A [`Session`] owns the worker pool, the server registry, the
//! persisted-context registry, and the cache/trace hooks, all sized
//! from settings. One session serves many prompt-function calls.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use quill_compile::{Bindings, HostFn};
use quill_core::{PromptContext, Value};
use quill_futures::WorkerPool;
use quill_llm::{
    GenParams, Generation, GenerationHooks, MemoryCache, MemoryTrace, ModelServer, ResponseCache,
    ServerManager, SqliteCache, ToolSchema, TraceStore,
};
use quill_settings::QuillSettings;

use crate::errors::Result;
use crate::func::PromptFunc;
use crate::registry::ContextRegistry;

/// A configured runtime for prompt functions and model calls.
pub struct Session {
    pool: WorkerPool,
    servers: ServerManager,
    registry: ContextRegistry,
    hooks: GenerationHooks,
    default_params: GenParams,
    timeout: Option<Duration>,
    counter: AtomicU64,
}

impl Session {
    /// A session wired from the process-wide settings.
    pub fn new() -> Result<Self> {
        Self::from_settings(&quill_settings::get_settings())
    }

    /// A session wired from explicit settings.
    ///
    /// The cache backend follows `cache.path`: a path means sqlite,
    /// none means in-memory.
    pub fn from_settings(settings: &QuillSettings) -> Result<Self> {
        let hooks = GenerationHooks {
            cache: if settings.cache.enabled {
                Some(match &settings.cache.path {
                    Some(path) => Arc::new(SqliteCache::open(
                        path,
                        settings.cache.max_entries,
                        settings.cache.ttl_secs,
                    )?) as Arc<dyn ResponseCache>,
                    None => Arc::new(MemoryCache::new()),
                })
            } else {
                None
            },
            trace: settings
                .trace
                .enabled
                .then(|| Arc::new(MemoryTrace::new()) as Arc<dyn TraceStore>),
            strict_trace: settings.trace.strict_match,
            cache_nonzero_temperature: settings.cache.allow_nonzero_temperature,
        };
        Ok(Self {
            pool: WorkerPool::new(settings.server.workers),
            servers: ServerManager::new(),
            registry: ContextRegistry::new(),
            hooks,
            default_params: GenParams::default().with_model(settings.server.default_model.clone()),
            timeout: Some(Duration::from_secs(settings.server.timeout_secs)),
            counter: AtomicU64::new(0),
        })
    }

    /// The worker pool model calls run on.
    #[must_use]
    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    /// The persisted-context registry for resumable functions.
    #[must_use]
    pub fn registry(&self) -> &ContextRegistry {
        &self.registry
    }

    /// Make `server` available to later calls.
    pub fn register_server(&self, server: Arc<dyn ModelServer>) {
        self.servers.register(server);
    }

    /// Call a prompt function against `caller`'s context.
    pub fn call(
        &self,
        func: &PromptFunc,
        caller: &PromptContext,
        bindings: Bindings,
    ) -> Result<Value> {
        func.call(caller, &self.registry, bindings)
    }

    /// Schedule a model call over the conversation visible in `ctx`.
    ///
    /// The records are snapshotted now; work starts immediately on the
    /// pool and the returned handle carries the result as lazy text.
    /// `server` of `None` picks the configured default, and
    /// `params.timeout_secs` overrides the session-wide timeout.
    pub fn generate(
        &self,
        name: impl Into<String>,
        ctx: &PromptContext,
        server: Option<&str>,
        params: Option<GenParams>,
        tools: Vec<ToolSchema>,
    ) -> Result<Generation> {
        let server = self.servers.get(server)?;
        let params = params.unwrap_or_else(|| self.default_params.clone());
        let timeout = params.timeout_secs.map(Duration::from_secs).or(self.timeout);
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        let label = format!("{}#{n}", name.into());
        Ok(Generation::spawn(
            &self.pool,
            label,
            server,
            ctx.full_records(),
            params,
            tools,
            self.hooks.clone(),
            timeout,
        ))
    }

    /// A host callable that schedules a generation at its call site.
    ///
    /// Usable as an expression inside a prompt body: when evaluated it
    /// snapshots everything captured so far, schedules the call, and
    /// yields the response as lazy text. The server is resolved now so
    /// the callable itself cannot fail.
    pub fn gen_host(
        self: &Arc<Self>,
        name: impl Into<String>,
        server: Option<&str>,
        params: Option<GenParams>,
    ) -> Result<HostFn> {
        let server = self.servers.get(server)?;
        let session = Arc::clone(self);
        let name = name.into();
        Ok(HostFn::new(move |ctx, _| {
            let n = session.counter.fetch_add(1, Ordering::Relaxed);
            let label = format!("{name}#{n}");
            let params = params.clone().unwrap_or_else(|| session.default_params.clone());
            let timeout = params
                .timeout_secs
                .map(Duration::from_secs)
                .or(session.timeout);
            let gen = Generation::spawn(
                &session.pool,
                label,
                Arc::clone(&server),
                ctx.full_records(),
                params,
                Vec::new(),
                session.hooks.clone(),
                timeout,
            );
            Value::Text(gen.as_text())
        }))
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("workers", &self.pool.capacity())
            .field("timeout", &self.timeout)
            .finish()
    }
}
