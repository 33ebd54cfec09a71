//! Call traces.
//!
//! Every resolved generation appends a [`TraceEvent`]; a trace loaded as a
//! replay source answers lookups before any live call happens. Strict
//! matching keys on the generation name and the call args; relaxed
//! matching keys on the args alone, so renamed call sites still replay.

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::response::CompletionResponse;

/// One recorded call and its response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceEvent {
    /// Generation identity.
    pub gen_id: Uuid,
    /// Call-site name, e.g. the prompt function plus a counter.
    pub name: String,
    /// Serialized call args (the cache key form).
    pub args_key: String,
    /// The response that came back.
    pub response: CompletionResponse,
    /// When the call resolved.
    pub timestamp: DateTime<Utc>,
}

fn replay_key(name: &str, args_key: &str, strict: bool) -> String {
    if strict {
        format!("{name} {args_key}")
    } else {
        args_key.to_string()
    }
}

/// An append-only event log with replay lookup.
pub trait TraceStore: Send + Sync {
    /// Append one event.
    fn record(&self, event: TraceEvent);

    /// Pop the next replayable response for this call, if any.
    ///
    /// Repeated identical calls replay in recorded order.
    fn replay(&self, name: &str, args_key: &str, strict: bool) -> Option<CompletionResponse>;
}

/// In-memory trace store.
#[derive(Default)]
pub struct MemoryTrace {
    events: Mutex<Vec<TraceEvent>>,
    /// Replay queues for both key forms, built as events arrive.
    strict_queues: Mutex<HashMap<String, VecDeque<CompletionResponse>>>,
    relaxed_queues: Mutex<HashMap<String, VecDeque<CompletionResponse>>>,
}

impl MemoryTrace {
    /// An empty trace.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all recorded events in order.
    #[must_use]
    pub fn events(&self) -> Vec<TraceEvent> {
        self.events.lock().clone()
    }

    /// Number of recorded events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    /// Whether anything has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

impl TraceStore for MemoryTrace {
    fn record(&self, event: TraceEvent) {
        self.strict_queues
            .lock()
            .entry(replay_key(&event.name, &event.args_key, true))
            .or_default()
            .push_back(event.response.clone());
        self.relaxed_queues
            .lock()
            .entry(replay_key(&event.name, &event.args_key, false))
            .or_default()
            .push_back(event.response.clone());
        self.events.lock().push(event);
    }

    fn replay(&self, name: &str, args_key: &str, strict: bool) -> Option<CompletionResponse> {
        let queues = if strict {
            &self.strict_queues
        } else {
            &self.relaxed_queues
        };
        queues
            .lock()
            .get_mut(&replay_key(name, args_key, strict))
            .and_then(VecDeque::pop_front)
    }
}
