//! Persisted contexts for resumable prompt functions.

use dashmap::DashMap;
use quill_core::PromptContext;
use uuid::Uuid;

/// Stores the persisted context of each resumable function, keyed by
/// the function's id.
#[derive(Debug, Default)]
pub struct ContextRegistry {
    contexts: DashMap<Uuid, PromptContext>,
}

impl ContextRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The persisted context for `id`, seeded from a snapshot of
    /// `caller` on first use.
    ///
    /// The returned handle aliases the persisted log, so captures made
    /// through it survive into the next call.
    #[must_use]
    pub fn resume(&self, id: Uuid, caller: &PromptContext) -> PromptContext {
        self.contexts
            .entry(id)
            .or_insert_with(|| {
                tracing::debug!(%id, "seeding resumable context");
                caller.snapshot()
            })
            .inherit()
    }

    /// Drop the persisted context for `id`. The next resume reseeds.
    pub fn reset(&self, id: Uuid) {
        self.contexts.remove(&id);
    }

    /// Drop every persisted context.
    pub fn clear(&self) {
        self.contexts.clear();
    }

    /// Number of persisted contexts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    /// Whether any context is persisted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_resume_seeds_from_the_caller() {
        let registry = ContextRegistry::new();
        let mut caller = PromptContext::new();
        caller.append_text("preamble");
        let id = Uuid::new_v4();
        let resumed = registry.resume(id, &caller);
        assert_eq!(resumed.full_records().len(), 1);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn later_resumes_see_earlier_captures() {
        let registry = ContextRegistry::new();
        let caller = PromptContext::new();
        let id = Uuid::new_v4();

        let mut first = registry.resume(id, &caller);
        first.append_text("turn one");

        let second = registry.resume(id, &caller);
        assert_eq!(second.full_records().len(), 1);
    }

    #[test]
    fn reset_reseeds_from_scratch() {
        let registry = ContextRegistry::new();
        let caller = PromptContext::new();
        let id = Uuid::new_v4();

        let mut first = registry.resume(id, &caller);
        first.append_text("stale");
        registry.reset(id);

        let second = registry.resume(id, &caller);
        assert!(second.full_records().is_empty());
    }

    #[test]
    fn registries_are_keyed_per_function() {
        let registry = ContextRegistry::new();
        let caller = PromptContext::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        let mut ctx_a = registry.resume(a, &caller);
        ctx_a.append_text("only a");
        let ctx_b = registry.resume(b, &caller);
        assert!(ctx_b.full_records().is_empty());
    }
}
