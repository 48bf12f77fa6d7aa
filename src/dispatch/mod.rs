//! The rotation dispatcher — ordered fallback across search providers.
//!
//! One dispatch call walks the provider registry starting at the
//! persisted rotation pointer, making at most one call per provider:
//!
//! - a provider in the unavailable set is skipped without a call;
//! - an empty result is a transient failure: the pointer advances and
//!   the provider is forgiven;
//! - a result that reads like a quota message retires the provider
//!   durably and advances the pointer;
//! - a clean result leaves the pointer on the successful provider (so
//!   the next independent query prefers it) and goes to summarization.
//!
//! State is written back after every transition, before the next
//! outbound call, so a crash resumes the rotation at exactly the next
//! unresolved provider. When the registry is exhausted the call falls
//! back to the reference source, and only when that also fails does the
//! caller see the fixed terminal failure string.

use std::sync::Arc;
use tracing::{error, info, warn};

use crate::adapters::SearchAdapter;
use crate::summarize::Summarizer;
use crate::wiki::ReferenceSource;

pub mod quota;
pub mod rotation;

use rotation::{RotationState, StateStore};

/// Provenance prefix on answers served by the reference source.
pub const REFERENCE_PREFIX: &str = "Wikipedia: ";

/// Returned when every provider and the reference source failed.
pub const TERMINAL_FAILURE: &str =
    "❌ All search providers and the reference lookup failed or returned no results.";

pub struct Dispatcher {
    providers: Vec<Box<dyn SearchAdapter>>,
    /// Registry order, derived from `providers` at construction and
    /// immutable afterwards. Defines the modulus for pointer arithmetic.
    registry: Vec<&'static str>,
    store: Arc<dyn StateStore>,
    summarizer: Box<dyn Summarizer>,
    reference: Box<dyn ReferenceSource>,
    /// Serializes the whole load-mutate-save cycle. Two concurrent
    /// dispatch calls would otherwise read the same pointer and the last
    /// writer would win.
    gate: tokio::sync::Mutex<()>,
}

impl Dispatcher {
    pub fn new(
        providers: Vec<Box<dyn SearchAdapter>>,
        store: Arc<dyn StateStore>,
        summarizer: Box<dyn Summarizer>,
        reference: Box<dyn ReferenceSource>,
    ) -> Self {
        let registry = providers.iter().map(|p| p.id()).collect();
        Self {
            providers,
            registry,
            store,
            summarizer,
            reference,
            gate: tokio::sync::Mutex::new(()),
        }
    }

    pub fn provider_ids(&self) -> &[&'static str] {
        &self.registry
    }

    /// Run the fallback chain for one query. Always returns a string:
    /// a synthesized answer, a prefixed reference extract, a sentinel.
    pub async fn dispatch(&self, query: &str) -> String {
        let _serialized = self.gate.lock().await;

        let mut state = self.store.load();
        state.normalize(&self.registry);

        let count = self.providers.len();
        if count == 0 {
            warn!("provider registry is empty, going straight to the reference source");
            return self.fall_back(query).await;
        }

        let mut index = state.next_index;
        let mut attempts = 0;

        while attempts < count {
            let provider = &self.providers[index];
            let id = provider.id();

            if state.is_unavailable(id) {
                index = (index + 1) % count;
                attempts += 1;
                continue;
            }

            info!(provider = id, "🌐 trying provider");
            match provider.search(query).await {
                None => {
                    // Transient failure: advance, do not penalize.
                    state.next_index = (index + 1) % count;
                    self.persist(&state);
                    index = state.next_index;
                    attempts += 1;
                }
                Some(text) if quota::is_quota_signal(&text) => {
                    warn!(provider = id, "⚠️ quota signal, retiring provider");
                    state.mark_unavailable(id);
                    state.next_index = (index + 1) % count;
                    self.persist(&state);
                    index = state.next_index;
                    attempts += 1;
                }
                Some(snippet) => {
                    // Pointer stays on the provider that delivered, so
                    // the next independent query tries it first.
                    state.next_index = index;
                    self.persist(&state);
                    info!(provider = id, "✅ got a snippet, synthesizing answer");
                    return self.summarizer.summarize(query, &snippet).await;
                }
            }
        }

        warn!("⚠️ all search providers failed or unavailable, falling back");
        self.fall_back(query).await
    }

    async fn fall_back(&self, query: &str) -> String {
        match self.reference.lookup(query).await {
            Some(extract) => format!("{REFERENCE_PREFIX}{extract}"),
            None => TERMINAL_FAILURE.to_string(),
        }
    }

    /// A dispatch call never fails because the state could not be
    /// written; the rotation just loses resumability until the next
    /// successful save.
    fn persist(&self, state: &RotationState) {
        if let Err(e) = self.store.save(state) {
            error!("failed to persist rotation state: {e:#}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::rotation::MemoryStateStore;
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Adapter that replays a fixed script of responses and records how
    /// often and in what order it was called.
    #[derive(Clone)]
    struct ScriptedProvider {
        id: &'static str,
        script: Arc<Mutex<VecDeque<Option<String>>>>,
        calls: Arc<AtomicUsize>,
        call_log: Arc<Mutex<Vec<&'static str>>>,
    }

    impl ScriptedProvider {
        fn new(
            id: &'static str,
            responses: Vec<Option<String>>,
            call_log: Arc<Mutex<Vec<&'static str>>>,
        ) -> Self {
            Self {
                id,
                script: Arc::new(Mutex::new(responses.into())),
                calls: Arc::new(AtomicUsize::new(0)),
                call_log,
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl SearchAdapter for ScriptedProvider {
        fn id(&self) -> &'static str {
            self.id
        }

        async fn search(&self, _query: &str) -> Option<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.call_log.lock().unwrap().push(self.id);
            self.script.lock().unwrap().pop_front().flatten()
        }
    }

    struct FixedSummarizer(&'static str);

    #[async_trait]
    impl Summarizer for FixedSummarizer {
        async fn summarize(&self, _query: &str, _snippet: &str) -> String {
            self.0.to_string()
        }
    }

    struct FixedReference(Option<&'static str>);

    #[async_trait]
    impl ReferenceSource for FixedReference {
        async fn lookup(&self, _topic: &str) -> Option<String> {
            self.0.map(str::to_string)
        }
    }

    struct Fixture {
        providers: Vec<ScriptedProvider>,
        store: Arc<MemoryStateStore>,
        call_log: Arc<Mutex<Vec<&'static str>>>,
    }

    impl Fixture {
        fn new(scripts: Vec<(&'static str, Vec<Option<String>>)>) -> Self {
            let call_log = Arc::new(Mutex::new(Vec::new()));
            let providers = scripts
                .into_iter()
                .map(|(id, responses)| {
                    ScriptedProvider::new(id, responses, Arc::clone(&call_log))
                })
                .collect();
            Self {
                providers,
                store: Arc::new(MemoryStateStore::default()),
                call_log,
            }
        }

        fn dispatcher(
            &self,
            summarizer: &'static str,
            reference: Option<&'static str>,
        ) -> Dispatcher {
            Dispatcher::new(
                self.providers
                    .iter()
                    .cloned()
                    .map(|p| Box::new(p) as Box<dyn SearchAdapter>)
                    .collect(),
                Arc::clone(&self.store) as Arc<dyn StateStore>,
                Box::new(FixedSummarizer(summarizer)),
                Box::new(FixedReference(reference)),
            )
        }

        fn order(&self) -> Vec<&'static str> {
            self.call_log.lock().unwrap().clone()
        }
    }

    fn quota_response() -> Option<String> {
        Some("Daily limit exceeded for this API key".to_string())
    }

    #[tokio::test]
    async fn quota_then_transient_then_success() {
        let fx = Fixture::new(vec![
            ("a", vec![quota_response()]),
            ("b", vec![None]),
            ("c", vec![Some("snippet-X".to_string())]),
        ]);
        let dispatcher = fx.dispatcher("final answer", None);

        let answer = dispatcher.dispatch("anything").await;
        assert_eq!(answer, "final answer");

        let state = fx.store.load();
        assert_eq!(state.next_index, 2);
        assert_eq!(state.unavailable, vec!["a"]);
    }

    #[tokio::test]
    async fn success_leaves_pointer_on_successful_provider() {
        let fx = Fixture::new(vec![
            ("a", vec![Some("a snippet".to_string())]),
            ("b", vec![]),
        ]);
        let dispatcher = fx.dispatcher("answer", None);
        dispatcher.dispatch("q").await;

        assert_eq!(fx.store.load().next_index, 0);
        assert_eq!(fx.order(), vec!["a"]);
    }

    #[tokio::test]
    async fn transient_failure_advances_pointer() {
        let fx = Fixture::new(vec![
            ("a", vec![None]),
            ("b", vec![Some("from b".to_string())]),
        ]);
        let dispatcher = fx.dispatcher("answer", None);
        dispatcher.dispatch("q").await;

        let state = fx.store.load();
        // b succeeded last, so the pointer rests on b, and a was not
        // penalized for its transient failure.
        assert_eq!(state.next_index, 1);
        assert!(state.unavailable.is_empty());
    }

    #[tokio::test]
    async fn all_transient_failures_wrap_pointer_and_fall_back() {
        let fx = Fixture::new(vec![("a", vec![None]), ("b", vec![None])]);
        let dispatcher = fx.dispatcher("unused", Some("extract about q"));

        let answer = dispatcher.dispatch("q").await;
        assert_eq!(answer, "Wikipedia: extract about q");
        assert_eq!(fx.store.load().next_index, 0); // (1 + 1) % 2
        assert_eq!(fx.providers[0].calls(), 1);
        assert_eq!(fx.providers[1].calls(), 1);
    }

    #[tokio::test]
    async fn disabled_providers_are_skipped_without_calls() {
        let fx = Fixture::new(vec![
            ("a", vec![]),
            ("b", vec![]),
            ("c", vec![]),
        ]);
        let mut state = RotationState::default();
        for id in ["a", "b", "c"] {
            state.mark_unavailable(id);
        }
        fx.store.save(&state).unwrap();

        let dispatcher = fx.dispatcher("unused", Some("reference text"));
        let answer = dispatcher.dispatch("q").await;

        assert_eq!(answer, "Wikipedia: reference text");
        for p in &fx.providers {
            assert_eq!(p.calls(), 0);
        }
    }

    #[tokio::test]
    async fn all_disabled_and_reference_failing_is_terminal() {
        let fx = Fixture::new(vec![("a", vec![]), ("b", vec![])]);
        let mut state = RotationState::default();
        state.mark_unavailable("a");
        state.mark_unavailable("b");
        fx.store.save(&state).unwrap();

        let dispatcher = fx.dispatcher("unused", None);
        assert_eq!(dispatcher.dispatch("q").await, TERMINAL_FAILURE);
    }

    #[tokio::test]
    async fn retired_provider_stays_retired_across_calls() {
        let fx = Fixture::new(vec![
            ("a", vec![quota_response()]),
            ("b", vec![Some("one".into()), Some("two".into())]),
        ]);
        let dispatcher = fx.dispatcher("answer", None);

        dispatcher.dispatch("first query").await;
        dispatcher.dispatch("second query").await;

        // a was retired on the first call and never invoked again.
        assert_eq!(fx.providers[0].calls(), 1);
        assert_eq!(fx.providers[1].calls(), 2);
    }

    #[tokio::test]
    async fn reset_returns_retired_provider_to_rotation() {
        let fx = Fixture::new(vec![
            ("a", vec![quota_response(), Some("a is back".into())]),
            ("b", vec![Some("from b".into())]),
        ]);
        let dispatcher = fx.dispatcher("answer", None);

        dispatcher.dispatch("first").await;
        assert_eq!(fx.store.load().unavailable, vec!["a"]);

        fx.store.reset().unwrap();
        dispatcher.dispatch("second").await;

        assert_eq!(fx.providers[0].calls(), 2);
        assert!(fx.store.load().unavailable.is_empty());
    }

    #[tokio::test]
    async fn at_most_one_call_per_provider_when_everything_quotas() {
        let fx = Fixture::new(vec![
            ("a", vec![quota_response()]),
            ("b", vec![quota_response()]),
            ("c", vec![quota_response()]),
        ]);
        let dispatcher = fx.dispatcher("unused", Some("fallback text"));

        let answer = dispatcher.dispatch("q").await;
        assert_eq!(answer, "Wikipedia: fallback text");
        for p in &fx.providers {
            assert_eq!(p.calls(), 1);
        }
        assert_eq!(
            fx.store.load().unavailable,
            vec!["a", "b", "c"]
        );
    }

    #[tokio::test]
    async fn rotation_resumes_from_persisted_pointer() {
        let fx = Fixture::new(vec![
            ("a", vec![Some("never used".into())]),
            ("b", vec![Some("b snippet".into())]),
        ]);
        let mut state = RotationState::default();
        state.next_index = 1;
        fx.store.save(&state).unwrap();

        let dispatcher = fx.dispatcher("answer", None);
        dispatcher.dispatch("q").await;

        assert_eq!(fx.order(), vec!["b"]);
        assert_eq!(fx.providers[0].calls(), 0);
    }

    #[tokio::test]
    async fn identical_state_yields_identical_selection_order() {
        let run = |scripts: Vec<(&'static str, Vec<Option<String>>)>| async move {
            let fx = Fixture::new(scripts);
            let dispatcher = fx.dispatcher("answer", Some("ref"));
            dispatcher.dispatch("q").await;
            fx.order()
        };

        let scripts = || {
            vec![
                ("a", vec![None]),
                ("b", vec![quota_response()]),
                ("c", vec![Some("hit".to_string())]),
            ]
        };
        assert_eq!(run(scripts()).await, run(scripts()).await);
    }

    #[tokio::test]
    async fn empty_registry_goes_to_reference() {
        let fx = Fixture::new(vec![]);
        let dispatcher = fx.dispatcher("unused", Some("only source"));
        assert_eq!(dispatcher.dispatch("q").await, "Wikipedia: only source");
    }

    #[tokio::test]
    async fn stale_pointer_beyond_registry_is_clamped() {
        let fx = Fixture::new(vec![
            ("a", vec![Some("a snippet".into())]),
            ("b", vec![]),
        ]);
        let mut state = RotationState::default();
        state.next_index = 7; // written by a config with more providers
        fx.store.save(&state).unwrap();

        let dispatcher = fx.dispatcher("answer", None);
        let answer = dispatcher.dispatch("q").await;
        assert_eq!(answer, "answer");
        // 7 % 2 == 1: b goes first, fails transiently, then a delivers.
        assert_eq!(fx.order(), vec!["b", "a"]);
    }
}
