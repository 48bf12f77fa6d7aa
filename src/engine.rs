//! The answer engine — the surface the conversational front end calls.
//!
//! `answer` always returns a string. Direct-lookup intents run first in
//! priority order; only when none of them produces a confident result
//! does the query fall into the provider rotation. Every failure mode
//! below this boundary resolves to a sentinel string, never an error.

use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use crate::dispatch::Dispatcher;
use crate::intent::IntentMatcher;

pub struct AnswerEngine {
    matchers: Vec<Box<dyn IntentMatcher>>,
    dispatcher: Dispatcher,
}

impl AnswerEngine {
    pub fn new(matchers: Vec<Box<dyn IntentMatcher>>, dispatcher: Dispatcher) -> Self {
        Self {
            matchers,
            dispatcher,
        }
    }

    pub fn provider_ids(&self) -> &[&'static str] {
        self.dispatcher.provider_ids()
    }

    /// Answer a free-text query.
    pub async fn answer(&self, query: &str) -> String {
        let request_id = Uuid::new_v4();
        let span = info_span!("answer", %request_id);

        async {
            for matcher in &self.matchers {
                if !matcher.matches(query) {
                    continue;
                }
                if let Some(answer) = matcher.handle(query).await {
                    info!(intent = matcher.name(), "answered by direct lookup");
                    return answer;
                }
            }
            self.dispatcher.dispatch(query).await
        }
        .instrument(span)
        .await
    }
}
