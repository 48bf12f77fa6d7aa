//! Intent pre-router — direct lookups that short-circuit the dispatcher.
//!
//! A small ordered set of matchers, each a keyword predicate plus a
//! handler. They are evaluated in fixed priority order before generic
//! dispatch; the first matcher whose handler produces an answer wins and
//! the provider rotation never runs. A matcher whose lookup fails simply
//! yields to the next stage — a weather query about a city the weather
//! API does not know still gets a regular search.

use async_trait::async_trait;

pub mod market;
pub mod weather;

use crate::config::Config;

#[async_trait]
pub trait IntentMatcher: Send + Sync {
    fn name(&self) -> &'static str;

    /// Cheap keyword predicate — no I/O.
    fn matches(&self, query: &str) -> bool;

    /// Run the direct lookup. `None` means "not confident, fall
    /// through"; transport failures are folded into `None` here too.
    async fn handle(&self, query: &str) -> Option<String>;
}

/// Case-insensitive any-keyword containment check shared by matchers.
pub(crate) fn contains_keyword(query: &str, keywords: &[&str]) -> bool {
    let lower = query.to_lowercase();
    keywords.iter().any(|k| lower.contains(k))
}

/// Build the matcher list from config, in evaluation order. A matcher
/// without credentials is left out entirely.
pub fn build_matchers(config: &Config) -> Vec<Box<dyn IntentMatcher>> {
    let mut matchers: Vec<Box<dyn IntentMatcher>> = Vec::new();
    if let Some(key) = &config.openweather_key {
        matchers.push(Box::new(weather::WeatherMatcher::new(key.clone())));
    }
    if let Some(key) = &config.polygon_key {
        matchers.push(Box::new(market::MarketMatcher::new(key.clone())));
    }
    matchers
}
