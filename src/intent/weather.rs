//! Weather intent — direct OpenWeather current-conditions lookup.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use super::{contains_keyword, IntentMatcher};
use crate::adapters::REQUEST_TIMEOUT;

const WEATHER_KEYWORDS: &[&str] = &["weather", "temperature", "climate", "forecast", "rain"];

pub struct WeatherMatcher {
    client: reqwest::Client,
    api_key: String,
}

impl WeatherMatcher {
    pub fn new(api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
        }
    }

    async fn current_conditions(&self, city: &str) -> Result<String> {
        let body: Value = self
            .client
            .get("http://api.openweathermap.org/data/2.5/weather")
            .query(&[
                ("q", city),
                ("appid", self.api_key.as_str()),
                ("units", "metric"),
            ])
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?
            .json()
            .await?;

        let name = body["name"].as_str().context("response has no city name")?;
        let temp = body["main"]["temp"]
            .as_f64()
            .context("response has no temperature")?;
        let description = body["weather"][0]["description"]
            .as_str()
            .context("response has no description")?;
        Ok(format!("🌤️ {name}: {temp}°C, {description}"))
    }
}

/// The location is taken to be the last whitespace-delimited token of
/// the query ("what is the weather in paris" → "paris").
pub(crate) fn location_from(query: &str) -> Option<&str> {
    query.split_whitespace().last()
}

#[async_trait]
impl IntentMatcher for WeatherMatcher {
    fn name(&self) -> &'static str {
        "weather"
    }

    fn matches(&self, query: &str) -> bool {
        contains_keyword(query, WEATHER_KEYWORDS)
    }

    async fn handle(&self, query: &str) -> Option<String> {
        let city = location_from(query)?;
        match self.current_conditions(city).await {
            Ok(report) => Some(report),
            Err(e) => {
                debug!(city, "weather lookup failed: {e:#}");
                None
            }
        }
    }
}
