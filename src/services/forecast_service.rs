use std::sync::Arc;

use chrono::{Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::pipeline::ValidationOutcome;

pub const MAX_TEMPERATURE_C: i32 = 60;
pub const MIN_TEMPERATURE_C: i32 = -90;

const SUMMARIES: [&str; 10] = [
    "Freezing", "Bracing", "Chilly", "Cool", "Mild", "Warm", "Balmy", "Hot", "Sweltering", "Scorching",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Forecast {
    pub id: Uuid,
    pub date: NaiveDate,
    pub temperature_c: i32,
    pub temperature_f: i32,
    pub summary: Option<String>,
}

/// Client-supplied fields of a forecast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastInput {
    pub date: NaiveDate,
    pub temperature_c: i32,
    pub summary: Option<String>,
}

impl Forecast {
    pub fn new(id: Uuid, input: ForecastInput) -> Self {
        Self {
            id,
            date: input.date,
            temperature_c: input.temperature_c,
            temperature_f: fahrenheit(input.temperature_c),
            summary: input.summary,
        }
    }

    /// Plausibility check on the temperature reading
    pub fn validate(&self) -> ValidationOutcome {
        if self.temperature_c > MAX_TEMPERATURE_C {
            ValidationOutcome::fail("Temperature is too high.")
        } else if self.temperature_c < MIN_TEMPERATURE_C {
            ValidationOutcome::fail("Temperature is too low.")
        } else {
            ValidationOutcome::pass()
        }
    }
}

fn fahrenheit(celsius: i32) -> i32 {
    32 + (f64::from(celsius) * 9.0 / 5.0).round() as i32
}

/// In-memory, ordered forecast collection shared by the forecast endpoints.
///
/// Forecasts that fail [`Forecast::validate`] are handed back to the caller
/// but never stored.
#[derive(Debug, Clone, Default)]
pub struct ForecastStore {
    records: Arc<RwLock<Vec<Forecast>>>,
}

impl ForecastStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-filled with `count` deterministic forecasts, one per day from today
    pub fn seeded(count: usize) -> Self {
        let today = Utc::now().date_naive();
        let records = (0..count)
            .map(|i| {
                let input = ForecastInput {
                    date: today + Duration::days(i as i64),
                    temperature_c: ((i * 37) % 75) as i32 - 20,
                    summary: Some(SUMMARIES[i % SUMMARIES.len()].to_string()),
                };
                Forecast::new(Uuid::new_v4(), input)
            })
            .collect();

        Self {
            records: Arc::new(RwLock::new(records)),
        }
    }

    pub async fn all(&self) -> Vec<Forecast> {
        self.records.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn get(&self, id: Uuid) -> Option<Forecast> {
        self.records.read().await.iter().find(|f| f.id == id).cloned()
    }

    pub async fn contains(&self, id: Uuid) -> bool {
        self.records.read().await.iter().any(|f| f.id == id)
    }

    pub async fn insert(&self, input: ForecastInput) -> Forecast {
        let forecast = Forecast::new(Uuid::new_v4(), input);
        if forecast.validate().pass {
            self.records.write().await.push(forecast.clone());
            tracing::debug!(id = %forecast.id, "forecast stored");
        }
        forecast
    }

    /// Replace the forecast with `id`. `None` when no such forecast exists.
    pub async fn update(&self, id: Uuid, input: ForecastInput) -> Option<Forecast> {
        let mut records = self.records.write().await;
        let slot = records.iter_mut().find(|f| f.id == id)?;

        let updated = Forecast::new(id, input);
        if updated.validate().pass {
            *slot = updated.clone();
        }
        Some(updated)
    }

    pub async fn remove(&self, id: Uuid) -> bool {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|f| f.id != id);
        records.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(temperature_c: i32) -> ForecastInput {
        ForecastInput {
            date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            temperature_c,
            summary: Some("Warm".to_string()),
        }
    }

    #[test]
    fn fahrenheit_is_derived() {
        assert_eq!(Forecast::new(Uuid::nil(), input(0)).temperature_f, 32);
        assert_eq!(Forecast::new(Uuid::nil(), input(100)).temperature_f, 212);
        assert_eq!(Forecast::new(Uuid::nil(), input(-40)).temperature_f, -40);
    }

    #[test]
    fn validation_bounds() {
        assert!(Forecast::new(Uuid::nil(), input(MAX_TEMPERATURE_C)).validate().pass);
        assert_eq!(
            Forecast::new(Uuid::nil(), input(MAX_TEMPERATURE_C + 1)).validate().message,
            "Temperature is too high."
        );
        assert_eq!(
            Forecast::new(Uuid::nil(), input(MIN_TEMPERATURE_C - 1)).validate().message,
            "Temperature is too low."
        );
    }

    #[tokio::test]
    async fn seeded_store_is_ordered_and_sized() {
        let store = ForecastStore::seeded(100);
        let all = store.all().await;
        assert_eq!(all.len(), 100);
        assert!(all.windows(2).all(|w| w[0].date < w[1].date));
        assert!(all.iter().all(|f| f.validate().pass));
    }

    #[tokio::test]
    async fn invalid_forecasts_are_not_stored() {
        let store = ForecastStore::new();
        let hot = store.insert(input(75)).await;
        assert!(!hot.validate().pass);
        assert!(!store.contains(hot.id).await);

        let mild = store.insert(input(20)).await;
        assert!(store.contains(mild.id).await);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn update_and_remove() {
        let store = ForecastStore::new();
        let created = store.insert(input(10)).await;

        let updated = store.update(created.id, input(12)).await.unwrap();
        assert_eq!(store.get(created.id).await, Some(updated));

        assert!(store.update(Uuid::new_v4(), input(12)).await.is_none());
        assert!(store.remove(created.id).await);
        assert!(!store.remove(created.id).await);
    }
}
