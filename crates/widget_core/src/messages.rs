use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Datelike, Local, TimeZone, Timelike};
use futures::future::BoxFuture;
use rand::seq::SliceRandom;
use reqwest::Client;
use serde::Deserialize;
use shared::options::{HourRule, MessageOptions, SeasonRule};
use tracing::{debug, warn};
use url::Url;

use crate::error::WidgetError;

pub fn parse_hour_range(raw: &str) -> Option<(u32, u32)> {
    let (start, end) = raw.split_once('-')?;
    let start = start.trim().parse::<u32>().ok()?;
    let end = end.trim().parse::<u32>().ok()?;
    (start < 24 && end < 24).then_some((start, end))
}

fn parse_month_day(raw: &str) -> Option<(u32, u32)> {
    let (month, day) = raw.split_once('/')?;
    let month = month.trim().parse::<u32>().ok()?;
    let day = day.trim().parse::<u32>().ok()?;
    ((1..=12).contains(&month) && (1..=31).contains(&day)).then_some((month, day))
}

/// First rule whose inclusive hour range contains `hour`. Ranges such as
/// `23-4` wrap past midnight. Malformed rules are skipped.
pub fn welcome_for_hour(rules: &[HourRule], hour: u32) -> Option<&str> {
    rules.iter().find_map(|rule| {
        let Some((start, end)) = parse_hour_range(&rule.hours) else {
            debug!(hours = %rule.hours, "messages: skipping malformed hour rule");
            return None;
        };
        let matches = if start <= end {
            (start..=end).contains(&hour)
        } else {
            hour >= start || hour <= end
        };
        matches.then_some(rule.text.as_str())
    })
}

pub fn season_for_date(rules: &[SeasonRule], month: u32, day: u32) -> Option<&str> {
    let today = (month, day);
    rules.iter().find_map(|rule| {
        let (Some(start), Some(end)) = (parse_month_day(&rule.start), parse_month_day(&rule.end))
        else {
            debug!(start = %rule.start, end = %rule.end, "messages: skipping malformed season rule");
            return None;
        };
        let matches = if start <= end {
            start <= today && today <= end
        } else {
            today >= start || today <= end
        };
        matches.then_some(rule.text.as_str())
    })
}

pub fn welcome_message<Tz: TimeZone>(
    messages: &MessageOptions,
    now: &DateTime<Tz>,
) -> Option<String> {
    season_for_date(&messages.seasons, now.month(), now.day())
        .or_else(|| welcome_for_hour(&messages.welcome, now.hour()))
        .map(str::to_string)
}

pub fn local_welcome_message(messages: &MessageOptions) -> Option<String> {
    welcome_message(messages, &Local::now())
}

/// Blank entries are never picked.
pub fn pick_random(pool: &[String]) -> Option<String> {
    let candidates: Vec<&String> = pool.iter().filter(|text| !text.trim().is_empty()).collect();
    candidates
        .choose(&mut rand::thread_rng())
        .map(|text| text.to_string())
}

#[async_trait]
pub trait WordOfTheDay: Send + Sync {
    async fn fetch(&self) -> Result<Option<String>>;
}

#[async_trait]
impl<F> WordOfTheDay for F
where
    F: Fn() -> Option<String> + Send + Sync,
{
    async fn fetch(&self) -> Result<Option<String>> {
        Ok(self())
    }
}

#[derive(Debug, Deserialize)]
struct WordOfTheDayResponse {
    hitokoto: String,
    from: Option<String>,
}

pub struct RemoteWordOfTheDay {
    http: Client,
    endpoint: Url,
}

impl RemoteWordOfTheDay {
    pub fn new(endpoint: &str) -> Result<Self, WidgetError> {
        let endpoint = Url::parse(endpoint).map_err(|source| WidgetError::InvalidEndpoint {
            url: endpoint.to_string(),
            source,
        })?;
        Ok(Self {
            http: Client::new(),
            endpoint,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl WordOfTheDay for RemoteWordOfTheDay {
    async fn fetch(&self) -> Result<Option<String>> {
        let body: WordOfTheDayResponse = self
            .http
            .get(self.endpoint.clone())
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .with_context(|| format!("malformed word of the day from {}", self.endpoint))?;
        let text = body.hitokoto.trim();
        if text.is_empty() {
            return Ok(None);
        }
        Ok(Some(match body.from.as_deref().map(str::trim) {
            Some(from) if !from.is_empty() => format!("{text} ({from})"),
            _ => text.to_string(),
        }))
    }
}

pub type PoolProvider = Arc<dyn Fn() -> BoxFuture<'static, Vec<String>> + Send + Sync>;

#[derive(Clone)]
pub enum MessagePool {
    Literal(Vec<String>),
    Provider(PoolProvider),
}

impl MessagePool {
    async fn pick(&self) -> Option<String> {
        match self {
            Self::Literal(messages) => pick_random(messages),
            Self::Provider(provider) => pick_random(&provider().await),
        }
    }
}

#[derive(Clone)]
pub struct IdleSource {
    word_of_the_day: Option<Arc<dyn WordOfTheDay>>,
    pool: MessagePool,
}

impl IdleSource {
    pub fn new(pool: MessagePool) -> Self {
        Self {
            word_of_the_day: None,
            pool,
        }
    }

    pub fn with_word_of_the_day(mut self, provider: Arc<dyn WordOfTheDay>) -> Self {
        self.word_of_the_day = Some(provider);
        self
    }

    pub fn set_pool(&mut self, pool: MessagePool) {
        self.pool = pool;
    }

    /// Word of the day first, then the pool. `None` means the source is dry.
    pub async fn next_message(&self) -> Option<String> {
        if let Some(provider) = &self.word_of_the_day {
            match provider.fetch().await {
                Ok(Some(text)) if !text.trim().is_empty() => return Some(text),
                Ok(_) => debug!("messages: word of the day returned nothing"),
                Err(err) => warn!("messages: word of the day failed: {err:#}"),
            }
        }
        self.pool
            .pick()
            .await
            .filter(|text| !text.trim().is_empty())
    }
}
