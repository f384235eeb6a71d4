//! Batch orchestration: runs search, harvest, format, and ask for each entity.

use std::collections::HashSet;

use serde::Serialize;
use tracing::{info, warn};

use crate::format::render_page;
use crate::harvest::PageHarvester;
use crate::llm::{Answer, ChatCompletion, ask};
use crate::retry::{RetryPolicy, Sleeper, TokioSleeper};
use crate::search::UrlResolver;

/// Email value recorded when no answer was found.
pub const NOT_FOUND: &str = "notfound";
/// Email value recorded when the model could not be reached.
pub const UNAVAILABLE: &str = "unavailable";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Status {
    #[serde(rename = "success")]
    Success,
    #[serde(rename = "Not found")]
    NotFound,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultRecord {
    pub entity: String,
    pub email: String,
    pub status: Status,
}

#[derive(Debug, Default, Serialize)]
pub struct BatchOutcome {
    pub results: Vec<ResultRecord>,
    pub logs: Vec<String>,
}

enum Resolution {
    Found(String),
    NotFound,
    Unavailable,
}

impl Resolution {
    fn into_record(self, entity: &str) -> ResultRecord {
        let (email, status) = match self {
            Resolution::Found(value) => (value, Status::Success),
            Resolution::NotFound => (NOT_FOUND.to_string(), Status::NotFound),
            Resolution::Unavailable => (UNAVAILABLE.to_string(), Status::NotFound),
        };
        ResultRecord {
            entity: entity.to_string(),
            email,
            status,
        }
    }
}

/// Trimmed, non-blank entities in order of first appearance.
pub fn unique_entities<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    raw.into_iter()
        .map(|e| e.as_ref().trim().to_string())
        .filter(|e| !e.is_empty() && seen.insert(e.clone()))
        .collect()
}

pub struct Pipeline<R, H, C, S = TokioSleeper> {
    resolver: R,
    harvester: H,
    chat: C,
    sleeper: S,
    policy: RetryPolicy,
}

impl<R, H, C> Pipeline<R, H, C> {
    pub fn new(resolver: R, harvester: H, chat: C, policy: RetryPolicy) -> Self {
        Self {
            resolver,
            harvester,
            chat,
            sleeper: TokioSleeper,
            policy,
        }
    }
}

impl<R, H, C, S> Pipeline<R, H, C, S>
where
    R: UrlResolver,
    H: PageHarvester,
    C: ChatCompletion,
    S: Sleeper,
{
    #[cfg(test)]
    pub(crate) fn with_sleeper<T: Sleeper>(self, sleeper: T) -> Pipeline<R, H, C, T> {
        Pipeline {
            resolver: self.resolver,
            harvester: self.harvester,
            chat: self.chat,
            sleeper,
            policy: self.policy,
        }
    }

    /// Resolves every unique entity in turn. A failure for one entity is
    /// recorded against it and never stops the batch.
    pub async fn run(&self, entities: &[String], query_template: &str) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();

        for entity in unique_entities(entities) {
            let resolution = self
                .resolve_entity(&entity, query_template, &mut outcome.logs)
                .await;
            outcome.results.push(resolution.into_record(&entity));
        }

        info!(
            entities = outcome.results.len(),
            found = outcome
                .results
                .iter()
                .filter(|r| r.status == Status::Success)
                .count(),
            "batch complete"
        );
        outcome
    }

    async fn resolve_entity(
        &self,
        entity: &str,
        query_template: &str,
        logs: &mut Vec<String>,
    ) -> Resolution {
        let query = format!("{} {entity}", query_template.trim());
        logs.push(format!("Processing query for: {entity}"));
        info!(%entity, %query, "processing entity");

        let Some(url) = self.resolver.resolve(&query).await.into_iter().next() else {
            logs.push(format!("No candidate URL found for {entity}."));
            warn!(%entity, "no candidate URL");
            return Resolution::NotFound;
        };

        let Some(page) = self.harvester.harvest(&url).await else {
            logs.push(format!("No relevant data found for {entity}."));
            warn!(%entity, %url, "nothing harvested");
            return Resolution::NotFound;
        };

        let content = match render_page(&page) {
            Ok(content) => content,
            Err(e) => {
                logs.push(format!("Could not format data for {entity}: {e}"));
                warn!(%entity, error = %e, "formatting failed");
                return Resolution::NotFound;
            }
        };

        match ask(&self.chat, &self.sleeper, &content, &query, &self.policy).await {
            Answer::Value(value) => {
                logs.push(format!("Found answer for {entity}."));
                Resolution::Found(value)
            }
            Answer::NotFound => {
                logs.push(format!("No answer found for {entity} at {url}."));
                Resolution::NotFound
            }
            Answer::Unavailable => {
                logs.push(format!("LLM unavailable while processing {entity}."));
                Resolution::Unavailable
            }
        }
    }
}
