//! # HTTP Search Engine Adapter
//!
//! Concrete implementation of the [`SearchEnginePort`] that forwards
//! normalized GSA parameters to a JSON search API and maps the answer back
//! into a [`SearchResponse`].

use crate::config::Config;
use crate::gsa::response::field;
use crate::gsa::{param, Document, GsaRequestParams, SearchResponse, XmlValue};
use crate::ports::SearchEnginePort;
use crate::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::ACCEPT;
use serde::Deserialize;
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Page of results as returned by the JSON search API
#[derive(Debug, Deserialize)]
struct EngineResponse {
    /// Execution time in seconds
    #[serde(default)]
    exec_time: f64,
    #[serde(default)]
    record_count: u64,
    #[serde(default)]
    data: Vec<serde_json::Map<String, Value>>,
}

/// Search engine reached over HTTP
#[derive(Debug, Clone)]
pub struct HttpSearchEngine {
    client: reqwest::Client,
    endpoint: Url,
    /// Fields whose RFC 3339 strings are surfaced as dates
    date_fields: Vec<String>,
}

impl HttpSearchEngine {
    /// Create a new adapter for the configured engine
    pub fn new(config: &Config) -> Result<Self> {
        let engine = &config.engine;
        let endpoint = format!(
            "{}{}",
            engine.base_url.trim_end_matches('/'),
            engine.search_path
        );
        let endpoint = Url::parse(&endpoint)
            .map_err(|e| Error::invalid_input("engine.base_url", format!("{endpoint}: {e}")))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(engine.timeout_secs))
            .user_agent(engine.user_agent.as_str())
            .build()?;

        info!("Initializing HttpSearchEngine for {}", endpoint);

        Ok(Self {
            client,
            endpoint,
            date_fields: vec![
                field::LAST_MODIFIED.to_string(),
                "created".to_string(),
                config.gsa.timestamp_field.clone(),
            ],
        })
    }

    #[must_use]
    pub const fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Query string sent to the engine for `params`
    #[must_use]
    pub fn query_pairs(params: &GsaRequestParams) -> Vec<(String, String)> {
        let mut pairs = vec![
            (param::QUERY.to_string(), params.query().to_string()),
            (param::START.to_string(), params.start_position().to_string()),
            (param::OFFSET.to_string(), params.offset().to_string()),
            (param::NUM.to_string(), params.page_size().to_string()),
            (param::SORT.to_string(), params.sort()),
        ];

        for (name, values) in params.fields() {
            let key = format!("{}{name}", param::FIELDS_PREFIX);
            pairs.extend(values.iter().map(|v| (key.clone(), v.clone())));
        }
        pairs.extend(
            params
                .extra_queries()
                .iter()
                .map(|q| (param::EXTRA_QUERY.to_string(), q.clone())),
        );
        for (name, values) in params.conditions() {
            let key = format!("{}{name}", param::CONDITION_PREFIX);
            pairs.extend(values.iter().map(|v| (key.clone(), v.clone())));
        }
        pairs.extend(
            params
                .languages()
                .iter()
                .map(|lang| ("lang".to_string(), lang.clone())),
        );
        if let Some(sdh) = params.similar_doc_hash() {
            pairs.push((param::SIMILAR_DOC_HASH.to_string(), sdh.to_string()));
        }
        if let Some(track) = params.track_total_hits() {
            pairs.push((param::TRACK_TOTAL_HITS.to_string(), track.to_string()));
        }

        pairs
    }

    fn map_response(&self, body: EngineResponse) -> SearchResponse {
        let exec_time = Duration::try_from_secs_f64(body.exec_time).unwrap_or_default();

        let documents = body
            .data
            .into_iter()
            .map(|fields| {
                let mut document = Document::new();
                for (name, value) in fields {
                    let value = to_xml_value(value);
                    let value = if self.date_fields.contains(&name) {
                        promote_date(value)
                    } else {
                        value
                    };
                    document.insert(name, value);
                }
                document
            })
            .collect();

        SearchResponse {
            exec_time,
            total_hits: body.record_count,
            documents,
        }
    }
}

#[async_trait]
impl SearchEnginePort for HttpSearchEngine {
    #[instrument(skip(self, params), fields(q = %params.query(), start = params.start_position(), num = params.page_size()))]
    async fn search(&self, params: &GsaRequestParams) -> Result<SearchResponse> {
        let started = Instant::now();
        let pairs = Self::query_pairs(params);
        debug!(endpoint = %self.endpoint, ?pairs, "Sending search request");

        let response = self
            .client
            .get(self.endpoint.clone())
            .query(&pairs)
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "Search engine returned an error");
            return Err(Error::SearchEngine {
                status: status.as_u16(),
                message,
            });
        }

        let body: EngineResponse = response.json().await.map_err(|e| Error::Parse {
            context: "search engine response".to_string(),
            message: e.to_string(),
        })?;
        let result = self.map_response(body);

        info!(
            "Search completed in {}ms, {} of {} hits returned",
            started.elapsed().as_millis(),
            result.documents.len(),
            result.total_hits
        );
        Ok(result)
    }

    fn name(&self) -> &str {
        "http"
    }
}

fn scalar_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

fn to_xml_value(value: Value) -> XmlValue {
    match value {
        Value::Null => XmlValue::Null,
        Value::String(s) => XmlValue::Text(s),
        Value::Bool(_) | Value::Number(_) => XmlValue::Text(value.to_string()),
        Value::Array(items) => XmlValue::List(
            items
                .into_iter()
                .filter(|v| !v.is_null())
                .map(scalar_text)
                .collect(),
        ),
        Value::Object(entries) => XmlValue::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k, scalar_text(v)))
                .collect(),
        ),
    }
}

fn promote_date(value: XmlValue) -> XmlValue {
    match value {
        XmlValue::Text(text) => match DateTime::parse_from_rfc3339(text.trim()) {
            Ok(date) => XmlValue::Date(date.with_timezone(&Utc)),
            Err(_) => XmlValue::Text(text),
        },
        other => other,
    }
}
