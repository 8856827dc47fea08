//! # Request Parameters
//!
//! Normalization of GSA query parameters into [`GsaRequestParams`].
//!
//! Parsing never fails: malformed or missing values are replaced by the
//! configured defaults, numeric values are bounded, and blank strings are
//! treated as absent.

use super::language::parse_accept_language;
use super::sort::{render_sort, resolve_sort, SortClause};
use super::{param, GsaRequest, CONDITION_KEYS, LABEL_FIELD};
use crate::config::GsaConfig;
use std::collections::BTreeMap;
use std::str::FromStr;
use tracing::debug;

/// Normalized, immutable view of one GSA search request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GsaRequestParams {
    query: String,
    start_position: usize,
    offset: usize,
    page_size: usize,
    sort_param: String,
    sort_clauses: Vec<SortClause>,
    fields: BTreeMap<String, Vec<String>>,
    extra_queries: Vec<String>,
    conditions: BTreeMap<String, Vec<String>>,
    languages: Vec<String>,
    similar_doc_hash: Option<String>,
    track_total_hits: Option<String>,
    output_encoding: String,
    raw_params: Vec<(String, String)>,
}

impl GsaRequestParams {
    /// Read and normalize every parameter of `request`
    pub fn new(request: &GsaRequest, config: &GsaConfig) -> Self {
        let params = Self {
            query: request.parameter(param::QUERY).unwrap_or_default().to_string(),
            start_position: parse_or(request.parameter(param::START), 0),
            offset: parse_or(request.parameter(param::OFFSET), 0),
            page_size: parse_page_size(request.parameter(param::NUM), config),
            sort_param: request
                .parameter(param::SORT)
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(config.default_sort.as_str())
                .to_string(),
            sort_clauses: resolve_sort(request.non_blank_parameter(param::SORT), config),
            fields: parse_fields(request),
            extra_queries: parse_extra_queries(request, &config.meta_prefix),
            conditions: parse_conditions(request),
            languages: parse_languages(request, &config.default_lang),
            similar_doc_hash: request
                .non_blank_parameter(param::SIMILAR_DOC_HASH)
                .map(str::to_string),
            track_total_hits: request
                .parameter(param::TRACK_TOTAL_HITS)
                .map(str::to_string),
            output_encoding: request
                .non_blank_parameter(param::OUTPUT_ENCODING)
                .unwrap_or(config.default_encoding.as_str())
                .to_string(),
            raw_params: request.parameters().to_vec(),
        };

        debug!(
            query = %params.query,
            start = params.start_position,
            num = params.page_size,
            sort = %params.sort(),
            "Parsed GSA request parameters"
        );
        params
    }

    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    #[must_use]
    pub const fn start_position(&self) -> usize {
        self.start_position
    }

    #[must_use]
    pub const fn offset(&self) -> usize {
        self.offset
    }

    #[must_use]
    pub const fn page_size(&self) -> usize {
        self.page_size
    }

    /// The raw `sort` parameter, or the default sort when absent
    #[must_use]
    pub fn sort_param(&self) -> &str {
        &self.sort_param
    }

    #[must_use]
    pub fn sort_clauses(&self) -> &[SortClause] {
        &self.sort_clauses
    }

    /// Sort clauses in the engine's `field.order,field.order` form
    #[must_use]
    pub fn sort(&self) -> String {
        render_sort(&self.sort_clauses)
    }

    #[must_use]
    pub const fn fields(&self) -> &BTreeMap<String, Vec<String>> {
        &self.fields
    }

    #[must_use]
    pub fn extra_queries(&self) -> &[String] {
        &self.extra_queries
    }

    #[must_use]
    pub const fn conditions(&self) -> &BTreeMap<String, Vec<String>> {
        &self.conditions
    }

    #[must_use]
    pub fn languages(&self) -> &[String] {
        &self.languages
    }

    #[must_use]
    pub fn similar_doc_hash(&self) -> Option<&str> {
        self.similar_doc_hash.as_deref()
    }

    #[must_use]
    pub fn track_total_hits(&self) -> Option<&str> {
        self.track_total_hits.as_deref()
    }

    /// Character encoding requested through `oe`
    #[must_use]
    pub fn output_encoding(&self) -> &str {
        &self.output_encoding
    }

    /// Inbound parameters exactly as received, echoed as `<PARAM>` elements
    #[must_use]
    pub fn raw_params(&self) -> &[(String, String)] {
        &self.raw_params
    }
}

/// Parse `raw` as `T`, falling back to `default` when absent or malformed
pub fn parse_or<T: FromStr>(raw: Option<&str>, default: T) -> T {
    raw.and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}

fn parse_page_size(raw: Option<&str>, config: &GsaConfig) -> usize {
    let requested = match parse_or(raw, config.default_page_size) {
        0 => config.default_page_size,
        n => n,
    };
    // not `clamp`: an unvalidated config must not panic here
    requested.min(config.max_page_size).max(config.min_page_size)
}

fn parse_fields(request: &GsaRequest) -> BTreeMap<String, Vec<String>> {
    let mut fields = BTreeMap::new();

    for (key, value) in request.parameters() {
        let Some(name) = key.strip_prefix(param::FIELDS_PREFIX) else {
            continue;
        };
        if name.is_empty() || value.trim().is_empty() {
            continue;
        }
        fields
            .entry(name.to_string())
            .or_insert_with(|| vec![value.clone()]);
    }

    if let Some(site) = request.non_blank_parameter(param::SITE) {
        fields.insert(LABEL_FIELD.to_string(), vec![site.to_string()]);
    }

    fields
}

fn parse_extra_queries(request: &GsaRequest, meta_prefix: &str) -> Vec<String> {
    let mut queries: Vec<String> = request
        .parameter_values(param::EXTRA_QUERY)
        .filter(|q| !q.trim().is_empty())
        .map(str::to_string)
        .collect();

    if let Some(clause) = request
        .non_blank_parameter(param::REQUIRED_FIELDS)
        .and_then(|spec| required_fields_query(spec, meta_prefix))
    {
        queries.push(clause);
    }

    queries
}

/// Translate a GSA `requiredfields` expression into one query clause
///
/// `.` conjoins, `|` separates alternatives, and `name:value` requires a
/// value rather than mere presence:
/// `title.author|editor` becomes `meta_title:* AND (meta_author:* OR meta_editor:*)`.
#[must_use]
pub fn required_fields_query(spec: &str, meta_prefix: &str) -> Option<String> {
    let groups: Vec<String> = spec
        .split('.')
        .filter_map(|segment| {
            let terms: Vec<String> = segment
                .split('|')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .filter_map(|t| required_field_term(t, meta_prefix))
                .collect();

            match terms.len() {
                0 => None,
                1 => terms.into_iter().next(),
                _ => Some(format!("({})", terms.join(" OR "))),
            }
        })
        .collect();

    (!groups.is_empty()).then(|| groups.join(" AND "))
}

fn required_field_term(term: &str, meta_prefix: &str) -> Option<String> {
    match term.split_once(':') {
        Some((name, _)) if name.trim().is_empty() => None,
        Some((name, value)) if !value.trim().is_empty() => {
            let value = value.trim().replace('\\', "\\\\").replace('"', "\\\"");
            Some(format!("{meta_prefix}{}:\"{value}\"", name.trim()))
        }
        Some((name, _)) => Some(format!("{meta_prefix}{}:*", name.trim())),
        None => Some(format!("{meta_prefix}{term}:*")),
    }
}

fn parse_conditions(request: &GsaRequest) -> BTreeMap<String, Vec<String>> {
    CONDITION_KEYS
        .iter()
        .filter_map(|key| {
            let name = format!("{}{key}", param::CONDITION_PREFIX);
            request
                .non_blank_parameter(&name)
                .map(|value| ((*key).to_string(), vec![value.to_string()]))
        })
        .collect()
}

fn parse_languages(request: &GsaRequest, default_lang: &str) -> Vec<String> {
    if let Some(lang) = request.non_blank_parameter(param::USER_LANG) {
        return vec![lang.to_string()];
    }

    let negotiated = request
        .accept_language()
        .map(parse_accept_language)
        .unwrap_or_default();
    if negotiated.is_empty() {
        vec![default_lang.to_string()]
    } else {
        negotiated
    }
}
