//! GSA sort tokens (`date:D`, `meta:title:A`) and their translation into
//! engine sort clauses (`timestamp.desc`, `meta_title.asc`).

use crate::config::GsaConfig;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    /// GSA direction letter, `A` or `D`
    fn from_gsa(token: &str) -> Option<Self> {
        match token {
            "A" | "a" => Some(Self::Asc),
            "D" | "d" => Some(Self::Desc),
            _ => None,
        }
    }

    /// Engine direction suffix, `asc` or `desc`
    fn from_engine(token: &str) -> Option<Self> {
        if token.eq_ignore_ascii_case("asc") {
            Some(Self::Asc)
        } else if token.eq_ignore_ascii_case("desc") {
            Some(Self::Desc)
        } else {
            None
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// One `field.direction` sort clause
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortClause {
    pub field: String,
    pub order: SortOrder,
}

impl SortClause {
    pub fn new(field: impl Into<String>, order: SortOrder) -> Self {
        Self {
            field: field.into(),
            order,
        }
    }

    /// Parse an engine clause such as `score.desc`; a bare field sorts ascending
    #[must_use]
    pub fn parse(spec: &str) -> Option<Self> {
        let spec = spec.trim();
        if spec.is_empty() {
            return None;
        }

        match spec.rsplit_once('.') {
            Some((field, order)) if !field.is_empty() => {
                SortOrder::from_engine(order).map(|order| Self::new(field, order))
            }
            Some(_) => None,
            None => Some(Self::new(spec, SortOrder::Asc)),
        }
    }
}

impl fmt::Display for SortClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.field, self.order.as_str())
    }
}

/// Parse a comma separated clause list such as the configured default sort
#[must_use]
pub fn parse_sort_list(spec: &str) -> Vec<SortClause> {
    spec.split(',').filter_map(SortClause::parse).collect()
}

/// Translate a single GSA sort token
///
/// Trailing segments after the direction (`date:D:S:d1`) are ignored.
#[must_use]
pub fn parse_gsa_sort(token: &str, config: &GsaConfig) -> Option<SortClause> {
    let mut parts = token.trim().split(':');
    match parts.next()? {
        "date" => {
            let order = SortOrder::from_gsa(parts.next()?)?;
            Some(SortClause::new(config.timestamp_field.as_str(), order))
        }
        "meta" => {
            let field = parts.next().filter(|f| !f.is_empty())?;
            let order = SortOrder::from_gsa(parts.next()?)?;
            Some(SortClause::new(format!("{}{field}", config.meta_prefix), order))
        }
        _ => None,
    }
}

/// Resolve the effective clause list for a raw `sort` parameter
///
/// A recognized token comes first, always followed by every default sort
/// clause as tiebreaker. Anything else resolves to the default sort alone.
#[must_use]
pub fn resolve_sort(raw: Option<&str>, config: &GsaConfig) -> Vec<SortClause> {
    let defaults = parse_sort_list(&config.default_sort);

    let Some(primary) = raw.and_then(|token| parse_gsa_sort(token, config)) else {
        return defaults;
    };

    let mut clauses = Vec::with_capacity(defaults.len() + 1);
    clauses.push(primary);
    clauses.extend(defaults);
    clauses
}

/// Render clauses back into the engine's comma separated form
#[must_use]
pub fn render_sort(clauses: &[SortClause]) -> String {
    clauses
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}
