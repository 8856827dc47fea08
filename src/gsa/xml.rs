//! # XML Escaping
//!
//! Escaping of result values into GSP XML fragments and emission of the
//! `<PARAM>` elements echoing request parameters.

use crate::config::GsaConfig;
use crate::{Error, Result};
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, SecondsFormat, Utc};
use std::collections::BTreeMap;
use std::fmt::Write as _;

/// A value of a search result field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlValue {
    Null,
    Text(String),
    List(Vec<String>),
    Map(BTreeMap<String, String>),
    Date(DateTime<Utc>),
}

impl From<&str> for XmlValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for XmlValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Vec<String>> for XmlValue {
    fn from(value: Vec<String>) -> Self {
        Self::List(value)
    }
}

impl From<BTreeMap<String, String>> for XmlValue {
    fn from(value: BTreeMap<String, String>) -> Self {
        Self::Map(value)
    }
}

impl From<DateTime<Utc>> for XmlValue {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Date(value)
    }
}

impl<T: Into<Self>> From<Option<T>> for XmlValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl XmlValue {
    /// Whether the value renders as a plain string (usable in an attribute)
    #[must_use]
    pub const fn is_scalar(&self) -> bool {
        matches!(self, Self::Null | Self::Text(_) | Self::Date(_))
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }
}

/// Whether `c` may appear in an XML 1.0 document
#[must_use]
pub const fn is_xml_char(c: char) -> bool {
    matches!(
        c,
        '\t' | '\n' | '\r' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..='\u{10FFFF}'
    )
}

/// Escape `&`, `<`, `>` and `"` for use in XML text or attribute values
///
/// Characters XML 1.0 cannot carry at all (most C0 controls, U+FFFE, U+FFFF)
/// are dropped.
#[must_use]
pub fn escape_text(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len() + value.len() / 8);
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            c if is_xml_char(c) => escaped.push(c),
            _ => {}
        }
    }
    escaped
}

fn normalize_encoding(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '-' && *c != '_')
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Whether responses can be produced in the named character encoding
#[must_use]
pub fn is_supported_encoding(name: &str) -> bool {
    normalize_encoding(name.trim()) == "utf8"
}

/// Form-urlencode `value` (spaces become `+`) in the named character encoding
pub fn url_encode(value: &str, encoding: &str) -> Result<String> {
    if !is_supported_encoding(encoding) {
        return Err(Error::UnsupportedEncoding {
            encoding: encoding.to_string(),
        });
    }
    Ok(url::form_urlencoded::byte_serialize(value.as_bytes()).collect())
}

/// Whether `format` is a usable chrono strftime pattern
#[must_use]
pub fn is_valid_date_format(format: &str) -> bool {
    !format.is_empty() && !StrftimeItems::new(format).any(|item| matches!(item, Item::Error))
}

/// Renders result values and parameters as GSP XML fragments
#[derive(Debug, Clone)]
pub struct XmlResponseFormatter {
    encoding: String,
    date_format: String,
}

impl XmlResponseFormatter {
    #[must_use]
    pub fn new(config: &GsaConfig) -> Self {
        Self {
            encoding: config.default_encoding.clone(),
            date_format: config.date_format.clone(),
        }
    }

    /// Use `encoding` for URL-encoded attribute values and the XML declaration
    #[must_use]
    pub fn with_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = encoding.into();
        self
    }

    #[must_use]
    pub fn encoding(&self) -> &str {
        &self.encoding
    }

    /// Render `value` as an escaped XML fragment
    #[must_use]
    pub fn escape_xml(&self, value: &XmlValue) -> String {
        match value {
            XmlValue::Null => String::new(),
            XmlValue::Text(text) => escape_text(text),
            XmlValue::List(items) => {
                let mut buf = String::from("<list>");
                for item in items {
                    buf.push_str("<item>");
                    buf.push_str(&escape_text(item));
                    buf.push_str("</item>");
                }
                buf.push_str("</list>");
                buf
            }
            XmlValue::Map(entries) => {
                let mut buf = String::from("<data>");
                for (name, value) in entries {
                    buf.push_str("<name>");
                    buf.push_str(&escape_text(name));
                    buf.push_str("</name><value>");
                    buf.push_str(&escape_text(value));
                    buf.push_str("</value>");
                }
                buf.push_str("</data>");
                buf
            }
            XmlValue::Date(date) => escape_text(&self.format_date(date)),
        }
    }

    /// Format a date with the configured pattern, RFC 3339 if the pattern is unusable
    #[must_use]
    pub fn format_date(&self, date: &DateTime<Utc>) -> String {
        let mut formatted = String::new();
        if write!(formatted, "{}", date.format(&self.date_format)).is_err() || formatted.is_empty() {
            return date.to_rfc3339_opts(SecondsFormat::Millis, true);
        }
        formatted
    }

    /// Append `<PARAM name=".." value=".." original_value=".."/>`, URL-encoding `value`
    pub fn append_param(&self, buf: &mut String, name: &str, value: &str) -> Result<()> {
        let original = url_encode(value, &self.encoding)?;
        self.append_param_with_original(buf, name, value, &original);
        Ok(())
    }

    /// Append a `<PARAM>` element with an already encoded original value
    pub fn append_param_with_original(&self, buf: &mut String, name: &str, value: &str, original: &str) {
        buf.push_str("<PARAM name=\"");
        buf.push_str(&escape_text(name));
        buf.push_str("\" value=\"");
        buf.push_str(&escape_text(value));
        buf.push_str("\" original_value=\"");
        buf.push_str(&escape_text(original));
        buf.push_str("\"/>");
    }
}
