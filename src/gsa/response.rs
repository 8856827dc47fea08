//! # GSP Response
//!
//! Search results as returned by the engine and their serialization into a
//! complete GSP 3.2 XML document.

use super::xml::{escape_text, url_encode, XmlResponseFormatter, XmlValue};
use super::{param, GsaRequestParams};
use crate::config::GsaConfig;
use crate::Result;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::io::Write;
use std::time::Duration;
use tracing::{debug, instrument};

/// Document fields with a dedicated GSP element
pub mod field {
    pub const URL: &str = "url";
    pub const TITLE: &str = "title";
    pub const DIGEST: &str = "digest";
    pub const DOC_ID: &str = "doc_id";
    pub const CONTENT_LENGTH: &str = "content_length";
    pub const LANG: &str = "lang";
    pub const MIMETYPE: &str = "mimetype";
    pub const LAST_MODIFIED: &str = "last_modified";

    pub(crate) const RESERVED: &[&str] = &[
        URL,
        TITLE,
        DIGEST,
        DOC_ID,
        CONTENT_LENGTH,
        LANG,
        MIMETYPE,
        LAST_MODIFIED,
    ];
}

/// One search hit, field name to value
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    fields: BTreeMap<String, XmlValue>,
}

impl Document {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<XmlValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<XmlValue>) {
        self.fields.insert(name.into(), value.into());
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&XmlValue> {
        self.fields.get(name)
    }

    /// Text value of `name`, if it holds one
    #[must_use]
    pub fn text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(XmlValue::as_text)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &XmlValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Result page returned by the search engine
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchResponse {
    pub exec_time: Duration,
    pub total_hits: u64,
    pub documents: Vec<Document>,
}

impl XmlResponseFormatter {
    /// Serialize a complete GSP document for `response` into `out`
    #[instrument(skip_all, fields(query = %params.query(), hits = response.documents.len()))]
    pub fn write_xml_response<W: Write>(
        &self,
        out: &mut W,
        params: &GsaRequestParams,
        response: &SearchResponse,
        config: &GsaConfig,
    ) -> Result<()> {
        let document = self.render_response(params, response, config)?;
        out.write_all(document.as_bytes())?;
        out.flush()?;
        debug!(bytes = document.len(), "GSP response written");
        Ok(())
    }

    /// Render a complete GSP document for `response`
    pub fn render_response(
        &self,
        params: &GsaRequestParams,
        response: &SearchResponse,
        config: &GsaConfig,
    ) -> Result<String> {
        let mut buf = String::with_capacity(1024 + response.documents.len() * 512);

        buf.push_str("<?xml version=\"1.0\" encoding=\"");
        buf.push_str(&escape_text(self.encoding()));
        buf.push_str("\" standalone=\"no\"?>\n<GSP VER=\"3.2\">\n");
        buf.push_str(&format!("<TM>{:.6}</TM>", response.exec_time.as_secs_f64()));
        buf.push_str("<Q>");
        buf.push_str(&escape_text(params.query()));
        buf.push_str("</Q>\n");

        for (name, value) in params.raw_params() {
            self.append_param(&mut buf, name, value)?;
            buf.push('\n');
        }

        if !response.documents.is_empty() {
            // start is client supplied and may sit at usize::MAX
            let start = params.start_position();
            let end = start.saturating_add(response.documents.len());
            buf.push_str(&format!(
                "<RES SN=\"{}\" EN=\"{end}\">\n",
                start.saturating_add(1)
            ));
            buf.push_str(&format!("<M>{}</M>\n", response.total_hits));
            self.append_navigation(&mut buf, params, response.total_hits, config)?;

            for (i, document) in response.documents.iter().enumerate() {
                let rank = start.saturating_add(i).saturating_add(1);
                self.append_document(&mut buf, rank, document, config);
            }
            buf.push_str("</RES>\n");
        }

        buf.push_str("</GSP>\n");
        Ok(buf)
    }

    fn append_navigation(
        &self,
        buf: &mut String,
        params: &GsaRequestParams,
        total_hits: u64,
        config: &GsaConfig,
    ) -> Result<()> {
        let start = params.start_position();
        let page_size = params.page_size();
        let has_prev = start > 0;
        let has_next = (start.saturating_add(page_size) as u64) < total_hits;
        if !has_prev && !has_next {
            return Ok(());
        }

        buf.push_str("<NB>");
        if has_prev {
            let prev = self.page_link(params, start.saturating_sub(page_size), config)?;
            buf.push_str("<PU>");
            buf.push_str(&escape_text(&prev));
            buf.push_str("</PU>");
        }
        if has_next {
            let next = self.page_link(params, start.saturating_add(page_size), config)?;
            buf.push_str("<NU>");
            buf.push_str(&escape_text(&next));
            buf.push_str("</NU>");
        }
        buf.push_str("</NB>\n");
        Ok(())
    }

    fn page_link(&self, params: &GsaRequestParams, start: usize, config: &GsaConfig) -> Result<String> {
        let mut query = String::new();
        for (name, value) in params
            .raw_params()
            .iter()
            .filter(|(name, _)| name != param::START)
        {
            query.push_str(&url_encode(name, self.encoding())?);
            query.push('=');
            query.push_str(&url_encode(value, self.encoding())?);
            query.push('&');
        }
        query.push_str(param::START);
        query.push('=');
        query.push_str(&start.to_string());

        Ok(format!("{}/search?{query}", config.path_prefix))
    }

    fn append_document(&self, buf: &mut String, rank: usize, document: &Document, config: &GsaConfig) {
        buf.push_str(&format!("<R N=\"{rank}\""));
        if let Some(mime) = document.text(field::MIMETYPE) {
            buf.push_str(" MIME=\"");
            buf.push_str(&escape_text(mime));
            buf.push('"');
        }
        buf.push_str(">\n");

        let url = document.text(field::URL).unwrap_or_default();
        buf.push_str("<U>");
        buf.push_str(&escape_text(url));
        buf.push_str("</U>\n<UE>");
        buf.push_str(&escape_text(&urlencoding::encode(url)));
        buf.push_str("</UE>\n");

        if let Some(title) = document.get(field::TITLE) {
            buf.push_str("<T>");
            buf.push_str(&self.escape_xml(title));
            buf.push_str("</T>\n");
        }

        if let Some(date) = document.get(field::LAST_MODIFIED).and_then(as_date) {
            buf.push_str("<FS NAME=\"date\" VALUE=\"");
            buf.push_str(&date.format("%Y-%m-%d").to_string());
            buf.push_str("\"/>\n");
        }

        for (name, value) in document.iter() {
            if field::RESERVED.contains(&name) || matches!(value, XmlValue::Null) {
                continue;
            }
            if !config.response_fields.is_empty() && !config.response_fields.iter().any(|f| f == name) {
                continue;
            }

            if value.is_scalar() {
                buf.push_str(&format!(
                    "<MT N=\"{}\" V=\"{}\"/>\n",
                    escape_text(name),
                    self.escape_xml(value)
                ));
            } else {
                buf.push_str(&format!(
                    "<MT N=\"{}\">{}</MT>\n",
                    escape_text(name),
                    self.escape_xml(value)
                ));
            }
        }

        if let Some(digest) = document.get(field::DIGEST) {
            buf.push_str("<S>");
            buf.push_str(&self.escape_xml(digest));
            buf.push_str("</S>\n");
        }

        if let Some(lang) = document.text(field::LANG) {
            buf.push_str("<LANG>");
            buf.push_str(&escape_text(lang));
            buf.push_str("</LANG>\n");
        }

        buf.push_str("<HAS><L/>");
        let size = document
            .text(field::CONTENT_LENGTH)
            .and_then(|len| len.trim().parse::<u64>().ok());
        let doc_id = document.text(field::DOC_ID);
        if size.is_some() || doc_id.is_some() {
            buf.push_str("<C");
            if let Some(bytes) = size {
                buf.push_str(&format!(" SZ=\"{}k\"", (bytes + 999) / 1000));
            }
            if let Some(id) = doc_id {
                buf.push_str(" CID=\"");
                buf.push_str(&escape_text(id));
                buf.push('"');
            }
            buf.push_str(" ENC=\"");
            buf.push_str(&escape_text(self.encoding()));
            buf.push_str("\"/>");
        }
        buf.push_str("</HAS>\n</R>\n");
    }
}

/// Date carried by a field, either typed or as an RFC 3339 string
fn as_date(value: &XmlValue) -> Option<DateTime<Utc>> {
    match value {
        XmlValue::Date(date) => Some(*date),
        XmlValue::Text(text) => DateTime::parse_from_rfc3339(text.trim())
            .ok()
            .map(|d| d.with_timezone(&Utc)),
        _ => None,
    }
}
