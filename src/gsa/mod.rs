//! # GSA Protocol
//!
//! The two halves of the legacy search appliance protocol:
//!
//! - [`params`] turns raw query parameters into a bounded, normalized
//!   [`GsaRequestParams`] (fail-soft: malformed input degrades to defaults)
//! - [`xml`] and [`response`] render engine results into the GSP XML schema
//!
//! Both halves are pure functions of their inputs and the injected
//! [`crate::config::GsaConfig`].

pub mod language;
pub mod params;
pub mod request;
pub mod response;
pub mod sort;
pub mod xml;

pub use params::GsaRequestParams;
pub use request::GsaRequest;
pub use response::{Document, SearchResponse};
pub use sort::{SortClause, SortOrder};
pub use xml::{escape_text, XmlResponseFormatter, XmlValue};

/// Query parameter names of the GSA protocol
pub mod param {
    pub const QUERY: &str = "q";
    pub const START: &str = "start";
    pub const OFFSET: &str = "offset";
    pub const NUM: &str = "num";
    pub const SORT: &str = "sort";
    pub const FIELDS_PREFIX: &str = "fields.";
    pub const SITE: &str = "site";
    pub const EXTRA_QUERY: &str = "ex_q";
    pub const REQUIRED_FIELDS: &str = "requiredfields";
    pub const CONDITION_PREFIX: &str = "as_";
    pub const USER_LANG: &str = "ulang";
    pub const SIMILAR_DOC_HASH: &str = "sdh";
    pub const TRACK_TOTAL_HITS: &str = "track_total_hits";
    pub const OUTPUT_ENCODING: &str = "oe";
}

/// Field key the `site` parameter is mapped onto
pub const LABEL_FIELD: &str = "label";

/// Recognized `as_*` condition suffixes
pub const CONDITION_KEYS: &[&str] = &[
    "q",
    "epq",
    "oq",
    "nq",
    "occt",
    "sitesearch",
    "filetype",
    "timestamp",
];
