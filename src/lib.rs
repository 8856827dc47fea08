//! # GSA Compatibility Adapter
//!
//! Serves the legacy Google Search Appliance XML protocol on top of a modern
//! search engine. GSA-style query parameters are normalized into
//! [`GsaRequestParams`], forwarded through a [`SearchEnginePort`], and the
//! results are rendered back as GSP 3.2 XML by [`XmlResponseFormatter`].

pub mod adapters;
pub mod config;
pub mod error;
pub mod gsa;
pub mod ports;
pub mod server;

pub use adapters::HttpSearchEngine;
pub use config::{Config, ConfigOverrides, LogFormat};
pub use error::{Error, Result};
pub use gsa::{GsaRequest, GsaRequestParams, XmlResponseFormatter, XmlValue};
pub use ports::SearchEnginePort;
pub use server::Server;
