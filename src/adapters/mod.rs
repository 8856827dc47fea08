//! # Adapters Module
//!
//! Concrete implementations of the port interfaces defined in
//! [`crate::ports`]. Adapters handle the actual interaction with the search
//! engine while conforming to the port contracts.
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use gsa_compat_adapter::adapters::HttpSearchEngine;
//! use gsa_compat_adapter::ports::SearchEnginePort;
//! use gsa_compat_adapter::Config;
//! use std::sync::Arc;
//!
//! let config = Config::default();
//! let engine: Arc<dyn SearchEnginePort> = Arc::new(HttpSearchEngine::new(&config)?);
//! ```

pub mod http_search_engine;

pub use http_search_engine::HttpSearchEngine;
