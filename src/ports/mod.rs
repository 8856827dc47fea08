//! # Ports Module
//!
//! Port interfaces between the GSA protocol layer and the search engine it
//! fronts. The protocol layer depends only on these traits; concrete engine
//! access lives in [`crate::adapters`].
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use gsa_compat_adapter::gsa::GsaRequestParams;
//! use gsa_compat_adapter::ports::SearchEnginePort;
//! use std::sync::Arc;
//!
//! async fn run(engine: Arc<dyn SearchEnginePort>, params: GsaRequestParams) {
//!     // The caller doesn't know or care which engine answers
//!     let response = engine.search(&params).await;
//! }
//! ```

pub mod search_engine;

pub use search_engine::SearchEnginePort;
