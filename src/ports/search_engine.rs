//! # Search Engine Port
//!
//! Defines the port interface for the search engine behind the adapter.

use crate::gsa::{GsaRequestParams, SearchResponse};
use crate::Result;
use async_trait::async_trait;
use std::fmt::Debug;

/// Port interface for search execution
///
/// Implementations receive fully normalized parameters (bounded paging,
/// resolved sort clauses, languages) and return one page of results.
/// Ranking, index access and authentication are the implementation's concern.
///
/// # Errors
///
/// Implementations return an error when the engine cannot be reached or
/// answers with something that cannot be interpreted as a result page.
#[async_trait]
pub trait SearchEnginePort: Send + Sync + Debug {
    /// Execute the search described by `params`
    async fn search(&self, params: &GsaRequestParams) -> Result<SearchResponse>;

    /// Short engine name used in logs
    fn name(&self) -> &str;
}
