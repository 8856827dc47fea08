use crate::config::{Config, GsaConfig};
use crate::error::ErrorCategory;
use crate::gsa::xml::is_supported_encoding;
use crate::gsa::{GsaRequest, GsaRequestParams, XmlResponseFormatter};
use crate::ports::SearchEnginePort;
use crate::{Error, Result};
use axum::{
    extract::State,
    http::{
        header::{ACCEPT_LANGUAGE, ALLOW, CONTENT_TYPE},
        HeaderMap, Method, StatusCode, Uri,
    },
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, instrument, warn};

/// Shared, immutable state of the HTTP layer
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub engine: Arc<dyn SearchEnginePort>,
}

impl AppState {
    #[must_use]
    pub fn new(config: Arc<Config>, engine: Arc<dyn SearchEnginePort>) -> Self {
        Self { config, engine }
    }
}

/// Whether `path` belongs to the GSA endpoint
///
/// The route is active only when enabled, and only for the prefix itself or
/// paths beneath it (`/gsa`, `/gsa/search`, but not `/gsax`).
#[must_use]
pub fn matches(path: &str, config: &GsaConfig) -> bool {
    config.enabled
        && path
            .strip_prefix(config.path_prefix.as_str())
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

/// Rendered GSP document plus the content type it is served with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GsaResponseBody {
    pub content_type: String,
    pub body: Vec<u8>,
}

/// Parse, search and render one GSA request
#[instrument(skip(state, request), fields(path = request.path()))]
pub async fn handle_search(state: &AppState, request: &GsaRequest) -> Result<GsaResponseBody> {
    let gsa = &state.config.gsa;
    let params = GsaRequestParams::new(request, gsa);

    // fail before querying the engine
    if !is_supported_encoding(params.output_encoding()) {
        return Err(Error::UnsupportedEncoding {
            encoding: params.output_encoding().to_string(),
        });
    }

    let response = state.engine.search(&params).await?;
    debug!(
        engine = state.engine.name(),
        total = response.total_hits,
        "Search engine answered"
    );

    let formatter = XmlResponseFormatter::new(gsa).with_encoding(params.output_encoding());
    let mut body = Vec::new();
    formatter.write_xml_response(&mut body, &params, &response, gsa)?;

    Ok(GsaResponseBody {
        content_type: format!("text/xml; charset={}", formatter.encoding()),
        body,
    })
}

/// Fallback handler: serves GSA paths, everything else is unmatched
pub async fn dispatch(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    if !matches(uri.path(), &state.config.gsa) {
        return StatusCode::NOT_FOUND.into_response();
    }
    if method != Method::GET && method != Method::HEAD {
        return (StatusCode::METHOD_NOT_ALLOWED, [(ALLOW, "GET, HEAD")]).into_response();
    }

    let accept_language = headers
        .get(ACCEPT_LANGUAGE)
        .and_then(|value| value.to_str().ok());
    let request = GsaRequest::from_parts(uri.path(), uri.query(), accept_language);

    match handle_search(&state, &request).await {
        Ok(rendered) => {
            ([(CONTENT_TYPE, rendered.content_type)], rendered.body).into_response()
        }
        Err(e) => e.into_response(),
    }
}

impl Error {
    /// HTTP status this error is reported with
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self.category() {
            ErrorCategory::Client => StatusCode::BAD_REQUEST,
            ErrorCategory::Upstream => StatusCode::BAD_GATEWAY,
            ErrorCategory::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, "GSA request failed");
        } else {
            warn!(error = %self, "GSA request rejected");
        }

        (
            status,
            [(CONTENT_TYPE, "text/plain; charset=utf-8")],
            self.to_string(),
        )
            .into_response()
    }
}

/// Liveness report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub healthy: bool,
    pub gsa_enabled: bool,
    pub engine: String,
    pub version: String,
}

/// Liveness probe handler (is the service alive?)
pub async fn health_handler(State(state): State<AppState>) -> (StatusCode, Json<HealthStatus>) {
    let status = HealthStatus {
        healthy: true,
        gsa_enabled: state.config.gsa.enabled,
        engine: state.engine.name().to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };
    (StatusCode::OK, Json(status))
}
