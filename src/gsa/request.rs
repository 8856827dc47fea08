/// Inbound request as seen by the parameter parser
///
/// Holds the request path, the decoded query parameters in their original
/// order (names may repeat) and the `Accept-Language` header value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GsaRequest {
    path: String,
    params: Vec<(String, String)>,
    accept_language: Option<String>,
}

impl GsaRequest {
    /// Create an empty request for `path`
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            params: Vec::new(),
            accept_language: None,
        }
    }

    /// Build a request from a raw (still form-encoded) query string
    #[must_use]
    pub fn from_parts(path: &str, query: Option<&str>, accept_language: Option<&str>) -> Self {
        let params = query
            .map(|q| {
                url::form_urlencoded::parse(q.as_bytes())
                    .map(|(k, v)| (k.into_owned(), v.into_owned()))
                    .collect()
            })
            .unwrap_or_default();

        Self {
            path: path.to_string(),
            params,
            accept_language: accept_language.map(str::to_string),
        }
    }

    #[must_use]
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn with_accept_language(mut self, value: impl Into<String>) -> Self {
        self.accept_language = Some(value.into());
        self
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// First value of `name`, if present
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// First value of `name` with surrounding whitespace removed, blank treated as absent
    #[must_use]
    pub fn non_blank_parameter(&self, name: &str) -> Option<&str> {
        self.parameter(name).map(str::trim).filter(|v| !v.is_empty())
    }

    /// All values of `name` in request order
    pub fn parameter_values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.params
            .iter()
            .filter(move |(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// All parameters in request order
    #[must_use]
    pub fn parameters(&self) -> &[(String, String)] {
        &self.params
    }

    #[must_use]
    pub fn accept_language(&self) -> Option<&str> {
        self.accept_language.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_parts_decodes_query() {
        let request = GsaRequest::from_parts(
            "/gsa/search",
            Some("q=test+search&ex_q=a&ex_q=b%26c&site=example.com"),
            Some("ja,en;q=0.5"),
        );

        assert_eq!(request.path(), "/gsa/search");
        assert_eq!(request.parameter("q"), Some("test search"));
        assert_eq!(
            request.parameter_values("ex_q").collect::<Vec<_>>(),
            vec!["a", "b&c"]
        );
        assert_eq!(request.parameter("missing"), None);
        assert_eq!(request.accept_language(), Some("ja,en;q=0.5"));
    }

    #[test]
    fn test_from_parts_without_query() {
        let request = GsaRequest::from_parts("/gsa", None, None);
        assert!(request.parameters().is_empty());
        assert!(request.accept_language().is_none());
    }

    #[test]
    fn test_non_blank_parameter() {
        let request = GsaRequest::new("/")
            .with_param("blank", "   ")
            .with_param("padded", "  abc ");
        assert_eq!(request.non_blank_parameter("blank"), None);
        assert_eq!(request.non_blank_parameter("padded"), Some("abc"));
    }
}
