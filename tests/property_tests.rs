use gsa_compat_adapter::config::GsaConfig;
use gsa_compat_adapter::gsa::{escape_text, Document, SearchResponse};
use gsa_compat_adapter::gsa::language::parse_accept_language;
use gsa_compat_adapter::gsa::xml::is_xml_char;
use gsa_compat_adapter::{Config, GsaRequest, GsaRequestParams, XmlResponseFormatter, XmlValue};
use proptest::prelude::*;

/// Property-based tests for parameter normalization and XML escaping
mod escaping_props {
    use super::*;

    /// Every `&` in escaped output starts one of the emitted entities
    fn ampersands_are_entities(escaped: &str) -> bool {
        escaped.match_indices('&').all(|(i, _)| {
            let rest = &escaped[i..];
            ["&amp;", "&lt;", "&gt;", "&quot;"]
                .iter()
                .any(|entity| rest.starts_with(entity))
        })
    }

    proptest! {
        #[test]
        fn test_escaped_text_has_no_markup(input in ".*") {
            let escaped = escape_text(&input);
            prop_assert!(!escaped.contains('<'));
            prop_assert!(!escaped.contains('>'));
            prop_assert!(!escaped.contains('"'));
            prop_assert!(ampersands_are_entities(&escaped));
        }

        #[test]
        fn test_escaped_text_is_xml_chars_only(input in any::<String>()) {
            let escaped = escape_text(&input);
            prop_assert!(escaped.chars().all(is_xml_char));
        }

        #[test]
        fn test_escaping_plain_text_is_identity(input in "[a-zA-Z0-9 .,:;/_-]*") {
            prop_assert_eq!(escape_text(&input), input);
        }

        #[test]
        fn test_list_items_are_escaped(items in prop::collection::vec(".*", 0..8)) {
            let formatter = XmlResponseFormatter::new(&GsaConfig::default());
            let rendered = formatter.escape_xml(&XmlValue::List(items.clone()));
            let inner = rendered
                .strip_prefix("<list>")
                .and_then(|s| s.strip_suffix("</list>"))
                .unwrap_or_default()
                .replace("<item>", "")
                .replace("</item>", "");

            prop_assert!(!inner.contains('<'));
            prop_assert_eq!(rendered.matches("<item>").count(), items.len());
        }
    }
}

mod document_props {
    use super::*;

    proptest! {
        #[test]
        fn test_rendered_document_is_well_formed(
            query in ".*",
            title in ".*",
            tags in prop::collection::vec(".*", 0..4),
        ) {
            let config = GsaConfig::default();
            let request = GsaRequest::new("/gsa/search").with_param("q", query.clone());
            let params = GsaRequestParams::new(&request, &config);
            let response = SearchResponse {
                total_hits: 50,
                documents: vec![Document::new()
                    .with_field("url", "http://example.com/?a=1&b=2")
                    .with_field("title", title)
                    .with_field("tags", tags)],
                ..SearchResponse::default()
            };

            let xml = XmlResponseFormatter::new(&config)
                .render_response(&params, &response, &config)
                .unwrap();
            let doc = match roxmltree::Document::parse(&xml) {
                Ok(doc) => doc,
                Err(e) => return Err(TestCaseError::fail(format!("not well-formed: {e}"))),
            };
            // parsers normalize carriage returns to line feeds
            let expected: String = query
                .chars()
                .filter(|&c| is_xml_char(c))
                .collect::<String>()
                .replace("\r\n", "\n")
                .replace('\r', "\n");
            let q = doc.descendants().find(|n| n.has_tag_name("Q")).and_then(|n| n.text());
            prop_assert_eq!(q.unwrap_or_default(), expected.as_str());
        }
    }
}

mod params_props {
    use super::*;

    proptest! {
        #[test]
        fn test_page_size_always_bounded(num in ".*") {
            let config = GsaConfig::default();
            let request = GsaRequest::new("/gsa").with_param("num", num);
            let params = GsaRequestParams::new(&request, &config);

            prop_assert!(params.page_size() >= config.min_page_size);
            prop_assert!(params.page_size() <= config.max_page_size);
        }

        #[test]
        fn test_numeric_page_size_clamped(num in any::<i64>()) {
            let config = GsaConfig::default();
            let request = GsaRequest::new("/gsa").with_param("num", num.to_string());
            let params = GsaRequestParams::new(&request, &config);

            let expected = if num <= 0 {
                config.default_page_size
            } else {
                usize::try_from(num).unwrap_or(usize::MAX).min(config.max_page_size)
            };
            prop_assert_eq!(params.page_size(), expected);
        }

        #[test]
        fn test_start_never_fails(start in any::<i64>()) {
            let request = GsaRequest::new("/gsa").with_param("start", start.to_string());
            let params = GsaRequestParams::new(&request, &GsaConfig::default());

            let expected = usize::try_from(start).unwrap_or(0);
            prop_assert_eq!(params.start_position(), expected);
        }

        #[test]
        fn test_sort_always_ends_with_default(sort in ".*") {
            let config = GsaConfig::default();
            let request = GsaRequest::new("/gsa").with_param("sort", sort);
            let params = GsaRequestParams::new(&request, &config);

            prop_assert!(params.sort().ends_with(&config.default_sort));
        }

        #[test]
        fn test_languages_never_empty(header in ".*") {
            let request = GsaRequest::new("/gsa").with_accept_language(header);
            let params = GsaRequestParams::new(&request, &GsaConfig::default());
            prop_assert!(!params.languages().is_empty());
        }

        #[test]
        fn test_accept_language_output_is_normalized(header in "[a-zA-Z;=,.0-9 -]*") {
            for lang in parse_accept_language(&header) {
                prop_assert!(!lang.is_empty());
                prop_assert!(!lang.contains('-'));
                prop_assert_eq!(lang.to_ascii_lowercase(), lang);
            }
        }
    }
}

mod config_validation_props {
    use super::*;

    proptest! {
        #[test]
        fn test_port_validation(port in 1u16..=65535) {
            let mut config = Config::default();
            config.server.port = port;
            prop_assert!(config.validate().is_ok(), "Valid port should be accepted: {}", port);
        }

        #[test]
        fn test_page_bounds_validation(min in 1usize..50, extra in 0usize..50) {
            let mut config = Config::default();
            config.gsa.min_page_size = min;
            config.gsa.max_page_size = min + extra;
            config.gsa.default_page_size = min;
            prop_assert!(config.validate().is_ok());
        }
    }
}
