//! Placeholder substitution against the scenario cache.
//!
//! A placeholder has the form `{{.KEY}}` where `KEY` is any run of characters
//! other than braces and whitespace (whitespace inside the braces is allowed).
//! Resolution is all-or-nothing: one missing key fails the whole template.

use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use crate::cache::Cache;
use crate::error::{CoreError, CoreResult};

lazy_static! {
    static ref PLACEHOLDER_REGEX: Regex =
        Regex::new(r"\{\{\s*\.([^{}\s]+)\s*\}\}").unwrap();
}

/// Expands templated text using values saved in a cache
pub trait TemplateEngine: Send + Sync + fmt::Debug {
    fn resolve(&self, template: &str, cache: &dyn Cache) -> CoreResult<String>;
}

/// Default engine for `{{.KEY}}` placeholders. Single pass, no nesting.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderEngine;

impl PlaceholderEngine {
    pub fn new() -> Self {
        Self
    }
}

impl TemplateEngine for PlaceholderEngine {
    fn resolve(&self, template: &str, cache: &dyn Cache) -> CoreResult<String> {
        let mut output = String::with_capacity(template.len());
        let mut last_end = 0;

        for caps in PLACEHOLDER_REGEX.captures_iter(template) {
            let (Some(whole), Some(identifier)) = (caps.get(0), caps.get(1)) else {
                continue;
            };

            let value = cache.get_saved(identifier.as_str()).map_err(|err| match err {
                CoreError::NotFound(key) => CoreError::TemplateResolution(key),
                other => other,
            })?;

            output.push_str(&template[last_end..whole.start()]);
            output.push_str(&value.to_template_string()?);
            last_end = whole.end();
        }

        if last_end == 0 {
            return Ok(template.to_string());
        }

        output.push_str(&template[last_end..]);
        debug!(template, resolved = %output, "Resolved template");
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ConcurrentCache;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn cache_with(entries: &[(&str, serde_json::Value)]) -> ConcurrentCache {
        let cache = ConcurrentCache::new();
        for (key, value) in entries {
            cache.save(key, value.clone().into());
        }
        cache
    }

    #[test]
    fn test_resolve_single_placeholder() {
        let cache = cache_with(&[("K", json!("abc"))]);
        assert_eq!(PlaceholderEngine.resolve("{{.K}}", &cache).unwrap(), "abc");
    }

    #[test]
    fn test_resolve_mixed_text_and_value_kinds() {
        let cache = cache_with(&[
            ("HOST", json!("http://localhost:8080")),
            ("ID", json!(42)),
            ("RATIO", json!(2.0)),
            ("ACTIVE", json!(true)),
            ("FILTER", json!({"tags": ["a"]})),
        ]);

        let resolved = PlaceholderEngine
            .resolve(
                "{{.HOST}}/users/{{ .ID }}?ratio={{.RATIO}}&active={{.ACTIVE}} {{.FILTER}}",
                &cache,
            )
            .unwrap();

        assert_eq!(
            resolved,
            r#"http://localhost:8080/users/42?ratio=2&active=true {"tags":["a"]}"#
        );
    }

    #[test]
    fn test_missing_identifier_fails_whole_template() {
        let cache = cache_with(&[("PRESENT", json!("x"))]);

        let result = PlaceholderEngine.resolve("{{.PRESENT}}-{{.MISSING}}", &cache);

        assert_eq!(
            result,
            Err(CoreError::TemplateResolution("MISSING".to_string()))
        );
    }

    #[test]
    fn test_text_without_placeholders_is_unchanged() {
        let cache = ConcurrentCache::new();
        for text in ["", "plain text", "{{ not a placeholder }}", "{.ID}", "{{.}}"] {
            assert_eq!(PlaceholderEngine.resolve(text, &cache).unwrap(), text);
        }
    }

    #[test]
    fn test_no_recursive_expansion() {
        let cache = cache_with(&[("OUTER", json!("{{.INNER}}"))]);
        assert_eq!(
            PlaceholderEngine.resolve("{{.OUTER}}", &cache).unwrap(),
            "{{.INNER}}"
        );
    }

    #[test]
    fn test_keys_with_dashes_and_non_ascii_letters() {
        let cache = cache_with(&[("USER-ID", json!(7)), ("ZAŻÓŁĆ", json!("gęślą"))]);

        assert_eq!(
            PlaceholderEngine.resolve("/users/{{.USER-ID}}", &cache).unwrap(),
            "/users/7"
        );
        assert_eq!(
            PlaceholderEngine.resolve("{{ .ZAŻÓŁĆ }} jaźń", &cache).unwrap(),
            "gęślą jaźń"
        );
        assert_eq!(
            PlaceholderEngine.resolve("{{.MISSING-KEY}}", &cache),
            Err(CoreError::TemplateResolution("MISSING-KEY".to_string()))
        );
    }

    #[test]
    fn test_dotted_key_is_looked_up_verbatim() {
        let cache = cache_with(&[("user.name", json!("john"))]);
        assert_eq!(PlaceholderEngine.resolve("{{.user.name}}", &cache).unwrap(), "john");
        assert_eq!(
            PlaceholderEngine.resolve("{{.user.id}}", &cache),
            Err(CoreError::TemplateResolution("user.id".to_string()))
        );
    }
}
