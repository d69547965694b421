//! Client settings sent with `initialize` and `workspace/didChangeConfiguration`.

use serde::Deserialize;
use serde_json::Value;

/// Section name used by editor clients.
pub const SETTINGS_SECTION: &str = "unusedCssFinder";

/// Settings understood by the server. Unset values defer to deadcss.toml.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinderSettings {
    pub enable_fallback_search: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Wrapped {
    unused_css_finder: Option<FinderSettings>,
}

/// Key of the only setting, as sent by clients.
const FALLBACK_KEY: &str = "enableFallbackSearch";

/// Read settings from either `{ "unusedCssFinder": { ... } }` or the bare
/// section object. Malformed values, and objects carrying neither form (such
/// as other extensions' sections), yield `None` so current settings are kept.
pub fn parse_settings(value: &Value) -> Option<FinderSettings> {
    if value.get(SETTINGS_SECTION).is_some() {
        let wrapped: Wrapped = serde_json::from_value(value.clone()).ok()?;
        return wrapped.unused_css_finder;
    }
    if value.get(FALLBACK_KEY).is_some() {
        return serde_json::from_value(value.clone()).ok();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wrapped_settings() {
        let value = json!({ "unusedCssFinder": { "enableFallbackSearch": false } });
        assert_eq!(
            parse_settings(&value),
            Some(FinderSettings { enable_fallback_search: Some(false) })
        );
    }

    #[test]
    fn test_bare_settings() {
        let value = json!({ "enableFallbackSearch": true });
        assert_eq!(parse_settings(&value).unwrap().enable_fallback_search, Some(true));
    }

    #[test]
    fn test_missing_or_malformed_settings() {
        assert_eq!(parse_settings(&Value::Null), None);
        assert_eq!(
            parse_settings(&json!({ "enableFallbackSearch": "yes" })),
            None
        );
        assert_eq!(parse_settings(&json!({})), None);
    }

    #[test]
    fn test_unrelated_sections_keep_current_settings() {
        let value = json!({ "editor": { "tabSize": 2 }, "css": { "validate": true } });
        assert_eq!(parse_settings(&value), None);
    }
}
