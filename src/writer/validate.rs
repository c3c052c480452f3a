use serde_json::Value;

use crate::reporter::{Diagnostic, DiagnosticKind, Reporter};

/// Key of the cookie mapping in the analytics configuration.
pub const WRITE_COOKIES_KEY: &str = "writeCookies";

/// One cookie to write, derived from the configuration on every `write()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieWriteEntry {
    pub name: String,
    pub template: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidatedConfig {
    /// No `writeCookies`, or an empty mapping.
    Nothing,
    /// `writeCookies` is not a mapping. Already reported.
    Invalid,
    /// Entries in configuration order.
    Entries(Vec<CookieWriteEntry>),
}

/// Validates the `writeCookies` block of `config`.
///
/// Shape errors are reported here. Entries with an empty name are reported
/// and dropped; non-string templates are kept as their JSON text so they are
/// reported as unsupported later on.
pub fn validate(config: &Value, tag: &str, reporter: &dyn Reporter) -> ValidatedConfig {
    let Some(write_cookies) = config.get(WRITE_COOKIES_KEY) else {
        return ValidatedConfig::Nothing;
    };

    let Some(mapping) = write_cookies.as_object() else {
        reporter.report(&Diagnostic::new(
            DiagnosticKind::InvalidConfig,
            tag,
            format!("{WRITE_COOKIES_KEY} config must be an object"),
        ));
        return ValidatedConfig::Invalid;
    };

    let mut entries = Vec::with_capacity(mapping.len());
    for (name, value) in mapping {
        if name.is_empty() {
            reporter.report(&Diagnostic::new(
                DiagnosticKind::EmptyCookieName,
                tag,
                "cookie name must not be empty",
            ));
            continue;
        }

        let template = match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        entries.push(CookieWriteEntry { name: name.clone(), template });
    }

    if entries.is_empty() {
        ValidatedConfig::Nothing
    } else {
        ValidatedConfig::Entries(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Collect(Mutex<Vec<Diagnostic>>);

    impl Reporter for Collect {
        fn report(&self, diagnostic: &Diagnostic) {
            self.0.lock().unwrap().push(diagnostic.clone());
        }
    }

    impl Collect {
        fn messages(&self) -> Vec<String> {
            self.0.lock().unwrap().iter().map(|d| d.to_string()).collect()
        }
    }

    #[test]
    fn missing_or_empty_is_nothing_without_diagnostics() {
        let r = Collect::default();
        assert_eq!(validate(&json!({}), "[t]", &r), ValidatedConfig::Nothing);
        assert_eq!(validate(&json!({"writeCookies": {}}), "[t]", &r), ValidatedConfig::Nothing);
        assert_eq!(validate(&json!({"requests": {"a": "b"}}), "[t]", &r), ValidatedConfig::Nothing);
        assert!(r.messages().is_empty());
    }

    #[test]
    fn non_object_is_reported_once() {
        for bad in [json!("invalid"), json!(["a"]), json!(42), json!(null), json!(true)] {
            let r = Collect::default();
            let config = json!({ "writeCookies": bad });
            assert_eq!(validate(&config, "[t]", &r), ValidatedConfig::Invalid);
            assert_eq!(r.messages(), vec!["[t] writeCookies config must be an object".to_string()]);
        }
    }

    #[test]
    fn entries_keep_configuration_order() {
        let r = Collect::default();
        let config = json!({"writeCookies": {"zeta": "QUERY_PARAM(z)", "alpha": "QUERY_PARAM(a)", "mid": 5}});

        let ValidatedConfig::Entries(entries) = validate(&config, "[t]", &r) else {
            panic!("expected entries");
        };
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["zeta", "alpha", "mid"]);
        assert_eq!(entries[2].template, "5");
        assert!(r.messages().is_empty());
    }

    #[test]
    fn empty_names_are_reported_and_dropped() {
        let r = Collect::default();
        let config = json!({"writeCookies": {"": "QUERY_PARAM(a)"}});
        assert_eq!(validate(&config, "[t]", &r), ValidatedConfig::Nothing);
        assert_eq!(r.0.lock().unwrap()[0].kind, DiagnosticKind::EmptyCookieName);
    }
}
