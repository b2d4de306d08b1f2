//! Search provider implementations.
//!
//! `build(config, api_key)` is the factory — called at startup.
//! Adding a new backend = new module + new match arm.

pub mod fixed;
pub mod serper;

use crate::config::SearchConfig;
use crate::search::{SearchError, SearchProvider};

/// Construct a `SearchProvider` from config and an optional API key.
///
/// A missing key does not fail here: the relay still starts and reports a
/// configuration error per request via [`SearchProvider::ensure_configured`].
pub fn build(config: &SearchConfig, api_key: Option<String>) -> Result<SearchProvider, SearchError> {
    match config.provider.as_str() {
        "serper" => {
            let p = serper::SerperProvider::new(
                config.api_url.clone(),
                api_key,
                config.max_results,
                config.timeout_seconds,
            )?;
            Ok(SearchProvider::Serper(p))
        }
        "static" => Ok(SearchProvider::Static(fixed::StaticProvider::new(
            config
                .static_results
                .iter()
                .map(|h| (h.title.clone(), h.snippet.clone()))
                .collect(),
            config.max_results,
        ))),
        "none" => Ok(SearchProvider::Disabled),
        other => Err(SearchError::UnknownProvider(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn builds_each_known_provider() {
        let mut cfg = Config::test_default(std::path::Path::new("/tmp")).search;
        for (name, expected) in [("serper", "serper"), ("static", "static"), ("none", "none")] {
            cfg.provider = name.into();
            assert_eq!(build(&cfg, None).unwrap().name(), expected);
        }
    }

    #[test]
    fn unknown_provider_errors() {
        let mut cfg = Config::test_default(std::path::Path::new("/tmp")).search;
        cfg.provider = "bing".into();
        assert!(matches!(build(&cfg, None), Err(SearchError::UnknownProvider(_))));
    }

    #[test]
    fn serper_without_key_is_not_configured() {
        let mut cfg = Config::test_default(std::path::Path::new("/tmp")).search;
        cfg.provider = "serper".into();
        let p = build(&cfg, None).unwrap();
        assert!(matches!(p.ensure_configured(), Err(SearchError::MissingCredential)));
        let p = build(&cfg, Some("key".into())).unwrap();
        assert!(p.ensure_configured().is_ok());
    }
}
