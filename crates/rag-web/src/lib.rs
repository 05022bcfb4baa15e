//! rag-web - Web search providers
//!
//! Implementations of [`WebSearchPort`] that fetch organic Google results
//! through a SERP API:
//!
//! - [`BrightDataSearch`]: Bright Data super proxy with `brd_json=1`
//! - [`SerperSearch`]: the Serper.dev search API
//!
//! Credentials are read from the environment on every call, so a `.env`
//! edited between calls is picked up without a restart.

mod bright_data;
mod serp;
mod serper;

use std::sync::Arc;
use std::time::Duration;

pub use bright_data::BrightDataSearch;
pub use serper::SerperSearch;

// Re-export the port trait for convenience
pub use rag_core::WebSearchPort;

use rag_core::{RagError, Result, SearchProvider, WebResult, WebSearchConfig};

/// Environment variable lookup.
pub type EnvLookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Lookup reading the process environment.
pub fn process_env() -> EnvLookup {
    Arc::new(|key: &str| std::env::var(key).ok())
}

/// Build the provider selected by the configuration.
pub fn from_config(config: &WebSearchConfig) -> Arc<dyn WebSearchPort> {
    with_env(config, process_env())
}

/// Build the configured provider with a custom environment lookup.
pub fn with_env(config: &WebSearchConfig, env: EnvLookup) -> Arc<dyn WebSearchPort> {
    let timeout = Duration::from_secs(config.timeout_secs);
    match config.provider {
        SearchProvider::BrightData => Arc::new(BrightDataSearch::new(
            config.bright_data_endpoint.clone(),
            timeout,
            env,
        )),
        SearchProvider::Serper => Arc::new(SerperSearch::new(
            config.serper_endpoint.clone(),
            timeout,
            env,
        )),
    }
}

/// Render results as `"{title} — {url}\n{snippet}"` strings.
pub fn format_results(results: &[WebResult]) -> Vec<String> {
    results.iter().map(ToString::to_string).collect()
}

/// Values of the required variables, in order.
///
/// Fails naming every variable that is unset or empty.
pub(crate) fn require_vars(env: &EnvLookup, keys: &[&str]) -> Result<Vec<String>> {
    let mut values = Vec::with_capacity(keys.len());
    let mut missing = Vec::new();

    for key in keys {
        match env(*key).filter(|v| !v.is_empty()) {
            Some(value) => values.push(value),
            None => missing.push(*key),
        }
    }

    if !missing.is_empty() {
        return Err(RagError::missing_credentials(missing));
    }
    Ok(values)
}

#[cfg(test)]
pub(crate) fn env_from(pairs: &[(&str, &str)]) -> EnvLookup {
    let vars: std::collections::HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    Arc::new(move |key: &str| vars.get(key).cloned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_vars() {
        let env = env_from(&[("A", "1"), ("B", "2")]);
        assert_eq!(require_vars(&env, &["B", "A"]).unwrap(), vec!["2", "1"]);
    }

    #[test]
    fn test_require_vars_names_all_missing() {
        let env = env_from(&[("A", "1"), ("C", "")]);

        let err = require_vars(&env, &["A", "B", "C"]).unwrap_err();
        match &err {
            RagError::MissingCredentials { variables } => assert_eq!(variables, &["B", "C"]),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.to_string().contains("B, C"));
    }

    #[test]
    fn test_format_results() {
        let results = vec![WebResult {
            title: "Rust".to_string(),
            url: "https://rust-lang.org".to_string(),
            snippet: "Fast.".to_string(),
        }];
        assert_eq!(
            format_results(&results),
            vec!["Rust — https://rust-lang.org\nFast.".to_string()]
        );
    }

    #[test]
    fn test_from_config_selects_provider() {
        let mut config = WebSearchConfig::default();
        assert_eq!(with_env(&config, env_from(&[])).provider(), "bright_data");

        config.provider = SearchProvider::Serper;
        assert_eq!(with_env(&config, env_from(&[])).provider(), "serper");
    }
}
