//! Runtime configuration read from the environment (and `.env`).

use std::time::Duration;

/// Settings for the web front end.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Address the HTTP server listens on
    pub bind_addr: String,
    /// Base URL of the engineering calculation service
    pub engineering_service_url: String,
    /// Upper bound for one "Design" action against the service
    pub design_timeout: Duration,
    /// Idle time after which a form session is forgotten
    pub session_ttl: Duration,
    /// Maximum number of sessions kept in memory
    pub session_capacity: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            engineering_service_url: "http://127.0.0.1:8000".to_string(),
            design_timeout: Duration::from_secs(60),
            session_ttl: Duration::from_secs(60 * 60),
            session_capacity: 10_000,
        }
    }
}

impl AppConfig {
    /// Read settings from process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through `lookup`, falling back to defaults for unset
    /// or unparseable values.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let seconds = |key: &str, default: Duration| -> Duration {
            match lookup(key) {
                Some(raw) => match raw.trim().parse::<u64>() {
                    Ok(secs) if secs > 0 => Duration::from_secs(secs),
                    _ => {
                        tracing::warn!("Ignoring invalid {}={:?}, using {:?}", key, raw, default);
                        default
                    }
                },
                None => default,
            }
        };

        let session_capacity = match lookup("SESSION_CAPACITY") {
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                tracing::warn!("Ignoring invalid SESSION_CAPACITY={:?}", raw);
                defaults.session_capacity
            }),
            None => defaults.session_capacity,
        };

        Self {
            bind_addr: lookup("BIND_ADDR").unwrap_or(defaults.bind_addr),
            engineering_service_url: lookup("ENGINEERING_SERVICE_URL")
                .unwrap_or(defaults.engineering_service_url),
            design_timeout: seconds("DESIGN_TIMEOUT_SECS", defaults.design_timeout),
            session_ttl: seconds("SESSION_TTL_SECS", defaults.session_ttl),
            session_capacity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = AppConfig::from_lookup(lookup(&[]));
        assert_eq!(config.bind_addr, "0.0.0.0:8080");
        assert_eq!(config.design_timeout, Duration::from_secs(60));
        assert_eq!(config.session_capacity, 10_000);
    }

    #[test]
    fn test_reads_overrides() {
        let config = AppConfig::from_lookup(lookup(&[
            ("BIND_ADDR", "127.0.0.1:3000"),
            ("ENGINEERING_SERVICE_URL", "http://calc:9000"),
            ("DESIGN_TIMEOUT_SECS", "15"),
            ("SESSION_TTL_SECS", "120"),
            ("SESSION_CAPACITY", "50"),
        ]));
        assert_eq!(config.bind_addr, "127.0.0.1:3000");
        assert_eq!(config.engineering_service_url, "http://calc:9000");
        assert_eq!(config.design_timeout, Duration::from_secs(15));
        assert_eq!(config.session_ttl, Duration::from_secs(120));
        assert_eq!(config.session_capacity, 50);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = AppConfig::from_lookup(lookup(&[
            ("DESIGN_TIMEOUT_SECS", "0"),
            ("SESSION_TTL_SECS", "soon"),
            ("SESSION_CAPACITY", "-1"),
        ]));
        assert_eq!(config.design_timeout, Duration::from_secs(60));
        assert_eq!(config.session_ttl, Duration::from_secs(3600));
        assert_eq!(config.session_capacity, 10_000);
    }
}
