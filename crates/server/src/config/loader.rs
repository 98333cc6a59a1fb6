use std::collections::HashSet;
use std::path::Path;

use super::schema::StormwatchConfig;

/// Environment variable naming the YAML config file.
pub const CONFIG_ENV: &str = "STORMWATCH_CONFIG";

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("parse: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("validation: {0}")]
    Validation(String),
    #[error("env {var}: {reason}")]
    Env { var: &'static str, reason: String },
}

/// Loads the file named by `STORMWATCH_CONFIG`, or the defaults when it is
/// unset, then applies environment overrides.
pub fn load() -> Result<StormwatchConfig, LoadError> {
    let mut cfg = match std::env::var(CONFIG_ENV) {
        Ok(path) => load_from_file(Path::new(&path))?,
        Err(_) => StormwatchConfig::default(),
    };
    apply_env_overrides(&mut cfg, |var| std::env::var(var).ok())?;
    validate(&cfg)?;
    Ok(cfg)
}

pub fn load_from_file(path: &Path) -> Result<StormwatchConfig, LoadError> {
    let contents = std::fs::read_to_string(path)?;
    load_from_str(&contents)
}

pub fn load_from_str(yaml: &str) -> Result<StormwatchConfig, LoadError> {
    let cfg: StormwatchConfig = serde_yaml::from_str(yaml)?;
    validate(&cfg)?;
    Ok(cfg)
}

/// Applies `REST_ADDR` and `BACKOFF_MS` from `lookup`.
pub fn apply_env_overrides<F>(cfg: &mut StormwatchConfig, lookup: F) -> Result<(), LoadError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(addr) = lookup("REST_ADDR") {
        cfg.server.rest_addr = addr.parse().map_err(|e: std::net::AddrParseError| LoadError::Env {
            var: "REST_ADDR",
            reason: e.to_string(),
        })?;
    }
    if let Some(ms) = lookup("BACKOFF_MS") {
        cfg.engine.backoff_ms = ms.parse().map_err(|e: std::num::ParseIntError| LoadError::Env {
            var: "BACKOFF_MS",
            reason: e.to_string(),
        })?;
    }
    Ok(())
}

fn validate(cfg: &StormwatchConfig) -> Result<(), LoadError> {
    let engine = &cfg.engine;
    if cfg.server.keep_alive_secs == 0 {
        return Err(LoadError::Validation("server.keep_alive_secs must be > 0".into()));
    }
    if engine.backoff_ms == 0 {
        return Err(LoadError::Validation("engine.backoff_ms must be > 0".into()));
    }
    if engine.store_timeout_ms == 0 {
        return Err(LoadError::Validation("engine.store_timeout_ms must be > 0".into()));
    }
    if engine.store_attempts == 0 {
        return Err(LoadError::Validation("engine.store_attempts must be > 0".into()));
    }
    if engine.eviction_interval_ms == 0 {
        return Err(LoadError::Validation("engine.eviction_interval_ms must be > 0".into()));
    }
    if engine.feed_history == 0 {
        return Err(LoadError::Validation("engine.feed_history must be > 0".into()));
    }

    let mut polled = HashSet::new();
    for p in &cfg.pollers {
        if p.feed.is_empty() || p.endpoint.is_empty() {
            return Err(LoadError::Validation("poller feed and endpoint must not be empty".into()));
        }
        if p.interval_secs == 0 {
            return Err(LoadError::Validation(format!("poller {}: interval_secs must be > 0", p.feed)));
        }
        if !polled.insert(p.feed.as_str()) {
            return Err(LoadError::Validation(format!("feed {} is polled twice", p.feed)));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use stormwatch_common::Severity;

    #[test]
    fn empty_document_gives_defaults() {
        let cfg = load_from_str("{}").unwrap();
        assert_eq!(cfg, StormwatchConfig::default());
        assert_eq!(cfg.server.rest_addr.port(), 8080);
        assert_eq!(cfg.server.keep_alive_secs, 15);
        assert_eq!(cfg.engine.backoff_ms, 5_000);
        assert_eq!(cfg.engine.store_timeout_ms, 2_000);
        assert_eq!(cfg.engine.store_attempts, 1);
        assert_eq!(cfg.engine.feed_history, 10_000);
    }

    #[test]
    fn full_document() {
        let yaml = r#"
server:
  rest_addr: 127.0.0.1:9000
engine:
  backoff_ms: 250
  store_attempts: 3
rules:
  - feed: solar_wind
    code: DENSITY_HIGH
    level: warning
    ttl_secs: 600
    field: density
    condition: GreaterOrEqual
    threshold: 20
pollers:
  - feed: planetary_k_index
    endpoint: https://services.swpc.noaa.gov/products/noaa-planetary-k-index.json
    unique_keys: [time_tag]
"#;
        let cfg = load_from_str(yaml).unwrap();
        assert_eq!(cfg.server.rest_addr.to_string(), "127.0.0.1:9000");
        assert_eq!(cfg.server.keep_alive_secs, 15);
        assert_eq!(cfg.engine.backoff_ms, 250);
        assert_eq!(cfg.engine.store_attempts, 3);
        assert_eq!(cfg.engine.store_timeout_ms, 2_000);
        assert_eq!(cfg.rules.len(), 1);
        assert_eq!(cfg.rules[0].level, Severity::Warning);
        assert_eq!(cfg.pollers[0].unique_keys, vec!["time_tag"]);
        assert_eq!(cfg.pollers[0].interval_secs, 60);
    }

    #[test]
    fn zero_backoff_rejected() {
        let err = load_from_str("engine:\n  backoff_ms: 0\n").unwrap_err();
        assert!(matches!(err, LoadError::Validation(_)));
    }

    #[test]
    fn duplicate_poller_rejected() {
        let yaml = r#"
pollers:
  - feed: solar_wind
    endpoint: https://a.test/1.json
  - feed: solar_wind
    endpoint: https://a.test/2.json
"#;
        assert!(matches!(load_from_str(yaml), Err(LoadError::Validation(_))));
    }

    #[test]
    fn malformed_yaml_is_parse_error() {
        assert!(matches!(load_from_str("server: [1, 2"), Err(LoadError::Parse(_))));
        assert!(matches!(
            load_from_str("engine:\n  backoff_ms: soon\n"),
            Err(LoadError::Parse(_))
        ));
    }

    #[test]
    fn env_overrides_apply() {
        let env: HashMap<&str, &str> = [("REST_ADDR", "127.0.0.1:7070"), ("BACKOFF_MS", "100")].into();
        let mut cfg = StormwatchConfig::default();
        apply_env_overrides(&mut cfg, |k| env.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(cfg.server.rest_addr.port(), 7070);
        assert_eq!(cfg.engine.backoff_ms, 100);
    }

    #[test]
    fn bad_env_override_is_reported() {
        let mut cfg = StormwatchConfig::default();
        let err = apply_env_overrides(&mut cfg, |k| (k == "BACKOFF_MS").then(|| "fast".to_string()))
            .unwrap_err();
        assert!(matches!(err, LoadError::Env { var: "BACKOFF_MS", .. }));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "server:\n  keep_alive_secs: 30").unwrap();
        let cfg = load_from_file(file.path()).unwrap();
        assert_eq!(cfg.server.keep_alive_secs, 30);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_from_file(Path::new("/nonexistent/stormwatch.yaml")).unwrap_err();
        assert!(matches!(err, LoadError::Io(_)));
    }
}
