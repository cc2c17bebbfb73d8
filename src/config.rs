//! Environment-driven configuration for the explorer server

const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8000/api";
const DEFAULT_PORT: u16 = 8082;

#[derive(Debug, Clone, PartialEq)]
pub struct ExplorerConfig {
    pub api_base_url: String,
    pub port: u16,
    pub include_staff_options: bool,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            port: DEFAULT_PORT,
            include_staff_options: false,
        }
    }
}

impl ExplorerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unparseable values keep the default
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(url) = lookup("AGGEXPLORER_API_BASE_URL").filter(|v| !v.trim().is_empty()) {
            config.api_base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(port) = lookup("AGGEXPLORER_PORT").and_then(|v| v.parse().ok()) {
            config.port = port;
        }
        if let Some(flag) = lookup("AGGEXPLORER_INCLUDE_STAFF_OPTIONS") {
            config.include_staff_options = matches!(flag.as_str(), "1" | "true" | "yes");
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = ExplorerConfig::from_lookup(|_| None);
        assert_eq!(config, ExplorerConfig::default());
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("AGGEXPLORER_API_BASE_URL", "https://example.org/api/"),
            ("AGGEXPLORER_PORT", "9000"),
            ("AGGEXPLORER_INCLUDE_STAFF_OPTIONS", "true"),
        ]);
        let config = ExplorerConfig::from_lookup(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(config.api_base_url, "https://example.org/api");
        assert_eq!(config.port, 9000);
        assert!(config.include_staff_options);
    }

    #[test]
    fn test_bad_port_keeps_default() {
        let config = ExplorerConfig::from_lookup(|k| (k == "AGGEXPLORER_PORT").then(|| "nope".to_string()));
        assert_eq!(config.port, DEFAULT_PORT);
    }
}
