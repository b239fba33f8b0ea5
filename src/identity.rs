//! Own-node identity advertised to peers.

use std::collections::BTreeMap;

use crate::config::MonitorConfig;

/// Source of the identity fields sent with every outbound request.
pub trait SystemIdentity {
    fn os(&self) -> String;
    fn version(&self) -> String;
    fn port(&self) -> u16;
    fn nethash(&self) -> String;
}

/// Identity read from the loaded configuration.
#[derive(Debug, Clone)]
pub struct ConfigIdentity {
    os: String,
    version: String,
    port: u16,
    nethash: String,
}

impl ConfigIdentity {
    pub fn from_config(config: &MonitorConfig) -> Self {
        Self {
            os: config.identity.os.clone(),
            version: config.identity.version.clone(),
            port: config.identity.port,
            nethash: config.nethash.clone(),
        }
    }
}

impl SystemIdentity for ConfigIdentity {
    fn os(&self) -> String {
        self.os.clone()
    }

    fn version(&self) -> String {
        self.version.clone()
    }

    fn port(&self) -> u16 {
        self.port
    }

    fn nethash(&self) -> String {
        self.nethash.clone()
    }
}

/// Header template captured once from a [`SystemIdentity`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityHeaders(BTreeMap<String, String>);

impl IdentityHeaders {
    pub fn capture(identity: &dyn SystemIdentity) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert("os".to_string(), identity.os());
        headers.insert("version".to_string(), identity.version());
        headers.insert("port".to_string(), identity.port().to_string());
        headers.insert("nethash".to_string(), identity.nethash());
        Self(headers)
    }

    /// Template merged with per-call overrides; overrides win.
    pub fn merged(&self, overrides: &BTreeMap<String, String>) -> BTreeMap<String, String> {
        let mut headers = self.0.clone();
        for (name, value) in overrides {
            headers.insert(name.to_ascii_lowercase(), value.clone());
        }
        headers
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> ConfigIdentity {
        let mut config = MonitorConfig::default();
        config.nethash = "N1".into();
        config.identity.os = "linux".into();
        config.identity.version = "1.2.3".into();
        config.identity.port = 7000;
        ConfigIdentity::from_config(&config)
    }

    #[test]
    fn test_capture() {
        let headers = IdentityHeaders::capture(&identity());
        assert_eq!(headers.get("os"), Some("linux"));
        assert_eq!(headers.get("version"), Some("1.2.3"));
        assert_eq!(headers.get("port"), Some("7000"));
        assert_eq!(headers.get("nethash"), Some("N1"));
    }

    #[test]
    fn test_overrides_take_precedence() {
        let headers = IdentityHeaders::capture(&identity());
        let mut overrides = BTreeMap::new();
        overrides.insert("Version".to_string(), "9.9.9".to_string());
        overrides.insert("x-extra".to_string(), "1".to_string());

        let merged = headers.merged(&overrides);
        assert_eq!(merged["version"], "9.9.9");
        assert_eq!(merged["x-extra"], "1");
        assert_eq!(merged["os"], "linux");
        assert_eq!(merged.len(), 5);
    }
}
