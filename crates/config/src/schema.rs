//! Config schema: everything `Bridge::connect` needs to build its two
//! sessions, plus bridge-level deployment knobs.

use serde::{Deserialize, Serialize};

use voxlink_protocol::Namespace;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub platform: PlatformConfig,
    pub router: RouterConfig,
    pub bridge: BridgeSection,
}

/// Chat-platform credentials for the long-lived session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    /// Bot token. Caller-supplied tokens for `token.*` lookups arrive
    /// per invocation and never appear in config.
    pub token: String,
}

/// Router session parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Router transport address.
    pub url: String,
    /// Realm joined on connect.
    pub realm: String,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            url: "ws://127.0.0.1:8080/ws".into(),
            realm: "realm1".into(),
        }
    }
}

/// Bridge-level knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeSection {
    /// Namespace prefix for all registered procedures and topics.
    pub namespace: Namespace,
    /// Page size for guild-membership lookups (1..=100).
    pub guild_page_size: usize,
}

impl Default for BridgeSection {
    fn default() -> Self {
        Self {
            namespace: Namespace::default(),
            guild_page_size: 100,
        }
    }
}

impl BridgeConfig {
    /// Validate deployment constraints before connecting.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.platform.token.trim().is_empty() {
            anyhow::bail!("platform.token must be set");
        }
        if self.router.url.trim().is_empty() {
            anyhow::bail!("router.url must be set");
        }
        if self.bridge.guild_page_size == 0 || self.bridge.guild_page_size > 100 {
            anyhow::bail!("bridge.guild_page_size must be between 1 and 100");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_usable_except_token() {
        let config = BridgeConfig::default();
        assert_eq!(config.bridge.namespace.as_str(), "com.voxlink.");
        assert_eq!(config.bridge.guild_page_size, 100);
        assert_eq!(config.router.realm, "realm1");
        // Only the token is mandatory.
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_page_size() {
        let mut config = BridgeConfig::default();
        config.platform.token = "bot-token".into();
        assert!(config.validate().is_ok());

        config.bridge.guild_page_size = 0;
        assert!(config.validate().is_err());
        config.bridge.guild_page_size = 101;
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: BridgeConfig = toml::from_str(
            r#"
            [platform]
            token = "bot-token"

            [bridge]
            namespace = "com.other"
            "#,
        )
        .expect("parse");
        assert_eq!(config.platform.token, "bot-token");
        assert_eq!(config.bridge.namespace.as_str(), "com.other.");
        assert_eq!(config.bridge.guild_page_size, 100);
    }
}
