//! Lab configuration.
//!
//! Read from the TOML file named by `GRAFT_CONFIG` when set; every key is
//! optional. `GRAFT_ADDR` overrides the listen address.
//!
//! ```toml
//! listen = "127.0.0.1:8080"
//! static_excludes = ["/css/**", "/js/**", "/images/**"]
//!
//! [gateway]
//! timeout_ms = 30000
//!
//! [implant]
//! route_path = "/evilcontroller"
//! route_param = "cmd"
//! interceptor_param = "camd"
//! interceptor_scope = "/**"
//! ```

use serde::Deserialize;
use std::{
    env,
    net::{AddrParseError, SocketAddr},
    path::{Path, PathBuf},
    time::Duration,
};
use thiserror::Error;

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "GRAFT_CONFIG";

/// Environment variable overriding [`LabConfig::listen`].
pub const ADDR_ENV: &str = "GRAFT_ADDR";

/// Errors raised while loading [`LabConfig`].
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        /// File that was read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid TOML for [`LabConfig`].
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// The address override is not a socket address.
    #[error("invalid {ADDR_ENV} value `{value}`: {source}")]
    Addr {
        /// The rejected value.
        value: String,
        /// Parse failure.
        #[source]
        source: AddrParseError,
    },
}

/// Top-level lab configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LabConfig {
    /// Socket address the HTTP listener binds.
    pub listen: SocketAddr,
    /// Paths the request log interceptor skips.
    pub static_excludes: Vec<String>,
    /// Command gateway settings.
    pub gateway: GatewayConfig,
    /// Implant settings.
    pub implant: ImplantConfig,
}

impl Default for LabConfig {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([127, 0, 0, 1], 8080)),
            static_excludes: vec!["/css/**".into(), "/js/**".into(), "/images/**".into()],
            gateway: GatewayConfig::default(),
            implant: ImplantConfig::default(),
        }
    }
}

/// Command gateway settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GatewayConfig {
    /// Upper bound on a command's run time. Absent means no bound.
    pub timeout_ms: Option<u64>,
}

impl GatewayConfig {
    /// The timeout as a [`Duration`].
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

/// Implant settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImplantConfig {
    /// Path of the injected command route.
    pub route_path: String,
    /// Parameter read by the command route.
    pub route_param: String,
    /// Parameter read by the command interceptor.
    pub interceptor_param: String,
    /// Include pattern of the command interceptor.
    pub interceptor_scope: String,
}

impl Default for ImplantConfig {
    fn default() -> Self {
        Self {
            route_path: "/evilcontroller".into(),
            route_param: "cmd".into(),
            interceptor_param: "camd".into(),
            interceptor_scope: "/**".into(),
        }
    }
}

impl LabConfig {
    /// Load from the environment, falling back to defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_file(Path::new(&path))?,
            None => Self::default(),
        };
        if let Ok(value) = env::var(ADDR_ENV) {
            config.override_listen(&value)?;
        }
        Ok(config)
    }

    /// Parse a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        text.parse()
    }

    fn override_listen(&mut self, value: &str) -> Result<(), ConfigError> {
        self.listen = value.parse().map_err(|source| ConfigError::Addr {
            value: value.to_owned(),
            source,
        })?;
        Ok(())
    }
}

impl std::str::FromStr for LabConfig {
    type Err = ConfigError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        Ok(toml::from_str(text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_is_default() {
        let config: LabConfig = "".parse().unwrap();
        assert_eq!(config, LabConfig::default());
        assert_eq!(config.gateway.timeout(), None);
        assert_eq!(config.implant.route_param, "cmd");
        assert_eq!(config.implant.interceptor_param, "camd");
    }

    #[test]
    fn test_partial_override() {
        let config: LabConfig = r#"
            listen = "0.0.0.0:9000"

            [gateway]
            timeout_ms = 250

            [implant]
            route_path = "/shell"
        "#
        .parse()
        .unwrap();

        assert_eq!(config.listen, SocketAddr::from(([0, 0, 0, 0], 9000)));
        assert_eq!(config.gateway.timeout(), Some(Duration::from_millis(250)));
        assert_eq!(config.implant.route_path, "/shell");
        assert_eq!(config.implant.route_param, "cmd");
        assert_eq!(config.static_excludes.len(), 3);
    }

    #[test]
    fn test_rejects_unknown_keys() {
        let err = "lisen = \"127.0.0.1:1\"".parse::<LabConfig>().unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_addr_override() {
        let mut config = LabConfig::default();
        config.override_listen("127.0.0.1:18080").unwrap();
        assert_eq!(config.listen.port(), 18080);
        assert!(matches!(
            config.override_listen("not-an-addr"),
            Err(ConfigError::Addr { .. })
        ));
    }
}
