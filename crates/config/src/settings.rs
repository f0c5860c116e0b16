//! Server settings.
//!
//! Read from `<config_dir>/dataprobe/config.toml` unless a path is given.
//! Every section and field is optional:
//!
//! ```toml
//! [server]
//! transport = "both"   # stdio | tcp | both
//! host = "127.0.0.1"
//! port = 7411
//!
//! [logging]
//! filter = "dataprobe=debug,info"
//! ```

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 7411;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    #[default]
    Stdio,
    Tcp,
    Both,
}

impl Transport {
    pub fn uses_stdio(&self) -> bool {
        matches!(self, Self::Stdio | Self::Both)
    }

    pub fn uses_tcp(&self) -> bool {
        matches!(self, Self::Tcp | Self::Both)
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdio => write!(f, "stdio"),
            Self::Tcp => write!(f, "tcp"),
            Self::Both => write!(f, "both"),
        }
    }
}

impl FromStr for Transport {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "stdio" => Ok(Self::Stdio),
            "tcp" => Ok(Self::Tcp),
            "both" => Ok(Self::Both),
            other => Err(ConfigError::Validation(format!(
                "unknown transport '{other}' (expected stdio, tcp or both)"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub transport: Transport,
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self { transport: Transport::default(), host: DEFAULT_HOST.to_string(), port: DEFAULT_PORT }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// `EnvFilter` directive. `RUST_LOG` takes precedence.
    pub filter: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
}

impl Settings {
    /// `<config_dir>/dataprobe/config.toml`, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("dataprobe").join("config.toml"))
    }

    pub fn from_toml(input: &str) -> Result<Self, ConfigError> {
        let settings: Settings = toml::from_str(input).map_err(|e| ConfigError::Parse(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.host.trim().is_empty() {
            return Err(ConfigError::Validation("server.host must not be empty".into()));
        }
        if self.server.port == 0 {
            return Err(ConfigError::Validation("server.port must be between 1 and 65535".into()));
        }
        Ok(())
    }

    /// Load from `path`, or from the default location.
    ///
    /// An explicit path must exist. A missing default file yields the
    /// defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => match Self::default_path() {
                Some(p) => (p, false),
                None => return Ok(Self::default()),
            },
        };

        if !path.exists() {
            if explicit {
                return Err(ConfigError::NotFound(path));
            }
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .map_err(|e| ConfigError::Read { path: path.clone(), message: e.to_string() })?;
        Self::from_toml(&contents)
    }

    /// `host:port` for the TCP listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let s = Settings::default();
        assert_eq!(s.server.transport, Transport::Stdio);
        assert_eq!(s.bind_addr(), "127.0.0.1:7411");
        assert_eq!(s.logging.filter, None);
        assert!(s.validate().is_ok());
    }

    #[test]
    fn test_empty_file_is_defaults() {
        assert_eq!(Settings::from_toml("").unwrap(), Settings::default());
    }

    #[test]
    fn test_full_file() {
        let s = Settings::from_toml(
            r#"
[server]
transport = "both"
host = "0.0.0.0"
port = 9000

[logging]
filter = "debug"
"#,
        )
        .unwrap();
        assert_eq!(s.server.transport, Transport::Both);
        assert!(s.server.transport.uses_stdio() && s.server.transport.uses_tcp());
        assert_eq!(s.bind_addr(), "0.0.0.0:9000");
        assert_eq!(s.logging.filter.as_deref(), Some("debug"));
    }

    #[test]
    fn test_partial_section_keeps_defaults() {
        let s = Settings::from_toml("[server]\nport = 8000\n").unwrap();
        assert_eq!(s.server.host, DEFAULT_HOST);
        assert_eq!(s.server.port, 8000);
    }

    #[test]
    fn test_unknown_transport_rejected() {
        let err = Settings::from_toml("[server]\ntransport = \"sse\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_port_zero_rejected() {
        let err = Settings::from_toml("[server]\nport = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_empty_host_rejected() {
        let err = Settings::from_toml("[server]\nhost = \"  \"\n").unwrap_err();
        assert_eq!(err.to_string(), "invalid config: server.host must not be empty");
    }

    #[test]
    fn test_transport_from_str() {
        assert_eq!("TCP".parse::<Transport>().unwrap(), Transport::Tcp);
        assert!("pipe".parse::<Transport>().is_err());
    }

    #[test]
    fn test_load_explicit_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]\ntransport = \"tcp\"").unwrap();
        let s = Settings::load(Some(file.path())).unwrap();
        assert_eq!(s.server.transport, Transport::Tcp);
    }

    #[test]
    fn test_load_missing_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let err = Settings::load(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }
}
