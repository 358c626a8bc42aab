//! Configuration management
//!
//! Layered with the `config` crate: built-in defaults, an optional TOML
//! file, `OUTBOUND_CALLER__<SECTION>__<KEY>` variables, then the well-known
//! LiveKit/SIP variables shared with the dispatch CLI.

use config::{Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = "outbound-caller.toml";

/// Well-known variables mapped onto config keys
const WELL_KNOWN_ENV: [(&str, &str); 4] = [
    ("SIP_OUTBOUND_TRUNK_ID", "sip.outbound_trunk_id"),
    ("LIVEKIT_URL", "livekit.url"),
    ("LIVEKIT_API_KEY", "livekit.api_key"),
    ("LIVEKIT_API_SECRET", "livekit.api_secret"),
];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub livekit: LiveKitConfig,
    pub sip: SipConfig,
    pub agent: AgentConfig,
    pub dispatch: DispatchConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct LiveKitConfig {
    pub url: String,
    pub api_key: String,
    #[serde(skip_serializing, default)]
    pub api_secret: String,
}

impl fmt::Debug for LiveKitConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveKitConfig")
            .field("url", &self.url)
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SipConfig {
    pub outbound_trunk_id: String,
    /// Caller ID presented on outbound calls
    pub caller_number: String,
    pub participant_wait_timeout_secs: u64,
}

impl SipConfig {
    pub fn participant_wait_timeout(&self) -> Duration {
        Duration::from_secs(self.participant_wait_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Name the worker is dispatched under
    pub name: String,
    pub availability_delay_ms: u64,
    /// WebSocket endpoint of the speech pipeline
    pub session_url: String,
}

impl AgentConfig {
    pub fn availability_delay(&self) -> Duration {
        Duration::from_millis(self.availability_delay_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DispatchMode {
    /// Shell out to the dispatch CLI
    Cli,
    /// Call the agent dispatch API directly
    Api,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    pub mode: DispatchMode,
    pub program: String,
    /// Prepended to PATH for the dispatch command, relative to the working directory
    pub bin_dir: PathBuf,
    pub timeout_secs: u64,
    pub default_phone_number: String,
    pub default_transfer_to: String,
}

impl DispatchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            livekit: LiveKitConfig {
                url: "http://localhost:7880".to_string(),
                api_key: String::new(),
                api_secret: String::new(),
            },
            sip: SipConfig {
                outbound_trunk_id: String::new(),
                caller_number: "+17345214522".to_string(),
                participant_wait_timeout_secs: 30,
            },
            agent: AgentConfig {
                name: "outbound-caller".to_string(),
                availability_delay_ms: 3000,
                session_url: "ws://localhost:8765/session".to_string(),
            },
            dispatch: DispatchConfig {
                mode: DispatchMode::Cli,
                program: "lk".to_string(),
                bin_dir: PathBuf::from("bin"),
                timeout_secs: 30,
                default_phone_number: "+918980579954".to_string(),
                default_transfer_to: "+17345214522".to_string(),
            },
        }
    }
}

impl Config {
    /// Load from the default file location and the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let env: Vec<(String, String)> = std::env::vars().collect();
        Self::load_from(path, &env)
    }

    /// Load with an explicit environment, used by `load` and in tests.
    pub fn load_from(path: Option<&Path>, env: &[(String, String)]) -> Result<Self, ConfigError> {
        let defaults = config::Config::try_from(&Config::default())?;

        let file = match path {
            Some(path) => File::from(path.to_path_buf()).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let prefixed = Environment::with_prefix("OUTBOUND_CALLER")
            .prefix_separator("__")
            .separator("__")
            .source(Some(env.iter().cloned().collect()));

        let mut builder = config::Config::builder()
            .add_source(defaults)
            .add_source(file.format(FileFormat::Toml))
            .add_source(prefixed);

        for (var, key) in WELL_KNOWN_ENV {
            if let Some((_, value)) = env.iter().find(|(name, _)| name == var) {
                builder = builder.set_override(key, value.clone())?;
            }
        }

        let config: Config = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML document layered over the defaults.
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        let config: Config = config::Config::builder()
            .add_source(config::Config::try_from(&Config::default())?)
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.agent.name.trim().is_empty() {
            return Err(ConfigError::Invalid("agent.name must not be empty".to_string()));
        }
        if self.dispatch.program.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "dispatch.program must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
