use crate::error;
use crate::Result;
use log::debug;
use serde::Deserialize;
use snafu::ResultExt;
use std::fs;
use std::path::Path;

/// Prefix of the environment variables read by [`ClientConfig::from_env`].
const ENV_PREFIX: &str = "IPAM_";

const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

/// Where the cluster IPAM service lives and how to talk to it.
#[derive(Clone, Deserialize, PartialEq, Eq)]
pub struct ClientConfig {
    pub endpoint: String,
    #[serde(default)]
    pub token: Option<String>,
    /// Every request fails after this long rather than hanging the caller.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_timeout_seconds() -> u64 {
    DEFAULT_TIMEOUT_SECONDS
}

// Hand-written so the token never ends up in a log line.
impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("endpoint", &self.endpoint)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

impl ClientConfig {
    /// Loads the config from `path` if one is given, otherwise from the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Self::from_env(),
        }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let s = fs::read_to_string(path).context(error::ConfigReadSnafu { path })?;
        let config: ClientConfig = toml::from_str(&s).context(error::ConfigParseSnafu { path })?;
        debug!("Loaded IPAM client config from {}: {:?}", path.display(), config);
        Ok(config)
    }

    pub fn from_env() -> Result<Self> {
        Self::from_pairs(std::env::vars())
    }

    /// Loads the config from `IPAM_`-prefixed key/value pairs, ignoring everything else.
    pub fn from_pairs<I>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let config: ClientConfig = envy::prefixed(ENV_PREFIX)
            .from_iter(pairs)
            .context(error::ConfigEnvSnafu)?;
        debug!("Loaded IPAM client config from environment: {:?}", config);
        Ok(config)
    }
}
