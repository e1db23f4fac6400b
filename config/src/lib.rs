#[macro_use]
extern crate tracing;

mod app_config;
mod args;
mod failure_policy;

pub use app_config::{
    get_config_dir,
    get_data_dir,
};
pub use args::Args;
use derive_more::Debug;
use eyre::{
    eyre,
    Result,
};
pub use failure_policy::FailurePolicy;
use serde::Deserialize;
use std::{
    net::SocketAddr,
    path::{
        Path,
        PathBuf,
    },
    time::Duration,
};
use url::Url;

const DEFAULT_CONFIG: &str = include_str!("default-config.yaml");

const SESSION_FILE: &str = "session.json";

const CONFIG_FILE: &str = "config.yaml";

/// Route of the health probe, reserved next to the metrics path.
pub const HEALTH_PATH: &str = "/healthz";

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub data_dir: PathBuf,
    #[serde(default)]
    pub config_dir: PathBuf,
    /// Usernames of the tracked accounts.
    #[serde(default)]
    pub identities: Vec<String>,
    #[serde(default)]
    pub login: Option<String>,
    #[debug(skip)]
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub token_path: Option<PathBuf>,
    pub upstream_url: Url,
    #[serde(deserialize_with = "humantime_duration")]
    pub request_timeout: Duration,
    #[serde(deserialize_with = "humantime_duration")]
    pub refresh_interval: Duration,
    pub on_fetch_error: FailurePolicy,
    pub listen_address: SocketAddr,
    pub metrics_path: String,
    pub namespace: String,
    pub log_level: String,
    /// The config file that was read, if any.
    #[serde(skip)]
    source_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        serde_yml::from_str(DEFAULT_CONFIG).expect("Failed to parse default config")
    }
}

impl Config {
    /// Layers, lowest precedence first: built-in defaults, config file,
    /// `INSTAGRAM_EXPORTER_*` environment variables, command line.
    pub fn new(args: Args) -> Result<Self, config::ConfigError> {
        Self::load(args, environment())
    }

    fn load(args: Args, environment: config::Environment) -> Result<Self, config::ConfigError> {
        let data_dir = get_data_dir();
        let config_dir = get_config_dir();
        let mut builder = config::Config::builder()
            .set_default("data_dir", data_dir.display().to_string())?
            .set_default("config_dir", config_dir.display().to_string())?
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Yaml));

        // An explicit file must exist, the one in the config directory may not.
        let required = args.config.is_some();
        let source_file = args
            .config
            .clone()
            .or_else(|| Some(config_dir.join(CONFIG_FILE)).filter(|file| file.exists()));
        if let Some(file) = &source_file {
            builder = builder.add_source(
                config::File::from(file.as_path())
                    .format(config::FileFormat::Yaml)
                    .required(required),
            );
        }

        builder = builder.add_source(environment).add_source(args);

        let mut config: Self = builder.build()?.try_deserialize()?;
        config.source_file = source_file;
        Ok(config)
    }

    pub fn source_file(&self) -> Option<&Path> {
        self.source_file.as_deref()
    }

    /// Report where the settings were read from. Only useful once logging is
    /// initialized, which itself depends on the loaded `log_level`.
    pub fn log_sources(&self) {
        match &self.source_file {
            Some(file) => info!(?file, "using config file"),
            None => debug!(config_dir = ?self.config_dir, "no config file, using defaults"),
        }
        debug!(data_dir = ?self.data_dir, token_path = ?self.token_path(), "data locations");
    }

    pub fn validate(&self) -> Result<()> {
        if self.identities.is_empty() {
            return Err(eyre!("at least one identity is required"));
        }
        if let Some(blank) = self.identities.iter().position(|identity| identity.trim().is_empty()) {
            return Err(eyre!("identity #{blank} is blank"));
        }
        if self.refresh_interval.is_zero() {
            return Err(eyre!("refresh_interval must be greater than zero"));
        }
        if !self.metrics_path.starts_with('/') {
            return Err(eyre!("metrics_path must start with '/', got {:?}", self.metrics_path));
        }
        if self.metrics_path == HEALTH_PATH {
            return Err(eyre!("metrics_path cannot be {HEALTH_PATH}"));
        }
        Ok(())
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Where the upstream session is persisted between runs.
    pub fn token_path(&self) -> PathBuf {
        self.token_path
            .clone()
            .unwrap_or_else(|| self.data_dir().join(SESSION_FILE))
    }

    /// Login and password, if both are configured.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        self.login.as_deref().zip(self.password.as_deref())
    }
}

fn environment() -> config::Environment {
    config::Environment::with_prefix(&app_config::PROJECT_NAME)
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("identities")
}

fn humantime_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    humantime::parse_duration(&value).map_err(serde::de::Error::custom)
}
