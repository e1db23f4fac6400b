use crate::FailurePolicy;
use clap::Parser;
use std::path::PathBuf;

const LONG_ABOUT: &str = "\
Prometheus exporter for Instagram account metrics

It exports the following metrics:
- instagram_media_like_total : Total likes count by [username, media_id]
- instagram_media_comment_total : Total comments count by [username, media_id]
- instagram_media_total : Total media count by [username]
- instagram_follower_total : Total followers count by [username]
- instagram_following_total : Total following count by [username]";

/// Prometheus exporter for Instagram account metrics
#[derive(Parser, Debug, Clone, Default)]
#[command(author, version = version(), about, long_about = LONG_ABOUT)]
pub struct Args {
    /// Config file (default is `config.yaml` in the config directory).
    #[clap(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Instagram usernames to fetch metrics for. Can be repeated or comma separated.
    #[clap(long = "identity", value_name = "USERNAME", value_delimiter = ',')]
    pub identities: Vec<String>,

    /// Instagram login, used when no stored session is found.
    #[clap(long, value_name = "LOGIN")]
    pub login: Option<String>,

    /// Instagram password, used when no stored session is found.
    #[clap(long, value_name = "PASSWORD")]
    pub password: Option<String>,

    /// Location of the stored session.
    #[clap(long, value_name = "FILE")]
    pub token_path: Option<PathBuf>,

    /// Base URL of the upstream API.
    #[clap(long, value_name = "URL")]
    pub upstream_url: Option<String>,

    /// Timeout of a single upstream request (e.g. "30s").
    #[clap(long, value_name = "DURATION")]
    pub request_timeout: Option<String>,

    /// How often the metrics are refreshed from upstream (e.g. "5m").
    #[clap(long, value_name = "DURATION")]
    pub refresh_interval: Option<String>,

    /// What to do when a refresh fails after startup: "exit" or "keep-last-good".
    #[clap(long, value_name = "POLICY")]
    pub on_fetch_error: Option<FailurePolicy>,

    /// Address the metrics endpoint listens on.
    #[clap(long, value_name = "ADDRESS")]
    pub listen_address: Option<String>,

    /// Path used to expose metrics.
    #[clap(long, value_name = "PATH")]
    pub metrics_path: Option<String>,

    /// Prefix of every exported metric name.
    #[clap(long, value_name = "NAMESPACE")]
    pub namespace: Option<String>,

    /// Log level, overridden by RUST_LOG.
    #[clap(long, value_name = "LEVEL")]
    pub log_level: Option<String>,
}

mod config_ext {
    use super::*;
    use config::{
        Map,
        Source,
        Value,
    };
    use std::collections::HashMap;

    impl Source for Args {
        fn clone_into_box(&self) -> Box<dyn Source + Send + Sync> {
            Box::new((*self).clone())
        }

        fn collect(&self) -> Result<Map<String, Value>, config::ConfigError> {
            let mut cache = HashMap::<String, Value>::new();
            if !self.identities.is_empty() {
                cache.insert("identities".to_string(), self.identities.clone().into());
            }
            if let Some(login) = &self.login {
                cache.insert("login".to_string(), login.clone().into());
            }
            if let Some(password) = &self.password {
                cache.insert("password".to_string(), password.clone().into());
            }
            if let Some(token_path) = &self.token_path {
                cache.insert("token_path".to_string(), token_path.display().to_string().into());
            }
            let strings = [
                ("upstream_url", &self.upstream_url),
                ("request_timeout", &self.request_timeout),
                ("refresh_interval", &self.refresh_interval),
                ("listen_address", &self.listen_address),
                ("metrics_path", &self.metrics_path),
                ("namespace", &self.namespace),
                ("log_level", &self.log_level),
            ];
            for (key, value) in strings {
                if let Some(value) = value {
                    cache.insert(key.to_string(), value.clone().into());
                }
            }
            if let Some(policy) = self.on_fetch_error {
                cache.insert("on_fetch_error".to_string(), policy.to_string().into());
            }
            Ok(cache)
        }
    }
}

pub fn version() -> String {
    let author = clap::crate_authors!();
    let version = clap::crate_version!();
    let config_dir_path = crate::get_config_dir().display().to_string();
    let data_dir_path = crate::get_data_dir().display().to_string();

    format!(
        "\
{version}

Authors: {author}

Config directory: {config_dir_path}
Data directory: {data_dir_path}"
    )
}
