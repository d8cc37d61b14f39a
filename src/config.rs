use std::{env, path::PathBuf, str::FromStr, time::Duration};

use derive_builder::{Builder, UninitializedFieldError};

pub const DEFAULT_FEED_URL: &str = "https://servicios.siur.com.co/mapas/marks2.php";
pub const DEFAULT_ROUTE_ID: &str = "A17D";

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Missing setting: {0}")]
    Missing(String),

    #[error("Invalid value for {name}: {value}")]
    Invalid { name: String, value: String },
}

impl From<UninitializedFieldError> for ConfigError {
    fn from(e: UninitializedFieldError) -> Self {
        ConfigError::Missing(e.field_name().to_string())
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Clone, Builder)]
#[builder(build_fn(error = "ConfigError"))]
pub struct Settings {
    #[builder(default = "DEFAULT_FEED_URL.to_string()", setter(into))]
    pub feed_url: String,

    #[builder(default = "DEFAULT_ROUTE_ID.to_string()", setter(into))]
    pub route_id: String,

    /// Where reconciled state is persisted. In-memory only when unset.
    #[builder(default, setter(into, strip_option))]
    pub state_path: Option<PathBuf>,

    #[builder(default = "Duration::from_secs(40)")]
    pub poll_interval: Duration,

    #[builder(default = "Duration::from_secs(20)")]
    pub fetch_timeout: Duration,

    /// Oldest points are dropped past this many, 0 keeps everything
    #[builder(default = "500")]
    pub max_trajectory_points: usize,

    /// Task ids of vehicles that are not in service, "16" is the workshop
    #[builder(default = "vec![\"16\".to_string()]")]
    pub excluded_task_ids: Vec<String>,

    #[builder(default = "\"127.0.0.1:8080\".to_string()", setter(into))]
    pub listen_address: String,

    #[builder(default, setter(into, strip_option))]
    pub allow_origin: Option<String>,
}

impl Settings {
    /// Reads settings from the environment, anything unset keeps its default
    pub fn from_env() -> ConfigResult<Settings> {
        let mut builder = SettingsBuilder::default();

        if let Ok(feed_url) = env::var("FEED_URL") {
            builder.feed_url(feed_url);
        }
        if let Ok(route_id) = env::var("ROUTE_ID") {
            builder.route_id(route_id);
        }
        if let Ok(state_path) = env::var("STATE_PATH") {
            if !state_path.is_empty() {
                builder.state_path(state_path);
            }
        }
        if let Some(secs) = env_parse::<u64>("POLL_INTERVAL_SECS")? {
            if secs == 0 {
                return Err(invalid("POLL_INTERVAL_SECS", "0"));
            }
            builder.poll_interval(Duration::from_secs(secs));
        }
        if let Some(secs) = env_parse::<u64>("FETCH_TIMEOUT_SECS")? {
            builder.fetch_timeout(Duration::from_secs(secs));
        }
        if let Some(max) = env_parse::<usize>("MAX_TRAJECTORY_POINTS")? {
            builder.max_trajectory_points(max);
        }
        if let Ok(ids) = env::var("EXCLUDED_TASK_IDS") {
            builder.excluded_task_ids(split_list(&ids));
        }
        if let Ok(listen_address) = env::var("LISTEN_ADDRESS") {
            builder.listen_address(listen_address);
        }
        if let Ok(allow_origin) = env::var("ALLOW_ORIGIN") {
            builder.allow_origin(allow_origin);
        }

        builder.build()
    }
}

fn env_parse<T: FromStr>(name: &str) -> ConfigResult<Option<T>> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| invalid(name, &value)),
        Err(_) => Ok(None),
    }
}

fn invalid(name: &str, value: &str) -> ConfigError {
    ConfigError::Invalid {
        name: name.to_string(),
        value: value.to_string(),
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
