use std::path::PathBuf;

use common_enums::Environment;
use domain_types::types::{CheckoutConfiguration, Proxy};
use hyperswitch_masking::PeekInterface;

use crate::{
    consts::{self, Env},
    error::ConfigurationError,
    logger::config::Log,
};

#[derive(Clone, serde::Deserialize, Debug)]
pub struct Config {
    pub common: Common,
    #[serde(default)]
    pub log: Log,
    #[serde(default)]
    pub proxy: Proxy,
    pub checkout: CheckoutConfiguration,
}

#[derive(Clone, serde::Deserialize, Debug)]
pub struct Common {
    pub environment: String,
}

impl Common {
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        match self.environment.as_str() {
            "development" | "production" => Ok(()),
            _ => Err(config::ConfigError::Message(format!(
                "Invalid environment '{}'. Must be 'development' or 'production'",
                self.environment
            ))),
        }
    }
}

impl Config {
    /// Loads the configuration of the running environment from its default location.
    pub fn new() -> Result<Self, ConfigurationError> {
        Self::new_with_config_path(None)
    }

    /// Loads `explicit_config_path` (or the default file) and overlays `CHECKOUT__*` variables.
    pub fn new_with_config_path(
        explicit_config_path: Option<PathBuf>,
    ) -> Result<Self, ConfigurationError> {
        let environment = Env::current_env();
        let config_path = Self::config_path(&environment, explicit_config_path);

        let config = Self::builder(&environment)?
            .add_source(config::File::from(config_path).required(false))
            .add_source(
                config::Environment::with_prefix(consts::CONFIG_ENV_PREFIX)
                    .try_parsing(true)
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("proxy.bypass_proxy_urls"),
            )
            .build()?;

        #[allow(clippy::print_stderr)]
        let config: Self = serde_path_to_error::deserialize(config).map_err(|error| {
            eprintln!("Unable to deserialize application configuration: {error}");
            error.into_inner()
        })?;

        config.common.validate()?;
        validate_client_key(&config.checkout)?;

        Ok(config)
    }

    /// Base builder with the running environment pinned, so no file or variable can change it.
    pub fn builder(
        environment: &Env,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, config::ConfigError> {
        config::Config::builder().set_override("env", environment.to_string())
    }

    /// `explicit_config_path`, or `config/<env>.toml` under the workspace root.
    pub fn config_path(environment: &Env, explicit_config_path: Option<PathBuf>) -> PathBuf {
        explicit_config_path.unwrap_or_else(|| {
            workspace_path()
                .join("config")
                .join(environment.config_path())
        })
    }
}

/// Client keys look like `test_XXXX` or `live_XXXX` and must belong to the configured
/// environment.
pub fn validate_client_key(checkout: &CheckoutConfiguration) -> Result<(), ConfigurationError> {
    let client_key = checkout.client_key.peek();
    let (prefix, key) = client_key
        .split_once('_')
        .ok_or_else(|| ConfigurationError::InvalidClientKey(masked(client_key)))?;

    let is_well_formed = matches!(prefix, "test" | "live")
        && (15..=128).contains(&key.len())
        && key.chars().all(|c| c.is_ascii_alphanumeric());
    if !is_well_formed {
        return Err(ConfigurationError::InvalidClientKey(masked(client_key)));
    }

    let is_test_key = prefix == "test";
    if is_test_key != (checkout.environment == Environment::Test) {
        return Err(ConfigurationError::ClientKeyEnvironmentMismatch(
            checkout.environment,
        ));
    }
    Ok(())
}

fn masked(client_key: &str) -> String {
    let visible: String = client_key.chars().take(5).collect();
    format!("{visible}***")
}

pub fn workspace_path() -> PathBuf {
    if let Ok(manifest_dir) = std::env::var("CARGO_MANIFEST_DIR") {
        let mut path = PathBuf::from(manifest_dir);
        path.pop();
        path.pop();
        path
    } else {
        PathBuf::from(".")
    }
}
