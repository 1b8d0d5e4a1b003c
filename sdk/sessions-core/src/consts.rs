/// Saved state key of the latest `sessionData`.
pub const SESSION_DATA_KEY: &str = "session_data";
/// Saved state key of the "taken over" latch.
pub const FLOW_TAKEN_OVER_KEY: &str = "is_flow_taken_over";

/// Prefix of environment variables overriding configuration values.
pub const CONFIG_ENV_PREFIX: &str = "CHECKOUT";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Env {
    Development,
    Release,
}

impl Env {
    pub const fn current_env() -> Self {
        if cfg!(debug_assertions) {
            Self::Development
        } else {
            Self::Release
        }
    }

    pub const fn config_path(self) -> &'static str {
        match self {
            Self::Development => "development.toml",
            Self::Release => "production.toml",
        }
    }
}

impl std::fmt::Display for Env {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Release => write!(f, "release"),
        }
    }
}
