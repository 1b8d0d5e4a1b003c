//! Logger configuration, read from the `[log]` table.

use serde::Deserialize;

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Log {
    pub console: LogConsole,
    pub file: LogFile,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct LogConsole {
    pub enabled: bool,
    pub level: Level,
    pub log_format: LogFormat,
    /// Replaces the directive built from the workspace crates when set.
    pub filtering_directive: Option<String>,
}

impl Default for LogConsole {
    fn default() -> Self {
        Self {
            enabled: true,
            level: Level::default(),
            log_format: LogFormat::default(),
            filtering_directive: None,
        }
    }
}

/// Optional rolling log file, written through a non blocking appender.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct LogFile {
    pub enabled: bool,
    pub path: String,
    pub file_name: String,
    pub level: Level,
}

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Default,
    Json,
}

/// Log level as written in configuration files.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Level(tracing::Level);

impl Level {
    pub fn into_level(self) -> tracing::Level {
        self.0
    }
}

impl Default for Level {
    fn default() -> Self {
        Self(tracing::Level::INFO)
    }
}

impl<'de> Deserialize<'de> for Level {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use std::str::FromStr as _;

        let level = String::deserialize(deserializer)?;
        tracing::Level::from_str(&level)
            .map(Self)
            .map_err(serde::de::Error::custom)
    }
}
