//! Logger configuration.

use serde::Deserialize;

/// Log config settings.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Log {
    /// Logging to a file.
    pub file: LogFile,
    /// Logging to the console.
    pub console: LogConsole,
}

/// Logging to a file.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LogFile {
    /// Whether file logging is enabled.
    pub enabled: bool,
    /// Directory to store log files in, relative to the workspace root.
    pub path: String,
    /// Name stem of the log files.
    pub file_name: String,
    /// Maximum log level for the file layer.
    pub level: Level,
    /// Filtering directive, `RUST_LOG` syntax. Overrides `level` when set.
    pub filtering_directive: Option<String>,
}

impl Default for LogFile {
    fn default() -> Self {
        Self {
            enabled: false,
            path: "logs".to_string(),
            file_name: "debug.log".to_string(),
            level: Level(tracing::Level::INFO),
            filtering_directive: None,
        }
    }
}

/// Logging to the console.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LogConsole {
    /// Whether console logging is enabled.
    pub enabled: bool,
    /// Maximum log level for the console layer.
    pub level: Level,
    /// Output format.
    pub log_format: LogFormat,
    /// Filtering directive, `RUST_LOG` syntax. Overrides `level` when set.
    pub filtering_directive: Option<String>,
}

impl Default for LogConsole {
    fn default() -> Self {
        Self {
            enabled: true,
            level: Level(tracing::Level::INFO),
            log_format: LogFormat::Default,
            filtering_directive: None,
        }
    }
}

/// Format of console output.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable output.
    #[default]
    Default,
    /// JSON output, one event per line.
    Json,
}

/// Wrapper around [`tracing::Level`] that can be deserialized from config.
#[derive(Debug, Clone, Copy)]
pub struct Level(pub tracing::Level);

impl Level {
    /// Returns the inner [`tracing::Level`].
    pub fn into_level(self) -> tracing::Level {
        self.0
    }
}

impl<'de> Deserialize<'de> for Level {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use std::str::FromStr as _;

        let s = String::deserialize(deserializer)?;
        tracing::Level::from_str(&s)
            .map(Level)
            .map_err(serde::de::Error::custom)
    }
}
