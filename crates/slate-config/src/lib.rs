//! Settings for Slate (`slate.toml`) and tracing initialisation.
//!
//! Example:
//!
//! ```toml
//! [logging]
//! level = "slate.vfs=debug,info"
//!
//! [editor]
//! font_size = 14
//! tab_width = 2
//! word_wrap = true
//!
//! [import]
//! max_file_bytes = 10485760
//! max_concurrency = 8
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

mod diagnostics;
mod logging;

pub use diagnostics::{ConfigDiagnostics, ConfigWarning};
pub use logging::{init_tracing, LogBuffer};

/// Environment variable overriding config discovery.
pub const SLATE_CONFIG_ENV_VAR: &str = "SLATE_CONFIG_PATH";

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SlateConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Preferences read by the tab controller.
    #[serde(default)]
    pub editor: EditorConfig,

    /// Limits for file uploads into the virtual file system.
    #[serde(default)]
    pub import: ImportConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Either a simple level (`info`, `debug`, ...) or `EnvFilter` directives.
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,

    /// Emit logs in JSON format.
    #[serde(default)]
    pub json: bool,

    /// Mirror logs to stderr (in addition to the in-memory buffer).
    #[serde(default = "LoggingConfig::default_stderr")]
    pub stderr: bool,

    /// Append logs to the given file path.
    ///
    /// If the file cannot be opened, file logging is disabled while other sinks
    /// remain active.
    #[serde(default)]
    pub file: Option<PathBuf>,

    /// Number of log lines kept in memory.
    #[serde(default = "LoggingConfig::default_buffer_lines")]
    pub buffer_lines: usize,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_owned()
    }

    fn default_stderr() -> bool {
        true
    }

    pub(crate) fn default_buffer_lines() -> usize {
        2_000
    }

    pub(crate) fn normalize_level_directives(input: &str) -> String {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Self::default_level();
        }

        match trimmed.to_ascii_lowercase().as_str() {
            "trace" => "trace".to_owned(),
            "debug" => "debug".to_owned(),
            "info" => "info".to_owned(),
            "warn" | "warning" => "warn".to_owned(),
            "error" => "error".to_owned(),
            _ => trimmed.to_owned(),
        }
    }

    fn config_env_filter(&self) -> tracing_subscriber::EnvFilter {
        let directives = Self::normalize_level_directives(&self.level);
        tracing_subscriber::EnvFilter::try_new(directives).unwrap_or_else(|_| {
            tracing_subscriber::EnvFilter::default()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into())
        })
    }

    /// Effective filter: the configured level merged with `RUST_LOG` when set.
    pub fn env_filter(&self) -> tracing_subscriber::EnvFilter {
        let env_directives = std::env::var("RUST_LOG")
            .ok()
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty());

        let config_directives = Self::normalize_level_directives(&self.level);

        match env_directives {
            Some(env_directives) => {
                let combined = format!("{config_directives},{env_directives}");
                tracing_subscriber::EnvFilter::try_new(combined)
                    .or_else(|_| tracing_subscriber::EnvFilter::try_new(env_directives))
                    .unwrap_or_else(|_| self.config_env_filter())
            }
            None => self.config_env_filter(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
            json: false,
            stderr: Self::default_stderr(),
            file: None,
            buffer_lines: Self::default_buffer_lines(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditorConfig {
    #[serde(default = "EditorConfig::default_font_size")]
    pub font_size: u32,
    #[serde(default = "EditorConfig::default_tab_width")]
    pub tab_width: u32,
    #[serde(default)]
    pub word_wrap: bool,
}

impl EditorConfig {
    pub const FONT_SIZE_RANGE: (u32, u32) = (6, 72);
    pub const TAB_WIDTH_RANGE: (u32, u32) = (1, 16);

    fn default_font_size() -> u32 {
        14
    }

    fn default_tab_width() -> u32 {
        2
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            font_size: Self::default_font_size(),
            tab_width: Self::default_tab_width(),
            word_wrap: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportConfig {
    /// Uploaded files larger than this are rejected individually.
    #[serde(default = "ImportConfig::default_max_file_bytes")]
    pub max_file_bytes: u64,
    /// Upper bound on concurrent reads during a multi-file upload.
    #[serde(default = "ImportConfig::default_max_concurrency")]
    pub max_concurrency: usize,
}

impl ImportConfig {
    fn default_max_file_bytes() -> u64 {
        10 * 1024 * 1024
    }

    fn default_max_concurrency() -> usize {
        8
    }
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            max_file_bytes: Self::default_max_file_bytes(),
            max_concurrency: Self::default_max_concurrency(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse toml config: {0}")]
    Toml(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        // The default `Display` embeds a source snippet; keep just the message.
        ConfigError::Toml(err.message().to_owned())
    }
}

impl SlateConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let (config, _diagnostics) = Self::load_from_str_with_diagnostics(text)?;
        Ok(config)
    }

    /// Load a config file from TOML.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Load a config from a TOML string, reporting unknown keys and clamped values.
    pub fn load_from_str_with_diagnostics(
        text: &str,
    ) -> Result<(Self, ConfigDiagnostics), ConfigError> {
        let (mut config, unknown_keys) =
            diagnostics::deserialize_toml_with_unknown_keys::<SlateConfig>(text)?;

        let mut diagnostics = ConfigDiagnostics {
            unknown_keys,
            ..ConfigDiagnostics::default()
        };
        diagnostics.warnings.extend(config.sanitize());
        Ok((config, diagnostics))
    }

    fn sanitize(&mut self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        let (min, max) = EditorConfig::FONT_SIZE_RANGE;
        if let Some(warning) = clamp_u32(&mut self.editor.font_size, min, max, "editor.font_size") {
            warnings.push(warning);
        }
        let (min, max) = EditorConfig::TAB_WIDTH_RANGE;
        if let Some(warning) = clamp_u32(&mut self.editor.tab_width, min, max, "editor.tab_width") {
            warnings.push(warning);
        }
        if self.import.max_concurrency == 0 {
            warnings.push(ConfigWarning::ValueClamped {
                toml_path: "import.max_concurrency".to_owned(),
                value: 0,
                clamped: 1,
            });
            self.import.max_concurrency = 1;
        }

        let directives = LoggingConfig::normalize_level_directives(&self.logging.level);
        if tracing_subscriber::EnvFilter::try_new(&directives).is_err() {
            warnings.push(ConfigWarning::LoggingLevelInvalid {
                value: self.logging.level.clone(),
            });
        }

        for warning in &warnings {
            tracing::warn!(target: "slate.config", ?warning, "adjusted config value");
        }
        warnings
    }
}

fn clamp_u32(value: &mut u32, min: u32, max: u32, toml_path: &str) -> Option<ConfigWarning> {
    let clamped = (*value).clamp(min, max);
    if clamped == *value {
        return None;
    }
    let warning = ConfigWarning::ValueClamped {
        toml_path: toml_path.to_owned(),
        value: u64::from(*value),
        clamped: u64::from(clamped),
    };
    *value = clamped;
    Some(warning)
}

/// Discover the config file for a project root.
///
/// Search order:
/// 1) `SLATE_CONFIG_PATH` (absolute or relative to `root`)
/// 2) `slate.toml` in `root`
/// 3) `.slate.toml` in `root`
pub fn discover_config_path(root: &Path) -> Option<PathBuf> {
    if let Some(value) = std::env::var_os(SLATE_CONFIG_ENV_VAR) {
        let candidate = PathBuf::from(value);
        let path = if candidate.is_absolute() {
            candidate
        } else {
            root.join(candidate)
        };
        return Some(path);
    }

    ["slate.toml", ".slate.toml"]
        .into_iter()
        .map(|name| root.join(name))
        .find(|path| path.is_file())
}

/// Load the config for a project root, falling back to defaults when none exists.
pub fn load_for_root(root: &Path) -> Result<(SlateConfig, Option<PathBuf>), ConfigError> {
    let Some(path) = discover_config_path(root) else {
        return Ok((SlateConfig::default(), None));
    };
    let config = SlateConfig::load_from_path(&path)?;
    Ok((config, Some(path)))
}
