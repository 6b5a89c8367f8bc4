//! Server configuration
//!
//! Loaded from a YAML file, validated eagerly so a bad config fails at
//! startup rather than on the first request. The API key is read from the
//! environment, never from the file.

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Read(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
    #[error("api key environment variable not set: {0}")]
    MissingApiKey(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeskpilotConfig {
    /// Address the HTTP server binds to
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    /// Directory screenshots are written to
    #[serde(default = "default_screenshot_dir")]
    pub screenshot_dir: String,
    pub llm: LlmConfig,
    #[serde(default)]
    pub automation: AutomationConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    /// Chat-completions endpoint URL
    pub api_url: String,
    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    pub planner_model: String,
    pub vision_model: String,
    pub operation_model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AutomationConfig {
    /// Screenshot command, invoked as `<capture_command> <path>`
    #[serde(default = "default_capture_command")]
    pub capture_command: String,
    /// Input-injection command, xdotool-compatible
    #[serde(default = "default_input_command")]
    pub input_command: String,
    /// Pause after each dispatched command, in milliseconds
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
}

impl Default for AutomationConfig {
    fn default() -> Self {
        Self {
            capture_command: default_capture_command(),
            input_command: default_input_command(),
            settle_delay_ms: default_settle_delay_ms(),
        }
    }
}

fn default_listen_addr() -> String {
    "0.0.0.0:8000".to_string()
}

fn default_screenshot_dir() -> String {
    "./screenshots".to_string()
}

fn default_api_key_env() -> String {
    "DESKPILOT_API_KEY".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    512
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_capture_command() -> String {
    "scrot".to_string()
}

fn default_input_command() -> String {
    "xdotool".to_string()
}

fn default_settle_delay_ms() -> u64 {
    100
}

impl DeskpilotConfig {
    /// Resolve the API key from the configured environment variable
    pub fn api_key(&self) -> Result<String, ConfigError> {
        std::env::var(&self.llm.api_key_env)
            .map_err(|_| ConfigError::MissingApiKey(self.llm.api_key_env.clone()))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.listen_addr.trim().is_empty() {
            return Err(ConfigError::Invalid("listen_addr must not be empty".to_string()));
        }
        if self.llm.api_url.trim().is_empty() {
            return Err(ConfigError::Invalid("llm.api_url must not be empty".to_string()));
        }
        for (field, value) in [
            ("llm.planner_model", &self.llm.planner_model),
            ("llm.vision_model", &self.llm.vision_model),
            ("llm.operation_model", &self.llm.operation_model),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("{field} must not be empty")));
            }
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(ConfigError::Invalid(
                "llm.temperature must be between 0.0 and 2.0".to_string(),
            ));
        }
        if self.llm.max_tokens == 0 {
            return Err(ConfigError::Invalid("llm.max_tokens must be positive".to_string()));
        }
        Ok(())
    }
}

/// Load and validate the config file
pub fn load_config(path: impl AsRef<Path>) -> Result<DeskpilotConfig, ConfigError> {
    let raw = std::fs::read_to_string(path)?;
    let config: DeskpilotConfig = serde_yaml::from_str(&raw)?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MINIMAL: &str = r#"
llm:
  api_url: "https://models.example.com/v1/chat/completions"
  planner_model: "planner-v1"
  vision_model: "vision-v1"
  operation_model: "operator-v1"
"#;

    fn write_config(body: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(body.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_minimal_config_gets_defaults() {
        let file = write_config(MINIMAL);
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.listen_addr, "0.0.0.0:8000");
        assert_eq!(config.llm.api_key_env, "DESKPILOT_API_KEY");
        assert_eq!(config.llm.temperature, 0.7);
        assert_eq!(config.automation.capture_command, "scrot");
        assert_eq!(config.automation.settle_delay_ms, 100);
    }

    #[test]
    fn test_missing_model_is_rejected() {
        let file = write_config(
            r#"
llm:
  api_url: "https://models.example.com/v1/chat/completions"
  planner_model: "planner-v1"
  vision_model: ""
  operation_model: "operator-v1"
"#,
        );
        assert!(matches!(
            load_config(file.path()),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_out_of_range_temperature_is_rejected() {
        let file = write_config(
            r#"
llm:
  api_url: "https://models.example.com/v1/chat/completions"
  planner_model: "planner-v1"
  vision_model: "vision-v1"
  operation_model: "operator-v1"
  temperature: 3.5
"#,
        );
        assert!(matches!(
            load_config(file.path()),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_unparseable_yaml_is_a_parse_error() {
        let file = write_config("llm: [not, a, mapping");
        assert!(matches!(load_config(file.path()), Err(ConfigError::Parse(_))));
    }
}
