use std::{collections::HashMap, path::PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::llm::LlmSettings;
use crate::prompt::DEFAULT_PROMPT_TEMPLATE;

/// Report location used when none is configured, relative to the workspace.
pub const DEFAULT_REPORT_PATH: &str = "flow-risk-report.md";

/// Everything one run of the action needs, resolved once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionConfig {
    pub llm: LlmSettings,
    pub prompt_template: String,
    pub file_path: PathBuf,
    pub report_path: PathBuf,
    /// Log raw model replies (`FLOW_RISK_DEBUG`).
    pub debug_replies: bool,
}

/// Optional values read from a configuration file. Environment inputs win.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FileConfig {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub prompt: Option<String>,
    pub file_path: Option<String>,
    pub api_version: Option<String>,
    pub max_tokens: Option<u32>,
    pub endpoint: Option<String>,
    pub report_path: Option<String>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("input `file_path` is required (set {env})")]
    MissingFilePath { env: &'static str },
    #[error("{env} must be a positive integer (got `{value}`)")]
    InvalidMaxTokens { env: &'static str, value: String },
}

impl ActionConfig {
    const API_KEY_ENV: &'static str = "INPUT_API_KEY";
    const MODEL_ENV: &'static str = "INPUT_MODEL";
    const PROMPT_ENV: &'static str = "INPUT_PROMPT";
    const FILE_PATH_ENV: &'static str = "INPUT_FILE_PATH";
    const API_VERSION_ENV: &'static str = "INPUT_API_VERSION";
    const MAX_TOKENS_ENV: &'static str = "INPUT_MAX_TOKENS";
    const ENDPOINT_ENV: &'static str = "INPUT_ENDPOINT";
    const REPORT_PATH_ENV: &'static str = "INPUT_REPORT_PATH";
    const DEBUG_ENV: &'static str = "FLOW_RISK_DEBUG";
    const FILE_MAX_TOKENS_KEY: &'static str = "max_tokens";

    /// Load action inputs from the environment, layered over `file`.
    ///
    /// * `INPUT_API_KEY`   — model API key (checked when the client is built).
    /// * `INPUT_FILE_PATH` — flow XML to analyze (required).
    /// * `INPUT_MODEL`, `INPUT_PROMPT`, `INPUT_API_VERSION`, `INPUT_MAX_TOKENS`,
    ///   `INPUT_ENDPOINT`, `INPUT_REPORT_PATH` — optional overrides.
    /// * `FLOW_RISK_DEBUG` — any value other than `0` logs raw model replies.
    pub fn from_env(file: FileConfig) -> Result<Self, ConfigError> {
        Self::from_map(std::env::vars().collect(), file)
    }

    pub fn from_map(vars: HashMap<String, String>, file: FileConfig) -> Result<Self, ConfigError> {
        let lookup = |key: &str, fallback: Option<String>| {
            vars.get(key)
                .cloned()
                .filter(|v| !v.trim().is_empty())
                .or(fallback.filter(|v| !v.trim().is_empty()))
        };

        let file_path = lookup(Self::FILE_PATH_ENV, file.file_path)
            .map(|v| PathBuf::from(v.trim()))
            .ok_or(ConfigError::MissingFilePath {
                env: Self::FILE_PATH_ENV,
            })?;

        let max_tokens = match vars
            .get(Self::MAX_TOKENS_ENV)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
        {
            Some(raw) => raw
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| ConfigError::InvalidMaxTokens {
                    env: Self::MAX_TOKENS_ENV,
                    value: raw.to_string(),
                })?,
            None => match file.max_tokens {
                Some(0) => {
                    return Err(ConfigError::InvalidMaxTokens {
                        env: Self::FILE_MAX_TOKENS_KEY,
                        value: "0".into(),
                    })
                }
                Some(n) => n,
                None => crate::llm::DEFAULT_MAX_TOKENS,
            },
        };

        let debug_replies = vars
            .get(Self::DEBUG_ENV)
            .map(|v| v.trim())
            .is_some_and(|v| !v.is_empty() && v != "0");

        let defaults = LlmSettings::with_api_key(String::new());
        let llm = LlmSettings {
            api_key: lookup(Self::API_KEY_ENV, file.api_key)
                .map(|v| v.trim().to_string())
                .unwrap_or_default(),
            endpoint: lookup(Self::ENDPOINT_ENV, file.endpoint).unwrap_or(defaults.endpoint),
            model: lookup(Self::MODEL_ENV, file.model)
                .map(|v| v.trim().to_string())
                .unwrap_or(defaults.model),
            api_version: lookup(Self::API_VERSION_ENV, file.api_version)
                .map(|v| v.trim().to_string())
                .unwrap_or(defaults.api_version),
            max_tokens,
        };

        Ok(Self {
            llm,
            prompt_template: lookup(Self::PROMPT_ENV, file.prompt)
                .unwrap_or_else(|| DEFAULT_PROMPT_TEMPLATE.to_string()),
            file_path,
            report_path: lookup(Self::REPORT_PATH_ENV, file.report_path)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_REPORT_PATH)),
            debug_replies,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{DEFAULT_API_VERSION, DEFAULT_ENDPOINT, DEFAULT_MAX_TOKENS, DEFAULT_MODEL};

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn applies_defaults() {
        let config = ActionConfig::from_map(
            vars(&[("INPUT_API_KEY", "secret"), ("INPUT_FILE_PATH", "flow.xml")]),
            FileConfig::default(),
        )
        .expect("should load config");
        assert_eq!(config.llm.api_key, "secret");
        assert_eq!(config.llm.model, DEFAULT_MODEL);
        assert_eq!(config.llm.api_version, DEFAULT_API_VERSION);
        assert_eq!(config.llm.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.llm.max_tokens, DEFAULT_MAX_TOKENS);
        assert_eq!(config.prompt_template, DEFAULT_PROMPT_TEMPLATE);
        assert_eq!(config.file_path, PathBuf::from("flow.xml"));
        assert_eq!(config.report_path, PathBuf::from(DEFAULT_REPORT_PATH));
    }

    #[test]
    fn file_path_is_required() {
        let err = ActionConfig::from_map(
            vars(&[("INPUT_API_KEY", "secret"), ("INPUT_FILE_PATH", "  ")]),
            FileConfig::default(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            ConfigError::MissingFilePath {
                env: "INPUT_FILE_PATH"
            }
        );
    }

    #[test]
    fn missing_api_key_is_left_for_the_client() {
        let config =
            ActionConfig::from_map(vars(&[("INPUT_FILE_PATH", "flow.xml")]), FileConfig::default())
                .unwrap();
        assert!(config.llm.api_key.is_empty());
    }

    #[test]
    fn rejects_invalid_max_tokens() {
        let err = ActionConfig::from_map(
            vars(&[("INPUT_FILE_PATH", "flow.xml"), ("INPUT_MAX_TOKENS", "lots")]),
            FileConfig::default(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("INPUT_MAX_TOKENS"));
        assert!(err.to_string().contains("lots"));
    }

    #[test]
    fn rejects_zero_max_tokens_from_file() {
        let file = FileConfig {
            max_tokens: Some(0),
            ..FileConfig::default()
        };
        let err = ActionConfig::from_map(vars(&[("INPUT_FILE_PATH", "flow.xml")]), file)
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidMaxTokens {
                env: "max_tokens",
                value: "0".into()
            }
        );
    }

    #[test]
    fn debug_replies_follows_flow_risk_debug() {
        let load = |value: Option<&str>| {
            let mut map = vars(&[("INPUT_FILE_PATH", "flow.xml")]);
            if let Some(value) = value {
                map.insert("FLOW_RISK_DEBUG".into(), value.into());
            }
            ActionConfig::from_map(map, FileConfig::default())
                .unwrap()
                .debug_replies
        };
        assert!(!load(None));
        assert!(!load(Some("")));
        assert!(!load(Some("0")));
        assert!(load(Some("1")));
        assert!(load(Some("true")));
    }

    #[test]
    fn environment_overrides_file_values() {
        let file = FileConfig {
            model: Some("file-model".into()),
            prompt: Some("file prompt {JSON}".into()),
            file_path: Some("from-file.xml".into()),
            max_tokens: Some(256),
            ..FileConfig::default()
        };
        let config = ActionConfig::from_map(
            vars(&[
                ("INPUT_MODEL", "env-model"),
                ("INPUT_MAX_TOKENS", "2048"),
                ("INPUT_API_VERSION", "2024-01-01"),
            ]),
            file,
        )
        .unwrap();
        assert_eq!(config.llm.model, "env-model");
        assert_eq!(config.llm.max_tokens, 2048);
        assert_eq!(config.llm.api_version, "2024-01-01");
        assert_eq!(config.prompt_template, "file prompt {JSON}");
        assert_eq!(config.file_path, PathBuf::from("from-file.xml"));
    }
}
