use anyhow::{anyhow, Result};
use std::path::PathBuf;

use crate::ai::{DEFAULT_MODEL, GEMINI_API_BASE};

/// Runtime configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub api_base: String,
    pub model: String,
    pub log_filter: String,
    pub log_dir: PathBuf,
}

impl Config {
    pub fn from_env(model_override: Option<&str>) -> Result<Self> {
        dotenvy::dotenv().ok(); // .env is optional
        Self::from_lookup(|key| std::env::var(key).ok(), model_override)
    }

    pub fn from_lookup<F>(lookup: F, model_override: Option<&str>) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_key = non_empty("GEMINI_API_KEY")
            .or_else(|| non_empty("API_KEY"))
            .ok_or_else(|| {
                anyhow!(
                    "GEMINI_API_KEY environment variable not set. Set it with: export GEMINI_API_KEY=your-key-here"
                )
            })?;

        let model = model_override
            .map(str::to_string)
            .or_else(|| non_empty("TAILOR_MODEL"))
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        Ok(Self {
            api_key,
            api_base: non_empty("GEMINI_API_BASE").unwrap_or_else(|| GEMINI_API_BASE.to_string()),
            model,
            log_filter: non_empty("TAILOR_LOG").unwrap_or_else(|| "info".to_string()),
            log_dir: default_log_dir(),
        })
    }

    pub fn log_file(&self) -> PathBuf {
        self.log_dir.join("tailor.log")
    }
}

fn default_log_dir() -> PathBuf {
    // XDG data directory, or the working directory as a fallback
    if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "resume-tailor") {
        proj_dirs.data_dir().to_path_buf()
    } else {
        PathBuf::from(".")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn load(env: &HashMap<String, String>, model_override: Option<&str>) -> Result<Config> {
        Config::from_lookup(|key| env.get(key).cloned(), model_override)
    }

    #[test]
    fn test_requires_api_key() {
        let result = load(&env_of(&[]), None);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("GEMINI_API_KEY"));

        assert!(load(&env_of(&[("GEMINI_API_KEY", "  ")]), None).is_err());
    }

    #[test]
    fn test_falls_back_to_api_key_variable() {
        let config = load(&env_of(&[("API_KEY", "legacy-key")]), None).unwrap();
        assert_eq!(config.api_key, "legacy-key");

        let env = env_of(&[("API_KEY", "legacy-key"), ("GEMINI_API_KEY", "gemini-key")]);
        let config = load(&env, None).unwrap();
        assert_eq!(config.api_key, "gemini-key");
    }

    #[test]
    fn test_defaults() {
        let config = load(&env_of(&[("GEMINI_API_KEY", "k")]), None).unwrap();
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.api_base, GEMINI_API_BASE);
        assert_eq!(config.log_filter, "info");
        assert!(config.log_file().ends_with("tailor.log"));
    }

    #[test]
    fn test_model_override_wins() {
        let env = env_of(&[
            ("GEMINI_API_KEY", "k"),
            ("TAILOR_MODEL", "gemini-2.5-pro"),
            ("TAILOR_LOG", "resume_tailor=debug"),
            ("GEMINI_API_BASE", "http://localhost:9000"),
        ]);
        let config = load(&env, None).unwrap();
        assert_eq!(config.model, "gemini-2.5-pro");
        assert_eq!(config.log_filter, "resume_tailor=debug");
        assert_eq!(config.api_base, "http://localhost:9000");

        let config = load(&env, Some("flash")).unwrap();
        assert_eq!(config.model, "flash");
    }
}
