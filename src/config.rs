use std::path::PathBuf;

use tracing::warn;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8501";
pub const DEFAULT_LOG_CSV: &str = "predictions_log.csv";

/// Runtime settings, read from the environment (and `.env` when present).
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub bind_addr: String,
    pub log_path: PathBuf,
    pub models_dir: Option<PathBuf>,
    pub device: String,
    pub max_seq_len: Option<usize>,
    pub preload: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            log_path: PathBuf::from(DEFAULT_LOG_CSV),
            models_dir: None,
            device: "cpu".to_string(),
            max_seq_len: None,
            preload: false,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| dotenvy::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let max_seq_len = get("EMOTION_SEQ_LEN").and_then(|raw| match raw.parse::<usize>() {
            Ok(len) if len > 0 => Some(len),
            _ => {
                warn!(value = raw.as_str(), "ignoring invalid EMOTION_SEQ_LEN");
                None
            }
        });

        let preload = get("EMOTION_PRELOAD")
            .map(|raw| match raw.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => {
                    warn!(value = raw.as_str(), "ignoring invalid EMOTION_PRELOAD");
                    defaults.preload
                }
            })
            .unwrap_or(defaults.preload);

        Self {
            bind_addr: get("EMOTION_BIND_ADDR").unwrap_or(defaults.bind_addr),
            log_path: get("EMOTION_LOG_CSV")
                .map(PathBuf::from)
                .unwrap_or(defaults.log_path),
            models_dir: get("EMOTION_MODELS_DIR").map(PathBuf::from),
            device: get("EMOTION_DEVICE").unwrap_or(defaults.device),
            max_seq_len,
            preload,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> AppConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn empty_environment_gives_defaults() {
        assert_eq!(config_from(&[]), AppConfig::default());
        assert_eq!(AppConfig::default().log_path, PathBuf::from("predictions_log.csv"));
    }

    #[test]
    fn overrides_are_applied() {
        let cfg = config_from(&[
            ("EMOTION_BIND_ADDR", "127.0.0.1:9000"),
            ("EMOTION_LOG_CSV", "/tmp/log.csv"),
            ("EMOTION_MODELS_DIR", "models"),
            ("EMOTION_DEVICE", "cuda:1"),
            ("EMOTION_SEQ_LEN", "128"),
            ("EMOTION_PRELOAD", "yes"),
        ]);
        assert_eq!(cfg.bind_addr, "127.0.0.1:9000");
        assert_eq!(cfg.log_path, PathBuf::from("/tmp/log.csv"));
        assert_eq!(cfg.models_dir, Some(PathBuf::from("models")));
        assert_eq!(cfg.device, "cuda:1");
        assert_eq!(cfg.max_seq_len, Some(128));
        assert!(cfg.preload);
    }

    #[test]
    fn invalid_values_fall_back() {
        let cfg = config_from(&[
            ("EMOTION_SEQ_LEN", "lots"),
            ("EMOTION_PRELOAD", "maybe"),
            ("EMOTION_BIND_ADDR", "   "),
        ]);
        assert_eq!(cfg.max_seq_len, None);
        assert!(!cfg.preload);
        assert_eq!(cfg.bind_addr, DEFAULT_BIND_ADDR);
    }
}
