use anyhow::Context;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuntimeConfig {
    #[serde(default)]
    pub evaluation: EvaluationConfig,
    #[serde(default)]
    pub alerts: AlertsConfig,
    #[serde(default)]
    pub rules: RulesConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Periodic evaluation loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationConfig {
    #[serde(default = "default_evaluation_enabled")]
    pub enabled: bool,
    /// Seconds between two evaluation passes over the metric source.
    #[serde(default = "default_evaluation_tick_secs")]
    pub tick_secs: u64,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            enabled: default_evaluation_enabled(),
            tick_secs: default_evaluation_tick_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertsConfig {
    /// Upper bound on retained alerts; the oldest resolved ones go first.
    #[serde(default = "default_max_alerts")]
    pub max_alerts: usize,
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            max_alerts: default_max_alerts(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RulesConfig {
    #[serde(default = "default_install_defaults")]
    pub install_defaults: bool,
    /// JSON file of extra rules loaded at startup.
    #[serde(default)]
    pub seed_file: Option<String>,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            install_defaults: default_install_defaults(),
            seed_file: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive(s), e.g. `vigil=debug`. `RUST_LOG` still applies.
    #[serde(default)]
    pub filter: Option<String>,
    #[serde(default)]
    pub json: bool,
}

fn default_evaluation_enabled() -> bool {
    true
}

fn default_evaluation_tick_secs() -> u64 {
    60
}

fn default_max_alerts() -> usize {
    vigil_alert::alert_store::DEFAULT_MAX_ALERTS
}

fn default_install_defaults() -> bool {
    true
}

impl RuntimeConfig {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file '{path}'"))?;
        Self::from_toml_str(&content).with_context(|| format!("Invalid config file '{path}'"))
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.evaluation.tick_secs == 0 {
            anyhow::bail!("evaluation.tick_secs must be greater than 0");
        }
        if self.alerts.max_alerts == 0 {
            anyhow::bail!("alerts.max_alerts must be greater than 0");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config = RuntimeConfig::from_toml_str("").unwrap();
        assert!(config.evaluation.enabled);
        assert_eq!(config.evaluation.tick_secs, 60);
        assert_eq!(config.alerts.max_alerts, 1000);
        assert!(config.rules.install_defaults);
        assert!(config.rules.seed_file.is_none());
        assert!(config.logging.filter.is_none());
        assert!(!config.logging.json);
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config = RuntimeConfig::from_toml_str(
            r#"
            [evaluation]
            tick_secs = 15

            [rules]
            seed_file = "rules.json"

            [logging]
            filter = "vigil=debug"
            json = true
            "#,
        )
        .unwrap();

        assert!(config.evaluation.enabled);
        assert_eq!(config.evaluation.tick_secs, 15);
        assert_eq!(config.alerts.max_alerts, 1000);
        assert!(config.rules.install_defaults);
        assert_eq!(config.rules.seed_file.as_deref(), Some("rules.json"));
        assert_eq!(config.logging.filter.as_deref(), Some("vigil=debug"));
        assert!(config.logging.json);
    }

    #[test]
    fn zero_tick_is_rejected() {
        let err = RuntimeConfig::from_toml_str("[evaluation]\ntick_secs = 0\n").unwrap_err();
        assert!(err.to_string().contains("tick_secs"));
    }

    #[test]
    fn malformed_toml_is_an_error() {
        assert!(RuntimeConfig::from_toml_str("[evaluation\n").is_err());
    }

    #[test]
    fn missing_file_reports_path() {
        let err = RuntimeConfig::load("/nonexistent/vigil.toml").unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/vigil.toml"));
    }
}
