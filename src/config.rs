use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub credits: CreditsConfig,

    #[serde(default)]
    pub plans: Vec<PlanConfig>,

    #[serde(default)]
    pub admin: AdminConfig,

    #[serde(default)]
    pub gateway: GatewayConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,

    #[serde(default)]
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Argon2 memory cost in KiB (default: 8192 = 8MB)
    pub argon2_memory_cost_kib: u32,

    /// Argon2 time cost (iterations)
    pub argon2_time_cost: u32,

    /// Argon2 parallelism (default: 1)
    pub argon2_parallelism: u32,

    /// Minimum password length enforced at signup.
    pub min_password_length: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            argon2_memory_cost_kib: 8192,
            argon2_time_cost: 3,
            argon2_parallelism: 1,
            min_password_length: 8,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Record ledger and payment counters and log a Prometheus snapshot
    /// when a command finishes.
    pub metrics_enabled: bool,

    pub loki_enabled: bool,

    pub loki_url: String,

    pub loki_labels: std::collections::HashMap<String, String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        let mut labels = std::collections::HashMap::new();
        labels.insert("app".to_string(), "division".to_string());

        Self {
            metrics_enabled: false,
            loki_enabled: false,
            loki_url: "http://localhost:3100".to_string(),
            loki_labels: labels,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    /// Directory generated and edited images are written to.
    pub output_dir: String,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    pub max_db_connections: u32,

    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/division.db".to_string(),
            log_level: "info".to_string(),
            output_dir: "output".to_string(),
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CreditsConfig {
    /// Credits granted to every new account.
    pub signup_bonus: i64,

    /// Cost of a single generated image.
    pub generation_cost: i64,

    /// Cost of one edit request.
    pub edit_cost: i64,

    pub max_images_per_request: u32,

    /// Re-credit the debited amount when the gateway call fails.
    pub refund_on_failure: bool,

    /// Balance below which `whoami` suggests buying more credits.
    pub low_balance_threshold: i64,
}

impl Default for CreditsConfig {
    fn default() -> Self {
        Self {
            signup_bonus: 25,
            generation_cost: 5,
            edit_cost: 5,
            max_images_per_request: 3,
            refund_on_failure: false,
            low_balance_threshold: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlanConfig {
    pub name: String,
    pub credits: i64,
    pub price: i64,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    pub name: String,

    pub email: String,

    /// Initial administrator password. When unset and no administrator
    /// exists yet, a random one is generated and printed once.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            name: "Admin".to_string(),
            email: "admin@division.local".to_string(),
            password: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub base_url: String,

    /// Falls back to `GEMINI_API_KEY` / `API_KEY` from the environment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    pub generate_model: String,

    pub edit_model: String,

    pub aspect_ratio: String,

    pub request_timeout_seconds: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            api_key: None,
            generate_model: "imagen-4.0-generate-001".to_string(),
            edit_model: "gemini-2.5-flash-image".to_string(),
            aspect_ratio: "1:1".to_string(),
            request_timeout_seconds: 120,
        }
    }
}

impl GatewayConfig {
    #[must_use]
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| std::env::var("GEMINI_API_KEY").ok())
            .or_else(|| std::env::var("API_KEY").ok())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            credits: CreditsConfig::default(),
            plans: vec![
                PlanConfig {
                    name: "Starter Pack".to_string(),
                    credits: 30,
                    price: 99,
                    description: "Perfect for getting started.".to_string(),
                },
                PlanConfig {
                    name: "Creator Pack".to_string(),
                    credits: 100,
                    price: 299,
                    description: "Best value for regular creators.".to_string(),
                },
                PlanConfig {
                    name: "Pro Pack".to_string(),
                    credits: 200,
                    price: 499,
                    description: "For power users and professionals.".to_string(),
                },
            ],
            admin: AdminConfig::default(),
            gateway: GatewayConfig::default(),
            observability: ObservabilityConfig::default(),
            security: SecurityConfig::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let paths = Self::config_paths();

        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                return Self::load_from_path(path);
            }
        }

        info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("config.toml")];

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("division").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".division").join("config.toml"));
        }

        paths
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();
        if path.exists() {
            Ok(false)
        } else {
            let config = Self::default();
            config.save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.plans.is_empty() {
            anyhow::bail!("At least one credit plan must be configured");
        }

        for (i, plan) in self.plans.iter().enumerate() {
            if plan.name.trim().is_empty() {
                anyhow::bail!("Plan #{} has an empty name", i + 1);
            }
            if plan.credits <= 0 {
                anyhow::bail!("Plan '{}' must grant a positive number of credits", plan.name);
            }
            if plan.price < 0 {
                anyhow::bail!("Plan '{}' has a negative price", plan.name);
            }
            if find_plan(&self.plans[..i], &plan.name).is_some() {
                anyhow::bail!("Duplicate plan name '{}'", plan.name);
            }
        }

        if self.credits.signup_bonus < 0 {
            anyhow::bail!("Signup bonus cannot be negative");
        }

        if self.credits.generation_cost <= 0 || self.credits.edit_cost <= 0 {
            anyhow::bail!("Generation and edit costs must be greater than zero");
        }

        if self.credits.max_images_per_request == 0 {
            anyhow::bail!("max_images_per_request must be at least 1");
        }

        if self.admin.email.trim().is_empty() {
            anyhow::bail!("Administrator email cannot be empty");
        }

        if self.gateway.base_url.is_empty() {
            anyhow::bail!("Gateway base URL cannot be empty");
        }
        url::Url::parse(&self.gateway.base_url).context("Invalid gateway base URL")?;

        if self.observability.loki_enabled {
            url::Url::parse(&self.observability.loki_url).context("Invalid Loki URL")?;
        }

        Ok(())
    }
}

/// Looks up a plan by name, ignoring surrounding whitespace and ASCII case.
#[must_use]
pub fn find_plan<'a>(plans: &'a [PlanConfig], name: &str) -> Option<&'a PlanConfig> {
    let name = name.trim();
    plans.iter().find(|p| p.name.trim().eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.credits.signup_bonus, 25);
        assert_eq!(config.credits.generation_cost, 5);
        assert_eq!(config.security.min_password_length, 8);
        assert_eq!(config.plans.len(), 3);
        assert!(!config.credits.refund_on_failure);
        config.validate().unwrap();
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[credits]"));
        assert!(toml_str.contains("[[plans]]"));
        assert!(!toml_str.contains("api_key"));
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
            [general]
            log_level = "debug"

            [credits]
            refund_on_failure = true

            [[plans]]
            name = "Mega Pack"
            credits = 1000
            price = 1999
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert!(config.credits.refund_on_failure);
        assert_eq!(config.credits.signup_bonus, 25);
        assert_eq!(config.plans.len(), 1);
        assert_eq!(find_plan(&config.plans, "mega pack").unwrap().credits, 1000);
    }

    #[test]
    fn test_validate_rejects_duplicate_plans() {
        let mut config = Config::default();
        config.plans.push(config.plans[0].clone());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_plans_differing_only_in_case() {
        let mut config = Config::default();
        let mut shouted = config.plans[0].clone();
        shouted.name = format!(" {} ", shouted.name.to_uppercase());
        config.plans.push(shouted);

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Duplicate plan name"));
    }

    #[test]
    fn test_validate_rejects_zero_credit_plan() {
        let mut config = Config::default();
        config.plans[1].credits = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_find_plan_is_case_insensitive() {
        let config = Config::default();
        assert_eq!(find_plan(&config.plans, " starter pack ").unwrap().credits, 30);
        assert!(find_plan(&config.plans, "Unknown").is_none());
    }
}
