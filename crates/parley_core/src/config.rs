use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::context::ContextRetention;
use crate::error::SimulationError;
use crate::interest::{InterestThresholds, KeywordWeights};
use crate::response::ResponseThresholds;

// ============================================================================
// Top-level config
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ParleyConfig {
    pub simulation: SimulationConfig,
    pub scoring: ScoringConfig,
    pub llm: LlmConfig,
    pub retry: RetryConfig,
    pub bank: BankConfig,
}

impl ParleyConfig {
    /// Load config from a TOML file, falling back to defaults for missing fields.
    /// After loading, env var overrides are applied.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;
        let mut config: ParleyConfig =
            toml::from_str(&content).with_context(|| "Failed to parse TOML config")?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Try to load from path; if file doesn't exist, return defaults with env overrides.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::info!("Config file not found or invalid ({}), using defaults", e);
                let mut cfg = Self::default();
                cfg.apply_env_overrides();
                cfg
            }
        }
    }

    /// Apply environment variable overrides on top of file-based config.
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("LLM_PROVIDER") {
            self.llm.provider = v;
        }
        if let Ok(v) = std::env::var("LLM_MODEL") {
            self.llm.model = v;
        }
        if let Ok(v) = std::env::var("LLM_BASE_URL") {
            self.llm.base_url = Some(v);
        }
        if let Ok(v) = std::env::var("LLM_MAX_TOKENS") {
            if let Ok(n) = v.parse() {
                self.llm.max_tokens = n;
            }
        }
        if let Ok(v) = std::env::var("LLM_TEMPERATURE") {
            if let Ok(n) = v.parse() {
                self.llm.temperature = n;
            }
        }
        if let Ok(v) = std::env::var("PARLEY_NUM_VISITS") {
            if let Ok(n) = v.parse() {
                self.simulation.num_visits = n;
            }
        }
        if let Ok(v) = std::env::var("PARLEY_TURNS_PER_VISIT") {
            if let Ok(n) = v.parse() {
                self.simulation.num_turns_per_visit = n;
            }
        }
    }

    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> std::result::Result<(), SimulationError> {
        let sim = &self.simulation;
        if sim.num_visits == 0 {
            return Err(SimulationError::Configuration(
                "simulation.num_visits must be at least 1".into(),
            ));
        }
        if sim.num_turns_per_visit == 0 {
            return Err(SimulationError::Configuration(
                "simulation.num_turns_per_visit must be at least 1".into(),
            ));
        }
        if !(0.0..=1.0).contains(&sim.min_success_score) {
            return Err(SimulationError::Configuration(format!(
                "simulation.min_success_score must be within [0, 1], got {}",
                sim.min_success_score
            )));
        }
        for (section, map) in [
            ("interest_thresholds", &self.scoring.interest_thresholds),
            ("response_thresholds", &self.scoring.response_thresholds),
        ] {
            for (key, value) in map {
                if key != "no_response_probability" && !(0.0..=100.0).contains(value) {
                    return Err(SimulationError::Configuration(format!(
                        "scoring.{}.{} must be within [0, 100], got {}",
                        section, key, value
                    )));
                }
            }
        }
        if self.retry.max_attempts == 0 {
            return Err(SimulationError::Configuration(
                "retry.max_attempts must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Sub-configs
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub num_personas: usize,
    pub num_visits: u32,
    pub num_turns_per_visit: u32,
    pub visit_interval_days: u32,
    /// Score on the 0–1 scale at which an organization counts as receptive.
    pub min_success_score: f64,
    pub memory_retention_visits: u32,
    pub context_max_entries: usize,
    pub max_assigned_per_seller: usize,
    /// Ask the collaborator for interest scores, keeping the keyword model as fallback.
    pub llm_interest_scoring: bool,
    /// Characters kept per message when summarizing a visit for the next one.
    pub carry_over_chars: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            num_personas: 3,
            num_visits: 3,
            num_turns_per_visit: 8,
            visit_interval_days: 30,
            min_success_score: 0.7,
            memory_retention_visits: 3,
            context_max_entries: 20,
            max_assigned_per_seller: 2,
            llm_interest_scoring: false,
            carry_over_chars: 200,
        }
    }
}

impl SimulationConfig {
    pub fn retention(&self) -> ContextRetention {
        ContextRetention {
            max_entries: self.context_max_entries,
            retention_visits: self.memory_retention_visits,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub interest_thresholds: BTreeMap<String, f64>,
    pub response_thresholds: BTreeMap<String, f64>,
    pub keyword_weights: BTreeMap<String, f64>,
    pub positive_keywords: Vec<String>,
    pub negative_keywords: Vec<String>,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            interest_thresholds: BTreeMap::new(),
            response_thresholds: BTreeMap::new(),
            keyword_weights: BTreeMap::new(),
            positive_keywords: default_positive_keywords(),
            negative_keywords: default_negative_keywords(),
        }
    }
}

impl ScoringConfig {
    pub fn interest_thresholds(&self) -> InterestThresholds {
        InterestThresholds::with_overrides(&self.interest_thresholds)
    }

    pub fn response_thresholds(&self) -> ResponseThresholds {
        ResponseThresholds::with_overrides(&self.response_thresholds)
    }

    pub fn keyword_weights(&self) -> KeywordWeights {
        KeywordWeights::with_overrides(&self.keyword_weights)
    }
}

fn default_positive_keywords() -> Vec<String> {
    [
        "ご検討",
        "興味",
        "詳細",
        "ご提案",
        "承知",
        "ありがとう",
        "期待",
        "前向き",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_negative_keywords() -> Vec<String> {
    [
        "結構です",
        "見送り",
        "他社",
        "予算",
        "時期",
        "難しい",
        "検討中",
        "保留",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// `"openai"` or `"mock"`.
    pub provider: String,
    pub model: String,
    pub base_url: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "gpt-4.1-mini".to_string(),
            base_url: None,
            max_tokens: 3000,
            temperature: 0.7,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    /// Sampling temperature is multiplied by this factor on every retry.
    pub temperature_decay: f32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub backoff_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            temperature_decay: 0.7,
            initial_delay_ms: 500,
            max_delay_ms: 8_000,
            backoff_factor: 2.0,
        }
    }
}

/// The seller's institution, quoted in prompts and fallback messages.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BankConfig {
    pub name: String,
    pub branch: String,
    pub location: String,
    pub services: Vec<String>,
}

impl Default for BankConfig {
    fn default() -> Self {
        Self {
            name: "りそな銀行".to_string(),
            branch: "本店営業部".to_string(),
            location: "東京都千代田区".to_string(),
            services: vec![
                "法人向け融資".to_string(),
                "資産運用".to_string(),
                "預金".to_string(),
                "法人保険".to_string(),
            ],
        }
    }
}

impl BankConfig {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.name, self.branch)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = ParleyConfig::default();
        assert_eq!(cfg.llm.provider, "openai");
        assert_eq!(cfg.llm.max_tokens, 3000);
        assert_eq!(cfg.simulation.num_visits, 3);
        assert_eq!(cfg.simulation.num_turns_per_visit, 8);
        assert_eq!(cfg.scoring.positive_keywords.len(), 8);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_parse_minimal_toml() {
        let toml_str = r#"
[llm]
provider = "mock"
model = "test-model"
"#;
        let cfg: ParleyConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.llm.provider, "mock");
        assert_eq!(cfg.llm.model, "test-model");
        // Defaults for unspecified fields
        assert_eq!(cfg.llm.max_tokens, 3000);
        assert_eq!(cfg.simulation.visit_interval_days, 30);
        assert_eq!(cfg.bank.name, "りそな銀行");
    }

    #[test]
    fn test_parse_full_toml() {
        let toml_str = r#"
[simulation]
num_personas = 2
num_visits = 5
num_turns_per_visit = 4
visit_interval_days = 14
min_success_score = 0.6
memory_retention_visits = 2
context_max_entries = 10
max_assigned_per_seller = 1

[scoring]
interest_thresholds = { very_high = 85.0 }
response_thresholds = { acceptance = 90.0, no_response_probability = 0.5 }
keyword_weights = { positive = 4.0 }
positive_keywords = ["前向き"]

[llm]
provider = "openai"
model = "gpt-4o"
base_url = "http://localhost:8080/v1"
max_tokens = 1024
temperature = 0.3

[retry]
max_attempts = 5
temperature_decay = 0.5

[bank]
name = "みらい銀行"
branch = "新宿支店"
"#;
        let cfg: ParleyConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.simulation.num_visits, 5);
        assert_eq!(cfg.simulation.retention().max_entries, 10);
        assert_eq!(cfg.scoring.interest_thresholds().very_high, 85.0);
        assert_eq!(cfg.scoring.interest_thresholds().high, 60.0);
        assert_eq!(cfg.scoring.response_thresholds().acceptance, 90.0);
        assert_eq!(cfg.scoring.response_thresholds().no_response_probability, 0.5);
        assert_eq!(cfg.scoring.keyword_weights().positive, 4.0);
        assert_eq!(cfg.scoring.positive_keywords, vec!["前向き".to_string()]);
        assert_eq!(cfg.scoring.negative_keywords.len(), 8);
        assert_eq!(cfg.llm.base_url.as_deref(), Some("http://localhost:8080/v1"));
        assert_eq!(cfg.retry.max_attempts, 5);
        assert_eq!(cfg.retry.initial_delay_ms, 500);
        assert_eq!(cfg.bank.display_name(), "みらい銀行 新宿支店");
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_visits() {
        let mut cfg = ParleyConfig::default();
        cfg.simulation.num_visits = 0;
        assert!(matches!(
            cfg.validate(),
            Err(SimulationError::Configuration(_))
        ));
    }

    #[test]
    fn test_validate_rejects_out_of_range_threshold() {
        let mut cfg = ParleyConfig::default();
        cfg.scoring
            .interest_thresholds
            .insert("high".to_string(), 140.0);
        assert!(cfg.validate().is_err());

        let mut cfg = ParleyConfig::default();
        cfg.simulation.min_success_score = 1.5;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let cfg = ParleyConfig::load_or_default("/nonexistent/parley.toml");
        assert!(cfg.simulation.num_visits >= 1 || std::env::var("PARLEY_NUM_VISITS").is_ok());
    }
}
