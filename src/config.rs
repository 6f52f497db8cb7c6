//! Configuration: environment helpers, injected secrets and the forecast profile table.
//!
//! Resolution order (highest priority first):
//! 1. Environment variables (`LABORCAST_*`)
//! 2. TOML file (explicit path, `LABORCAST_CONFIG`, or `laborcast.toml` in the cwd)
//! 3. Compiled defaults (`broad` and `narrow` profiles, default series table)

use crate::models::{
    AdjustmentRule, ClampBand, Direction, Normalizer, SeriesSpec, Source, Unit,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = "laborcast.toml";
pub const DEFAULT_PROFILE: &str = "broad";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid TOML in {path}: {message}")]
    Parse { path: String, message: String },
    #[error("rule '{rule}': {message}")]
    InvalidRule { rule: String, message: String },
    #[error("profile '{profile}': {message}")]
    InvalidProfile { profile: String, message: String },
    #[error("unknown profile '{0}'")]
    UnknownProfile(String),
    #[error("invalid series entry: {0}")]
    InvalidSeries(String),
    #[error("invalid value for {key}: {value}")]
    InvalidEnv { key: String, value: String },
}

/// Get the current environment (production/sandbox)
pub fn get_environment() -> String {
    env::var("APP_ENV")
        .or_else(|_| env::var("ENVIRONMENT"))
        .unwrap_or_else(|_| "sandbox".to_string())
        .to_lowercase()
}

/// API keys injected at process start. Never compiled into source.
#[derive(Clone, Default)]
pub struct ApiKeys {
    pub bls: Option<String>,
    pub fred: Option<String>,
    pub bea: Option<String>,
}

impl ApiKeys {
    pub fn from_env() -> Self {
        Self {
            bls: non_empty_var("BLS_API_KEY"),
            fred: non_empty_var("FRED_API_KEY"),
            bea: non_empty_var("BEA_API_KEY"),
        }
    }
}

impl fmt::Debug for ApiKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mask = |key: &Option<String>| if key.is_some() { "<set>" } else { "<unset>" };
        f.debug_struct("ApiKeys")
            .field("bls", &mask(&self.bls))
            .field("fred", &mask(&self.fred))
            .field("bea", &mask(&self.bea))
            .finish()
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Fixed bonus granted when every required indicator is live.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceBonus {
    pub name: String,
    pub points: f64,
    #[serde(default)]
    pub requires: Vec<String>,
}

impl ConfidenceBonus {
    pub fn new(name: &str, points: f64, requires: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            points,
            requires: requires.iter().map(|r| r.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceSettings {
    pub base: f64,
    pub cap: f64,
    pub freshness_weight: f64,
    pub availability_weight: f64,
    /// Live readings older than this score as stale.
    pub max_age_days: i64,
    /// Per-indicator staleness windows for series on a slower release calendar.
    #[serde(default)]
    pub max_age_overrides: BTreeMap<String, i64>,
    #[serde(default)]
    pub bonuses: Vec<ConfidenceBonus>,
}

impl ConfidenceSettings {
    pub fn max_age_for(&self, indicator: &str) -> i64 {
        self.max_age_overrides
            .get(indicator)
            .copied()
            .unwrap_or(self.max_age_days)
    }
}

/// Quarterly GDP is stamped at quarter start and stays the newest release for
/// about seven months.
const GDP_MAX_AGE_DAYS: i64 = 220;

fn default_max_age_overrides() -> BTreeMap<String, i64> {
    BTreeMap::from([("gdp_growth".to_string(), GDP_MAX_AGE_DAYS)])
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseRateSpec {
    pub indicator: String,
    pub fallback: f64,
}

/// One named forecast variant: clamp band, confidence constants and rule table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastProfile {
    pub name: String,
    pub clamp: ClampBand,
    pub base_rate: BaseRateSpec,
    #[serde(default = "default_stable_band")]
    pub stable_band: f64,
    pub confidence: ConfidenceSettings,
    pub rules: Vec<AdjustmentRule>,
}

fn default_stable_band() -> f64 {
    0.05
}

impl ForecastProfile {
    /// Wide band `[2, 15]`, base confidence 70, cap 95.
    pub fn broad() -> Self {
        Self {
            name: "broad".to_string(),
            clamp: ClampBand::new(2.0, 15.0),
            base_rate: default_base_rate(),
            stable_band: default_stable_band(),
            confidence: ConfidenceSettings {
                base: 70.0,
                cap: 95.0,
                freshness_weight: 0.10,
                availability_weight: 0.15,
                max_age_days: 120,
                max_age_overrides: default_max_age_overrides(),
                bonuses: vec![
                    ConfidenceBonus::new(
                        "claims_stability",
                        5.0,
                        &["initial_claims", "continuing_claims"],
                    ),
                    ConfidenceBonus::new("trade_volume", 5.0, &["trade_sentiment"]),
                ],
            },
            rules: default_rules(),
        }
    }

    /// Narrow band `[3, 8]`, base confidence 85, cap 98.
    pub fn narrow() -> Self {
        Self {
            name: "narrow".to_string(),
            clamp: ClampBand::new(3.0, 8.0),
            base_rate: default_base_rate(),
            stable_band: default_stable_band(),
            confidence: ConfidenceSettings {
                base: 85.0,
                cap: 98.0,
                freshness_weight: 0.05,
                availability_weight: 0.08,
                max_age_days: 120,
                max_age_overrides: default_max_age_overrides(),
                bonuses: vec![
                    ConfidenceBonus::new(
                        "claims_stability",
                        3.0,
                        &["initial_claims", "continuing_claims"],
                    ),
                    ConfidenceBonus::new("trade_volume", 2.0, &["trade_sentiment"]),
                ],
            },
            rules: default_rules(),
        }
    }

    pub fn rule(&self, name: &str) -> Option<&AdjustmentRule> {
        self.rules.iter().find(|r| r.indicator_name == name)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidProfile {
            profile: self.name.clone(),
            message,
        };

        if self.name.trim().is_empty() {
            return Err(invalid("name must not be empty".to_string()));
        }
        if !self.clamp.min.is_finite() || !self.clamp.max.is_finite() {
            return Err(invalid("clamp bounds must be finite".to_string()));
        }
        if self.clamp.min >= self.clamp.max {
            return Err(invalid(format!(
                "clamp min {} must be below max {}",
                self.clamp.min, self.clamp.max
            )));
        }
        if !self.base_rate.fallback.is_finite() {
            return Err(invalid("base rate fallback must be finite".to_string()));
        }
        if !self.stable_band.is_finite() || self.stable_band < 0.0 {
            return Err(invalid("stable_band must be a non-negative number".to_string()));
        }

        let c = &self.confidence;
        if !(0.0..=100.0).contains(&c.base) || !(0.0..=100.0).contains(&c.cap) {
            return Err(invalid("confidence base and cap must lie in [0, 100]".to_string()));
        }
        if c.base > c.cap {
            return Err(invalid(format!(
                "confidence base {} exceeds cap {}",
                c.base, c.cap
            )));
        }
        for (label, weight) in [
            ("freshness_weight", c.freshness_weight),
            ("availability_weight", c.availability_weight),
        ] {
            if !weight.is_finite() || weight < 0.0 {
                return Err(invalid(format!("{} must be a non-negative number", label)));
            }
        }
        if c.max_age_days < 0 || c.max_age_overrides.values().any(|days| *days < 0) {
            return Err(invalid("max_age_days must not be negative".to_string()));
        }
        for bonus in &c.bonuses {
            if !(0.0..=100.0).contains(&bonus.points) {
                return Err(invalid(format!(
                    "bonus '{}' must award between 0 and 100 points",
                    bonus.name
                )));
            }
        }

        let mut seen = HashSet::new();
        for rule in &self.rules {
            validate_rule(rule)?;
            if !seen.insert(rule.indicator_name.as_str()) {
                return Err(ConfigError::InvalidRule {
                    rule: rule.indicator_name.clone(),
                    message: "duplicate rule name".to_string(),
                });
            }
            if rule.indicator_name == self.base_rate.indicator {
                return Err(ConfigError::InvalidRule {
                    rule: rule.indicator_name.clone(),
                    message: "the base rate indicator cannot also be an adjustment".to_string(),
                });
            }
        }
        Ok(())
    }
}

fn validate_rule(rule: &AdjustmentRule) -> Result<(), ConfigError> {
    let invalid = |message: &str| ConfigError::InvalidRule {
        rule: rule.indicator_name.clone(),
        message: message.to_string(),
    };

    if rule.indicator_name.trim().is_empty() {
        return Err(invalid("indicator name must not be empty"));
    }
    for value in [rule.baseline, rule.scale, rule.weight, rule.fallback] {
        if !value.is_finite() {
            return Err(invalid("baseline, scale, weight and fallback must be finite"));
        }
    }
    match rule.normalizer {
        Normalizer::Absolute => {}
        Normalizer::Relative => {
            if rule.baseline == 0.0 {
                return Err(invalid("relative normalizer requires a non-zero baseline"));
            }
        }
        Normalizer::DivideByConstant { k } => {
            if !k.is_finite() || k == 0.0 {
                return Err(invalid("divide_by_constant requires a finite, non-zero k"));
            }
        }
    }
    Ok(())
}

fn default_base_rate() -> BaseRateSpec {
    BaseRateSpec {
        indicator: "unemployment_rate".to_string(),
        fallback: 4.3,
    }
}

/// Rule table shared by the built-in profiles.
pub fn default_rules() -> Vec<AdjustmentRule> {
    vec![
        AdjustmentRule::new(
            "initial_claims",
            225_000.0,
            0.3,
            Direction::Raises,
            1.0,
            Normalizer::Relative,
            230_000.0,
        ),
        AdjustmentRule::new(
            "continuing_claims",
            1_800_000.0,
            0.2,
            Direction::Raises,
            0.5,
            Normalizer::Relative,
            1_850_000.0,
        ),
        // thousands of jobs added month over month
        AdjustmentRule::new(
            "payroll_change",
            150.0,
            1.0,
            Direction::Lowers,
            1.0,
            Normalizer::DivideByConstant { k: 1_000.0 },
            150.0,
        ),
        AdjustmentRule::new(
            "job_openings",
            8_000.0,
            0.25,
            Direction::Lowers,
            1.0,
            Normalizer::Relative,
            7_700.0,
        ),
        AdjustmentRule::new(
            "consumer_sentiment",
            70.0,
            0.01,
            Direction::Lowers,
            1.0,
            Normalizer::Absolute,
            68.0,
        ),
        AdjustmentRule::new(
            "gdp_growth",
            2.0,
            0.1,
            Direction::Lowers,
            1.0,
            Normalizer::Absolute,
            2.0,
        ),
        // volume-weighted sentiment in [-1, 1]
        AdjustmentRule::new(
            "trade_sentiment",
            0.0,
            0.2,
            Direction::Lowers,
            0.01,
            Normalizer::Absolute,
            0.0,
        ),
    ]
}

pub fn default_series() -> Vec<SeriesSpec> {
    vec![
        SeriesSpec::new("unemployment_rate", Source::Bls, "LNS14000000", Unit::Percent),
        SeriesSpec::new("initial_claims", Source::Fred, "ICSA", Unit::Count),
        SeriesSpec::new("continuing_claims", Source::Fred, "CCSA", Unit::Count),
        SeriesSpec::new("payroll_change", Source::Fred, "PAYEMS", Unit::Count)
            .with_transform("chg"),
        SeriesSpec::new("job_openings", Source::Fred, "JTSJOL", Unit::Count),
        SeriesSpec::new("consumer_sentiment", Source::Fred, "UMCSENT", Unit::Index),
        SeriesSpec::new("gdp_growth", Source::Bea, "T10101:1", Unit::Percent),
        SeriesSpec::new("trade_sentiment", Source::Trade, "*", Unit::Index),
    ]
}

/// Where and how the source adapters reach their upstreams.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSettings {
    pub bls_base_url: String,
    pub fred_base_url: String,
    pub bea_base_url: String,
    pub trade_csv: Option<PathBuf>,
    pub timeout_secs: u64,
    pub max_retries: usize,
    /// How many calendar years of history to request.
    pub lookback_years: i32,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            bls_base_url: "https://api.bls.gov".to_string(),
            fred_base_url: "https://api.stlouisfed.org".to_string(),
            bea_base_url: "https://apps.bea.gov".to_string(),
            trade_csv: None,
            timeout_secs: 30,
            max_retries: 2,
            lookback_years: 2,
        }
    }
}

/// Full configuration for a forecast deployment.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastConfig {
    pub active_profile: String,
    pub profiles: Vec<ForecastProfile>,
    pub series: Vec<SeriesSpec>,
    pub sources: SourceSettings,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            active_profile: DEFAULT_PROFILE.to_string(),
            profiles: vec![ForecastProfile::broad(), ForecastProfile::narrow()],
            series: default_series(),
            sources: SourceSettings::default(),
        }
    }
}

/// Shape of the optional TOML file. Every section is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    active_profile: Option<String>,
    profiles: Vec<ForecastProfile>,
    series: Vec<SeriesSpec>,
    sources: Option<SourceSettings>,
}

impl ForecastConfig {
    /// Load configuration with layered resolution and validate it.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        let file_path = path
            .map(Path::to_path_buf)
            .or_else(|| non_empty_var("LABORCAST_CONFIG").map(PathBuf::from))
            .or_else(|| {
                let candidate = PathBuf::from(DEFAULT_CONFIG_FILE);
                candidate.exists().then_some(candidate)
            });

        if let Some(file_path) = file_path {
            config.merge_toml_file(&file_path)?;
        }

        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML document on top of the compiled defaults.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.merge_toml(contents, "<inline>")?;
        config.validate()?;
        Ok(config)
    }

    fn merge_toml_file(&mut self, path: &Path) -> Result<(), ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        self.merge_toml(&contents, &path.display().to_string())
    }

    fn merge_toml(&mut self, contents: &str, origin: &str) -> Result<(), ConfigError> {
        let file: ConfigFile = toml::from_str(contents).map_err(|e| ConfigError::Parse {
            path: origin.to_string(),
            message: e.to_string(),
        })?;

        if let Some(active) = file.active_profile {
            self.active_profile = active;
        }
        // Profiles with a built-in name replace it, others are appended.
        for profile in file.profiles {
            match self.profiles.iter_mut().find(|p| p.name == profile.name) {
                Some(existing) => *existing = profile,
                None => self.profiles.push(profile),
            }
        }
        if !file.series.is_empty() {
            self.series = file.series;
        }
        if let Some(sources) = file.sources {
            self.sources = sources;
        }
        Ok(())
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(profile) = non_empty_var("LABORCAST_PROFILE") {
            self.active_profile = profile;
        }
        if let Some(csv) = non_empty_var("LABORCAST_TRADE_CSV") {
            self.sources.trade_csv = Some(PathBuf::from(csv));
        }
        if let Some(raw) = non_empty_var("LABORCAST_HTTP_TIMEOUT_SECS") {
            self.sources.timeout_secs = raw.parse().map_err(|_| ConfigError::InvalidEnv {
                key: "LABORCAST_HTTP_TIMEOUT_SECS".to_string(),
                value: raw.clone(),
            })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut names = HashSet::new();
        for profile in &self.profiles {
            profile.validate()?;
            if !names.insert(profile.name.as_str()) {
                return Err(ConfigError::InvalidProfile {
                    profile: profile.name.clone(),
                    message: "duplicate profile name".to_string(),
                });
            }
        }
        if !names.contains(self.active_profile.as_str()) {
            return Err(ConfigError::UnknownProfile(self.active_profile.clone()));
        }
        for series in &self.series {
            if series.indicator.trim().is_empty() || series.series_id.trim().is_empty() {
                return Err(ConfigError::InvalidSeries(format!(
                    "indicator '{}' has an empty name or series id",
                    series.indicator
                )));
            }
        }
        Ok(())
    }

    pub fn profile(&self, name: &str) -> Option<&ForecastProfile> {
        self.profiles.iter().find(|p| p.name == name)
    }

    pub fn active(&self) -> Result<&ForecastProfile, ConfigError> {
        self.profile(&self.active_profile)
            .ok_or_else(|| ConfigError::UnknownProfile(self.active_profile.clone()))
    }
}
