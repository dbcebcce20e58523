//! Configuration management
//!
//! Settings live in `settings.json` inside the sovereign directory:
//! ```json
//! {
//!   "export": {
//!     "defaultRegion": "Nairobi",
//!     "defaultLanguage": "en",
//!     "enforceEthicalBoundaries": true,
//!     "governmentExportPermitted": false,
//!     "outputDir": "/path/to/exports",
//!     "qualityWeights": { "coverage": 0.3, "completeness": 0.3, "context": 0.2, "validity": 0.2 }
//!   },
//!   "collector": "basic"
//! }
//! ```
//! Keys the toolkit doesn't manage are preserved by `Config::set`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

/// Raw settings.json structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default)]
    export: ExportSettings,
    #[serde(default)]
    collector: Option<String>,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExportSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    default_region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    default_language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    enforce_ethical_boundaries: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    government_export_permitted: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    output_dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    quality_weights: Option<QualityWeights>,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

/// Which collector implementation backs `collect`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectorMode {
    #[default]
    Basic,
    Comprehensive,
}

impl CollectorMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CollectorMode::Basic => "basic",
            CollectorMode::Comprehensive => "comprehensive",
        }
    }
}

impl FromStr for CollectorMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "basic" => Ok(CollectorMode::Basic),
            "comprehensive" => Ok(CollectorMode::Comprehensive),
            other => bail!("Unknown collector mode: {}", other),
        }
    }
}

/// Weighting of the quality components. Normalized by their sum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityWeights {
    pub coverage: f64,
    pub completeness: f64,
    pub context: f64,
    pub validity: f64,
}

impl Default for QualityWeights {
    fn default() -> Self {
        Self {
            coverage: 0.3,
            completeness: 0.3,
            context: 0.2,
            validity: 0.2,
        }
    }
}

impl QualityWeights {
    /// Every weight must be finite and non-negative, and validity positive
    /// so that a successful export never scores zero.
    pub fn validate(&self) -> Result<()> {
        let weights = [self.coverage, self.completeness, self.context, self.validity];
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            bail!("Quality weights must be finite and non-negative");
        }
        if self.validity <= 0.0 {
            bail!("Quality weight 'validity' must be positive");
        }
        Ok(())
    }

    pub fn total(&self) -> f64 {
        self.coverage + self.completeness + self.context + self.validity
    }
}

/// Sovereign configuration (simplified view of settings)
#[derive(Debug, Clone)]
pub struct Config {
    pub default_region: String,
    pub default_language: String,
    /// Pseudonymize identifiers in sensitive records before export
    pub enforce_ethical_boundaries: bool,
    /// Process-wide permission for government exports
    pub government_export_permitted: bool,
    pub collector: CollectorMode,
    pub output_dir: PathBuf,
    pub quality_weights: QualityWeights,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_region: "Nairobi".to_string(),
            default_language: "en".to_string(),
            enforce_ethical_boundaries: true,
            government_export_permitted: false,
            collector: CollectorMode::Basic,
            output_dir: PathBuf::from("exports"),
            quality_weights: QualityWeights::default(),
        }
    }
}

/// One managed setting, as changed by `sov config set`
#[derive(Debug, Clone, PartialEq)]
pub enum Setting {
    Region(String),
    Language(String),
    EnforceEthics(bool),
    GovernmentPermission(bool),
    Collector(CollectorMode),
    OutputDir(PathBuf),
}

impl Setting {
    /// Parse a CLI key (`region`, `enforce-ethics`, ...) and its value
    pub fn parse(key: &str, value: &str) -> Result<Self> {
        Ok(match key {
            "region" => Setting::Region(value.to_string()),
            "language" => Setting::Language(value.to_string()),
            "enforce-ethics" => Setting::EnforceEthics(parse_flag(value)?),
            "government-permission" => Setting::GovernmentPermission(parse_flag(value)?),
            "collector" => Setting::Collector(value.parse()?),
            "output-dir" => Setting::OutputDir(PathBuf::from(value)),
            other => bail!("Unknown setting '{}'", other),
        })
    }
}

impl Config {
    /// Load config from the sovereign directory
    ///
    /// Environment variables override the settings file:
    /// `SOVEREIGN_DEFAULT_REGION`, `SOVEREIGN_DEFAULT_LANGUAGE`,
    /// `SOVEREIGN_ENFORCE_ETHICS`, `SOVEREIGN_GOVERNMENT_PERMISSION`,
    /// `SOVEREIGN_COLLECTOR`.
    pub fn load(sovereign_dir: &Path) -> Result<Self> {
        Self::load_with_env(sovereign_dir, |key| std::env::var(key).ok())
    }

    /// Load config, resolving overrides through `env` instead of the process environment
    pub fn load_with_env(
        sovereign_dir: &Path,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let raw = read_settings(sovereign_dir)?;
        let defaults = Config::default();
        let env_string = |key: &str| env(key).filter(|v| !v.trim().is_empty());
        let env_flag = |key: &str| env(key).and_then(|v| parse_flag(&v).ok());

        let collector = match env_string("SOVEREIGN_COLLECTOR").or(raw.collector.clone()) {
            Some(mode) => mode.parse()?,
            None => defaults.collector,
        };

        let config = Self {
            default_region: env_string("SOVEREIGN_DEFAULT_REGION")
                .or(raw.export.default_region)
                .unwrap_or(defaults.default_region),
            default_language: env_string("SOVEREIGN_DEFAULT_LANGUAGE")
                .or(raw.export.default_language)
                .unwrap_or(defaults.default_language),
            enforce_ethical_boundaries: env_flag("SOVEREIGN_ENFORCE_ETHICS")
                .or(raw.export.enforce_ethical_boundaries)
                .unwrap_or(defaults.enforce_ethical_boundaries),
            government_export_permitted: env_flag("SOVEREIGN_GOVERNMENT_PERMISSION")
                .or(raw.export.government_export_permitted)
                .unwrap_or(defaults.government_export_permitted),
            collector,
            output_dir: raw
                .export
                .output_dir
                .unwrap_or_else(|| sovereign_dir.join("exports")),
            quality_weights: raw.export.quality_weights.unwrap_or_default(),
        };

        config.validate()?;
        Ok(config)
    }

    /// Write one setting into settings.json
    ///
    /// Only the named key changes. Other values are taken from the file as
    /// it is on disk, so environment overrides are never persisted. Keys the
    /// toolkit doesn't manage are preserved.
    pub fn set(sovereign_dir: &Path, setting: Setting) -> Result<()> {
        let settings_path = sovereign_dir.join("settings.json");
        let mut settings = if settings_path.exists() {
            let content = std::fs::read_to_string(&settings_path)
                .with_context(|| format!("Failed to read settings: {:?}", settings_path))?;
            serde_json::from_str::<SettingsFile>(&content)
                .with_context(|| format!("Refusing to overwrite malformed settings: {:?}", settings_path))?
        } else {
            SettingsFile::default()
        };

        match setting {
            Setting::Region(region) => settings.export.default_region = Some(region),
            Setting::Language(language) => settings.export.default_language = Some(language),
            Setting::EnforceEthics(on) => settings.export.enforce_ethical_boundaries = Some(on),
            Setting::GovernmentPermission(on) => {
                settings.export.government_export_permitted = Some(on)
            }
            Setting::Collector(mode) => settings.collector = Some(mode.as_str().to_string()),
            Setting::OutputDir(dir) => settings.export.output_dir = Some(dir),
        }

        let content = serde_json::to_string_pretty(&settings)?;
        std::fs::write(&settings_path, content)
            .with_context(|| format!("Failed to write settings: {:?}", settings_path))?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.quality_weights
            .validate()
            .context("Invalid quality weights in settings")
    }
}

/// Read settings.json, falling back to defaults when missing or malformed
fn read_settings(sovereign_dir: &Path) -> Result<SettingsFile> {
    let settings_path = sovereign_dir.join("settings.json");
    if !settings_path.exists() {
        return Ok(SettingsFile::default());
    }
    let content = std::fs::read_to_string(&settings_path)
        .with_context(|| format!("Failed to read settings: {:?}", settings_path))?;
    Ok(serde_json::from_str(&content).unwrap_or_default())
}

fn parse_flag(value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => bail!("Expected true or false, got '{}'", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_when_missing() {
        let dir = tempdir().unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert!(config.enforce_ethical_boundaries);
        assert!(!config.government_export_permitted);
        assert_eq!(config.output_dir, dir.path().join("exports"));
        assert_eq!(config.quality_weights, QualityWeights::default());
    }

    #[test]
    fn test_reads_settings_file() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join("settings.json"),
            r#"{"export": {"defaultRegion": "Mombasa", "defaultLanguage": "sw"}, "collector": "comprehensive"}"#,
        )
        .unwrap();

        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.default_region, "Mombasa");
        assert_eq!(config.default_language, "sw");
        assert_eq!(config.collector, CollectorMode::Comprehensive);
    }

    #[test]
    fn test_malformed_settings_fall_back_to_defaults() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("settings.json"), "{ not json").unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.default_region, "Nairobi");
    }

    fn env_of(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_set_preserves_unmanaged_keys() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join("settings.json"),
            r#"{"theme": "dark", "export": {"defaultRegion": "Kisumu", "customKey": 7}}"#,
        )
        .unwrap();

        Config::set(dir.path(), Setting::Language("sw".to_string())).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(dir.path().join("settings.json")).unwrap())
                .unwrap();
        assert_eq!(raw["theme"], "dark");
        assert_eq!(raw["export"]["customKey"], 7);
        assert_eq!(raw["export"]["defaultRegion"], "Kisumu");
        assert_eq!(raw["export"]["defaultLanguage"], "sw");
        assert!(raw["export"].get("governmentExportPermitted").is_none());
    }

    #[test]
    fn test_env_overrides_settings_file() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join("settings.json"),
            r#"{"export": {"defaultRegion": "Mombasa", "enforceEthicalBoundaries": true}, "collector": "basic"}"#,
        )
        .unwrap();

        let env = env_of(&[
            ("SOVEREIGN_DEFAULT_REGION", "Eldoret"),
            ("SOVEREIGN_DEFAULT_LANGUAGE", "sw"),
            ("SOVEREIGN_ENFORCE_ETHICS", "0"),
            ("SOVEREIGN_GOVERNMENT_PERMISSION", "yes"),
            ("SOVEREIGN_COLLECTOR", "comprehensive"),
        ]);
        let config = Config::load_with_env(dir.path(), env).unwrap();
        assert_eq!(config.default_region, "Eldoret");
        assert_eq!(config.default_language, "sw");
        assert!(!config.enforce_ethical_boundaries);
        assert!(config.government_export_permitted);
        assert_eq!(config.collector, CollectorMode::Comprehensive);
    }

    #[test]
    fn test_blank_or_unparseable_env_values_are_ignored() {
        let dir = tempdir().unwrap();
        let env = env_of(&[
            ("SOVEREIGN_DEFAULT_REGION", "  "),
            ("SOVEREIGN_GOVERNMENT_PERMISSION", "maybe"),
        ]);
        let config = Config::load_with_env(dir.path(), env).unwrap();
        assert_eq!(config.default_region, "Nairobi");
        assert!(!config.government_export_permitted);
    }

    #[test]
    fn test_env_overrides_are_not_persisted_by_set() {
        let dir = tempdir().unwrap();
        let env = env_of(&[
            ("SOVEREIGN_GOVERNMENT_PERMISSION", "1"),
            ("SOVEREIGN_ENFORCE_ETHICS", "0"),
        ]);
        let overridden = Config::load_with_env(dir.path(), env).unwrap();
        assert!(overridden.government_export_permitted);

        Config::set(dir.path(), Setting::Region("Kisumu".to_string())).unwrap();

        let reloaded = Config::load_with_env(dir.path(), |_| None).unwrap();
        assert_eq!(reloaded.default_region, "Kisumu");
        assert!(!reloaded.government_export_permitted);
        assert!(reloaded.enforce_ethical_boundaries);
    }

    #[test]
    fn test_set_refuses_malformed_settings() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("settings.json"), "{ not json").unwrap();
        assert!(Config::set(dir.path(), Setting::Region("Kisumu".to_string())).is_err());
        assert_eq!(
            std::fs::read_to_string(dir.path().join("settings.json")).unwrap(),
            "{ not json"
        );
    }

    #[test]
    fn test_setting_parse() {
        assert_eq!(
            Setting::parse("government-permission", "on").unwrap(),
            Setting::GovernmentPermission(true)
        );
        assert_eq!(
            Setting::parse("collector", "Comprehensive").unwrap(),
            Setting::Collector(CollectorMode::Comprehensive)
        );
        assert!(Setting::parse("theme", "dark").is_err());
        assert!(Setting::parse("enforce-ethics", "sometimes").is_err());
    }

    #[test]
    fn test_rejects_zero_validity_weight() {
        let weights = QualityWeights {
            validity: 0.0,
            ..QualityWeights::default()
        };
        assert!(weights.validate().is_err());

        let negative = QualityWeights {
            coverage: -1.0,
            ..QualityWeights::default()
        };
        assert!(negative.validate().is_err());
    }
}
