use std::path::Path;

use anyhow::{bail, Context};
use serde::Deserialize;

use crate::models::DEFAULT_REQUIRED_PERCENTAGE;

pub const REQUIRED_PERCENTAGE_ENV: &str = "BUNK_REQUIRED_PERCENTAGE";
pub const PLAN_DAYS_ENV: &str = "BUNK_PLAN_DAYS";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Threshold for subjects whose input carries none.
    pub required_percentage: f64,
    /// Calendar days the planner looks ahead by default.
    pub plan_days: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            required_percentage: DEFAULT_REQUIRED_PERCENTAGE,
            plan_days: 7,
        }
    }
}

impl Settings {
    /// Defaults, then the optional TOML file, then environment overrides.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        Self::load_with(path, |key| std::env::var(key).ok())
    }

    fn load_with(
        path: Option<&Path>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> anyhow::Result<Self> {
        let mut settings = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read config {}", path.display()))?;
                Self::from_toml(&text)
                    .with_context(|| format!("failed to parse config {}", path.display()))?
            }
            None => Self::default(),
        };

        settings.apply_overrides(lookup)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_toml(text: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(text)?)
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<()> {
        if let Some(value) = lookup(REQUIRED_PERCENTAGE_ENV) {
            self.required_percentage = value
                .trim()
                .parse()
                .with_context(|| format!("{REQUIRED_PERCENTAGE_ENV} must be a number"))?;
        }
        if let Some(value) = lookup(PLAN_DAYS_ENV) {
            self.plan_days = value
                .trim()
                .parse()
                .with_context(|| format!("{PLAN_DAYS_ENV} must be a whole number"))?;
        }
        Ok(())
    }

    fn validate(&self) -> anyhow::Result<()> {
        if !self.required_percentage.is_finite()
            || !(0.0..=100.0).contains(&self.required_percentage)
        {
            bail!(
                "required_percentage must be within 0..=100, got {}",
                self.required_percentage
            );
        }
        if self.plan_days == 0 {
            bail!("plan_days must be at least 1");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toml_fills_missing_keys_with_defaults() {
        let settings = Settings::from_toml("required_percentage = 80.0\n").unwrap();
        assert_eq!(settings.required_percentage, 80.0);
        assert_eq!(settings.plan_days, 7);
    }

    #[test]
    fn environment_overrides_file() {
        let mut settings = Settings::from_toml("required_percentage = 80.0\nplan_days = 14\n").unwrap();
        settings
            .apply_overrides(|key| match key {
                REQUIRED_PERCENTAGE_ENV => Some("65".to_string()),
                _ => None,
            })
            .unwrap();
        assert_eq!(settings.required_percentage, 65.0);
        assert_eq!(settings.plan_days, 14);
    }

    #[test]
    fn rejects_bad_values() {
        let mut settings = Settings::default();
        assert!(settings
            .apply_overrides(|key| (key == PLAN_DAYS_ENV).then(|| "soon".to_string()))
            .is_err());

        let out_of_range = Settings {
            required_percentage: 120.0,
            ..Settings::default()
        };
        assert!(out_of_range.validate().is_err());

        let no_days = Settings {
            plan_days: 0,
            ..Settings::default()
        };
        assert!(no_days.validate().is_err());
        assert!(Settings::default().validate().is_ok());
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("bunk.toml");
        std::fs::write(&path, "plan_days = 10\n").unwrap();
        let settings = Settings::load_with(Some(&path), |_| None).unwrap();
        assert_eq!(settings.plan_days, 10);
        assert_eq!(settings.required_percentage, DEFAULT_REQUIRED_PERCENTAGE);

        let overridden =
            Settings::load_with(Some(&path), |key| (key == PLAN_DAYS_ENV).then(|| "3".to_string()))
                .unwrap();
        assert_eq!(overridden.plan_days, 3);
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = Settings::load_with(Some(&dir.path().join("absent.toml")), |_| None).unwrap_err();
        assert!(err.to_string().contains("failed to read config"));
    }
}
