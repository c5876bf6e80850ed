// config.rs
// Runtime configuration read from the environment (after dotenvy has run).

use anyhow::{Context, Result};
use std::{env, path::PathBuf};

use crate::state::FinanceRules;

pub const DEFAULT_DATA_DIR: &str = "./data/store";
pub const DEFAULT_USERS_FILE: &str = "./data/users.json";

#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub users_file: PathBuf,
    pub finance: FinanceRules,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let data_dir =
            env::var("SISMICH_DATA_DIR").unwrap_or_else(|_| DEFAULT_DATA_DIR.to_string());
        let users_file = env::var("USERS_FILE").unwrap_or_else(|_| DEFAULT_USERS_FILE.to_string());

        let defaults = FinanceRules::default();
        let finance = FinanceRules {
            materials_ratio: env_f64("SISMICH_MATERIALS_RATIO", defaults.materials_ratio)?,
            critical_deviation: env_f64("SISMICH_CRITICAL_DEVIATION", defaults.critical_deviation)?,
            warning_deviation: env_f64("SISMICH_WARNING_DEVIATION", defaults.warning_deviation)?,
            progress_gap: env_f64("SISMICH_PROGRESS_GAP", defaults.progress_gap)?,
            severe_progress_gap: env_f64(
                "SISMICH_SEVERE_PROGRESS_GAP",
                defaults.severe_progress_gap,
            )?,
            completed_min_financial: env_f64(
                "SISMICH_COMPLETED_MIN_FINANCIAL",
                defaults.completed_min_financial,
            )?,
        };

        Ok(Config {
            data_dir: PathBuf::from(data_dir),
            users_file: PathBuf::from(users_file),
            finance,
        })
    }
}

fn env_f64(key: &str, default: f64) -> Result<f64> {
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => {
            let value = raw
                .trim()
                .parse::<f64>()
                .with_context(|| format!("{key} must be a number, got {raw:?}"))?;
            anyhow::ensure!(value.is_finite() && value >= 0.0, "{key} must be a non-negative number");
            Ok(value)
        }
        _ => Ok(default),
    }
}
