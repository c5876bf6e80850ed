use anyhow::{Context, Result};
use std::{fs, path::Path};

use crate::models::{SeedUser, UserRole};

use super::{AppState, NewUser, create_user};

pub const DEFAULT_ADMIN_USERNAME: &str = "admin";
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

/// Populate the accounts collection on first run. Returns how many accounts
/// were inserted (zero when accounts already exist).
pub fn seed_if_empty(state: &AppState, users_file: &Path) -> Result<usize> {
    if !state.users.load_all()?.is_empty() {
        return Ok(0);
    }

    let seeds = load_seed_users(users_file)?;
    let seeds = if seeds.is_empty() {
        vec![default_admin()]
    } else {
        seeds
    };

    for seed in &seeds {
        create_user(
            state,
            NewUser {
                username: seed.username.clone(),
                password: seed.password.clone(),
                role: seed.role,
                name: seed.name.clone(),
                email: seed.email.clone(),
                phone: seed.phone.clone(),
                is_active: true,
            },
        )
        .with_context(|| format!("failed to seed account {}", seed.username))?;
    }
    Ok(seeds.len())
}

fn load_seed_users(path: &Path) -> Result<Vec<SeedUser>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let users = serde_json::from_str::<Vec<SeedUser>>(&contents)
        .with_context(|| format!("{} is not a valid account list", path.display()))?;
    Ok(users)
}

fn default_admin() -> SeedUser {
    SeedUser {
        username: DEFAULT_ADMIN_USERNAME.to_string(),
        password: DEFAULT_ADMIN_PASSWORD.to_string(),
        name: "Administrador".to_string(),
        role: UserRole::Admin,
        email: Some("admin@sismich.com".to_string()),
        phone: None,
    }
}
