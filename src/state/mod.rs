// state module: AppState, initialization, and re-exports of submodules.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::config::Config;
use crate::models::{Document, Payroll, Project, Session, User};
use crate::store::{Collection, FileStore, MemoryStore, Slot, SlotStore};

mod seed;
mod users;
mod projects;
mod payrolls;
mod documents;
mod finance;

pub use users::*;
pub use projects::*;
pub use payrolls::*;
pub use documents::*;
pub use finance::*;
pub use seed::{DEFAULT_ADMIN_PASSWORD, DEFAULT_ADMIN_USERNAME, seed_if_empty};

pub const SESSION_TTL_SECONDS: i64 = 60 * 60 * 24; // 1 day

pub const USERS_SLOT: &str = "sismich_users";
pub const PROJECTS_SLOT: &str = "sismich_obras";
pub const PAYROLLS_SLOT: &str = "sismich_nominas";
pub const DOCUMENTS_SLOT: &str = "sismich_documentos";
pub const SESSION_SLOT: &str = "sismich_auth";

/// Repository object owning every collection. Built once and passed by
/// reference; clones share the same backend.
#[derive(Clone)]
pub struct AppState {
    pub users: Collection<User>,
    pub projects: Collection<Project>,
    pub payrolls: Collection<Payroll>,
    pub documents: Collection<Document>,
    pub session: Slot<Session>,
}

impl AppState {
    pub fn with_store(backend: Arc<dyn SlotStore>) -> Self {
        AppState {
            users: Collection::new(Arc::clone(&backend), USERS_SLOT),
            projects: Collection::new(Arc::clone(&backend), PROJECTS_SLOT),
            payrolls: Collection::new(Arc::clone(&backend), PAYROLLS_SLOT),
            documents: Collection::new(Arc::clone(&backend), DOCUMENTS_SLOT),
            session: Slot::new(backend, SESSION_SLOT),
        }
    }

    pub fn in_memory() -> Self {
        Self::with_store(Arc::new(MemoryStore::new()))
    }
}

pub fn init_state(config: &Config) -> Result<AppState> {
    let store = FileStore::open(&config.data_dir)
        .with_context(|| format!("failed to open data dir {}", config.data_dir.display()))?;
    let state = AppState::with_store(Arc::new(store));

    // Only seed when there are no accounts at all.
    let seeded = seed_if_empty(&state, &config.users_file)?;
    if seeded > 0 {
        info!(count = seeded, "seeded default accounts");
    }

    Ok(state)
}

pub(crate) fn new_id() -> String {
    Uuid::new_v4().to_string()
}

pub(crate) fn now() -> DateTime<Utc> {
    Utc::now()
}
