#![allow(dead_code)]

use std::{path::PathBuf, sync::Arc};

use chrono::NaiveDate;
use tempfile::TempDir;

use sismich::config::Config;
use sismich::models::{DaysWorked, FundingSource, Project, ProjectScope, User, UserRole};
use sismich::state::{
    AppState, EmployeeInput, FinanceRules, NewProject, NewUser, create_project, create_user,
    init_state,
};
use sismich::store::FileStore;

/// AppState over a private temp directory; dropped with the context.
pub struct TestContext {
    pub state: AppState,
    pub dir: TempDir,
}

impl TestContext {
    pub fn data_dir(&self) -> PathBuf {
        self.dir.path().join("store")
    }

    /// A second AppState over the same directory, as another process would see it.
    pub fn reopen(&self) -> AppState {
        let store = FileStore::open(self.data_dir()).expect("reopen store");
        AppState::with_store(Arc::new(store))
    }

    pub fn config(&self) -> Config {
        Config {
            data_dir: self.data_dir(),
            users_file: self.dir.path().join("users.json"),
            finance: FinanceRules::default(),
        }
    }
}

pub fn setup_state() -> TestContext {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let store = FileStore::open(dir.path().join("store")).expect("failed to open store");
    TestContext {
        state: AppState::with_store(Arc::new(store)),
        dir,
    }
}

/// Same as `setup_state` but goes through `init_state`, so the default
/// administrator is seeded.
pub fn setup_seeded_state() -> TestContext {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let config = Config {
        data_dir: dir.path().join("store"),
        users_file: dir.path().join("users.json"),
        finance: FinanceRules::default(),
    };
    let state = init_state(&config).expect("init_state failed");
    TestContext { state, dir }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn add_user(state: &AppState, username: &str, role: UserRole) -> User {
    create_user(
        state,
        NewUser {
            username: username.to_string(),
            password: format!("{username}-pass"),
            role,
            name: format!("Usuario {username}"),
            email: None,
            phone: None,
            is_active: true,
        },
    )
    .expect("create user")
}

pub struct Crew {
    pub admin: User,
    pub resident: User,
    pub accountant: User,
}

pub fn add_crew(state: &AppState) -> Crew {
    Crew {
        admin: add_user(state, "director", UserRole::Admin),
        resident: add_user(state, "residente1", UserRole::Resident),
        accountant: add_user(state, "contadora1", UserRole::Accountant),
    }
}

pub fn add_project(state: &AppState, name: &str, resident_id: &str, budget: f64) -> Project {
    create_project(
        state,
        NewProject {
            name: name.to_string(),
            location: "Morelia, Michoacán".to_string(),
            scope: ProjectScope::Public,
            start_date: date(2025, 1, 6),
            end_date: date(2025, 12, 19),
            funding_source: FundingSource::Own,
            resident_id: resident_id.to_string(),
            budget,
        },
    )
    .expect("create project")
}

pub fn employee(name: &str, daily_wage: f64, slots: [f64; 7]) -> EmployeeInput {
    EmployeeInput {
        name: name.to_string(),
        position: "Albañil".to_string(),
        days: DaysWorked::from_slots(slots),
        daily_wage,
        notes: String::new(),
    }
}

pub const MON_TO_WED: [f64; 7] = [1.0, 1.0, 1.0, 0.0, 0.0, 0.0, 0.0];
