use chrono::NaiveDate;
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::models::{FundingSource, Project, ProjectScope, ProjectStatus, User, UserRole};

use super::{AppState, new_id, now};

#[derive(Debug, Clone)]
pub struct NewProject {
    pub name: String,
    pub location: String,
    pub scope: ProjectScope,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub funding_source: FundingSource,
    pub resident_id: String,
    pub budget: f64,
}

#[derive(Debug, Clone, Default)]
pub struct ProjectPatch {
    pub name: Option<String>,
    pub location: Option<String>,
    pub scope: Option<ProjectScope>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub funding_source: Option<FundingSource>,
    pub resident_id: Option<String>,
    pub status: Option<ProjectStatus>,
    pub budget: Option<f64>,
}

pub fn list_projects(state: &AppState) -> AppResult<Vec<Project>> {
    state.projects.load_all()
}

pub fn get_project_by_id(state: &AppState, id: &str) -> AppResult<Option<Project>> {
    state.projects.find(|p| p.id == id)
}

pub fn list_projects_by_resident(state: &AppState, resident_id: &str) -> AppResult<Vec<Project>> {
    state.projects.filter(|p| p.resident_id == resident_id)
}

pub fn list_projects_by_status(
    state: &AppState,
    status: ProjectStatus,
) -> AppResult<Vec<Project>> {
    state.projects.filter(|p| p.status == status)
}

pub fn list_active_projects(state: &AppState) -> AppResult<Vec<Project>> {
    list_projects_by_status(state, ProjectStatus::Active)
}

/// Projects shown to `user`: residents only see the ones assigned to them.
pub fn visible_projects(state: &AppState, user: &User) -> AppResult<Vec<Project>> {
    match user.role {
        UserRole::Resident => list_projects_by_resident(state, &user.id),
        UserRole::Admin | UserRole::Accountant => list_projects(state),
    }
}

pub fn create_project(state: &AppState, input: NewProject) -> AppResult<Project> {
    let ts = now();
    let project = Project {
        id: new_id(),
        name: input.name.trim().to_string(),
        location: input.location.trim().to_string(),
        scope: input.scope,
        start_date: input.start_date,
        end_date: input.end_date,
        funding_source: input.funding_source,
        resident_id: input.resident_id,
        status: ProjectStatus::Active,
        budget: input.budget,
        created_at: ts,
        updated_at: ts,
    };
    validate_project(&project)?;
    ensure_resident(state, &project.resident_id)?;

    state.projects.insert(project.clone())?;
    info!(project_id = %project.id, name = %project.name, "project created");
    Ok(project)
}

pub fn update_project(state: &AppState, id: &str, patch: ProjectPatch) -> AppResult<Project> {
    let mut projects = state.projects.load_all()?;
    let idx = projects
        .iter()
        .position(|p| p.id == id)
        .ok_or_else(|| AppError::not_found("project", id))?;

    let mut updated = projects[idx].clone();
    if let Some(name) = patch.name {
        updated.name = name.trim().to_string();
    }
    if let Some(location) = patch.location {
        updated.location = location.trim().to_string();
    }
    if let Some(scope) = patch.scope {
        updated.scope = scope;
    }
    if let Some(start_date) = patch.start_date {
        updated.start_date = start_date;
    }
    if let Some(end_date) = patch.end_date {
        updated.end_date = end_date;
    }
    if let Some(funding_source) = patch.funding_source {
        updated.funding_source = funding_source;
    }
    if let Some(resident_id) = patch.resident_id {
        ensure_resident(state, &resident_id)?;
        updated.resident_id = resident_id;
    }
    if let Some(status) = patch.status {
        updated.status = status;
    }
    if let Some(budget) = patch.budget {
        updated.budget = budget;
    }
    validate_project(&updated)?;
    updated.updated_at = now();

    projects[idx] = updated.clone();
    state.projects.save_all(&projects)?;

    info!(project_id = %id, status = %updated.status, "project updated");
    Ok(updated)
}

/// Mark the project finished as of today.
pub fn complete_project(state: &AppState, id: &str) -> AppResult<Project> {
    let today = now().date_naive();
    let mut projects = state.projects.load_all()?;
    let project = projects
        .iter_mut()
        .find(|p| p.id == id)
        .ok_or_else(|| AppError::not_found("project", id))?;

    project.status = ProjectStatus::Completed;
    // A project closed before its planned start keeps a one-day window.
    project.end_date = today.max(project.start_date);
    project.updated_at = now();
    let completed = project.clone();
    state.projects.save_all(&projects)?;

    info!(project_id = %id, "project completed");
    Ok(completed)
}

/// Returns whether a project was removed. Payrolls and documents that point
/// at it are left in place.
pub fn delete_project(state: &AppState, id: &str) -> AppResult<bool> {
    let removed = state.projects.remove_where(|p| p.id == id)? > 0;
    if removed {
        info!(project_id = %id, "project deleted");
    }
    Ok(removed)
}

fn validate_project(project: &Project) -> AppResult<()> {
    if project.name.is_empty() {
        return Err(AppError::validation("project name is required"));
    }
    if project.location.is_empty() {
        return Err(AppError::validation("project location is required"));
    }
    if !project.budget.is_finite() || project.budget < 0.0 {
        return Err(AppError::validation("budget must be a non-negative amount"));
    }
    if project.start_date > project.end_date {
        return Err(AppError::validation("start date is after end date"));
    }
    Ok(())
}

fn ensure_resident(state: &AppState, resident_id: &str) -> AppResult<()> {
    let resident = state
        .users
        .find(|u| u.id == resident_id)?
        .ok_or_else(|| AppError::not_found("user", resident_id))?;
    if resident.role != UserRole::Resident {
        return Err(AppError::validation(format!(
            "{} is not a resident",
            resident.username
        )));
    }
    if !resident.is_active {
        return Err(AppError::validation(format!(
            "resident {} is disabled",
            resident.username
        )));
    }
    Ok(())
}
