use chrono::NaiveDate;
use tracing::{info, warn};

use crate::error::{AppError, AppResult};
use crate::models::{
    DaysWorked, Payroll, PayrollEmployee, PayrollState, ProjectStatus, User, UserRole,
};

use super::{AppState, new_id, now};

/// Employee line as entered; day and money totals are always derived here.
#[derive(Debug, Clone)]
pub struct EmployeeInput {
    pub name: String,
    pub position: String,
    pub days: DaysWorked,
    pub daily_wage: f64,
    pub notes: String,
}

#[derive(Debug, Clone)]
pub struct NewPayroll {
    pub project_id: String,
    pub resident_id: String,
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    pub prepared_on: NaiveDate,
    pub employees: Vec<EmployeeInput>,
}

/// Every way a payroll can change. Data edits are only accepted while the
/// payroll is pending; state only moves through the three transitions.
/// Commands on an existing payroll resolve it first, then check the actor,
/// then the payload.
#[derive(Debug, Clone)]
pub enum PayrollCommand {
    Create(NewPayroll),
    EditEmployees {
        id: String,
        employees: Vec<EmployeeInput>,
    },
    EditWeek {
        id: String,
        week_start: NaiveDate,
        week_end: NaiveDate,
        prepared_on: NaiveDate,
    },
    Validate {
        id: String,
    },
    Authorize {
        id: String,
    },
    Pay {
        id: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayrollTransition {
    Validate,
    Authorize,
    Pay,
}

impl PayrollTransition {
    pub fn from_state(&self) -> PayrollState {
        match self {
            PayrollTransition::Validate => PayrollState::Pending,
            PayrollTransition::Authorize => PayrollState::Validated,
            PayrollTransition::Pay => PayrollState::Authorized,
        }
    }

    pub fn to_state(&self) -> PayrollState {
        match self {
            PayrollTransition::Validate => PayrollState::Validated,
            PayrollTransition::Authorize => PayrollState::Authorized,
            PayrollTransition::Pay => PayrollState::Paid,
        }
    }

    pub fn allowed_role(&self) -> UserRole {
        match self {
            PayrollTransition::Validate => UserRole::Resident,
            PayrollTransition::Authorize => UserRole::Admin,
            PayrollTransition::Pay => UserRole::Accountant,
        }
    }
}

pub fn apply_payroll_command(
    state: &AppState,
    actor: &User,
    command: PayrollCommand,
) -> AppResult<Payroll> {
    match command {
        PayrollCommand::Create(input) => create(state, actor, input),
        PayrollCommand::EditEmployees { id, employees } => {
            edit_pending(state, actor, &id, |payroll| {
                let employees = build_employees(employees)?;
                payroll.total = Payroll::employees_total(&employees);
                payroll.employees = employees;
                Ok(())
            })
        }
        PayrollCommand::EditWeek {
            id,
            week_start,
            week_end,
            prepared_on,
        } => edit_pending(state, actor, &id, |payroll| {
            check_week(week_start, week_end)?;
            payroll.week_start = week_start;
            payroll.week_end = week_end;
            payroll.prepared_on = prepared_on;
            Ok(())
        }),
        PayrollCommand::Validate { id } => transition(state, actor, &id, PayrollTransition::Validate),
        PayrollCommand::Authorize { id } => {
            transition(state, actor, &id, PayrollTransition::Authorize)
        }
        PayrollCommand::Pay { id } => transition(state, actor, &id, PayrollTransition::Pay),
    }
}

pub fn create_payroll(state: &AppState, actor: &User, input: NewPayroll) -> AppResult<Payroll> {
    apply_payroll_command(state, actor, PayrollCommand::Create(input))
}

pub fn edit_payroll_employees(
    state: &AppState,
    actor: &User,
    id: &str,
    employees: Vec<EmployeeInput>,
) -> AppResult<Payroll> {
    apply_payroll_command(
        state,
        actor,
        PayrollCommand::EditEmployees {
            id: id.to_string(),
            employees,
        },
    )
}

pub fn edit_payroll_week(
    state: &AppState,
    actor: &User,
    id: &str,
    week_start: NaiveDate,
    week_end: NaiveDate,
    prepared_on: NaiveDate,
) -> AppResult<Payroll> {
    apply_payroll_command(
        state,
        actor,
        PayrollCommand::EditWeek {
            id: id.to_string(),
            week_start,
            week_end,
            prepared_on,
        },
    )
}

pub fn validate_payroll(state: &AppState, actor: &User, id: &str) -> AppResult<Payroll> {
    apply_payroll_command(state, actor, PayrollCommand::Validate { id: id.to_string() })
}

pub fn authorize_payroll(state: &AppState, actor: &User, id: &str) -> AppResult<Payroll> {
    apply_payroll_command(state, actor, PayrollCommand::Authorize { id: id.to_string() })
}

pub fn pay_payroll(state: &AppState, actor: &User, id: &str) -> AppResult<Payroll> {
    apply_payroll_command(state, actor, PayrollCommand::Pay { id: id.to_string() })
}

/// Removes a pending payroll. Unknown ids are a no-op (`Ok(false)`).
pub fn delete_payroll(state: &AppState, actor: &User, id: &str) -> AppResult<bool> {
    let Some(payroll) = state.payrolls.find(|p| p.id == id)? else {
        return Ok(false);
    };
    ensure_can_edit(actor, &payroll)?;

    let removed = state.payrolls.remove_where(|p| p.id == id)? > 0;
    if removed {
        info!(payroll_id = %id, "payroll deleted");
    }
    Ok(removed)
}

pub fn list_payrolls(state: &AppState) -> AppResult<Vec<Payroll>> {
    state.payrolls.load_all()
}

pub fn get_payroll_by_id(state: &AppState, id: &str) -> AppResult<Option<Payroll>> {
    state.payrolls.find(|p| p.id == id)
}

pub fn list_payrolls_by_project(state: &AppState, project_id: &str) -> AppResult<Vec<Payroll>> {
    state.payrolls.filter(|p| p.project_id == project_id)
}

pub fn list_payrolls_by_resident(state: &AppState, resident_id: &str) -> AppResult<Vec<Payroll>> {
    state.payrolls.filter(|p| p.resident_id == resident_id)
}

pub fn list_payrolls_by_state(
    state: &AppState,
    payroll_state: PayrollState,
) -> AppResult<Vec<Payroll>> {
    state.payrolls.filter(|p| p.state == payroll_state)
}

/// Payrolls shown to `user`: residents see their own, accountants only what
/// is ready to pay or already paid.
pub fn visible_payrolls(state: &AppState, user: &User) -> AppResult<Vec<Payroll>> {
    match user.role {
        UserRole::Admin => list_payrolls(state),
        UserRole::Resident => list_payrolls_by_resident(state, &user.id),
        UserRole::Accountant => state.payrolls.filter(|p| p.state.is_committed()),
    }
}

fn create(state: &AppState, actor: &User, input: NewPayroll) -> AppResult<Payroll> {
    if !actor.is_active {
        return Err(AppError::Forbidden(format!("{} is disabled", actor.username)));
    }
    if !actor.role.is_admin() && actor.id != input.resident_id {
        return Err(AppError::Forbidden(
            "payrolls can only be created by their resident or an administrator".into(),
        ));
    }

    let resident = state
        .users
        .find(|u| u.id == input.resident_id)?
        .ok_or_else(|| AppError::not_found("user", input.resident_id.as_str()))?;
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

    let project = state
        .projects
        .find(|p| p.id == input.project_id)?
        .ok_or_else(|| AppError::not_found("project", input.project_id.as_str()))?;
    if project.status != ProjectStatus::Active {
        return Err(AppError::validation(format!(
            "project {} is {}; payrolls need an active project",
            project.name, project.status
        )));
    }

    check_week(input.week_start, input.week_end)?;
    let employees = build_employees(input.employees)?;

    let ts = now();
    let payroll = Payroll {
        id: new_id(),
        project_id: project.id,
        project_name: project.name,
        week_start: input.week_start,
        week_end: input.week_end,
        prepared_on: input.prepared_on,
        total: Payroll::employees_total(&employees),
        employees,
        state: PayrollState::Pending,
        resident_id: resident.id,
        resident_name: resident.name,
        validated_at: None,
        authorized_at: None,
        paid_at: None,
        created_at: ts,
        updated_at: ts,
    };
    state.payrolls.insert(payroll.clone())?;

    info!(
        payroll_id = %payroll.id,
        project_id = %payroll.project_id,
        total = payroll.total,
        "payroll created"
    );
    Ok(payroll)
}

fn edit_pending<F>(state: &AppState, actor: &User, id: &str, apply: F) -> AppResult<Payroll>
where
    F: FnOnce(&mut Payroll) -> AppResult<()>,
{
    let mut payrolls = state.payrolls.load_all()?;
    let payroll = payrolls
        .iter_mut()
        .find(|p| p.id == id)
        .ok_or_else(|| AppError::not_found("payroll", id))?;
    ensure_can_edit(actor, payroll)?;

    apply(payroll)?;
    payroll.updated_at = now();
    let edited = payroll.clone();
    state.payrolls.save_all(&payrolls)?;

    info!(payroll_id = %id, total = edited.total, "payroll edited");
    Ok(edited)
}

fn transition(
    state: &AppState,
    actor: &User,
    id: &str,
    step: PayrollTransition,
) -> AppResult<Payroll> {
    let mut payrolls = state.payrolls.load_all()?;
    let payroll = payrolls
        .iter_mut()
        .find(|p| p.id == id)
        .ok_or_else(|| AppError::not_found("payroll", id))?;

    if payroll.state != step.from_state() {
        warn!(payroll_id = %id, estado = %payroll.state, to = %step.to_state(), "transition rejected");
        return Err(AppError::InvalidTransition {
            id: id.to_string(),
            from: payroll.state,
            to: step.to_state(),
        });
    }
    ensure_can_transition(actor, payroll, step)?;

    let ts = now();
    match step {
        PayrollTransition::Validate => payroll.validated_at = Some(ts),
        PayrollTransition::Authorize => payroll.authorized_at = Some(ts),
        PayrollTransition::Pay => payroll.paid_at = Some(ts),
    }
    payroll.state = step.to_state();
    payroll.updated_at = ts;
    let moved = payroll.clone();
    state.payrolls.save_all(&payrolls)?;

    info!(payroll_id = %id, estado = %moved.state, actor = %actor.username, "payroll transitioned");
    Ok(moved)
}

fn ensure_can_transition(actor: &User, payroll: &Payroll, step: PayrollTransition) -> AppResult<()> {
    if !actor.is_active {
        return Err(AppError::Forbidden(format!("{} is disabled", actor.username)));
    }
    if actor.role != step.allowed_role() {
        warn!(payroll_id = %payroll.id, role = %actor.role, "transition forbidden");
        return Err(AppError::Forbidden(format!(
            "only a {} can move a payroll to {}",
            step.allowed_role(),
            step.to_state()
        )));
    }
    if step == PayrollTransition::Validate && actor.id != payroll.resident_id {
        return Err(AppError::Forbidden(
            "only the owning resident can validate a payroll".into(),
        ));
    }
    Ok(())
}

fn ensure_can_edit(actor: &User, payroll: &Payroll) -> AppResult<()> {
    if payroll.state != PayrollState::Pending {
        return Err(AppError::validation(format!(
            "payroll {} is {}; only pending payrolls can be changed",
            payroll.id, payroll.state
        )));
    }
    if !actor.is_active {
        return Err(AppError::Forbidden(format!("{} is disabled", actor.username)));
    }
    if !actor.role.is_admin() && actor.id != payroll.resident_id {
        return Err(AppError::Forbidden(
            "only the owning resident or an administrator can change a payroll".into(),
        ));
    }
    Ok(())
}

fn check_week(week_start: NaiveDate, week_end: NaiveDate) -> AppResult<()> {
    if week_start > week_end {
        return Err(AppError::validation("week start is after week end"));
    }
    Ok(())
}

fn build_employees(inputs: Vec<EmployeeInput>) -> AppResult<Vec<PayrollEmployee>> {
    if inputs.is_empty() {
        return Err(AppError::validation("a payroll needs at least one employee"));
    }

    inputs
        .into_iter()
        .enumerate()
        .map(|(idx, input)| {
            let name = input.name.trim().to_string();
            if name.is_empty() {
                return Err(AppError::validation(format!(
                    "employee #{} has no name",
                    idx + 1
                )));
            }
            if !input.daily_wage.is_finite() || input.daily_wage < 0.0 {
                return Err(AppError::validation(format!(
                    "daily wage for {name} must be a non-negative amount"
                )));
            }
            if input
                .days
                .slots()
                .iter()
                .any(|d| !d.is_finite() || *d < 0.0)
            {
                return Err(AppError::validation(format!(
                    "days worked for {name} must be non-negative numbers"
                )));
            }

            let mut employee = PayrollEmployee {
                id: new_id(),
                name,
                position: input.position.trim().to_string(),
                days: input.days,
                total_days: 0,
                daily_wage: input.daily_wage,
                weekly_total: 0.0,
                notes: input.notes,
            };
            employee.recompute();
            Ok(employee)
        })
        .collect()
}
