#[path = "common/mod.rs"]
mod common;

use sismich::error::{AppError, ErrorKind};
use sismich::models::{PayrollState, ProjectStatus, UserRole};
use sismich::state::{
    NewPayroll, PayrollCommand, ProjectPatch, UserPatch, apply_payroll_command,
    authorize_payroll, create_payroll, delete_payroll, edit_payroll_employees, edit_payroll_week,
    get_payroll_by_id, list_payrolls_by_state, pay_payroll, update_project, update_user,
    validate_payroll, visible_payrolls,
};

use common::{MON_TO_WED, add_crew, add_project, add_user, date, employee};

fn new_payroll(project_id: &str, resident_id: &str) -> NewPayroll {
    NewPayroll {
        project_id: project_id.to_string(),
        resident_id: resident_id.to_string(),
        week_start: date(2025, 3, 3),
        week_end: date(2025, 3, 9),
        prepared_on: date(2025, 3, 10),
        employees: vec![employee("Juan Pérez", 500.0, MON_TO_WED)],
    }
}

#[test]
fn create_computes_totals_and_starts_pending() {
    let ctx = common::setup_state();
    let state = &ctx.state;
    let crew = add_crew(state);
    let project = add_project(state, "Puente Norte", &crew.resident.id, 100_000.0);

    let payroll = create_payroll(state, &crew.resident, new_payroll(&project.id, &crew.resident.id))
        .unwrap();

    assert_eq!(payroll.employees[0].total_days, 3);
    assert_eq!(payroll.employees[0].weekly_total, 1500.0);
    assert_eq!(payroll.total, 1500.0);
    assert_eq!(payroll.state, PayrollState::Pending);
    assert_eq!(payroll.project_name, "Puente Norte");
    assert_eq!(payroll.resident_name, crew.resident.name);
    assert!(payroll.validated_at.is_none());

    let stored = get_payroll_by_id(state, &payroll.id).unwrap().unwrap();
    assert_eq!(stored, payroll);
}

#[test]
fn full_workflow_stamps_one_timestamp_per_step() {
    let ctx = common::setup_state();
    let state = &ctx.state;
    let crew = add_crew(state);
    let project = add_project(state, "Puente Norte", &crew.resident.id, 100_000.0);
    let created =
        create_payroll(state, &crew.resident, new_payroll(&project.id, &crew.resident.id)).unwrap();

    let validated = validate_payroll(state, &crew.resident, &created.id).unwrap();
    assert_eq!(validated.state, PayrollState::Validated);
    assert!(validated.validated_at.is_some());
    assert!(validated.authorized_at.is_none());

    let authorized = authorize_payroll(state, &crew.admin, &created.id).unwrap();
    assert_eq!(authorized.state, PayrollState::Authorized);
    assert_eq!(authorized.validated_at, validated.validated_at);
    assert!(authorized.authorized_at.is_some());
    assert!(authorized.paid_at.is_none());

    let paid = pay_payroll(state, &crew.accountant, &created.id).unwrap();
    assert_eq!(paid.state, PayrollState::Paid);
    assert_eq!(paid.authorized_at, authorized.authorized_at);
    assert!(paid.paid_at.is_some());
    assert!(paid.updated_at >= authorized.updated_at);

    let err = validate_payroll(state, &crew.resident, &created.id).unwrap_err();
    assert!(matches!(
        err,
        AppError::InvalidTransition {
            from: PayrollState::Paid,
            to: PayrollState::Validated,
            ..
        }
    ));
    assert_eq!(list_payrolls_by_state(state, PayrollState::Paid).unwrap().len(), 1);
}

#[test]
fn paying_a_pending_payroll_fails() {
    let ctx = common::setup_state();
    let state = &ctx.state;
    let crew = add_crew(state);
    let project = add_project(state, "Puente Norte", &crew.resident.id, 100_000.0);
    let created =
        create_payroll(state, &crew.resident, new_payroll(&project.id, &crew.resident.id)).unwrap();

    let err = pay_payroll(state, &crew.accountant, &created.id).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(matches!(err, AppError::InvalidTransition { .. }));

    let stored = get_payroll_by_id(state, &created.id).unwrap().unwrap();
    assert_eq!(stored.state, PayrollState::Pending);
    assert!(stored.paid_at.is_none());
}

#[test]
fn transitions_enforce_the_responsible_role() {
    let ctx = common::setup_state();
    let state = &ctx.state;
    let crew = add_crew(state);
    let other_resident = add_user(state, "residente2", UserRole::Resident);
    let project = add_project(state, "Puente Norte", &crew.resident.id, 100_000.0);
    let created =
        create_payroll(state, &crew.resident, new_payroll(&project.id, &crew.resident.id)).unwrap();

    // Another resident, the admin and the accountant cannot validate.
    for actor in [&other_resident, &crew.admin, &crew.accountant] {
        let err = validate_payroll(state, actor, &created.id).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)), "{err}");
    }
    validate_payroll(state, &crew.resident, &created.id).unwrap();

    let err = authorize_payroll(state, &crew.accountant, &created.id).unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
    authorize_payroll(state, &crew.admin, &created.id).unwrap();

    let err = pay_payroll(state, &crew.admin, &created.id).unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
    pay_payroll(state, &crew.accountant, &created.id).unwrap();
}

#[test]
fn disabled_actor_cannot_transition() {
    let ctx = common::setup_state();
    let state = &ctx.state;
    let crew = add_crew(state);
    let project = add_project(state, "Puente Norte", &crew.resident.id, 100_000.0);
    let created =
        create_payroll(state, &crew.resident, new_payroll(&project.id, &crew.resident.id)).unwrap();

    let disabled = update_user(
        state,
        &crew.resident.id,
        UserPatch {
            is_active: Some(false),
            ..Default::default()
        },
    )
    .unwrap();
    let err = validate_payroll(state, &disabled, &created.id).unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
}

#[test]
fn unknown_payroll_is_not_found() {
    let ctx = common::setup_state();
    let crew = add_crew(&ctx.state);
    let err = authorize_payroll(&ctx.state, &crew.admin, "no-such-id").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn create_rejects_invalid_input_without_writing() {
    let ctx = common::setup_state();
    let state = &ctx.state;
    let crew = add_crew(state);
    let project = add_project(state, "Puente Norte", &crew.resident.id, 100_000.0);

    let mut empty = new_payroll(&project.id, &crew.resident.id);
    empty.employees.clear();
    assert!(matches!(
        create_payroll(state, &crew.resident, empty),
        Err(AppError::Validation(_))
    ));

    let mut nameless = new_payroll(&project.id, &crew.resident.id);
    nameless.employees.push(employee("   ", 400.0, MON_TO_WED));
    assert!(matches!(
        create_payroll(state, &crew.resident, nameless),
        Err(AppError::Validation(_))
    ));

    let mut negative = new_payroll(&project.id, &crew.resident.id);
    negative.employees = vec![employee("Pedro", -10.0, MON_TO_WED)];
    assert!(matches!(
        create_payroll(state, &crew.resident, negative),
        Err(AppError::Validation(_))
    ));

    let mut backwards = new_payroll(&project.id, &crew.resident.id);
    backwards.week_end = date(2025, 3, 1);
    assert!(matches!(
        create_payroll(state, &crew.resident, backwards),
        Err(AppError::Validation(_))
    ));

    let missing = new_payroll("missing-project", &crew.resident.id);
    assert_eq!(
        create_payroll(state, &crew.resident, missing).unwrap_err().kind(),
        ErrorKind::NotFound
    );

    assert!(ctx.state.payrolls.load_all().unwrap().is_empty());
}

#[test]
fn edits_resolve_the_payroll_before_the_payload() {
    let ctx = common::setup_state();
    let state = &ctx.state;
    let crew = add_crew(state);
    let project = add_project(state, "Puente Norte", &crew.resident.id, 100_000.0);
    let created =
        create_payroll(state, &crew.resident, new_payroll(&project.id, &crew.resident.id)).unwrap();

    let err = edit_payroll_employees(state, &crew.resident, "no-such-id", Vec::new()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    let err = edit_payroll_week(
        state,
        &crew.resident,
        "no-such-id",
        date(2025, 3, 9),
        date(2025, 3, 3),
        date(2025, 3, 10),
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    // Known id, bad payload: rejected without touching the record.
    let err = edit_payroll_employees(state, &crew.resident, &created.id, Vec::new()).unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    let err = edit_payroll_week(
        state,
        &crew.resident,
        &created.id,
        date(2025, 3, 9),
        date(2025, 3, 3),
        date(2025, 3, 10),
    )
    .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    assert_eq!(get_payroll_by_id(state, &created.id).unwrap(), Some(created));
}

#[test]
fn disabled_resident_cannot_own_a_new_payroll() {
    let ctx = common::setup_state();
    let state = &ctx.state;
    let crew = add_crew(state);
    let project = add_project(state, "Puente Norte", &crew.resident.id, 100_000.0);
    update_user(
        state,
        &crew.resident.id,
        UserPatch {
            is_active: Some(false),
            ..Default::default()
        },
    )
    .unwrap();

    let err = create_payroll(state, &crew.admin, new_payroll(&project.id, &crew.resident.id))
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)), "{err}");
    assert!(state.payrolls.load_all().unwrap().is_empty());
}

#[test]
fn create_is_limited_to_owner_or_admin() {
    let ctx = common::setup_state();
    let state = &ctx.state;
    let crew = add_crew(state);
    let project = add_project(state, "Puente Norte", &crew.resident.id, 100_000.0);

    let err = create_payroll(state, &crew.accountant, new_payroll(&project.id, &crew.resident.id))
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    let by_admin =
        create_payroll(state, &crew.admin, new_payroll(&project.id, &crew.resident.id)).unwrap();
    assert_eq!(by_admin.resident_id, crew.resident.id);

    // The named owner has to be a resident.
    let err = create_payroll(state, &crew.admin, new_payroll(&project.id, &crew.admin.id))
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[test]
fn closed_projects_take_no_new_payrolls() {
    let ctx = common::setup_state();
    let state = &ctx.state;
    let crew = add_crew(state);
    let project = add_project(state, "Puente Norte", &crew.resident.id, 100_000.0);
    update_project(
        state,
        &project.id,
        ProjectPatch {
            status: Some(ProjectStatus::Cancelled),
            ..Default::default()
        },
    )
    .unwrap();

    let err = create_payroll(state, &crew.resident, new_payroll(&project.id, &crew.resident.id))
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[test]
fn editing_employees_recomputes_total() {
    let ctx = common::setup_state();
    let state = &ctx.state;
    let crew = add_crew(state);
    let project = add_project(state, "Puente Norte", &crew.resident.id, 100_000.0);
    let created =
        create_payroll(state, &crew.resident, new_payroll(&project.id, &crew.resident.id)).unwrap();

    let edited = edit_payroll_employees(
        state,
        &crew.resident,
        &created.id,
        vec![
            employee("Juan Pérez", 500.0, [1.0, 1.0, 1.0, 1.0, 1.0, 0.0, 0.0]),
            employee("Luis Gómez", 350.0, [0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.5]),
        ],
    )
    .unwrap();

    assert_eq!(edited.employees[0].total_days, 5);
    assert_eq!(edited.employees[1].total_days, 2);
    assert_eq!(edited.employees[1].weekly_total, 700.0);
    assert_eq!(edited.total, 2500.0 + 700.0);
    assert_eq!(edited.state, PayrollState::Pending);

    let week = edit_payroll_week(
        state,
        &crew.admin,
        &created.id,
        date(2025, 3, 10),
        date(2025, 3, 16),
        date(2025, 3, 17),
    )
    .unwrap();
    assert_eq!(week.week_start, date(2025, 3, 10));
    assert_eq!(week.total, edited.total);
}

#[test]
fn edits_are_closed_once_validated() {
    let ctx = common::setup_state();
    let state = &ctx.state;
    let crew = add_crew(state);
    let project = add_project(state, "Puente Norte", &crew.resident.id, 100_000.0);
    let created =
        create_payroll(state, &crew.resident, new_payroll(&project.id, &crew.resident.id)).unwrap();
    validate_payroll(state, &crew.resident, &created.id).unwrap();

    let err = apply_payroll_command(
        state,
        &crew.resident,
        PayrollCommand::EditEmployees {
            id: created.id.clone(),
            employees: vec![employee("Juan Pérez", 900.0, MON_TO_WED)],
        },
    )
    .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let stored = get_payroll_by_id(state, &created.id).unwrap().unwrap();
    assert_eq!(stored.total, 1500.0);

    let err = delete_payroll(state, &crew.resident, &created.id).unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[test]
fn delete_is_idempotent() {
    let ctx = common::setup_state();
    let state = &ctx.state;
    let crew = add_crew(state);
    let project = add_project(state, "Puente Norte", &crew.resident.id, 100_000.0);
    let created =
        create_payroll(state, &crew.resident, new_payroll(&project.id, &crew.resident.id)).unwrap();

    assert!(delete_payroll(state, &crew.resident, &created.id).unwrap());
    assert!(!delete_payroll(state, &crew.resident, &created.id).unwrap());
    assert!(get_payroll_by_id(state, &created.id).unwrap().is_none());
}

#[test]
fn visibility_depends_on_role() {
    let ctx = common::setup_state();
    let state = &ctx.state;
    let crew = add_crew(state);
    let other = add_user(state, "residente2", UserRole::Resident);
    let p1 = add_project(state, "Puente Norte", &crew.resident.id, 100_000.0);
    let p2 = add_project(state, "Camino Sur", &other.id, 50_000.0);

    let mine = create_payroll(state, &crew.resident, new_payroll(&p1.id, &crew.resident.id)).unwrap();
    create_payroll(state, &other, new_payroll(&p2.id, &other.id)).unwrap();
    validate_payroll(state, &crew.resident, &mine.id).unwrap();
    authorize_payroll(state, &crew.admin, &mine.id).unwrap();

    assert_eq!(visible_payrolls(state, &crew.admin).unwrap().len(), 2);
    let own = visible_payrolls(state, &crew.resident).unwrap();
    assert_eq!(own.len(), 1);
    assert_eq!(own[0].id, mine.id);
    let to_pay = visible_payrolls(state, &crew.accountant).unwrap();
    assert_eq!(to_pay.len(), 1);
    assert_eq!(to_pay[0].state, PayrollState::Authorized);
}
