// Financial aggregation over project and payroll snapshots. Everything here
// is recomputed from the lists it is given; nothing is cached or stored.

use chrono::NaiveDate;

use crate::error::{AppError, AppResult};
use crate::models::{
    AlertLevel, DashboardStats, FinancialAlert, Payroll, PayrollState, Project, ProjectFinance,
    ProjectStatus, ResidentSummary,
};

use super::AppState;

/// Thresholds and heuristics behind the finance figures. Percentages are
/// expressed in points (10.0 means 10%).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FinanceRules {
    /// Share of the budget assumed to go to materials.
    pub materials_ratio: f64,
    pub critical_deviation: f64,
    pub warning_deviation: f64,
    /// Financial minus physical progress that raises a warning.
    pub progress_gap: f64,
    pub severe_progress_gap: f64,
    /// Completed projects below this financial progress raise an info alert.
    pub completed_min_financial: f64,
}

impl Default for FinanceRules {
    fn default() -> Self {
        FinanceRules {
            materials_ratio: 0.30,
            critical_deviation: 10.0,
            warning_deviation: 5.0,
            progress_gap: 15.0,
            severe_progress_gap: 25.0,
            completed_min_financial: 95.0,
        }
    }
}

pub fn dashboard_stats(
    projects: &[Project],
    payrolls: &[Payroll],
    rules: &FinanceRules,
) -> DashboardStats {
    let mut stats = DashboardStats {
        total_projects: projects.len(),
        ..Default::default()
    };

    for project in projects {
        match project.status {
            ProjectStatus::Active => stats.active_projects += 1,
            ProjectStatus::Completed => stats.completed_projects += 1,
            ProjectStatus::Cancelled => stats.cancelled_projects += 1,
        }
        stats.total_budget += project.budget;
    }

    for payroll in payrolls {
        match payroll.state {
            PayrollState::Pending => stats.pending_payrolls += 1,
            PayrollState::Validated => stats.validated_payrolls += 1,
            PayrollState::Authorized => {
                stats.authorized_payrolls += 1;
                stats.amount_to_pay += payroll.total;
            }
            PayrollState::Paid => {
                stats.paid_payrolls += 1;
                stats.amount_paid += payroll.total;
            }
        }
        // Labor only counts against projects that still exist.
        if payroll.state.is_committed() && projects.iter().any(|p| p.id == payroll.project_id) {
            stats.total_labor += payroll.total;
        }
    }

    stats.total_materials = stats.total_budget * rules.materials_ratio;
    stats.projected_profit = stats.total_budget - stats.total_labor - stats.total_materials;
    stats
}

pub fn project_finance(
    project: &Project,
    payrolls: &[Payroll],
    rules: &FinanceRules,
    today: NaiveDate,
) -> ProjectFinance {
    let labor_total = committed_labor(payrolls.iter().filter(|p| p.project_id == project.id));
    let materials_total = project.budget * rules.materials_ratio;
    let spend_total = labor_total + materials_total;
    let budget = project.budget;

    let (financial_progress, budget_deviation, roi) = if budget > 0.0 {
        (
            spend_total / budget * 100.0,
            (spend_total - budget) / budget * 100.0,
            (budget - spend_total) / budget * 100.0,
        )
    } else {
        (0.0, 0.0, 0.0)
    };

    ProjectFinance {
        project_id: project.id.clone(),
        project_name: project.name.clone(),
        budget,
        labor_total,
        materials_total,
        spend_total,
        physical_progress: round2(physical_progress(
            project.start_date,
            project.end_date,
            today,
        )),
        financial_progress: round2(financial_progress),
        budget_deviation: round2(budget_deviation),
        roi: round2(roi),
    }
}

/// Elapsed share of the planned schedule, 0 to 100.
pub fn physical_progress(start: NaiveDate, end: NaiveDate, today: NaiveDate) -> f64 {
    if today < start {
        return 0.0;
    }
    if today >= end {
        return 100.0;
    }
    let planned = (end - start).num_days() as f64;
    let elapsed = (today - start).num_days() as f64;
    (elapsed / planned * 100.0).min(100.0)
}

pub fn financial_alerts(
    projects: &[Project],
    payrolls: &[Payroll],
    rules: &FinanceRules,
    today: NaiveDate,
) -> Vec<FinancialAlert> {
    let mut alerts = Vec::new();

    for project in projects {
        let finance = project_finance(project, payrolls, rules, today);
        let mut push = |level: AlertLevel, message: String| {
            alerts.push(FinancialAlert {
                project_id: project.id.clone(),
                project_name: project.name.clone(),
                level,
                message,
            })
        };

        if finance.budget_deviation > rules.critical_deviation {
            push(
                AlertLevel::Critical,
                format!(
                    "Sobrepresupuesto del {:.1}%. Presupuesto: {}, Gastado: {}",
                    finance.budget_deviation,
                    format_mxn(finance.budget),
                    format_mxn(finance.spend_total)
                ),
            );
        } else if finance.budget_deviation > rules.warning_deviation {
            push(
                AlertLevel::Warning,
                format!(
                    "Gasto {:.1}% por encima del presupuesto",
                    finance.budget_deviation
                ),
            );
        }

        let gap = finance.financial_progress - finance.physical_progress;
        if gap > rules.severe_progress_gap {
            push(
                AlertLevel::Warning,
                format!(
                    "Desfase grave: avance financiero {:.0}% vs avance físico {:.0}%. Se ha pagado más de lo construido.",
                    finance.financial_progress, finance.physical_progress
                ),
            );
        } else if gap > rules.progress_gap {
            push(
                AlertLevel::Warning,
                format!(
                    "Desfase: avance financiero {:.0}% vs avance físico {:.0}%",
                    finance.financial_progress, finance.physical_progress
                ),
            );
        }

        if project.status == ProjectStatus::Completed
            && finance.financial_progress < rules.completed_min_financial
        {
            push(
                AlertLevel::Info,
                format!(
                    "Obra terminada con {:.0}% del presupuesto sin ejercer",
                    100.0 - finance.financial_progress
                ),
            );
        }
    }

    alerts
}

pub fn resident_summary(
    resident_id: &str,
    projects: &[Project],
    payrolls: &[Payroll],
) -> ResidentSummary {
    let own_projects = projects.iter().filter(|p| p.resident_id == resident_id);
    let own_payrolls: Vec<&Payroll> = payrolls
        .iter()
        .filter(|p| p.resident_id == resident_id)
        .collect();

    let (total_projects, active_projects) =
        own_projects.fold((0, 0), |(total, active), project| {
            let is_active = project.status == ProjectStatus::Active;
            (total + 1, active + usize::from(is_active))
        });

    ResidentSummary {
        resident_id: resident_id.to_string(),
        total_projects,
        active_projects,
        committed_labor: committed_labor(own_payrolls.iter().copied()),
        pending_payrolls: own_payrolls
            .iter()
            .filter(|p| p.state == PayrollState::Pending)
            .count(),
        validated_payrolls: own_payrolls
            .iter()
            .filter(|p| p.state == PayrollState::Validated)
            .count(),
    }
}

/// Dashboard over the current contents of the store.
pub fn load_dashboard_stats(state: &AppState, rules: &FinanceRules) -> AppResult<DashboardStats> {
    let projects = state.projects.load_all()?;
    let payrolls = state.payrolls.load_all()?;
    Ok(dashboard_stats(&projects, &payrolls, rules))
}

pub fn load_project_finance(
    state: &AppState,
    project_id: &str,
    rules: &FinanceRules,
    today: NaiveDate,
) -> AppResult<ProjectFinance> {
    let project = state
        .projects
        .find(|p| p.id == project_id)?
        .ok_or_else(|| AppError::not_found("project", project_id))?;
    let payrolls = state.payrolls.filter(|p| p.project_id == project_id)?;
    Ok(project_finance(&project, &payrolls, rules, today))
}

pub fn load_financial_alerts(
    state: &AppState,
    rules: &FinanceRules,
    today: NaiveDate,
) -> AppResult<Vec<FinancialAlert>> {
    let projects = state.projects.load_all()?;
    let payrolls = state.payrolls.load_all()?;
    Ok(financial_alerts(&projects, &payrolls, rules, today))
}

pub fn load_resident_summary(state: &AppState, resident_id: &str) -> AppResult<ResidentSummary> {
    let projects = state.projects.load_all()?;
    let payrolls = state.payrolls.load_all()?;
    Ok(resident_summary(resident_id, &projects, &payrolls))
}

fn committed_labor<'a>(payrolls: impl Iterator<Item = &'a Payroll>) -> f64 {
    payrolls
        .filter(|p| p.state.is_committed())
        .map(|p| p.total)
        .sum()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Whole pesos with thousands separators, e.g. `$1,234,568`.
pub fn format_mxn(amount: f64) -> String {
    let rounded = amount.round();
    let digits = format!("{:.0}", rounded.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if rounded < 0.0 {
        format!("-${grouped}")
    } else {
        format!("${grouped}")
    }
}
