// main.rs
// Opens the data directory, seeds it on first run and logs the portfolio
// dashboard: totals, one finance line per project and every active alert.

use anyhow::Result;
use chrono::Utc;
use dotenvy::dotenv;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use sismich::config::Config;
use sismich::models::AlertLevel;
use sismich::state::{self, format_mxn};

fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("sismich=info")),
        )
        .init();

    let config = Config::from_env()?;
    let app = state::init_state(&config)?;
    info!(data_dir = %config.data_dir.display(), "store ready");

    let today = Utc::now().date_naive();
    let stats = state::load_dashboard_stats(&app, &config.finance)?;
    info!(
        obras = stats.total_projects,
        activas = stats.active_projects,
        terminadas = stats.completed_projects,
        presupuesto = %format_mxn(stats.total_budget),
        mano_obra = %format_mxn(stats.total_labor),
        materiales = %format_mxn(stats.total_materials),
        proyeccion = %format_mxn(stats.projected_profit),
        "dashboard"
    );
    info!(
        pendientes = stats.pending_payrolls,
        validadas = stats.validated_payrolls,
        autorizadas = stats.authorized_payrolls,
        pagadas = stats.paid_payrolls,
        por_pagar = %format_mxn(stats.amount_to_pay),
        "payrolls"
    );

    for project in state::list_projects(&app)? {
        let payrolls = state::list_payrolls_by_project(&app, &project.id)?;
        let finance = state::project_finance(&project, &payrolls, &config.finance, today);
        info!(
            obra = %finance.project_name,
            estado = %project.status,
            avance_fisico = finance.physical_progress,
            avance_financiero = finance.financial_progress,
            desviacion = finance.budget_deviation,
            roi = finance.roi,
            "project"
        );
    }

    for alert in state::load_financial_alerts(&app, &config.finance, today)? {
        match alert.level {
            AlertLevel::Critical | AlertLevel::Warning => {
                warn!(obra = %alert.project_name, nivel = alert.level.as_str(), "{}", alert.message)
            }
            AlertLevel::Info => {
                info!(obra = %alert.project_name, nivel = alert.level.as_str(), "{}", alert.message)
            }
        }
    }

    Ok(())
}
