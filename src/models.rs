// models.rs
// Domain models persisted in the store plus the derived finance views.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// User roles for authorization.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum UserRole {
    #[serde(rename = "admin")]
    Admin,
    #[serde(rename = "residente")]
    Resident,
    #[serde(rename = "contadora")]
    Accountant,
}

impl UserRole {
    pub fn default_admin() -> Self {
        UserRole::Admin
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Resident => "residente",
            UserRole::Accountant => "contadora",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, UserRole::Admin)
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Account definition as stored in users.json for first-run seeding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedUser {
    pub username: String,
    pub password: String,
    pub name: String,
    #[serde(default = "UserRole::default_admin")]
    pub role: UserRole,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Account record. The password is kept as entered.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    pub password: String,
    pub role: UserRole,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub is_active: bool,
}

/// Active session: a snapshot of the logged-in account.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub token: String,
    pub user: User,
    pub logged_in_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ProjectScope {
    #[serde(rename = "publica")]
    Public,
    #[serde(rename = "privada")]
    Private,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum FundingSource {
    #[serde(rename = "propio")]
    Own,
    #[serde(rename = "financiamiento")]
    Financing,
    #[serde(rename = "prestamo")]
    Loan,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ProjectStatus {
    #[serde(rename = "activa")]
    Active,
    #[serde(rename = "terminada")]
    Completed,
    #[serde(rename = "cancelada")]
    Cancelled,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Active => "activa",
            ProjectStatus::Completed => "terminada",
            ProjectStatus::Cancelled => "cancelada",
        }
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Civil-works project ("obra").
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "ubicacion")]
    pub location: String,
    #[serde(rename = "ambito")]
    pub scope: ProjectScope,
    #[serde(rename = "fechaInicio")]
    pub start_date: NaiveDate,
    #[serde(rename = "fechaTermino")]
    pub end_date: NaiveDate,
    #[serde(rename = "tipoRecurso")]
    pub funding_source: FundingSource,
    /// Weak reference to the responsible resident; never cascaded.
    #[serde(rename = "residenteId")]
    pub resident_id: String,
    #[serde(rename = "estado")]
    pub status: ProjectStatus,
    #[serde(rename = "presupuesto")]
    pub budget: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payroll workflow states, in the only order they may be visited.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum PayrollState {
    #[serde(rename = "pendiente")]
    Pending,
    #[serde(rename = "validada")]
    Validated,
    #[serde(rename = "autorizada")]
    Authorized,
    #[serde(rename = "pagada")]
    Paid,
}

impl PayrollState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PayrollState::Pending => "pendiente",
            PayrollState::Validated => "validada",
            PayrollState::Authorized => "autorizada",
            PayrollState::Paid => "pagada",
        }
    }

    /// The single state reachable from this one, if any.
    pub fn next(&self) -> Option<PayrollState> {
        match self {
            PayrollState::Pending => Some(PayrollState::Validated),
            PayrollState::Validated => Some(PayrollState::Authorized),
            PayrollState::Authorized => Some(PayrollState::Paid),
            PayrollState::Paid => None,
        }
    }

    /// Whether the payroll counts as committed labor cost.
    pub fn is_committed(&self) -> bool {
        matches!(self, PayrollState::Authorized | PayrollState::Paid)
    }
}

impl fmt::Display for PayrollState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Day slots for one week, Monday through Sunday.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct DaysWorked {
    #[serde(rename = "lun")]
    pub mon: f64,
    #[serde(rename = "mar")]
    pub tue: f64,
    #[serde(rename = "mie")]
    pub wed: f64,
    #[serde(rename = "jue")]
    pub thu: f64,
    #[serde(rename = "vie")]
    pub fri: f64,
    #[serde(rename = "sab")]
    pub sat: f64,
    #[serde(rename = "dom")]
    pub sun: f64,
}

impl DaysWorked {
    pub fn from_slots(slots: [f64; 7]) -> Self {
        let [mon, tue, wed, thu, fri, sat, sun] = slots;
        DaysWorked {
            mon,
            tue,
            wed,
            thu,
            fri,
            sat,
            sun,
        }
    }

    pub fn slots(&self) -> [f64; 7] {
        [
            self.mon, self.tue, self.wed, self.thu, self.fri, self.sat, self.sun,
        ]
    }

    /// Number of slots with a positive value; magnitudes are ignored.
    pub fn worked_count(&self) -> u32 {
        self.slots().iter().filter(|d| **d > 0.0).count() as u32
    }
}

/// One employee line inside a payroll.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PayrollEmployee {
    pub id: String,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "puesto")]
    pub position: String,
    #[serde(rename = "dias")]
    pub days: DaysWorked,
    #[serde(rename = "totalDias")]
    pub total_days: u32,
    #[serde(rename = "salarioDiario")]
    pub daily_wage: f64,
    #[serde(rename = "totalSemana")]
    pub weekly_total: f64,
    #[serde(rename = "observaciones", default)]
    pub notes: String,
}

impl PayrollEmployee {
    /// Recompute `total_days` and `weekly_total` from the day slots and wage.
    pub fn recompute(&mut self) {
        self.total_days = self.days.worked_count();
        self.weekly_total = f64::from(self.total_days) * self.daily_wage;
    }
}

/// Weekly payroll batch ("nómina") for one project.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Payroll {
    pub id: String,
    #[serde(rename = "obraId")]
    pub project_id: String,
    /// Project name as of creation time.
    #[serde(rename = "obraName", default)]
    pub project_name: String,
    #[serde(rename = "semanaDel")]
    pub week_start: NaiveDate,
    #[serde(rename = "semanaAl")]
    pub week_end: NaiveDate,
    #[serde(rename = "fechaElaboracion")]
    pub prepared_on: NaiveDate,
    #[serde(rename = "empleados")]
    pub employees: Vec<PayrollEmployee>,
    #[serde(rename = "totalNomina")]
    pub total: f64,
    #[serde(rename = "estado")]
    pub state: PayrollState,
    #[serde(rename = "residenteId")]
    pub resident_id: String,
    /// Resident name as of creation time.
    #[serde(rename = "residenteName", default)]
    pub resident_name: String,
    #[serde(rename = "validadaAt", default, skip_serializing_if = "Option::is_none")]
    pub validated_at: Option<DateTime<Utc>>,
    #[serde(rename = "autorizadaAt", default, skip_serializing_if = "Option::is_none")]
    pub authorized_at: Option<DateTime<Utc>>,
    #[serde(rename = "pagadaAt", default, skip_serializing_if = "Option::is_none")]
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Payroll {
    pub fn employees_total(employees: &[PayrollEmployee]) -> f64 {
        employees.iter().map(|e| e.weekly_total).sum()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DocumentCategory {
    #[serde(rename = "contrato")]
    Contract,
    #[serde(rename = "presupuesto")]
    Budget,
    #[serde(rename = "factura")]
    Invoice,
    #[serde(rename = "orden_compra")]
    PurchaseOrder,
    #[serde(rename = "caja_chica")]
    PettyCash,
    #[serde(rename = "nota_materiales")]
    MaterialsNote,
    #[serde(rename = "otro")]
    Other,
}

impl DocumentCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentCategory::Contract => "contrato",
            DocumentCategory::Budget => "presupuesto",
            DocumentCategory::Invoice => "factura",
            DocumentCategory::PurchaseOrder => "orden_compra",
            DocumentCategory::PettyCash => "caja_chica",
            DocumentCategory::MaterialsNote => "nota_materiales",
            DocumentCategory::Other => "otro",
        }
    }
}

/// Uploaded supporting document with its payload stored inline (base64,
/// optionally as a `data:` URL).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: String,
    #[serde(rename = "obraId")]
    pub project_id: String,
    #[serde(rename = "tipo")]
    pub category: DocumentCategory,
    #[serde(rename = "nombre")]
    pub name: String,
    pub file_name: String,
    pub file_data: String,
    pub uploaded_at: DateTime<Utc>,
    pub uploaded_by: String,
}

/// Portfolio-wide figures for the administrator dashboard.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_projects: usize,
    pub active_projects: usize,
    pub completed_projects: usize,
    pub cancelled_projects: usize,
    pub total_budget: f64,
    pub total_labor: f64,
    pub total_materials: f64,
    pub projected_profit: f64,
    pub pending_payrolls: usize,
    pub validated_payrolls: usize,
    pub authorized_payrolls: usize,
    pub paid_payrolls: usize,
    /// Sum of authorized payrolls awaiting the accountant.
    pub amount_to_pay: f64,
    pub amount_paid: f64,
}

/// Finance summary for a single project.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectFinance {
    pub project_id: String,
    pub project_name: String,
    pub budget: f64,
    pub labor_total: f64,
    pub materials_total: f64,
    pub spend_total: f64,
    pub physical_progress: f64,
    pub financial_progress: f64,
    pub budget_deviation: f64,
    pub roi: f64,
}

/// Figures scoped to one resident's projects and payrolls.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResidentSummary {
    pub resident_id: String,
    pub total_projects: usize,
    pub active_projects: usize,
    pub committed_labor: f64,
    pub pending_payrolls: usize,
    pub validated_payrolls: usize,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum AlertLevel {
    #[serde(rename = "critico")]
    Critical,
    #[serde(rename = "advertencia")]
    Warning,
    #[serde(rename = "info")]
    Info,
}

impl AlertLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertLevel::Critical => "critico",
            AlertLevel::Warning => "advertencia",
            AlertLevel::Info => "info",
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FinancialAlert {
    pub project_id: String,
    pub project_name: String,
    pub level: AlertLevel,
    pub message: String,
}
