// lib.rs
// Construction-project administration core: accounts, projects ("obras"),
// weekly payrolls ("nóminas") with their approval workflow, supporting
// documents and the finance figures derived from them.

pub mod config;
pub mod error;
pub mod models;
pub mod state;
pub mod store;

pub use error::{AppError, AppResult, ErrorKind};
pub use state::AppState;
