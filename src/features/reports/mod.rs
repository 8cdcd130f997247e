pub mod dtos;
pub mod export;
pub mod handlers;
pub mod lifecycle;
pub mod models;
pub mod query;
pub mod repositories;
pub mod routes;
pub mod services;

pub use repositories::PgReportRepository;
pub use services::{notifier_from_config, ReportService};
