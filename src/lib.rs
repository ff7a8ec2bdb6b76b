pub mod api;
pub mod entities;
pub mod escalation;
pub mod metrics;
pub mod migrator;
pub mod notifications;
pub mod telemetry;

pub use sea_orm;
