pub use super::alert::Entity as Alert;
pub use super::cold_cell::Entity as ColdCell;
pub use super::customer::Entity as Customer;
pub use super::escalation_log::Entity as EscalationLog;
pub use super::location::Entity as Location;
pub use super::technician::Entity as Technician;
