pub mod alert;
pub mod cold_cell;
pub mod customer;
pub mod escalation_log;
pub mod location;
pub mod technician;

pub use alert::Entity as Alert;
pub use cold_cell::Entity as ColdCell;
pub use customer::Entity as Customer;
pub use escalation_log::Entity as EscalationLog;
pub use location::Entity as Location;
pub use technician::Entity as Technician;

pub mod prelude;
