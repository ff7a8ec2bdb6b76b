pub mod channels;
pub mod layers;
pub mod templates;

pub use channels::AlertNotifier;
pub use templates::NotificationTemplates;
