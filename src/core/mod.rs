pub mod assistant;
pub mod configuration;
pub mod dispatcher;
pub mod error;
pub mod intake;
pub mod menu;
pub mod reply;
pub mod statistics;
pub mod templates;
pub mod traits;
