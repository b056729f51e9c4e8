pub mod database;
pub mod entities;
pub mod messenger;
pub mod repositories;
pub mod settings;
pub mod sheets;
pub mod traits;
