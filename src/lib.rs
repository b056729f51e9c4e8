//! Lead intake bot: menu dispatch, phone intake and usage analytics for a Telegram chat bot.

pub mod api;
pub mod core;
pub mod infrastructure;
