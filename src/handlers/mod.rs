pub mod auth;
pub mod catalog;
pub mod chat;
pub mod health;
pub mod insights;
pub mod journal;
pub mod preferences;
pub mod quotes;
pub mod ws;
