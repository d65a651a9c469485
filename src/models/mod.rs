pub mod chat;
pub mod journal;
pub mod philosopher;
pub mod preferences;
pub mod prompt;
pub mod quote;
pub mod session;
