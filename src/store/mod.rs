pub mod chat;
pub mod journal;
pub mod kv;
pub mod preferences;
