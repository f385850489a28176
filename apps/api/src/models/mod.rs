pub mod chat;
pub mod conversation;
pub mod job;
pub mod profile;
