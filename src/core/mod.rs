pub mod config;
pub mod conversation;
pub mod credential;
pub mod space_chat;
