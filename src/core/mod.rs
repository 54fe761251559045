pub mod app;
pub mod chat_stream;
pub mod client;
pub mod config;
pub mod export;
pub mod message;
pub mod personality;
pub mod settings;
pub mod store;
