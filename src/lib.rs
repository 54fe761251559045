//! Causerie is a terminal-first chat client for the Google Gemini API.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns runtime state: named sessions, the personality catalog,
//!   chat settings, the live chat handle, and streaming orchestration.
//! - [`ui`] renders the terminal interface and runs the interactive event
//!   loop that drives user input and display updates.
//! - [`commands`] implements slash-command parsing and command execution
//!   used by the chat loop.
//! - [`api`] defines the Gemini request/response payloads used by the
//!   backend client.
//!
//! The runtime entrypoint lives in the binary crate (`src/main.rs`), which
//! resolves configuration and credentials and then hands control to
//! [`ui::chat_loop`].

pub mod api;
pub mod auth;
pub mod commands;
pub mod core;
pub mod ui;
pub mod utils;
