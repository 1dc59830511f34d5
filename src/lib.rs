// Public API for integration tests and potential library usage

pub mod api;
pub mod auth;
pub mod broadcast;
pub mod config;
pub mod game;
pub mod identity;
pub mod protocol;
pub mod state;
pub mod store;
pub mod types;
pub mod view;
pub mod words;
pub mod ws;
