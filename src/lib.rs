pub mod config;
pub mod consts;
pub mod exceptions;
pub mod handlers;
pub mod historystore;
pub mod models;
pub mod server;
pub mod utils;
pub mod verifier;
