pub extern crate actix_web;

pub mod config;
pub mod connection;
mod connection_tx_storage;
pub mod document_file;
pub mod export;
pub mod handlers;
pub mod server;
mod server_state;
mod session;
