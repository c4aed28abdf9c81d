pub mod api_client;
pub mod cli;
pub mod clipboard;
pub mod config;
pub mod controller;
pub mod errors;
pub mod export;
pub mod models;
pub mod notification;
pub mod render;
pub mod state;
pub mod upload;

#[cfg(test)]
mod test_support;
