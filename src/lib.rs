pub mod agenda;
pub mod campaign;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod init;
pub mod memory;
pub mod models;
pub mod orchestrator;
pub mod routing;
pub mod services;
pub mod sweep;
pub mod variation;

pub use error::ConciergeError;
